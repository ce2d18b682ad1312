/// Route context: the result of one match attempt
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::constraint::RouteValue;
use crate::query::QueryParams;
use crate::route::{RouteAlias, RouteEntry};

/// Parameter values extracted by a match
///
/// An optional parameter that was absent from the path is present with no
/// value, which is distinct from a parameter the template never declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteParams {
    values: HashMap<String, Option<RouteValue>>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Option<RouteValue>) {
        self.values.insert(name.into(), value);
    }

    /// Typed value of a parameter, `None` if undeclared or absent
    pub fn get(&self, name: &str) -> Option<&RouteValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    /// Value of an unconstrained (string) parameter
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(RouteValue::as_str)
    }

    /// Value re-parsed as `T` from its URL form
    pub fn get_as<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name)?.to_string().parse().ok()
    }

    /// Whether the template declared this parameter (even if it is null)
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Declared but absent (an omitted optional parameter)
    pub fn is_null(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(None))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&RouteValue>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// URL forms of every non-null value, ready for URL generation
    pub fn to_string_map(&self) -> HashMap<String, String> {
        self.values
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.to_string())))
            .collect()
    }
}

/// Which alias produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasMatch {
    /// Index into the entry's (priority-sorted) alias list
    pub index: usize,
    pub redirect_to_primary: bool,
}

/// Outcome of matching one path against the route table
///
/// Created fresh per navigation and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct RouteContext {
    entry: Option<Arc<RouteEntry>>,
    remaining: Vec<String>,
    params: RouteParams,
    query: QueryParams,
    alias: Option<AliasMatch>,
    rejected: bool,
}

impl RouteContext {
    pub(crate) fn matched(
        entry: Arc<RouteEntry>,
        remaining: Vec<String>,
        params: RouteParams,
        query: QueryParams,
        alias: Option<AliasMatch>,
    ) -> Self {
        Self {
            entry: Some(entry),
            remaining,
            params,
            query,
            alias,
            rejected: false,
        }
    }

    /// No route matched; query data is still carried
    pub fn not_found(query: QueryParams) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    /// Rejected before matching: nothing at all is carried
    pub fn empty() -> Self {
        Self {
            rejected: true,
            ..Self::default()
        }
    }

    pub fn entry(&self) -> Option<&Arc<RouteEntry>> {
        self.entry.as_ref()
    }

    pub fn is_match(&self) -> bool {
        self.entry.is_some()
    }

    /// The URI never reached the route table
    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    /// Matched and consumed the whole path
    pub fn is_exact(&self) -> bool {
        self.is_match() && self.remaining.is_empty()
    }

    /// Unconsumed path segments, for a nested matcher
    pub fn remaining(&self) -> &[String] {
        &self.remaining
    }

    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn is_alias_match(&self) -> bool {
        self.alias.is_some()
    }

    pub fn alias_match(&self) -> Option<AliasMatch> {
        self.alias
    }

    /// The alias that matched, if the primary template did not
    pub fn matched_alias(&self) -> Option<&RouteAlias> {
        let alias = self.alias?;
        self.entry.as_ref()?.aliases.get(alias.index)
    }

    /// Matched through an alias that asks for the canonical URL
    pub fn should_redirect_to_primary(&self) -> bool {
        self.alias.is_some_and(|alias| alias.redirect_to_primary)
    }
}

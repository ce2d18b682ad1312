/// Route matcher
///
/// Resolves a raw path against a [`RouteTable`]: validation first (fail
/// closed), then each entry in specificity order, primary template before
/// aliases, first success wins.
use tracing::{debug, trace, warn};

use crate::constraint::RouteValue;
use crate::context::{AliasMatch, RouteContext, RouteParams};
use crate::path::{self, UrlValidator};
use crate::query::QueryParams;
use crate::route::{RouteSegment, SegmentKind};
use crate::table::RouteTable;

/// Successful template walk: leftover segments and extracted values
pub type TemplateMatch = (Vec<String>, RouteParams);

/// Matches paths using a [`UrlValidator`] as its security gate
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::{RouteCompiler, RouteDefinition, RouteMatcher, RouteValue, ViewHandle};
///
/// let table = RouteCompiler::default()
///     .build_table(vec![RouteDefinition::new("/users/{id:int}", ViewHandle::named("user"))])
///     .unwrap();
///
/// let matcher = RouteMatcher::default();
///
/// let context = matcher.match_path(&table, "/users/123");
/// assert!(context.is_match());
/// assert_eq!(context.params().get("id"), Some(&RouteValue::Int(123)));
///
/// assert!(!matcher.match_path(&table, "/users/abc").is_match());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteMatcher {
    validator: UrlValidator,
}

impl RouteMatcher {
    pub fn new(validator: UrlValidator) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &UrlValidator {
        &self.validator
    }

    /// Matches a raw path (optionally carrying `?query` and `#fragment`)
    pub fn match_path(&self, table: &RouteTable, raw_path: &str) -> RouteContext {
        if !self.screen(raw_path) {
            return RouteContext::empty();
        }
        let parts = path::split_uri(raw_path);

        let path_check = self.validator.validate_path(parts.path);
        if !path_check.is_valid() {
            warn!(
                "Rejected path `{}`: {}",
                parts.path,
                path_check.errors.join("; ")
            );
            return RouteContext::empty();
        }

        let query = parts.query.map_or_else(QueryParams::new, |raw| {
            let query_check = self.validator.validate_query_string(raw);
            if query_check.is_valid() {
                QueryParams::parse(raw)
            } else {
                debug!(
                    "Ignoring invalid query string for `{}`: {}",
                    parts.path,
                    query_check.errors.join("; ")
                );
                QueryParams::new()
            }
        });

        let Some(segments) = path::decode_segments(parts.path) else {
            warn!("Rejected path `{}`: undecodable segment", parts.path);
            return RouteContext::empty();
        };

        self.match_decoded(table, &segments, query)
    }

    /// Checks the parts of a URI that splitting throws away
    pub(crate) fn screen(&self, uri: &str) -> bool {
        let check = self.validator.validate_uri(uri);
        if !check.is_valid() {
            warn!("Rejected URI `{}`: {}", uri, check.errors.join("; "));
        }
        check.is_valid()
    }

    /// Matches already-decoded segments, e.g. the `remaining` segments of a
    /// parent match against a child table
    pub fn match_segments(&self, table: &RouteTable, segments: &[String]) -> RouteContext {
        self.match_decoded(table, segments, QueryParams::new())
    }

    fn match_decoded(
        &self,
        table: &RouteTable,
        segments: &[String],
        query: QueryParams,
    ) -> RouteContext {
        let found = table.iter().find_map(|entry| {
            if let Some((remaining, params)) = self.try_match(&entry.template, segments) {
                return Some((entry, remaining, params, None));
            }

            entry.aliases.iter().enumerate().find_map(|(index, alias)| {
                self.try_match(&alias.template, segments)
                    .map(|(remaining, params)| {
                        let alias_match = AliasMatch {
                            index,
                            redirect_to_primary: alias.redirect_to_primary,
                        };
                        (entry, remaining, params, Some(alias_match))
                    })
            })
        });

        match found {
            Some((entry, remaining, params, alias)) => {
                debug!(
                    "Matched `/{}` to `{}`{}",
                    segments.join("/"),
                    entry.source,
                    if alias.is_some() { " via alias" } else { "" }
                );
                RouteContext::matched(entry.clone(), remaining, params, query, alias)
            }
            None => {
                debug!("No route matched `/{}`", segments.join("/"));
                RouteContext::not_found(query)
            }
        }
    }

    /// Walks one template over decoded path segments
    ///
    /// Returns the unconsumed segments and the extracted values, or `None`
    /// if the template does not match. Parameter values are re-validated;
    /// a rejected value fails the whole template.
    pub fn try_match(&self, template: &[RouteSegment], path: &[String]) -> Option<TemplateMatch> {
        trace!("Trying template with {} segments", template.len());
        self.walk(template, path, RouteParams::new())
    }

    // Tail-recursive helper: consumes one template segment per call
    fn walk(
        &self,
        template: &[RouteSegment],
        path: &[String],
        mut params: RouteParams,
    ) -> Option<TemplateMatch> {
        let Some((segment, rest)) = template.split_first() else {
            return Some((path.to_vec(), params));
        };

        match segment.kind() {
            // Catch-all: swallow everything left, always succeeds
            SegmentKind::Parameter(p) if p.catch_all => {
                params.insert(p.name.clone(), Some(RouteValue::Str(path.join("/"))));
                Some((Vec::new(), params))
            }
            // Path exhausted: only optional segments may remain unfilled
            SegmentKind::Parameter(p) if path.is_empty() => {
                if !p.optional {
                    return None;
                }
                params.insert(p.name.clone(), None);
                self.walk(rest, path, params)
            }
            SegmentKind::Literal(_) if path.is_empty() => None,
            SegmentKind::Literal(text) => {
                if eq_ignore_case(text, &path[0]) {
                    self.walk(rest, &path[1..], params)
                } else {
                    None
                }
            }
            SegmentKind::Parameter(p) => {
                let raw = &path[0];

                let check = self.validator.validate_route_parameter(raw, &p.name);
                if !check.is_valid() {
                    debug!(
                        "Parameter `{}` rejected: {}",
                        p.name,
                        check.errors.join("; ")
                    );
                    return None;
                }

                let value = match &p.converter {
                    Some(converter) => converter.convert(raw)?,
                    None => RouteValue::Str(raw.clone()),
                };

                params.insert(p.name.clone(), Some(value));
                self.walk(rest, &path[1..], params)
            }
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

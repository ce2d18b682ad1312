/// Named route registry and URL builder
///
/// Reverse index from logical route name to compiled entry. URL generation
/// applies the same parameter validation and constraint checks as matching,
/// so a generated URL matches back to the route it was built from.
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::constraint::ConstraintRegistry;
use crate::context::RouteContext;
use crate::error::UrlGenerationError;
use crate::path::{encode_segment, UrlValidator};
use crate::query::QueryParams;
use crate::route::{RouteEntry, SegmentKind};
use crate::table::RouteTable;

/// Name → route index with URL generation
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::{NamedRouteRegistry, RouteCompiler, RouteDefinition, ViewHandle};
///
/// let compiler = RouteCompiler::default();
/// let table = compiler
///     .build_table(vec![
///         RouteDefinition::new("/posts/{year:int}/{slug}", ViewHandle::named("post"))
///             .with_name("post.show"),
///     ])
///     .unwrap();
///
/// let registry = NamedRouteRegistry::from_table(&table, compiler.constraints().clone());
///
/// let url = registry
///     .url_for_params("post.show", &[("year", "2024"), ("slug", "hello world")])
///     .unwrap();
/// assert_eq!(url, "/posts/2024/hello%20world");
///
/// assert!(registry.url_for_params("post.show", &[("year", "soon"), ("slug", "x")]).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct NamedRouteRegistry {
    routes: HashMap<String, Arc<RouteEntry>>,
    constraints: Arc<ConstraintRegistry>,
    validator: UrlValidator,
}

impl NamedRouteRegistry {
    /// Empty registry checking constraints against `constraints`
    pub fn new(constraints: Arc<ConstraintRegistry>) -> Self {
        Self {
            routes: HashMap::new(),
            constraints,
            validator: UrlValidator::default(),
        }
    }

    /// Registry holding every named entry of a table
    pub fn from_table(table: &RouteTable, constraints: Arc<ConstraintRegistry>) -> Self {
        table
            .named()
            .fold(Self::new(constraints), |mut registry, (name, entry)| {
                registry.register(name, entry.clone());
                registry
            })
    }

    /// Uses a validator with custom length limits
    pub fn with_validator(mut self, validator: UrlValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Registers an entry under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, entry: Arc<RouteEntry>) {
        let name = name.into();
        if let Some(previous) = self.routes.insert(name.clone(), entry) {
            warn!(
                "Route name `{}` re-registered (previously `{}`)",
                name, previous.source
            );
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&Arc<RouteEntry>> {
        self.routes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Builds the URL of a named route
    ///
    /// With `validate`, every value must pass the parameter security checks
    /// and satisfy its segment's constraint. Without it, values are only
    /// sanitized.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use rhtmx_navigator::{NamedRouteRegistry, RouteCompiler, RouteDefinition, ViewHandle};
    ///
    /// let compiler = RouteCompiler::default();
    /// let table = compiler
    ///     .build_table(vec![
    ///         RouteDefinition::new("/archive/{year:int?}", ViewHandle::named("archive"))
    ///             .with_name("archive"),
    ///     ])
    ///     .unwrap();
    /// let registry = NamedRouteRegistry::from_table(&table, compiler.constraints().clone());
    ///
    /// let mut values = HashMap::new();
    /// assert_eq!(registry.generate_url("archive", &values, true).unwrap(), "/archive");
    ///
    /// values.insert("year".to_string(), "2024".to_string());
    /// assert_eq!(registry.generate_url("archive", &values, true).unwrap(), "/archive/2024");
    /// ```
    pub fn generate_url(
        &self,
        name: &str,
        values: &HashMap<String, String>,
        validate: bool,
    ) -> Result<String, UrlGenerationError> {
        let entry = self
            .resolve(name)
            .ok_or_else(|| UrlGenerationError::UnknownRoute(name.to_string()))?;

        self.build(name, entry, values, validate)
    }

    /// Validating generation that reports failure as `None`
    pub fn try_generate_url(&self, name: &str, values: &HashMap<String, String>) -> Option<String> {
        self.generate_url(name, values, true)
            .map_err(|err| debug!("URL generation for `{}` failed: {}", name, err))
            .ok()
    }

    /// Convenience form taking parameter tuples
    pub fn url_for_params(
        &self,
        name: &str,
        params: &[(&str, &str)],
    ) -> Result<String, UrlGenerationError> {
        let values: HashMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        self.generate_url(name, &values, true)
    }

    /// Validating generation with a query string appended
    pub fn generate_url_with_query(
        &self,
        name: &str,
        values: &HashMap<String, String>,
        query: &QueryParams,
    ) -> Result<String, UrlGenerationError> {
        let path = self.generate_url(name, values, true)?;
        Ok(format!("{}{}", path, query.to_query_string()))
    }

    /// Canonical primary URL for a matched context
    ///
    /// Rebuilds the entry's primary template from the matched values and
    /// keeps the query. `None` if nothing matched or a value no longer fits.
    pub fn generate_for_context(&self, context: &RouteContext) -> Option<String> {
        let entry = context.entry()?;
        let label = entry.name.as_deref().unwrap_or(&entry.source);

        match self.build(label, entry, &context.params().to_string_map(), true) {
            Ok(path) => Some(format!("{}{}", path, context.query().to_query_string())),
            Err(err) => {
                warn!("Cannot build canonical URL for `{}`: {}", entry.source, err);
                None
            }
        }
    }

    fn build(
        &self,
        route: &str,
        entry: &RouteEntry,
        values: &HashMap<String, String>,
        validate: bool,
    ) -> Result<String, UrlGenerationError> {
        let pieces = entry
            .template
            .iter()
            .map(|segment| match segment.kind() {
                SegmentKind::Literal(text) => Ok(Some(encode_segment(text).into_owned())),
                SegmentKind::Parameter(param) => {
                    let value = match values.get(&param.name).map(String::as_str) {
                        Some(value) if validate && !value.is_empty() => {
                            self.check(&param.name, param.constraint.as_deref(), value)?;
                            value.to_string()
                        }
                        Some(value) if !validate => self.validator.sanitize_parameter(value),
                        _ => String::new(),
                    };

                    // Absent optional or catch-all: the segment disappears
                    if value.is_empty() {
                        return if param.optional || param.catch_all {
                            Ok(None)
                        } else {
                            Err(UrlGenerationError::MissingParameter {
                                route: route.to_string(),
                                param: param.name.clone(),
                            })
                        };
                    }

                    Ok(Some(if param.catch_all {
                        encode_catch_all(&value)
                    } else {
                        encode_segment(&value).into_owned()
                    }))
                }
            })
            .filter_map(Result::transpose)
            .collect::<Result<Vec<String>, UrlGenerationError>>()?;

        Ok(format!("/{}", pieces.join("/")))
    }

    fn check(
        &self,
        name: &str,
        constraint: Option<&str>,
        value: &str,
    ) -> Result<(), UrlGenerationError> {
        let result = self.validator.validate_route_parameter(value, name);
        if !result.is_valid() {
            return Err(UrlGenerationError::InvalidParameter {
                param: name.to_string(),
                errors: result.errors,
            });
        }

        match constraint {
            Some(kind) if !self.constraints.is_compatible(kind, value) => {
                Err(UrlGenerationError::ConstraintMismatch {
                    param: name.to_string(),
                    constraint: kind.to_string(),
                    value: value.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Encodes each piece of a catch-all value, keeping its `/` separators
fn encode_catch_all(value: &str) -> String {
    value
        .split('/')
        .filter(|piece| !piece.is_empty())
        .map(|piece| encode_segment(piece).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

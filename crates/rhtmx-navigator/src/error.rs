/// Error types for template compilation, URL generation and navigation
///
/// Validation rejections and match failures are *not* errors here: a
/// malformed or non-matching path simply yields an unmatched `RouteContext`.
use thiserror::Error;

/// A route template could not be compiled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// `{` without `}` (or the reverse) inside a segment
    #[error("unbalanced braces in segment `{segment}` of template `{template}`")]
    UnbalancedBraces { template: String, segment: String },

    /// `{}`, `{?}`, `{*}` or `{:int}`
    #[error("empty parameter name in segment `{segment}` of template `{template}`")]
    EmptyParameterName { template: String, segment: String },

    /// A catch-all must be the last segment of its template
    #[error("catch-all parameter `{name}` must be the last segment of template `{template}`")]
    CatchAllNotTerminal { template: String, name: String },

    /// `{*rest:int}`: a catch-all takes whatever is left, untyped
    #[error("catch-all `{name}` in template `{template}` cannot take constraint `{constraint}`")]
    ConstrainedCatchAll {
        template: String,
        name: String,
        constraint: String,
    },

    /// The same parameter name appears twice
    #[error("parameter `{name}` declared more than once in template `{template}`")]
    DuplicateParameter { template: String, name: String },
}

/// Building a URL from a named route failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlGenerationError {
    #[error("no route registered under the name `{0}`")]
    UnknownRoute(String),

    #[error("route `{route}` requires parameter `{param}`")]
    MissingParameter { route: String, param: String },

    #[error("parameter `{param}` is not a safe URL value: {}", .errors.join("; "))]
    InvalidParameter { param: String, errors: Vec<String> },

    #[error("parameter `{param}` = `{value}` does not satisfy constraint `{constraint}`")]
    ConstraintMismatch {
        param: String,
        constraint: String,
        value: String,
    },
}

/// Signal raised by a middleware that observed a cancellation request
///
/// Returned through `anyhow` from
/// [`NavigationContext::check_cancelled`](crate::NavigationContext::check_cancelled).
/// The pipeline turns it into `NavigationResult::Cancel` rather than `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("navigation was cancelled")]
pub struct NavigationCancelled;

/// Failures raised by the navigation driver itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("redirect loop detected (depth {depth}) while navigating to `{target}`")]
    RedirectLoop { depth: usize, target: String },

    #[error("middleware panicked: {0}")]
    MiddlewarePanic(String),
}

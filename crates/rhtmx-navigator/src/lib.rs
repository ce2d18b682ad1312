//! # RHTMX Navigator
//!
//! The navigation core of an RHTMX client: decides *what* a URL matches and
//! *whether* the navigation may proceed. Supports:
//! - Literal segments (`/about`), matched case-insensitively
//! - Typed parameters (`/users/{id:int}`, `{when:datetime}`, `{key:guid}`)
//! - Optional parameters (`/archive/{year:int?}`)
//! - Catch-all parameters (`/docs/{*path}`)
//! - Aliases with priorities and canonical redirects
//! - Named routes and URL generation
//! - An async, cancellable middleware pipeline around every navigation
//!
//! ## Pipeline
//!
//! raw URI → [`UrlValidator`] → [`RouteMatcher`] (compiled [`RouteTable`],
//! [`QueryParams`]) → [`RouteContext`] → [`MiddlewarePipeline`] →
//! [`NavigationOutcome`]
//!
//! ## Security
//!
//! Matching fails closed: traversal sequences, dangerous schemes, control
//! characters and oversized input (encoded or not) never match any route.
//! Rejection is reported as "no match", never as an error.
//!
//! ## Example
//!
//! ```
//! use rhtmx_navigator::{RouteCompiler, RouteDefinition, RouteMatcher, RouteValue, ViewHandle};
//!
//! let table = RouteCompiler::default()
//!     .build_table(vec![
//!         RouteDefinition::new("/users/{id:int}", ViewHandle::named("user")),
//!         RouteDefinition::new("/products/{*tail}", ViewHandle::named("products")),
//!     ])
//!     .unwrap();
//!
//! let matcher = RouteMatcher::default();
//!
//! let context = matcher.match_path(&table, "/users/123");
//! assert_eq!(context.params().get("id"), Some(&RouteValue::Int(123)));
//!
//! let context = matcher.match_path(&table, "/products/a/b");
//! assert_eq!(context.params().get_str("tail"), Some("a/b"));
//!
//! assert!(!matcher.match_path(&table, "/users/../admin").is_match());
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
pub mod constraint;
pub mod context;
pub mod error;
pub mod matcher;
pub mod named;
pub mod navigation;
pub mod path;
pub mod query;
pub mod route;
pub mod table;

// Re-export public types
pub use config::{NavigationConfig, NavigatorConfig, ValidationConfig};
pub use constraint::{ConstraintRegistry, Converter, RouteValue};
pub use context::{AliasMatch, RouteContext, RouteParams};
pub use error::{CompileError, NavigationCancelled, NavigationError, UrlGenerationError};
pub use matcher::RouteMatcher;
pub use named::NamedRouteRegistry;
pub use navigation::{
    guard_fn, middleware_fn, MiddlewarePipeline, NavigationContext, NavigationMiddleware,
    NavigationOutcome, NavigationResult, Navigator, Next,
};
pub use path::{UrlValidator, ValidationResult};
pub use query::QueryParams;
pub use route::{
    AliasDefinition, RouteAlias, RouteCompiler, RouteDefinition, RouteEntry, RouteSegment,
    SegmentKind, ViewHandle,
};
pub use table::RouteTable;

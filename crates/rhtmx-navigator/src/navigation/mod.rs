/// Navigation middleware
///
/// Every navigation attempt runs through an ordered chain of
/// [`NavigationMiddleware`]. Each stage either continues by awaiting
/// [`Next::run`] or short-circuits with its own [`NavigationResult`].
/// Stages observe cancellation through [`NavigationContext::check_cancelled`].
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::context::RouteContext;
use crate::error::NavigationCancelled;

pub mod navigator;
pub mod pipeline;

pub use navigator::{NavigationOutcome, Navigator};
pub use pipeline::MiddlewarePipeline;

// ============================================================================
// Context and result
// ============================================================================

/// Per-attempt navigation state handed to every middleware (read-only)
#[derive(Debug, Clone)]
pub struct NavigationContext {
    uri: String,
    route: RouteContext,
    token: CancellationToken,
}

impl NavigationContext {
    pub fn new(uri: impl Into<String>, route: RouteContext, token: CancellationToken) -> Self {
        Self {
            uri: uri.into(),
            route,
            token,
        }
    }

    /// Target URI as requested
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn route(&self) -> &RouteContext {
        &self.route
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fails with [`NavigationCancelled`] once cancellation was requested
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::{NavigationCancelled, NavigationContext, RouteContext};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// let token = CancellationToken::new();
    /// let ctx = NavigationContext::new("/", RouteContext::empty(), token.clone());
    /// assert!(ctx.check_cancelled().is_ok());
    ///
    /// token.cancel();
    /// let err = ctx.check_cancelled().unwrap_err();
    /// assert!(err.is::<NavigationCancelled>());
    /// ```
    pub fn check_cancelled(&self) -> anyhow::Result<()> {
        if self.token.is_cancelled() {
            Err(NavigationCancelled.into())
        } else {
            Ok(())
        }
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// Decision produced by a middleware stage
#[derive(Clone)]
pub enum NavigationResult {
    Allow,
    /// Navigate to another route path instead
    ///
    /// The target is relative to the configured base path, like the URLs
    /// built by [`NamedRouteRegistry`](crate::NamedRouteRegistry): with
    /// `base_path = "/app"`, `Redirect("/login")` navigates to `/app/login`.
    Redirect(String),
    Cancel,
    Error(Arc<anyhow::Error>),
}

impl NavigationResult {
    pub fn redirect(url: impl Into<String>) -> Self {
        Self::Redirect(url.into())
    }

    pub fn error(error: impl Into<anyhow::Error>) -> Self {
        Self::Error(Arc::new(error.into()))
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Debug for NavigationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("Allow"),
            Self::Redirect(url) => f.debug_tuple("Redirect").field(url).finish(),
            Self::Cancel => f.write_str("Cancel"),
            Self::Error(err) => f.debug_tuple("Error").field(&format_args!("{:#}", err)).finish(),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// One stage of the navigation pipeline
///
/// Returning `Err` is allowed: an error that is (or wraps)
/// [`NavigationCancelled`] becomes `Cancel`, anything else becomes `Error`.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use rhtmx_navigator::{NavigationContext, NavigationMiddleware, NavigationResult, Next};
///
/// struct RequireAuth {
///     signed_in: bool,
/// }
///
/// #[async_trait]
/// impl NavigationMiddleware for RequireAuth {
///     async fn invoke(
///         &self,
///         ctx: &NavigationContext,
///         next: Next<'_>,
///     ) -> anyhow::Result<NavigationResult> {
///         let protected = ctx
///             .route()
///             .entry()
///             .is_some_and(|entry| entry.has_meta("requires_auth"));
///
///         if protected && !self.signed_in {
///             return Ok(NavigationResult::redirect("/login"));
///         }
///         next.run(ctx).await
///     }
/// }
/// ```
#[async_trait]
pub trait NavigationMiddleware: Send + Sync {
    async fn invoke(
        &self,
        ctx: &NavigationContext,
        next: Next<'_>,
    ) -> anyhow::Result<NavigationResult>;

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// The rest of the chain after the current stage
///
/// Running past the last stage yields `Allow`.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    remaining: &'a [Arc<dyn NavigationMiddleware>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(remaining: &'a [Arc<dyn NavigationMiddleware>]) -> Self {
        Self { remaining }
    }

    /// Number of stages still ahead
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Invokes the next stage, checking cancellation before and after
    pub async fn run(self, ctx: &NavigationContext) -> anyhow::Result<NavigationResult> {
        ctx.check_cancelled()?;

        let result = match self.remaining.split_first() {
            Some((stage, rest)) => {
                tracing::trace!("Invoking navigation middleware `{}`", stage.name());
                stage.invoke(ctx, Next::new(rest)).await?
            }
            None => NavigationResult::Allow,
        };

        ctx.check_cancelled()?;
        Ok(result)
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.remaining.len())
            .finish()
    }
}

// ============================================================================
// Closure adapters
// ============================================================================

/// Boxed future returned by closure middleware
pub type MiddlewareFuture<'a> = BoxFuture<'a, anyhow::Result<NavigationResult>>;

/// Middleware backed by an async closure; see [`middleware_fn`]
pub struct FnMiddleware<F> {
    f: F,
}

#[async_trait]
impl<F> NavigationMiddleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a NavigationContext, Next<'a>) -> MiddlewareFuture<'a>
        + Send
        + Sync
        + 'static,
{
    async fn invoke(
        &self,
        ctx: &NavigationContext,
        next: Next<'_>,
    ) -> anyhow::Result<NavigationResult> {
        (self.f)(ctx, next).await
    }

    fn name(&self) -> &str {
        "middleware_fn"
    }
}

/// Wraps an async closure as middleware
///
/// # Examples
///
/// ```
/// use futures::FutureExt;
/// use rhtmx_navigator::{middleware_fn, MiddlewarePipeline, NavigationResult};
///
/// let pipeline = MiddlewarePipeline::new().with(middleware_fn(|ctx, next| {
///     async move {
///         if ctx.uri().starts_with("/old") {
///             return Ok(NavigationResult::redirect("/new"));
///         }
///         next.run(ctx).await
///     }
///     .boxed()
/// }));
/// assert_eq!(pipeline.len(), 1);
/// ```
pub fn middleware_fn<F>(f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a NavigationContext, Next<'a>) -> MiddlewareFuture<'a>
        + Send
        + Sync
        + 'static,
{
    FnMiddleware { f }
}

/// Synchronous guard; see [`guard_fn`]
pub struct FnGuard<F> {
    f: F,
}

#[async_trait]
impl<F> NavigationMiddleware for FnGuard<F>
where
    F: Fn(&NavigationContext) -> NavigationResult + Send + Sync + 'static,
{
    async fn invoke(
        &self,
        ctx: &NavigationContext,
        next: Next<'_>,
    ) -> anyhow::Result<NavigationResult> {
        match (self.f)(ctx) {
            NavigationResult::Allow => next.run(ctx).await,
            decision => Ok(decision),
        }
    }

    fn name(&self) -> &str {
        "guard_fn"
    }
}

/// Wraps a synchronous check: `Allow` continues the chain, anything else
/// short-circuits it
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::{guard_fn, MiddlewarePipeline, NavigationResult};
///
/// let pipeline = MiddlewarePipeline::new().with(guard_fn(|ctx| {
///     if ctx.uri().starts_with("/admin") {
///         NavigationResult::Cancel
///     } else {
///         NavigationResult::Allow
///     }
/// }));
/// assert!(!pipeline.is_empty());
/// ```
pub fn guard_fn<F>(f: F) -> FnGuard<F>
where
    F: Fn(&NavigationContext) -> NavigationResult + Send + Sync + 'static,
{
    FnGuard { f }
}

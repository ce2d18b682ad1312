/// Navigation driver
///
/// Owns the route table, the named registry and the middleware pipeline, and
/// turns a requested URI into a [`NavigationOutcome`]. One navigation is
/// active at a time: starting a new one cancels the previous one.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{MiddlewarePipeline, NavigationContext, NavigationMiddleware, NavigationResult};
use crate::config::NavigatorConfig;
use crate::constraint::ConstraintRegistry;
use crate::context::RouteContext;
use crate::error::{CompileError, NavigationError};
use crate::matcher::RouteMatcher;
use crate::named::NamedRouteRegistry;
use crate::path::{self, UrlValidator};
use crate::route::{RouteCompiler, RouteDefinition};
use crate::table::RouteTable;

/// Final decision for one navigation, consumed by the renderer and host
#[derive(Debug, Clone)]
pub enum NavigationOutcome {
    /// Render the matched route; `url` is the final URL after redirects
    Render { url: String, context: RouteContext },
    /// Nothing matched: render the not-found view
    NotFound { url: String, context: RouteContext },
    /// Cancelled (or superseded, or timed out); the host restores `restored_url`
    Cancelled { restored_url: Option<String> },
    /// A middleware or the driver failed; the host restores `restored_url`
    Failed {
        error: Arc<anyhow::Error>,
        restored_url: Option<String>,
    },
}

impl NavigationOutcome {
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// URL now shown to the user, if this outcome changes it
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Render { url, .. } | Self::NotFound { url, .. } => Some(url),
            Self::Cancelled { .. } | Self::Failed { .. } => None,
        }
    }

    pub fn context(&self) -> Option<&RouteContext> {
        match self {
            Self::Render { context, .. } | Self::NotFound { context, .. } => Some(context),
            Self::Cancelled { .. } | Self::Failed { .. } => None,
        }
    }
}

#[derive(Default)]
struct NavigatorState {
    current_url: Option<String>,
    active: Option<(u64, CancellationToken)>,
    next_id: u64,
}

/// Router instance driving navigations through the pipeline
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::{Navigator, RouteDefinition, ViewHandle};
///
/// # tokio_test_block(async {
/// let navigator = Navigator::from_definitions(vec![
///     RouteDefinition::new("/users/{id:int}", ViewHandle::named("user")),
/// ])
/// .unwrap();
///
/// let outcome = navigator.navigate("/users/7").await;
/// assert!(outcome.is_render());
/// assert_eq!(navigator.current_url().as_deref(), Some("/users/7"));
///
/// assert!(navigator.navigate("/nowhere").await.is_not_found());
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f);
/// # }
/// ```
pub struct Navigator {
    table: Arc<RouteTable>,
    registry: NamedRouteRegistry,
    matcher: RouteMatcher,
    pipeline: MiddlewarePipeline,
    config: NavigatorConfig,
    timeout: Duration,
    state: Mutex<NavigatorState>,
}

impl Navigator {
    /// Navigator over a compiled table; `constraints` must be the registry
    /// the table was compiled with
    pub fn new(table: RouteTable, constraints: Arc<ConstraintRegistry>) -> Self {
        let registry = NamedRouteRegistry::from_table(&table, constraints);
        let config = NavigatorConfig::default();

        Self {
            table: Arc::new(table),
            registry,
            matcher: RouteMatcher::default(),
            pipeline: MiddlewarePipeline::new(),
            timeout: config.navigation.timeout(),
            config,
            state: Mutex::new(NavigatorState::default()),
        }
    }

    /// Compiles declarations with the built-in constraints
    pub fn from_definitions<I>(definitions: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = RouteDefinition>,
    {
        let compiler = RouteCompiler::default();
        let table = compiler.build_table(definitions)?;
        Ok(Self::new(table, compiler.constraints().clone()))
    }

    /// Applies validator limits, navigation settings and the timeout
    pub fn with_config(mut self, config: NavigatorConfig) -> Self {
        let validator = UrlValidator::from_config(&config.validation);
        self.matcher = RouteMatcher::new(validator);
        self.registry = self.registry.with_validator(validator);
        self.timeout = config.navigation.timeout();
        self.config = config;
        self
    }

    /// Overrides the navigation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_middleware(mut self, middleware: impl NavigationMiddleware + 'static) -> Self {
        self.pipeline = self.pipeline.with(middleware);
        self
    }

    pub fn with_pipeline(mut self, pipeline: MiddlewarePipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn registry(&self) -> &NamedRouteRegistry {
        &self.registry
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// URL of the last completed navigation (`None` before the first one)
    pub fn current_url(&self) -> Option<String> {
        self.lock().current_url.clone()
    }

    /// Cancels the in-flight navigation, if any
    pub fn cancel(&self) {
        if let Some((_, token)) = self.lock().active.take() {
            token.cancel();
        }
    }

    /// Matches a URI the way navigation does (base path, exact-match rule)
    /// without running middleware
    pub fn resolve(&self, uri: &str) -> RouteContext {
        if !self.matcher.screen(uri) {
            return RouteContext::empty();
        }
        let parts = path::split_uri(uri);

        let Some(relative) = path::strip_base_path(parts.path, &self.config.navigation.base_path)
        else {
            debug!("`{}` is outside base path `{}`", uri, self.config.navigation.base_path);
            return RouteContext::empty();
        };

        let target = match parts.query {
            Some(query) => format!("{}?{}", relative, query),
            None => relative.to_string(),
        };

        let context = self.matcher.match_path(&self.table, &target);
        if self.config.navigation.require_exact_match && context.is_match() && !context.is_exact() {
            debug!("`{}` left unmatched segments {:?}", uri, context.remaining());
            return RouteContext::not_found(context.query().clone());
        }
        context
    }

    /// Runs a full navigation: match, middleware, redirects
    ///
    /// Cancels any navigation still in flight. The whole attempt, redirects
    /// included, is bounded by the configured timeout.
    pub async fn navigate(&self, uri: &str) -> NavigationOutcome {
        let (id, token) = self.begin();

        let outcome = match tokio::time::timeout(self.timeout, self.drive(uri, &token)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                token.cancel();
                warn!("Navigation to `{}` timed out after {:?}", uri, self.timeout);
                self.cancelled()
            }
        };

        self.finish(id, &outcome);
        outcome
    }

    async fn drive(&self, uri: &str, token: &CancellationToken) -> NavigationOutcome {
        let mut target = uri.to_string();
        let mut redirects = 0;

        loop {
            let context = self.resolve(&target);
            let ctx = NavigationContext::new(target.clone(), context.clone(), token.clone());
            let result = self.pipeline.run(&ctx).await;

            if token.is_cancelled() {
                debug!("Navigation to `{}` was cancelled", target);
                return self.cancelled();
            }

            let next = match result {
                NavigationResult::Allow if context.should_redirect_to_primary() => {
                    match self.registry.generate_for_context(&context) {
                        Some(canonical) => self.with_base_path(&canonical),
                        None => return self.allowed(target, context),
                    }
                }
                NavigationResult::Allow => return self.allowed(target, context),
                NavigationResult::Redirect(url) => self.with_base_path(&url),
                NavigationResult::Cancel => {
                    debug!("Navigation to `{}` cancelled by middleware", target);
                    return self.cancelled();
                }
                NavigationResult::Error(error) => {
                    warn!("Navigation to `{}` failed: {:#}", target, error);
                    return self.failed(error);
                }
            };

            if redirects >= self.config.navigation.max_redirects {
                warn!("Redirect loop detected (depth {}) at `{}`", redirects, next);
                return self.failed(Arc::new(
                    NavigationError::RedirectLoop {
                        depth: redirects,
                        target: next,
                    }
                    .into(),
                ));
            }

            debug!("Redirecting `{}` → `{}`", target, next);
            redirects += 1;
            target = next;
        }
    }

    fn allowed(&self, url: String, context: RouteContext) -> NavigationOutcome {
        if context.is_match() {
            NavigationOutcome::Render { url, context }
        } else {
            NavigationOutcome::NotFound { url, context }
        }
    }

    fn cancelled(&self) -> NavigationOutcome {
        NavigationOutcome::Cancelled {
            restored_url: self.current_url(),
        }
    }

    fn failed(&self, error: Arc<anyhow::Error>) -> NavigationOutcome {
        NavigationOutcome::Failed {
            error,
            restored_url: self.current_url(),
        }
    }

    /// Route path → navigable URI under the configured base path
    fn with_base_path(&self, url: &str) -> String {
        let base = self.config.navigation.base_path.trim_end_matches('/');
        format!("{}{}", base, url)
    }

    fn lock(&self) -> MutexGuard<'_, NavigatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new active navigation, cancelling the previous one
    fn begin(&self) -> (u64, CancellationToken) {
        let mut state = self.lock();
        if let Some((previous, token)) = state.active.take() {
            debug!("Superseding navigation #{}", previous);
            token.cancel();
        }

        let id = state.next_id;
        state.next_id += 1;

        let token = CancellationToken::new();
        state.active = Some((id, token.clone()));
        (id, token)
    }

    /// Commits the outcome if this navigation is still the active one
    fn finish(&self, id: u64, outcome: &NavigationOutcome) {
        let mut state = self.lock();
        if !matches!(state.active, Some((active, _)) if active == id) {
            return;
        }
        state.active = None;

        match outcome {
            NavigationOutcome::NotFound { url, context } if context.is_rejected() => {
                debug!("Keeping current URL after rejecting `{}`", url);
            }
            NavigationOutcome::Render { url, .. } | NavigationOutcome::NotFound { url, .. } => {
                info!("Navigated to `{}`", url);
                state.current_url = Some(url.clone());
            }
            NavigationOutcome::Cancelled { .. } | NavigationOutcome::Failed { .. } => {}
        }
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("routes", &self.table.len())
            .field("pipeline", &self.pipeline)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavigationConfig;
    use crate::navigation::guard_fn;
    use crate::route::{AliasDefinition, ViewHandle};

    fn navigator() -> Navigator {
        Navigator::from_definitions(vec![
            RouteDefinition::new("/", ViewHandle::named("home")),
            RouteDefinition::new("/users/{id:int}", ViewHandle::named("user"))
                .with_alias(AliasDefinition::new("/u/{id:int}").redirect_to_primary()),
            RouteDefinition::new("/legacy/{id:int}", ViewHandle::named("legacy"))
                .with_alias(AliasDefinition::new("/l/{id:int}")),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_render_updates_current_url() {
        let navigator = navigator();
        assert_eq!(navigator.current_url(), None);

        let outcome = navigator.navigate("/users/5?tab=a").await;
        assert!(outcome.is_render());
        assert_eq!(navigator.current_url().as_deref(), Some("/users/5?tab=a"));
    }

    #[tokio::test]
    async fn test_alias_with_redirect_goes_to_primary() {
        let outcome = navigator().navigate("/u/9").await;
        match outcome {
            NavigationOutcome::Render { url, context } => {
                assert_eq!(url, "/users/9");
                assert!(!context.is_alias_match());
            }
            other => panic!("expected Render, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_alias_without_redirect_renders_in_place() {
        let outcome = navigator().navigate("/l/3").await;
        assert_eq!(outcome.url(), Some("/l/3"));
        assert!(outcome.context().unwrap().is_alias_match());
    }

    #[tokio::test]
    async fn test_exact_match_rule() {
        let loose = navigator();
        assert!(loose.navigate("/users/5/extra").await.is_render());

        let strict = navigator().with_config(NavigatorConfig {
            navigation: NavigationConfig {
                require_exact_match: true,
                ..NavigationConfig::default()
            },
            ..NavigatorConfig::default()
        });
        assert!(strict.navigate("/users/5/extra").await.is_not_found());
    }

    #[tokio::test]
    async fn test_base_path_is_stripped() {
        let navigator = navigator().with_config(NavigatorConfig {
            navigation: NavigationConfig {
                base_path: "/app".to_string(),
                ..NavigationConfig::default()
            },
            ..NavigatorConfig::default()
        });

        assert!(navigator.navigate("/app/users/1").await.is_render());
        assert_eq!(
            navigator.navigate("/app/u/1").await.url(),
            Some("/app/users/1")
        );
        assert!(navigator.navigate("/elsewhere/users/1").await.is_not_found());
    }

    #[tokio::test]
    async fn test_cancel_restores_previous_url() {
        let navigator = navigator().with_middleware(guard_fn(|ctx| {
            if ctx.uri().starts_with("/users/13") {
                NavigationResult::Cancel
            } else {
                NavigationResult::Allow
            }
        }));

        assert!(navigator.navigate("/users/12").await.is_render());
        match navigator.navigate("/users/13").await {
            NavigationOutcome::Cancelled { restored_url } => {
                assert_eq!(restored_url.as_deref(), Some("/users/12"));
            }
            other => panic!("expected Cancelled, got {:?}", other),
        }
        assert_eq!(navigator.current_url().as_deref(), Some("/users/12"));
    }

    #[tokio::test]
    async fn test_first_load_cancel_restores_nothing() {
        let navigator = navigator().with_middleware(guard_fn(|_| NavigationResult::Cancel));
        match navigator.navigate("/").await {
            NavigationOutcome::Cancelled { restored_url } => assert_eq!(restored_url, None),
            other => panic!("expected Cancelled, got {:?}", other),
        }
    }
}

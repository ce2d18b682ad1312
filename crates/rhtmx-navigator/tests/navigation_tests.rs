//! Integration tests for the navigation pipeline and driver
//!
//! Covers:
//! - Short-circuiting and ordering of middleware
//! - Totality of the pipeline (errors, panics, cancellation)
//! - Redirects, redirect loops and canonical alias redirects
//! - Last-request-wins cancellation and timeouts
//! - Restoring the previous URL

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use pretty_assertions::assert_eq;
use rhtmx_navigator::*;
use rstest::rstest;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn routes() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::new("/", ViewHandle::named("home")),
        RouteDefinition::new("/login", ViewHandle::named("login")),
        RouteDefinition::new("/account", ViewHandle::named("account"))
            .with_meta("requires_auth", "true"),
        RouteDefinition::new("/users/{id:int}", ViewHandle::named("user"))
            .with_name("user")
            .with_alias(AliasDefinition::new("/profile/{id:int}").redirect_to_primary()),
        RouteDefinition::new("/slow", ViewHandle::named("slow")),
        RouteDefinition::new("/fast", ViewHandle::named("fast")),
    ]
}

fn ctx(uri: &str) -> NavigationContext {
    NavigationContext::new(uri, RouteContext::empty(), CancellationToken::new())
}

// ============================================================================
// Test middleware
// ============================================================================

/// Records its label, then continues
struct Record {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl NavigationMiddleware for Record {
    async fn invoke(
        &self,
        ctx: &NavigationContext,
        next: Next<'_>,
    ) -> anyhow::Result<NavigationResult> {
        self.log.lock().unwrap().push(self.label);
        next.run(ctx).await
    }
}

/// Cancels every navigation without calling `next`
struct AuthGuard {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl NavigationMiddleware for AuthGuard {
    async fn invoke(
        &self,
        _ctx: &NavigationContext,
        _next: Next<'_>,
    ) -> anyhow::Result<NavigationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(NavigationResult::Cancel)
    }
}

/// Counts invocations, then continues
struct LogGuard {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl NavigationMiddleware for LogGuard {
    async fn invoke(
        &self,
        ctx: &NavigationContext,
        next: Next<'_>,
    ) -> anyhow::Result<NavigationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        next.run(ctx).await
    }
}

/// Redirects protected routes to `/login`
struct RequireAuth {
    signed_in: bool,
}

#[async_trait]
impl NavigationMiddleware for RequireAuth {
    async fn invoke(
        &self,
        ctx: &NavigationContext,
        next: Next<'_>,
    ) -> anyhow::Result<NavigationResult> {
        let protected = ctx
            .route()
            .entry()
            .is_some_and(|entry| entry.has_meta("requires_auth"));

        if protected && !self.signed_in {
            return Ok(NavigationResult::redirect("/login"));
        }
        next.run(ctx).await
    }
}

/// Blocks navigations to `/slow` until cancelled
struct Stall {
    entered: Arc<Notify>,
}

#[async_trait]
impl NavigationMiddleware for Stall {
    async fn invoke(
        &self,
        ctx: &NavigationContext,
        next: Next<'_>,
    ) -> anyhow::Result<NavigationResult> {
        if ctx.uri() == "/slow" {
            self.entered.notify_one();
            tokio::select! {
                _ = ctx.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_secs(60)) => {}
            }
            ctx.check_cancelled()?;
        }
        next.run(ctx).await
    }
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_short_circuit_skips_later_stages() {
    init_tracing();
    let auth_calls = Arc::new(AtomicUsize::new(0));
    let log_calls = Arc::new(AtomicUsize::new(0));

    let pipeline = MiddlewarePipeline::new()
        .with(AuthGuard { calls: auth_calls.clone() })
        .with(LogGuard { calls: log_calls.clone() });

    let result = pipeline.run(&ctx("/account")).await;

    assert!(result.is_cancel());
    assert_eq!(auth_calls.load(Ordering::SeqCst), 1);
    assert_eq!(log_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_stages_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let pipeline = MiddlewarePipeline::new()
        .with(Record { label: "first", log: log.clone() })
        .with(Record { label: "second", log: log.clone() })
        .with(Record { label: "third", log: log.clone() });

    assert!(pipeline.run(&ctx("/")).await.is_allow());
    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_stage_can_transform_downstream_result() {
    let pipeline = MiddlewarePipeline::new()
        .with(middleware_fn(|ctx, next| {
            async move {
                match next.run(ctx).await? {
                    NavigationResult::Cancel => Ok(NavigationResult::redirect("/login")),
                    other => Ok(other),
                }
            }
            .boxed()
        }))
        .with(guard_fn(|_| NavigationResult::Cancel));

    match pipeline.run(&ctx("/")).await {
        NavigationResult::Redirect(url) => assert_eq!(url, "/login"),
        other => panic!("expected Redirect, got {:?}", other),
    }
}

#[derive(Debug, Clone, Copy)]
enum Expected {
    Allow,
    Redirect,
    Cancel,
    Error,
}

#[rstest]
#[case::empty(vec![], Expected::Allow)]
#[case::allow(vec!["allow"], Expected::Allow)]
#[case::redirect(vec!["allow", "redirect", "panic"], Expected::Redirect)]
#[case::cancel(vec!["cancel", "panic"], Expected::Cancel)]
#[case::error(vec!["allow", "error"], Expected::Error)]
#[case::panic(vec!["allow", "panic"], Expected::Error)]
#[case::cancelled_signal(vec!["signal"], Expected::Cancel)]
#[tokio::test]
async fn test_pipeline_totality(#[case] stages: Vec<&'static str>, #[case] expected: Expected) {
    let pipeline = stages.into_iter().fold(MiddlewarePipeline::new(), |pipeline, stage| {
        pipeline.with(middleware_fn(move |ctx, next| {
            async move {
                match stage {
                    "allow" => next.run(ctx).await,
                    "redirect" => Ok(NavigationResult::redirect("/elsewhere")),
                    "cancel" => Ok(NavigationResult::Cancel),
                    "error" => Err(anyhow::anyhow!("stage failed")),
                    "signal" => Err(NavigationCancelled.into()),
                    _ => panic!("stage panicked"),
                }
            }
            .boxed()
        }))
    });

    let result = pipeline.run(&ctx("/")).await;
    let ok = match expected {
        Expected::Allow => result.is_allow(),
        Expected::Redirect => result.is_redirect(),
        Expected::Cancel => result.is_cancel(),
        Expected::Error => result.is_error(),
    };
    assert!(ok, "expected {:?}, got {:?}", expected, result);
}

// ============================================================================
// Navigator
// ============================================================================

#[tokio::test]
async fn test_example_auth_guard_cancels_navigation() {
    init_tracing();
    let auth_calls = Arc::new(AtomicUsize::new(0));
    let log_calls = Arc::new(AtomicUsize::new(0));

    let navigator = Navigator::from_definitions(routes())
        .unwrap()
        .with_middleware(AuthGuard { calls: auth_calls.clone() })
        .with_middleware(LogGuard { calls: log_calls.clone() });

    let outcome = navigator.navigate("/users/1").await;

    assert!(outcome.is_cancelled());
    assert_eq!(log_calls.load(Ordering::SeqCst), 0);
    assert_eq!(navigator.current_url(), None);
}

#[tokio::test]
async fn test_middleware_redirect_is_followed() {
    let navigator = Navigator::from_definitions(routes())
        .unwrap()
        .with_middleware(RequireAuth { signed_in: false });

    let outcome = navigator.navigate("/account").await;
    assert_eq!(outcome.url(), Some("/login"));
    assert_eq!(
        outcome.context().and_then(|c| c.entry()).map(|e| e.view.name()),
        Some("login")
    );

    let signed_in = Navigator::from_definitions(routes())
        .unwrap()
        .with_middleware(RequireAuth { signed_in: true });
    assert_eq!(signed_in.navigate("/account").await.url(), Some("/account"));
}

#[tokio::test]
async fn test_redirect_loop_fails_and_restores() {
    let navigator = Navigator::from_definitions(routes())
        .unwrap()
        .with_middleware(guard_fn(|ctx| match ctx.uri() {
            "/login" => NavigationResult::redirect("/account"),
            "/account" => NavigationResult::redirect("/login"),
            _ => NavigationResult::Allow,
        }));

    assert!(navigator.navigate("/").await.is_render());

    match navigator.navigate("/login").await {
        NavigationOutcome::Failed { error, restored_url } => {
            assert!(matches!(
                error.downcast_ref::<NavigationError>(),
                Some(NavigationError::RedirectLoop { depth: 5, .. })
            ));
            assert_eq!(restored_url.as_deref(), Some("/"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
    assert_eq!(navigator.current_url().as_deref(), Some("/"));
}

#[tokio::test]
async fn test_alias_redirects_to_canonical_url() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();

    let navigator = Navigator::from_definitions(routes())
        .unwrap()
        .with_middleware(guard_fn(move |ctx| {
            recorder.lock().unwrap().push(ctx.uri().to_string());
            NavigationResult::Allow
        }));

    let outcome = navigator.navigate("/profile/7?tab=posts").await;

    assert_eq!(outcome.url(), Some("/users/7?tab=posts"));
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["/profile/7?tab=posts".to_string(), "/users/7?tab=posts".to_string()]
    );
}

#[tokio::test]
async fn test_error_restores_previous_url() {
    let navigator = Navigator::from_definitions(routes())
        .unwrap()
        .with_middleware(middleware_fn(|ctx, next| {
            async move {
                if ctx.uri().starts_with("/users/") {
                    anyhow::bail!("profile service unavailable");
                }
                next.run(ctx).await
            }
            .boxed()
        }));

    assert!(navigator.navigate("/fast").await.is_render());

    match navigator.navigate("/users/3").await {
        NavigationOutcome::Failed { error, restored_url } => {
            assert_eq!(error.to_string(), "profile service unavailable");
            assert_eq!(restored_url.as_deref(), Some("/fast"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_not_found_still_runs_pipeline() {
    let calls = Arc::new(AtomicUsize::new(0));
    let navigator = Navigator::from_definitions(vec![RouteDefinition::new(
        "/only",
        ViewHandle::named("only"),
    )])
    .unwrap()
    .with_middleware(LogGuard { calls: calls.clone() });

    let outcome = navigator.navigate("/missing?x=1").await;

    assert!(outcome.is_not_found());
    assert_eq!(outcome.context().unwrap().query().get("x"), Some("1"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rejected_uri_is_not_found() {
    let navigator = Navigator::from_definitions(routes()).unwrap();
    let outcome = navigator.navigate("/users/../admin").await;

    assert!(outcome.is_not_found());
    assert!(outcome.context().unwrap().is_rejected());
    assert_eq!(navigator.current_url(), None);
}

#[tokio::test]
async fn test_new_navigation_cancels_in_flight_one() {
    init_tracing();
    let entered = Arc::new(Notify::new());
    let navigator = Arc::new(
        Navigator::from_definitions(routes())
            .unwrap()
            .with_middleware(Stall { entered: entered.clone() }),
    );

    assert!(navigator.navigate("/").await.is_render());

    let slow = tokio::spawn({
        let navigator = navigator.clone();
        async move { navigator.navigate("/slow").await }
    });
    entered.notified().await;

    let fast = navigator.navigate("/fast").await;
    let slow = slow.await.unwrap();

    assert_eq!(fast.url(), Some("/fast"));
    assert!(slow.is_cancelled(), "expected Cancelled, got {:?}", slow);
    // The superseded navigation never overwrites the newer URL
    assert_eq!(navigator.current_url().as_deref(), Some("/fast"));
}

#[tokio::test]
async fn test_timeout_cancels_navigation() {
    let navigator = Navigator::from_definitions(routes())
        .unwrap()
        .with_middleware(Stall { entered: Arc::new(Notify::new()) })
        .with_timeout(Duration::from_millis(50));

    assert!(navigator.navigate("/slow").await.is_cancelled());
    assert_eq!(navigator.current_url(), None);

    assert!(navigator.navigate("/fast").await.is_render());
}

#[tokio::test]
async fn test_explicit_cancel() {
    let entered = Arc::new(Notify::new());
    let navigator = Arc::new(
        Navigator::from_definitions(routes())
            .unwrap()
            .with_middleware(Stall { entered: entered.clone() }),
    );

    let slow = tokio::spawn({
        let navigator = navigator.clone();
        async move { navigator.navigate("/slow").await }
    });
    entered.notified().await;
    navigator.cancel();

    assert!(slow.await.unwrap().is_cancelled());
}

#[tokio::test]
async fn test_config_from_toml() {
    let config: NavigatorConfig = toml::from_str(
        r#"
        [navigation]
        base_path = "/app"
        max_redirects = 1
        "#,
    )
    .unwrap();

    let navigator = Navigator::from_definitions(routes())
        .unwrap()
        .with_config(config)
        .with_middleware(guard_fn(|ctx| match ctx.uri() {
            "/app/fast" => NavigationResult::redirect("/slow"),
            "/app/slow" => NavigationResult::redirect("/login"),
            _ => NavigationResult::Allow,
        }));

    assert_eq!(navigator.navigate("/app/users/2").await.url(), Some("/app/users/2"));
    assert_eq!(navigator.navigate("/app/profile/2").await.url(), Some("/app/users/2"));
    assert!(navigator.navigate("/app/fast").await.is_failed());
}

#[tokio::test]
async fn test_guard_redirect_lands_under_base_path() {
    let config: NavigatorConfig = toml::from_str(
        r#"
        [navigation]
        base_path = "/app"
        "#,
    )
    .unwrap();

    let navigator = Navigator::from_definitions(routes())
        .unwrap()
        .with_config(config)
        .with_middleware(RequireAuth { signed_in: false });

    let outcome = navigator.navigate("/app/account").await;
    assert!(outcome.is_render(), "expected Render, got {:?}", outcome);
    assert_eq!(outcome.url(), Some("/app/login"));
    assert_eq!(navigator.current_url().as_deref(), Some("/app/login"));
}

#[rstest]
#[case("javascript://evil/users/1")]
#[case("file:///users/1")]
#[case("/users/1#/../admin")]
#[tokio::test]
async fn test_dangerous_uri_never_renders(#[case] uri: &str) {
    let navigator = Navigator::from_definitions(routes()).unwrap();
    assert!(navigator.navigate("/").await.is_render());

    let outcome = navigator.navigate(uri).await;
    assert!(outcome.is_not_found(), "expected NotFound, got {:?}", outcome);
    assert!(outcome.context().unwrap().is_rejected());
    assert_eq!(navigator.current_url().as_deref(), Some("/"));
}

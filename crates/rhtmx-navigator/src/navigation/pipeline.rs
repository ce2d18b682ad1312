/// Middleware pipeline driver
///
/// Runs the chain for one navigation and always ends in exactly one of the
/// four [`NavigationResult`] variants: errors, cancellation signals and
/// panics raised by a stage are all converted here.
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error};

use super::{NavigationContext, NavigationMiddleware, NavigationResult, Next};
use crate::error::{NavigationCancelled, NavigationError};

/// Ordered middleware list; execution order equals registration order
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    stages: Vec<Arc<dyn NavigationMiddleware>>,
}

impl MiddlewarePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage (builder pattern)
    pub fn with(mut self, middleware: impl NavigationMiddleware + 'static) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends a shared stage (builder pattern)
    pub fn with_shared(mut self, middleware: Arc<dyn NavigationMiddleware>) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Appends a stage
    pub fn add(&mut self, middleware: Arc<dyn NavigationMiddleware>) {
        self.stages.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs the whole chain for one navigation attempt
    ///
    /// Any failure observed while the token is cancelled counts as `Cancel`.
    pub async fn run(&self, ctx: &NavigationContext) -> NavigationResult {
        let chain = Next::new(&self.stages);

        let result = match AssertUnwindSafe(chain.run(ctx)).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) if is_cancellation(&err) || ctx.is_cancelled() => NavigationResult::Cancel,
            Ok(Err(err)) => NavigationResult::Error(Arc::new(err)),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Navigation middleware panicked on `{}`: {}", ctx.uri(), message);
                NavigationResult::error(NavigationError::MiddlewarePanic(message))
            }
        };

        debug!("Pipeline result for `{}`: {:?}", ctx.uri(), result);
        result
    }
}

impl std::fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|stage| stage.name()))
            .finish()
    }
}

fn is_cancellation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<NavigationCancelled>().is_some()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RouteContext;
    use crate::navigation::{guard_fn, middleware_fn};
    use futures::FutureExt;
    use tokio_util::sync::CancellationToken;

    fn ctx(uri: &str) -> NavigationContext {
        NavigationContext::new(uri, RouteContext::empty(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_empty_pipeline_allows() {
        let result = MiddlewarePipeline::new().run(&ctx("/")).await;
        assert!(result.is_allow());
    }

    #[tokio::test]
    async fn test_error_becomes_error_result() {
        let pipeline = MiddlewarePipeline::new().with(middleware_fn(|_, _| {
            async { Err::<NavigationResult, _>(anyhow::anyhow!("backend unavailable")) }.boxed()
        }));

        match pipeline.run(&ctx("/")).await {
            NavigationResult::Error(err) => assert_eq!(err.to_string(), "backend unavailable"),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancellation_signal_is_not_an_error() {
        let pipeline = MiddlewarePipeline::new().with(middleware_fn(|_, _| {
            async {
                Err::<NavigationResult, _>(
                    anyhow::Error::new(NavigationCancelled).context("while loading session"),
                )
            }
            .boxed()
        }));

        assert!(pipeline.run(&ctx("/")).await.is_cancel());
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let pipeline = MiddlewarePipeline::new().with(guard_fn(|_| panic!("guard exploded")));

        match pipeline.run(&ctx("/")).await {
            NavigationResult::Error(err) => {
                assert!(matches!(
                    err.downcast_ref::<NavigationError>(),
                    Some(NavigationError::MiddlewarePanic(message)) if message == "guard exploded"
                ));
            }
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_never_runs_stages() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = NavigationContext::new("/", RouteContext::empty(), token);

        let pipeline = MiddlewarePipeline::new().with(guard_fn(|_| panic!("must not run")));
        assert!(pipeline.run(&ctx).await.is_cancel());
    }

    #[test]
    fn test_debug_lists_stage_names() {
        let pipeline = MiddlewarePipeline::new().with(guard_fn(|_| NavigationResult::Allow));
        assert_eq!(format!("{:?}", pipeline), "[\"guard_fn\"]");
    }
}

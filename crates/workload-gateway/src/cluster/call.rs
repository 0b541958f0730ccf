use std::future::Future;
use std::time::Duration;

use error_stack::Context;
use error_stack::Report;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::types::ClusterError;
use super::types::ClusterOperation;

/// Bound applied to a single control-plane call.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Longest time to wait for the control plane
    pub timeout: Duration,
    /// Cancelled when the server shuts down
    pub cancellation: CancellationToken,
}

impl CallContext {
    pub fn new(timeout: Duration, cancellation: CancellationToken) -> Self {
        Self {
            timeout,
            cancellation,
        }
    }
}

/// Run `call` within the bounds of `ctx`.
///
/// # Errors
///
/// - [`ClusterError::Cancelled`] if `ctx` is cancelled first
/// - [`ClusterError::Timeout`] if `ctx.timeout` elapses first
/// - [`ClusterError::Operation`] if the call itself fails
pub async fn bounded<T, E, F>(
    operation: ClusterOperation,
    ctx: &CallContext,
    call: F,
) -> Result<T, Report<ClusterError>>
where
    F: Future<Output = Result<T, E>>,
    E: Context,
{
    bounded_report(operation, ctx, async move {
        call.await.map_err(|e| operation_failed(operation, e))
    })
    .await
}

/// Like [`bounded`], for work that already reports [`ClusterError`], such as
/// connecting and then calling. Its errors pass through unchanged.
///
/// # Errors
///
/// - [`ClusterError::Cancelled`] if `ctx` is cancelled first
/// - [`ClusterError::Timeout`] if `ctx.timeout` elapses first
/// - whatever `call` reports otherwise
pub async fn bounded_report<T, F>(
    operation: ClusterOperation,
    ctx: &CallContext,
    call: F,
) -> Result<T, Report<ClusterError>>
where
    F: Future<Output = Result<T, Report<ClusterError>>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancellation.cancelled() => {
            warn!(%operation, "control-plane call cancelled");
            Err(Report::new(ClusterError::Cancelled { operation }))
        }
        result = tokio::time::timeout(ctx.timeout, call) => match result {
            Ok(outcome) => outcome,
            Err(_) => {
                let timeout_ms = u64::try_from(ctx.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(%operation, timeout_ms, "control-plane call timed out");
                Err(Report::new(ClusterError::Timeout { operation, timeout_ms }))
            }
        },
    }
}

/// Wrap a failed control-plane call as [`ClusterError::Operation`].
pub fn operation_failed<E: Context>(operation: ClusterOperation, error: E) -> Report<ClusterError> {
    let message = error.to_string();
    Report::new(error).change_context(ClusterError::Operation { operation, message })
}

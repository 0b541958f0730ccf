use std::time::Duration;

use anyhow::Result;
use error_stack::Report;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;

/// How long in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Resolves once SIGTERM or SIGINT (Ctrl+C elsewhere) is received.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, initiating graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C, initiating graceful shutdown");
    }
    Ok(())
}

/// wait for the server task to complete or receive shutdown signal
pub async fn wait_for_completion(
    mut server_task: JoinHandle<Result<(), Report<ApiError>>>,
    cancellation_token: &CancellationToken,
) -> Result<()> {
    tokio::select! {
        signal = shutdown_signal() => {
            signal?;
            tracing::info!("Shutdown signal received, cancelling in-flight work");
            cancellation_token.cancel();

            match tokio::time::timeout(SHUTDOWN_GRACE, &mut server_task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(report))) => tracing::error!("API server failed during shutdown: {report:?}"),
                Ok(Err(e)) => tracing::error!("API server task failed during shutdown: {e}"),
                Err(_) => {
                    tracing::warn!("API server shutdown timed out after {:?}", SHUTDOWN_GRACE);
                    server_task.abort();
                }
            }
        }
        result = &mut server_task => {
            cancellation_token.cancel();
            match result {
                Ok(Ok(())) => tracing::warn!("API server stopped unexpectedly"),
                Ok(Err(report)) => return Err(anyhow::anyhow!("API server failed: {report:?}")),
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

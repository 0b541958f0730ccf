use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;

use crate::api::ApiServer;
use crate::app::services::ApplicationServices;
use crate::app::tasks;
use crate::config::ServeArgs;

/// Application core structure with explicit dependencies
pub struct Application {
    services: ApplicationServices,
    serve_args: ServeArgs,
    cancellation_token: CancellationToken,
}

impl Application {
    /// Build the application from command line arguments
    pub fn build(serve_args: ServeArgs) -> Result<Self> {
        let cancellation_token = CancellationToken::new();
        let services = ApplicationServices::build(&serve_args, &cancellation_token)?;
        Ok(Self {
            services,
            serve_args,
            cancellation_token,
        })
    }

    /// Get access to services
    pub fn services(&self) -> &ApplicationServices {
        &self.services
    }

    /// Try to connect to the cluster before accepting requests.
    ///
    /// A failure is only logged; the first request that needs the cluster
    /// connects again and reports the error to its caller.
    async fn warm_up(&self) {
        match self.services.cluster.session().await {
            Ok(_) => info!("Kubernetes session ready"),
            Err(report) => warn!("Kubernetes session not available yet, will retry on demand: {report:?}"),
        }
    }

    /// Serve requests until a shutdown signal arrives
    pub async fn run(&self) -> Result<()> {
        self.warm_up().await;

        let server = ApiServer::new(
            self.services.api_state(),
            self.serve_args.api_listen_addr.clone(),
        );
        let token = self.cancellation_token.clone();
        let server_task = tokio::spawn(async move { server.run(token).await });

        tasks::wait_for_completion(server_task, &self.cancellation_token).await?;

        info!("Application run completed");
        Ok(())
    }
}

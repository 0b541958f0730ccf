use std::sync::Arc;

use anyhow::Result;
use api_types::UserRecord;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::AppState;
use crate::auth::AuthProvider;
use crate::auth::StoreAuthProvider;
use crate::cluster::KubeClusterClient;
use crate::config::ServeArgs;
use crate::controller::WorkloadController;
use crate::users::InMemoryUserStore;
use crate::users::UserStore;
use crate::users::ADMIN_ROLE;

/// Application dependencies - simple struct with Arc-wrapped services
pub struct ApplicationServices {
    pub cluster: Arc<KubeClusterClient>,
    pub controller: Arc<WorkloadController>,
    pub auth: Arc<dyn AuthProvider>,
    pub users: Arc<dyn UserStore>,
}

impl ApplicationServices {
    /// Wire the services together. Nothing here talks to the cluster yet.
    pub fn build(serve_args: &ServeArgs, cancellation_token: &CancellationToken) -> Result<Self> {
        let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        seed_admin(users.as_ref(), serve_args)?;
        let auth: Arc<dyn AuthProvider> = Arc::new(StoreAuthProvider::new(users.clone()));

        let cluster = Arc::new(KubeClusterClient::new(serve_args.kubeconfig.clone()));
        let controller = Arc::new(WorkloadController::new(
            cluster.clone(),
            serve_args.pods_namespace.clone(),
            serve_args.cluster_timeout(),
            cancellation_token.clone(),
        ));

        Ok(Self {
            cluster,
            controller,
            auth,
            users,
        })
    }

    pub fn api_state(&self) -> AppState {
        AppState {
            controller: self.controller.clone(),
            auth: self.auth.clone(),
            users: self.users.clone(),
        }
    }
}

fn seed_admin(users: &dyn UserStore, serve_args: &ServeArgs) -> Result<()> {
    let Some(password) = &serve_args.admin_password else {
        info!("No administrator password configured, admin login is disabled");
        return Ok(());
    };

    users
        .create(UserRecord {
            id: String::new(),
            username: serve_args.admin_username.clone(),
            password: password.clone(),
            email: String::new(),
            role: ADMIN_ROLE,
        })
        .map_err(|report| anyhow::anyhow!("failed to seed administrator: {report:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::auth::Credentials;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        serve: ServeArgs,
    }

    fn serve_args(args: &[&str]) -> ServeArgs {
        Harness::try_parse_from(std::iter::once("test").chain(args.iter().copied()))
            .expect("should parse serve args")
            .serve
    }

    #[test]
    fn seeds_configured_administrator() {
        let args = serve_args(&["--admin-username", "root", "--admin-password", "hunter2"]);

        let services =
            ApplicationServices::build(&args, &CancellationToken::new()).expect("should build");

        assert_eq!(services.users.count().expect("should count"), 1);
        let session = services
            .auth
            .issue_session(&Credentials {
                username: "root".to_string(),
                password: "hunter2".to_string(),
            })
            .expect("seeded admin should log in");
        assert_eq!(session.user.role, ADMIN_ROLE);
    }

    #[test]
    fn no_password_means_no_administrator() {
        let args = serve_args(&[]);

        let services =
            ApplicationServices::build(&args, &CancellationToken::new()).expect("should build");

        assert_eq!(services.users.count().expect("should count"), 0);
        assert_eq!(services.controller.list_namespace(), "default");
    }
}

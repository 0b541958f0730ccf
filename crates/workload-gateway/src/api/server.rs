use std::sync::Arc;

use error_stack::Report;
use poem::delete;
use poem::get;
use poem::http::Method;
use poem::listener::TcpListener;
use poem::middleware::CookieJarManager;
use poem::middleware::Cors;
use poem::middleware::Tracing;
use poem::post;
use poem::put;
use poem::Endpoint;
use poem::EndpointExt;
use poem::Route;
use poem::Server;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;

use super::admin;
use super::errors::ApiError;
use super::system;
use super::workloads;
use crate::auth::AuthProvider;
use crate::controller::WorkloadController;
use crate::users::UserStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<WorkloadController>,
    pub auth: Arc<dyn AuthProvider>,
    pub users: Arc<dyn UserStore>,
}

/// Cross-origin policy: any origin, the usual request headers, and the
/// methods the routes use.
fn cors() -> Cors {
    Cors::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(["X-Requested-With", "Content-Type", "Authorization"])
}

/// Build the full route table.
///
/// A request with a method its path does not accept gets `405 Method Not Allowed`.
pub fn routes(state: AppState) -> impl Endpoint {
    Route::new()
        .at("/kube/pods", get(workloads::list_pods))
        .at("/kube/create-pod", post(workloads::create_workload))
        .at("/kube/update-pod", put(workloads::update_workload))
        .at("/kube/delete-pod", delete(workloads::delete_workload))
        .at("/admin/admin-login", post(admin::login))
        .at("/admin/session", get(admin::current_session))
        .at("/system/create-user", post(system::create_user))
        .at("/system/update-user", put(system::update_user))
        .at("/system/delete-user", delete(system::delete_user))
        .at("/system/query-user", get(system::query_user))
        .at("/system/list-users", get(system::list_users))
        .at("/system/sum-users", get(system::sum_users))
        .data(state.controller)
        .data(state.auth)
        .data(state.users)
        .with(CookieJarManager::new())
        .with(cors())
        .with(Tracing)
}

/// HTTP front end of the workload gateway
pub struct ApiServer {
    state: AppState,
    listen_addr: String,
}

impl ApiServer {
    pub fn new(state: AppState, listen_addr: String) -> Self {
        Self { state, listen_addr }
    }

    /// Serve until `cancellation_token` is cancelled.
    ///
    /// # Errors
    ///
    /// - [`ApiError::ServerError`] if the server fails to start or bind to the address
    pub async fn run(self, cancellation_token: CancellationToken) -> Result<(), Report<ApiError>> {
        info!("Starting HTTP API server on {}", self.listen_addr);

        let app = routes(self.state);
        let listener = TcpListener::bind(&self.listen_addr);
        let server = Server::new(listener);

        tokio::select! {
            result = server.run(app) => {
                match result {
                    Ok(()) => {
                        info!("API server stopped normally");
                        Ok(())
                    }
                    Err(e) => {
                        error!("API server failed: {e}");
                        Err(Report::new(ApiError::ServerError {
                            message: format!("Server failed: {e}"),
                        }))
                    }
                }
            }
            _ = cancellation_token.cancelled() => {
                info!("API server shutdown requested");
                Ok(())
            }
        }
    }
}

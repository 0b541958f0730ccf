//! HTTP API of the workload gateway
//!
//! # API Endpoints
//!
//! Workloads (body is a JSON string, or `{"manifest": "..."}`, carrying manifest YAML):
//!
//! - `GET /kube/pods` - List pods of the configured namespace
//! - `POST /kube/create-pod` - Create a Deployment
//! - `PUT /kube/update-pod` - Replace a Deployment
//! - `DELETE /kube/delete-pod` - Delete a Deployment
//!
//! Administration:
//!
//! - `POST /admin/admin-login` - Form login, sets the `session_id` cookie
//! - `GET /admin/session` - Username owning the session cookie
//! - `POST /system/create-user`, `PUT /system/update-user`,
//!   `DELETE /system/delete-user?id=`, `GET /system/query-user?username=`,
//!   `GET /system/list-users`, `GET /system/sum-users`
//!
//! Errors are returned as plain text with a status matching the failure.

pub mod admin;
pub mod errors;
pub mod server;
pub mod system;
pub mod workloads;

pub use errors::ApiError;
pub use server::routes;
pub use server::ApiServer;
pub use server::AppState;

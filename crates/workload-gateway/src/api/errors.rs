use core::error::Error;

use error_stack::Context;
use error_stack::Report;
use poem::http::StatusCode;

use crate::auth::AuthError;
use crate::cluster::ClusterError;
use crate::controller::WorkloadError;
use crate::users::UserStoreError;

/// API errors
#[derive(Debug, derive_more::Display)]
pub enum ApiError {
    #[display("Server error: {message}")]
    ServerError { message: String },
}

impl Error for ApiError {}

/// Status code an error is reported with.
pub trait HttpStatus {
    fn status(&self) -> StatusCode;
}

impl HttpStatus for WorkloadError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Parse(_) | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Cluster(ClusterError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Cluster(ClusterError::Cancelled { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Cluster(ClusterError::ConnectionInit { .. } | ClusterError::Operation { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl HttpStatus for UserStoreError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Duplicate { .. } => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl HttpStatus for AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Turn a report into a plain-text error response carrying the top-level message.
pub fn into_poem_error<C>(report: Report<C>) -> poem::Error
where C: Context + HttpStatus {
    let context = report.current_context();
    poem::Error::from_string(context.to_string(), context.status())
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::cluster::ClusterOperation;
    use crate::manifest::ParseError;

    #[test]
    fn workload_errors_map_to_status_codes() {
        let cases = [
            (
                WorkloadError::Parse(ParseError::Envelope {
                    message: "expected value".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                WorkloadError::Validation {
                    message: "workload name must not be empty".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                WorkloadError::Cluster(ClusterError::ConnectionInit {
                    message: "no kubeconfig".to_string(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                WorkloadError::Cluster(ClusterError::Operation {
                    operation: ClusterOperation::CreateWorkload,
                    message: "AlreadyExists".to_string(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                WorkloadError::Cluster(ClusterError::Timeout {
                    operation: ClusterOperation::ListPods,
                    timeout_ms: 30_000,
                }),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                WorkloadError::Cluster(ClusterError::Cancelled {
                    operation: ClusterOperation::DeleteWorkload,
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "status for {error}");
        }
    }

    #[test]
    fn poem_error_carries_the_top_level_message() {
        let report = Report::new(UserStoreError::NotFound {
            id: "9".to_string(),
        });

        let error = into_poem_error(report);

        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), "User not found: 9");
    }

    #[test]
    fn api_error_display_formatting() {
        let server_error = ApiError::ServerError {
            message: "address in use".to_string(),
        };
        assert_eq!(server_error.to_string(), "Server error: address in use");
    }
}

use core::error::Error;

/// Control-plane operation, used to label errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ClusterOperation {
    #[display("list pods")]
    ListPods,
    #[display("create workload")]
    CreateWorkload,
    #[display("update workload")]
    UpdateWorkload,
    #[display("delete workload")]
    DeleteWorkload,
}

/// Errors that can occur while talking to the control plane.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ClusterError {
    #[display("Failed to initialize Kubernetes client: {message}")]
    ConnectionInit { message: String },
    #[display("Failed to {operation}: {message}")]
    Operation {
        operation: ClusterOperation,
        message: String,
    },
    #[display("Timed out after {timeout_ms}ms trying to {operation}")]
    Timeout {
        operation: ClusterOperation,
        timeout_ms: u64,
    },
    #[display("Cancelled while trying to {operation}")]
    Cancelled { operation: ClusterOperation },
}

impl Error for ClusterError {}

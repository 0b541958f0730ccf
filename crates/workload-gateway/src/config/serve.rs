use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::controller::DEFAULT_NAMESPACE;

#[derive(Parser, Clone, Debug)]
pub struct ServeArgs {
    #[arg(
        long,
        env = "KUBECONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to kubeconfig file (defaults to cluster config or ~/.kube/config)"
    )]
    pub kubeconfig: Option<PathBuf>,

    #[arg(
        long,
        env = "API_LISTEN_ADDR",
        default_value = "0.0.0.0:8080",
        help = "HTTP API server listen address"
    )]
    pub api_listen_addr: String,

    #[arg(
        long,
        env = "PODS_NAMESPACE",
        default_value = DEFAULT_NAMESPACE,
        help = "Namespace whose pods are listed by GET /kube/pods"
    )]
    pub pods_namespace: String,

    #[arg(
        long,
        env = "CLUSTER_TIMEOUT_SECS",
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Upper bound in seconds for each Kubernetes API call"
    )]
    pub cluster_timeout_secs: u64,

    #[arg(
        long,
        env = "AUDIT_LOG_FILE",
        value_hint = clap::ValueHint::FilePath,
        help = "Write audit events of workload changes to a daily rolling file, e.g. /logs/audit.log"
    )]
    pub audit_log_file: Option<PathBuf>,

    #[arg(
        long,
        env = "ADMIN_USERNAME",
        default_value = "admin",
        help = "Username of the administrator account seeded at startup"
    )]
    pub admin_username: String,

    #[arg(
        long,
        env = "ADMIN_PASSWORD",
        help = "Password of the seeded administrator; no account is seeded when unset"
    )]
    pub admin_password: Option<String>,
}

impl ServeArgs {
    pub fn cluster_timeout(&self) -> Duration {
        Duration::from_secs(self.cluster_timeout_secs)
    }
}

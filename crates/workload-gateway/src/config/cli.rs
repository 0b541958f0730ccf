use clap::Parser;
use clap::Subcommand;
use utils::version;

use crate::config::check::CheckManifestArgs;
use crate::config::serve::ServeArgs;

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP gateway
    Serve(Box<ServeArgs>),
    /// Parse a manifest offline and print the Deployment it maps to
    #[command(name = "check-manifest")]
    CheckManifest(CheckManifestArgs),
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["workload-gateway", "serve"]).expect("should parse");
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };

        assert_eq!(args.pods_namespace, "default");
        assert_eq!(args.cluster_timeout_secs, 30);
        assert_eq!(args.admin_username, "admin");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = Cli::try_parse_from([
            "workload-gateway",
            "serve",
            "--cluster-timeout-secs",
            "0",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn check_manifest_requires_a_file() {
        assert!(Cli::try_parse_from(["workload-gateway", "check-manifest"]).is_err());

        let cli = Cli::try_parse_from([
            "workload-gateway",
            "check-manifest",
            "--file",
            "web.yaml",
        ])
        .expect("should parse");
        assert!(matches!(cli.command, Commands::CheckManifest(_)));
    }
}

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use utils::version;
use workload_gateway::app::Application;
use workload_gateway::config::CheckManifestArgs;
use workload_gateway::config::Cli;
use workload_gateway::config::Commands;
use workload_gateway::config::ServeArgs;
use workload_gateway::controller::effective_namespace;
use workload_gateway::logging;
use workload_gateway::manifest;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(serve_args) => run_serve(*serve_args).await,
        Commands::CheckManifest(check_args) => run_check_manifest(check_args),
    }
}

async fn run_serve(serve_args: ServeArgs) -> Result<()> {
    let _guards = logging::init(serve_args.audit_log_file.as_deref());

    tracing::info!("Starting workload gateway {}", &**version::VERSION);

    let app = Application::build(serve_args)?;
    app.run().await
}

fn run_check_manifest(check_args: CheckManifestArgs) -> Result<()> {
    utils::logging::init();

    let text = std::fs::read_to_string(&check_args.file)
        .with_context(|| format!("read manifest {}", check_args.file.display()))?;

    let manifest = manifest::parse_text(&text)
        .map_err(|report| anyhow::anyhow!("invalid manifest: {report:?}"))?;
    if manifest.name.is_empty() {
        anyhow::bail!("invalid manifest: workload name must not be empty");
    }

    let namespace = effective_namespace(
        manifest
            .namespace
            .as_deref()
            .or(check_args.namespace.as_deref()),
    );
    tracing::debug!(name = %manifest.name, namespace, "Rendering manifest");
    let deployment = manifest.to_deployment(namespace);
    print!("{}", serde_yaml::to_string(&deployment)?);
    Ok(())
}

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone, Debug)]
pub struct CheckManifestArgs {
    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        help = "Manifest YAML file to validate"
    )]
    pub file: PathBuf,

    #[arg(
        long,
        help = "Namespace to render into when the manifest does not name one"
    )]
    pub namespace: Option<String>,
}

use std::path::PathBuf;

use clap::Parser;
use infra_stacks::{synthesize, write_artifacts, ConfigLoader, SynthError};
use tracing_subscriber::EnvFilter;

/// Compose the todo app and write its deployment plan.
#[derive(Parser, Debug)]
#[command(name = "synth", version, about)]
struct Args {
    /// TOML deployment config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the project name from config and environment.
    #[arg(long)]
    project: Option<String>,

    /// Overrides the environment name from config and environment.
    #[arg(long)]
    environment: Option<String>,

    #[arg(long, default_value = "synth.out")]
    out_dir: PathBuf,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(error) = run(Args::parse()) {
        eprintln!("synth failed: {error}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), SynthError> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    let mut config = loader.load()?;
    if let Some(project) = args.project {
        config.project = project;
    }
    if let Some(environment) = args.environment {
        config.environment = environment;
    }

    let deployment = synthesize(&config)?;
    let artifacts = write_artifacts(&deployment, &args.out_dir)?;

    for (name, value) in deployment.rendered_outputs() {
        println!("{name} = {value}");
    }
    println!("fingerprint = {}", artifacts.fingerprint);
    Ok(())
}

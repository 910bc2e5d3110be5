use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const SYNTH_FILES: [&str; 2] = ["plan.json", "outputs.json"];

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the todo infrastructure workspace",
    long_about = "A unified CLI for synthesizing and packaging the deployment plan,\n\
                  running benchmarks, and CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the todo app and write plan.json and outputs.json
    Synth {
        #[command(flatten)]
        synth: SynthArgs,
    },
    /// Synthesize, then zip the plan for the deployment tool
    Package {
        #[command(flatten)]
        synth: SynthArgs,
        /// Zip file to create
        #[arg(long, default_value = "dist/plan.zip")]
        output: PathBuf,
    },
    /// Run Criterion benchmarks
    Bench,
    /// Run CI checks (fmt, clippy, tests, synth, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(clap::Args)]
struct SynthArgs {
    /// TOML deployment config
    #[arg(long)]
    config: Option<PathBuf>,
    /// Environment name, e.g. dev or prod
    #[arg(long, env = "TODO_INFRA_ENVIRONMENT")]
    environment: Option<String>,
    /// Directory receiving the synthesized files
    #[arg(long, default_value = "synth.out")]
    out_dir: PathBuf,
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Synthesize the default deployment
    Synth,
    /// Run benchmarks
    Bench,
    /// Run check + synth + bench
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn synth(args: &SynthArgs) {
    step("Synthesize deployment plan");
    let out_dir = args.out_dir.display().to_string();
    let mut cargo_args = vec!["run", "-p", "infra_stacks", "--bin", "synth", "--"];
    cargo_args.extend(["--out-dir", out_dir.as_str()]);

    let config = args.config.as_ref().map(|path| path.display().to_string());
    if let Some(config) = &config {
        cargo_args.extend(["--config", config.as_str()]);
    }
    if let Some(environment) = &args.environment {
        cargo_args.extend(["--environment", environment.as_str()]);
    }
    run_cargo(&cargo_args);
}

fn package_plan(out_dir: &Path, zip_path: &Path) {
    step("Package deployment plan");
    if let Some(parent) = zip_path.parent() {
        fs::create_dir_all(parent).expect("failed to create package directory");
    }

    let file = fs::File::create(zip_path).expect("failed to create plan zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    for name in SYNTH_FILES {
        let path = out_dir.join(name);
        if !path.exists() {
            panic!("expected synthesized file at '{}'", path.display());
        }
        let content = fs::read(&path).expect("failed to read synthesized file");
        zip.start_file(name, options)
            .expect("failed to start entry in plan zip");
        zip.write_all(&content)
            .expect("failed to write entry in plan zip");
    }
    zip.finish().expect("failed to finish plan zip");

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test infra_core");
    run_cargo(&["test", "-p", "infra_core"]);

    step("Test infra_stacks");
    run_cargo(&["test", "-p", "infra_stacks"]);
}

fn ci_synth() {
    synth(&SynthArgs {
        config: None,
        environment: None,
        out_dir: PathBuf::from("target/ci-synth"),
    });
}

fn ci_bench() {
    step("Run benchmarks");
    run_cargo(&["bench", "-p", "infra_core", "--bench", "composition"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Synth { synth: args } => synth(&args),
        Commands::Package {
            synth: args,
            output,
        } => {
            synth(&args);
            package_plan(&args.out_dir, &output);
        }
        Commands::Bench => ci_bench(),
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Synth => ci_synth(),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    ci_synth();
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}

//! Files handed to the deployment tool.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use infra_core::{CompositionError, Deployment};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::ConfigError;

pub const PLAN_FILE: &str = "plan.json";
pub const OUTPUTS_FILE: &str = "outputs.json";

#[derive(Debug, Error)]
pub enum SynthError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error("failed to serialize synthesis output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub plan: PathBuf,
    pub outputs: PathBuf,
    pub fingerprint: String,
}

#[derive(Serialize)]
struct OutputsFile<'a> {
    fingerprint: &'a str,
    outputs: BTreeMap<String, String>,
}

/// Writes `plan.json` and `outputs.json` into `out_dir`, creating it if needed.
pub fn write_artifacts(deployment: &Deployment, out_dir: &Path) -> Result<Artifacts, SynthError> {
    std::fs::create_dir_all(out_dir).map_err(|source| SynthError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let plan = deployment.plan();
    let fingerprint = plan.fingerprint()?;

    let plan_path = out_dir.join(PLAN_FILE);
    write_file(&plan_path, &plan.to_json_pretty()?)?;

    let outputs_path = out_dir.join(OUTPUTS_FILE);
    let outputs = OutputsFile {
        fingerprint: &fingerprint,
        outputs: deployment.rendered_outputs(),
    };
    write_file(&outputs_path, &serde_json::to_string_pretty(&outputs)?)?;

    info!(
        plan = %plan_path.display(),
        outputs = %outputs_path.display(),
        %fingerprint,
        "wrote synthesis artifacts"
    );
    Ok(Artifacts {
        plan: plan_path,
        outputs: outputs_path,
        fingerprint,
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), SynthError> {
    std::fs::write(path, content).map_err(|source| SynthError::Write {
        path: path.to_path_buf(),
        source,
    })
}

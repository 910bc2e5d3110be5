//! Deployment configuration with layered loading.
//!
//! Layers, each overriding the previous:
//!
//! 1. Compiled defaults
//! 2. Optional TOML file
//! 3. Environment variables (`TODO_INFRA_PROJECT`, `TODO_INFRA_ENVIRONMENT`)
//!
//! Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use infra_core::{CompositionError, NamingContext};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const PROJECT_ENV_VAR: &str = "TODO_INFRA_PROJECT";
pub const ENVIRONMENT_ENV_VAR: &str = "TODO_INFRA_ENVIRONMENT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },
}

/// Key-value table settings for the storage stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub name: String,
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub target_utilization_percent: u32,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            name: "Todos".to_string(),
            min_capacity: 1,
            max_capacity: 50,
            target_utilization_percent: 70,
        }
    }
}

/// The post-confirmation function that creates a user's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionSettings {
    pub code_asset: String,
    pub handler: String,
    pub runtime: String,
    pub timeout_secs: u32,
}

impl Default for FunctionSettings {
    fn default() -> Self {
        Self {
            code_asset: "./assets/lambda/createuser".to_string(),
            handler: "src/index.handler".to_string(),
            runtime: "nodejs10.x".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub project: String,
    pub environment: String,
    pub table: TableSettings,
    pub create_user: FunctionSettings,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            project: "todo".to_string(),
            environment: "dev".to_string(),
            table: TableSettings::default(),
            create_user: FunctionSettings::default(),
        }
    }
}

impl DeploymentConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn naming(&self) -> Result<NamingContext, CompositionError> {
        NamingContext::new(&self.project, &self.environment)
    }
}

/// Builds a [`DeploymentConfig`] from defaults, a file and the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unlike the environment layer, a file named here must exist.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    pub fn load(&self) -> Result<DeploymentConfig, ConfigError> {
        let mut config = match &self.file {
            Some(path) => {
                let config = load_file(path)?;
                debug!(path = %path.display(), "loaded config file");
                config
            }
            None => DeploymentConfig::default(),
        };

        if !self.skip_env {
            apply_env(&mut config, |name| std::env::var(name).ok())?;
        }
        Ok(config)
    }
}

fn load_file(path: &Path) -> Result<DeploymentConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    DeploymentConfig::from_toml(&content).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env(
    config: &mut DeploymentConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    for (name, field) in [
        (PROJECT_ENV_VAR, &mut config.project),
        (ENVIRONMENT_ENV_VAR, &mut config.environment),
    ] {
        let Some(value) = lookup(name) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::InvalidEnvVar {
                name: name.to_string(),
                message: "expected a non-empty value".to_string(),
            });
        }
        debug!(variable = name, value, "config overridden from environment");
        *field = value.to_string();
    }
    Ok(())
}

//! The todo application's infrastructure: a storage stack and an identity
//! stack composed with `infra_core`.

pub mod app;
pub mod artifacts;
pub mod config;
pub mod identity;
pub mod storage;

pub use app::{synthesize, todo_app};
pub use artifacts::{write_artifacts, Artifacts, SynthError};
pub use config::{ConfigError, ConfigLoader, DeploymentConfig};

#![allow(dead_code)]

use infra_core::Deployment;
use infra_stacks::{synthesize, ConfigLoader, DeploymentConfig};

pub fn default_config() -> DeploymentConfig {
    ConfigLoader::new()
        .skip_env_vars()
        .load()
        .expect("default config")
}

pub fn todo_deployment() -> Deployment {
    synthesize(&default_config()).expect("todo app composes")
}

//! Wires the storage and identity stacks into one deployment.

use infra_core::{CompositionRoot, Deployment, Result, StackSpec};
use tracing::info;

use crate::config::DeploymentConfig;
use crate::identity::{IdentityStack, IDENTITY_STACK, TABLE_INPUT};
use crate::storage::{StorageStack, STORAGE_STACK, TABLE_HANDLE_EXPORT};

pub fn todo_app(config: &DeploymentConfig) -> Result<CompositionRoot> {
    let naming = config.naming()?;
    let storage = StorageStack::new(config.table.clone());
    let identity = IdentityStack::new(config.create_user.clone());
    Ok(CompositionRoot::new(naming)
        .stack(StackSpec::new(STORAGE_STACK, storage))
        .stack(
            StackSpec::new(IDENTITY_STACK, identity)
                .input(TABLE_INPUT, STORAGE_STACK, TABLE_HANDLE_EXPORT),
        ))
}

pub fn synthesize(config: &DeploymentConfig) -> Result<Deployment> {
    info!(
        project = %config.project,
        environment = %config.environment,
        "synthesizing todo app"
    );
    todo_app(config)?.compose()
}

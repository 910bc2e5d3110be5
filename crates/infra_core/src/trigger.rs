//! Lifecycle triggers: a resource event invoking an executable.
//!
//! Binding a trigger never grants the executable any permission. Access is
//! wired separately through [`crate::access`].

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CompositionError, Result};
use crate::lifecycle::LifecycleEvent;
use crate::resource::{ExecutableHandle, ResourceAddress, ResourceDeclaration};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TriggerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TriggerConfig {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerBinding {
    pub resource: ResourceAddress,
    pub event: LifecycleEvent,
    pub executable: ExecutableHandle,
    pub config: TriggerConfig,
}

/// One trigger per (resource, event); a second binding replaces the first.
#[derive(Debug, Clone, Default)]
pub struct TriggerBindings {
    bindings: BTreeMap<(ResourceAddress, LifecycleEvent), TriggerBinding>,
}

impl TriggerBindings {
    /// Records the binding and returns the one it replaced, if any.
    pub fn bind(
        &mut self,
        resource: &ResourceDeclaration,
        event: LifecycleEvent,
        executable: &ExecutableHandle,
        config: TriggerConfig,
    ) -> Result<Option<TriggerBinding>> {
        if !event.is_recognized_for(resource.kind()) {
            return Err(CompositionError::configuration(format!(
                "lifecycle event '{event}' is not recognized for {} '{}'",
                resource.kind(),
                resource.address()
            )));
        }

        let binding = TriggerBinding {
            resource: resource.address().clone(),
            event,
            executable: executable.clone(),
            config,
        };
        debug!(
            resource = %binding.resource,
            %event,
            executable = %executable.identity(),
            "bound lifecycle trigger"
        );

        let previous = self
            .bindings
            .insert((binding.resource.clone(), event), binding);
        if let Some(previous) = &previous {
            warn!(
                resource = %previous.resource,
                %event,
                replaced = %previous.executable.identity(),
                "lifecycle trigger replaced an earlier binding"
            );
        }
        Ok(previous)
    }

    pub fn get(
        &self,
        resource: &ResourceAddress,
        event: LifecycleEvent,
    ) -> Option<&TriggerBinding> {
        self.bindings.get(&(resource.clone(), event))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TriggerBinding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{
        AttributeType, Executable, KeyAttribute, ResourceAttributes, ResourceId, TableAttributes,
        UserDirectoryAttributes,
    };

    fn declare(id: &str, attributes: ResourceAttributes) -> ResourceDeclaration {
        let address = ResourceAddress::new("Identity", ResourceId::new(id).expect("id"));
        ResourceDeclaration::new(address, attributes).expect("declaration should pass")
    }

    fn executable(id: &str) -> ExecutableHandle {
        let declaration = declare(
            id,
            Executable::new("./assets/fn", "index.handler", "nodejs10.x").into(),
        );
        ExecutableHandle::new(declaration.handle()).expect("function")
    }

    #[test]
    fn second_binding_replaces_the_first() {
        let mut triggers = TriggerBindings::default();
        let directory = declare("Users", UserDirectoryAttributes::default().into());

        let first = triggers
            .bind(
                &directory,
                LifecycleEvent::PostConfirmation,
                &executable("CreateUser"),
                TriggerConfig::default(),
            )
            .expect("first binding");
        assert!(first.is_none());

        let replaced = triggers
            .bind(
                &directory,
                LifecycleEvent::PostConfirmation,
                &executable("CreateUserV2"),
                TriggerConfig::described("v2"),
            )
            .expect("second binding")
            .expect("first binding is returned");
        assert_eq!(
            replaced.executable.identity(),
            executable("CreateUser").identity()
        );

        let current = triggers
            .get(directory.address(), LifecycleEvent::PostConfirmation)
            .expect("binding recorded");
        assert_eq!(
            current.executable.identity(),
            executable("CreateUserV2").identity()
        );
        assert_eq!(current.config, TriggerConfig::described("v2"));
        assert_eq!(triggers.len(), 1);
    }

    #[test]
    fn distinct_events_do_not_replace_each_other() {
        let mut triggers = TriggerBindings::default();
        let directory = declare("Users", UserDirectoryAttributes::default().into());
        for event in [LifecycleEvent::PreSignUp, LifecycleEvent::PostConfirmation] {
            triggers
                .bind(
                    &directory,
                    event,
                    &executable("Hook"),
                    TriggerConfig::default(),
                )
                .expect("binding");
        }
        assert_eq!(triggers.len(), 2);
    }

    #[test]
    fn rejects_events_the_kind_does_not_emit() {
        let mut triggers = TriggerBindings::default();
        let table = declare(
            "Todos",
            TableAttributes::new()
                .with_partition_key(KeyAttribute::new("PK", AttributeType::String))
                .into(),
        );
        let error = triggers
            .bind(
                &table,
                LifecycleEvent::PostConfirmation,
                &executable("CreateUser"),
                TriggerConfig::default(),
            )
            .expect_err("tables have no confirmation event");
        assert_eq!(
            error,
            CompositionError::configuration(
                "lifecycle event 'post-confirmation' is not recognized for Table 'Identity/Todos'"
            )
        );
        assert!(triggers.is_empty());
    }
}

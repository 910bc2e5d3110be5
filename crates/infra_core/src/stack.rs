//! Stacks: independently deployable units of resources and policy bindings.
//!
//! A stack is built through a [`StackScope`] (the `Constructing` state) and
//! frozen into a [`Stack`] (the `Constructed` state). `Stack` exposes no
//! mutating methods, so resources and exports cannot change after
//! construction.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::access::{AccessGrants, Effect, PermissionSet};
use crate::error::{CompositionError, Result};
use crate::lifecycle::LifecycleEvent;
use crate::naming::NamingContext;
use crate::reference::{CrossStackReference, ExportValue};
use crate::resource::{
    Executable, ExecutableHandle, ExecutableIdentity, ResourceAddress, ResourceAttributes,
    ResourceDeclaration, ResourceHandle, ResourceId,
};
use crate::scaling::{CapacityDimension, ScalingPolicies, ScalingPolicy};
use crate::token::Token;
use crate::trigger::{TriggerBinding, TriggerBindings, TriggerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StackState {
    Unconstructed,
    Constructing,
    Constructed,
}

/// Named value surfaced to operators after composition.
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    pub stack: String,
    pub value: Token,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Builds one stack. Must be deterministic and must not perform I/O.
pub trait StackConstructor {
    fn construct(&self, scope: &mut StackScope<'_>) -> Result<()>;
}

impl<F> StackConstructor for F
where
    F: Fn(&mut StackScope<'_>) -> Result<()>,
{
    fn construct(&self, scope: &mut StackScope<'_>) -> Result<()> {
        self(scope)
    }
}

/// A stack under construction.
#[derive(Debug)]
pub struct StackScope<'a> {
    name: String,
    naming: &'a NamingContext,
    inputs: BTreeMap<String, CrossStackReference>,
    resources: BTreeMap<ResourceId, ResourceDeclaration>,
    scaling: ScalingPolicies,
    access: AccessGrants,
    triggers: TriggerBindings,
    exports: BTreeMap<String, ExportValue>,
    outputs: BTreeMap<String, Output>,
}

impl<'a> StackScope<'a> {
    pub(crate) fn new(
        name: &str,
        naming: &'a NamingContext,
        inputs: BTreeMap<String, CrossStackReference>,
    ) -> Self {
        Self {
            name: name.to_string(),
            naming,
            inputs,
            resources: BTreeMap::new(),
            scaling: ScalingPolicies::default(),
            access: AccessGrants::default(),
            triggers: TriggerBindings::default(),
            exports: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn naming(&self) -> &NamingContext {
        self.naming
    }

    pub fn input(&self, name: &str) -> Result<&CrossStackReference> {
        self.inputs.get(name).ok_or_else(|| {
            CompositionError::configuration(format!(
                "stack '{}' reads input '{name}', which was not supplied",
                self.name
            ))
        })
    }

    /// Shorthand for an input that carries a resource handle.
    pub fn input_handle(&self, name: &str) -> Result<ResourceHandle> {
        self.input(name)?.handle().cloned()
    }

    /// Declares a resource. Re-declaring the same id with identical
    /// attributes returns the existing handle; different attributes conflict.
    pub fn declare(
        &mut self,
        id: &str,
        attributes: impl Into<ResourceAttributes>,
    ) -> Result<ResourceHandle> {
        let id = ResourceId::new(id)?;
        let address = ResourceAddress::new(self.name.clone(), id.clone());
        let declaration = ResourceDeclaration::new(address, attributes.into())?;

        if let Some(existing) = self.resources.get(&id) {
            if existing.has_same_attributes(&declaration) {
                debug!(resource = %existing.address(), "identical re-declaration ignored");
                return Ok(existing.handle());
            }
            return Err(CompositionError::conflict(format!(
                "resource '{}' is already declared with different attributes",
                existing.address()
            )));
        }

        debug!(
            resource = %declaration.address(),
            kind = %declaration.kind(),
            "declared resource"
        );
        let handle = declaration.handle();
        self.resources.insert(id, declaration);
        Ok(handle)
    }

    pub fn declare_executable(
        &mut self,
        id: &str,
        executable: Executable,
    ) -> Result<ExecutableHandle> {
        let handle = self.declare(id, executable)?;
        ExecutableHandle::new(handle)
    }

    pub fn bind_scaling(
        &mut self,
        resource: &ResourceHandle,
        dimension: CapacityDimension,
        min_capacity: u32,
        max_capacity: u32,
        target_utilization_percent: u32,
    ) -> Result<Option<ScalingPolicy>> {
        let declaration = owned(&self.name, &self.resources, resource)?;
        self.scaling.bind(
            declaration,
            dimension,
            min_capacity,
            max_capacity,
            target_utilization_percent,
        )
    }

    /// Grants `actions` on `resource` to the executable's identity under the
    /// named policy. The resource may belong to another stack if it arrived
    /// through one of this stack's inputs.
    pub fn bind_access<I, S>(
        &mut self,
        policy_name: &str,
        grantee: &ExecutableHandle,
        resource: &ResourceHandle,
        actions: I,
        effect: Effect,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        owned(&self.name, &self.resources, grantee.resource())?;
        self.ensure_reachable(resource)?;
        self.access
            .bind(policy_name, grantee.identity(), resource, actions, effect)?;
        Ok(())
    }

    pub fn bind_trigger(
        &mut self,
        resource: &ResourceHandle,
        event: LifecycleEvent,
        executable: &ExecutableHandle,
        config: TriggerConfig,
    ) -> Result<Option<TriggerBinding>> {
        self.ensure_reachable(executable.resource())?;
        let declaration = owned(&self.name, &self.resources, resource)?;
        self.triggers.bind(declaration, event, executable, config)
    }

    pub fn export_handle(&mut self, name: &str, resource: &ResourceHandle) -> Result<()> {
        owned(&self.name, &self.resources, resource)?;
        self.insert_export(
            name,
            ExportValue::Handle {
                handle: resource.clone(),
            },
        )
    }

    pub fn export_name(&mut self, name: &str, resource: &ResourceHandle) -> Result<()> {
        owned(&self.name, &self.resources, resource)?;
        self.insert_export(
            name,
            ExportValue::Value {
                source: resource.address().clone(),
                token: resource.name(),
            },
        )
    }

    pub fn export_attribute(
        &mut self,
        name: &str,
        resource: &ResourceHandle,
        attribute: &str,
    ) -> Result<()> {
        owned(&self.name, &self.resources, resource)?;
        self.insert_export(
            name,
            ExportValue::Value {
                source: resource.address().clone(),
                token: resource.attribute(attribute),
            },
        )
    }

    pub fn output(&mut self, name: &str, value: Token, description: Option<&str>) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CompositionError::configuration(
                "output name cannot be empty",
            ));
        }
        if self.outputs.contains_key(name) {
            return Err(CompositionError::conflict(format!(
                "stack '{}' declares output '{name}' twice",
                self.name
            )));
        }
        self.outputs.insert(
            name.to_string(),
            Output {
                stack: self.name.clone(),
                value,
                description: description.map(str::to_string),
            },
        );
        Ok(())
    }

    pub(crate) fn finish(self) -> Stack {
        Stack {
            name: self.name,
            inputs: self.inputs,
            resources: self.resources,
            scaling: self.scaling,
            access: self.access,
            triggers: self.triggers,
            exports: self.exports,
            outputs: self.outputs,
        }
    }

    fn insert_export(&mut self, name: &str, value: ExportValue) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CompositionError::configuration(
                "export name cannot be empty",
            ));
        }
        if self.exports.contains_key(name) {
            return Err(CompositionError::conflict(format!(
                "stack '{}' exports '{name}' twice",
                self.name
            )));
        }
        debug!(stack = %self.name, export = name, source = %value.source(), "exported value");
        self.exports.insert(name.to_string(), value);
        Ok(())
    }

    /// Own resources, or foreign ones handed in through an input.
    fn ensure_reachable(&self, resource: &ResourceHandle) -> Result<()> {
        if resource.address().stack() == self.name {
            return owned(&self.name, &self.resources, resource).map(|_| ());
        }
        let via_input = self
            .inputs
            .values()
            .any(|input| input.value().source() == resource.address());
        if via_input {
            return Ok(());
        }
        Err(CompositionError::configuration(format!(
            "stack '{}' refers to '{}' without receiving it as an input",
            self.name,
            resource.address()
        )))
    }
}

fn owned<'r>(
    stack: &str,
    resources: &'r BTreeMap<ResourceId, ResourceDeclaration>,
    resource: &ResourceHandle,
) -> Result<&'r ResourceDeclaration> {
    let address = resource.address();
    let declaration = (address.stack() == stack)
        .then(|| resources.get(address.id()))
        .flatten();
    match declaration {
        Some(declaration) if declaration.kind() == resource.kind() => Ok(declaration),
        _ => Err(CompositionError::configuration(format!(
            "stack '{stack}' does not own resource '{address}'"
        ))),
    }
}

/// A constructed, frozen stack.
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    inputs: BTreeMap<String, CrossStackReference>,
    resources: BTreeMap<ResourceId, ResourceDeclaration>,
    scaling: ScalingPolicies,
    access: AccessGrants,
    triggers: TriggerBindings,
    exports: BTreeMap<String, ExportValue>,
    outputs: BTreeMap<String, Output>,
}

impl Stack {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Always [`StackState::Constructed`]: a `Stack` only comes out of a
    /// finished [`StackScope`], so the type itself witnesses the state. The
    /// earlier states exist only inside [`CompositionRoot::compose`].
    ///
    /// [`CompositionRoot::compose`]: crate::composition::CompositionRoot::compose
    pub fn state(&self) -> StackState {
        StackState::Constructed
    }

    pub fn inputs(&self) -> &BTreeMap<String, CrossStackReference> {
        &self.inputs
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceDeclaration> {
        self.resources.values()
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceDeclaration> {
        let id = ResourceId::new(id).ok()?;
        self.resources.get(&id)
    }

    pub fn scaling_policies(&self) -> &ScalingPolicies {
        &self.scaling
    }

    pub fn access_grants(&self) -> &AccessGrants {
        &self.access
    }

    pub fn permissions_for(&self, grantee: &ExecutableIdentity) -> PermissionSet<'_> {
        self.access.permissions_for(grantee)
    }

    pub fn triggers(&self) -> &TriggerBindings {
        &self.triggers
    }

    pub fn exports(&self) -> &BTreeMap<String, ExportValue> {
        &self.exports
    }

    pub fn export(&self, name: &str) -> Option<&ExportValue> {
        self.exports.get(name)
    }

    pub fn outputs(&self) -> &BTreeMap<String, Output> {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::resource::{AttributeType, KeyAttribute, TableAttributes, UserDirectoryAttributes};

    fn naming() -> NamingContext {
        NamingContext::new("todo", "dev").expect("naming")
    }

    fn todos() -> TableAttributes {
        TableAttributes::new()
            .with_name("Todos")
            .with_partition_key(KeyAttribute::new("PK", AttributeType::String))
            .with_sort_key(KeyAttribute::new("SK", AttributeType::String))
    }

    #[test]
    fn identical_redeclaration_is_a_no_op() {
        let naming = naming();
        let mut scope = StackScope::new("Storage", &naming, BTreeMap::new());
        scope.declare("Todos", todos()).expect("first declaration");
        scope
            .declare("Todos", todos())
            .expect("identical declaration");
        let stack = scope.finish();
        assert_eq!(stack.resources().count(), 1);
    }

    #[test]
    fn conflicting_redeclaration_fails() {
        let naming = naming();
        let mut scope = StackScope::new("Storage", &naming, BTreeMap::new());
        scope.declare("Todos", todos()).expect("first declaration");
        let error = scope
            .declare("Todos", todos().with_name("Todos2"))
            .expect_err("different attributes conflict");
        assert_eq!(error.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn reading_a_missing_input_is_a_configuration_error() {
        let naming = naming();
        let scope = StackScope::new("Identity", &naming, BTreeMap::new());
        let error = scope.input("table").expect_err("input was not supplied");
        assert_eq!(
            error,
            CompositionError::configuration(
                "stack 'Identity' reads input 'table', which was not supplied"
            )
        );
    }

    #[test]
    fn cannot_export_foreign_resources() {
        let naming = naming();
        let mut storage = StackScope::new("Storage", &naming, BTreeMap::new());
        let table = storage.declare("Todos", todos()).expect("declaration");

        let mut other = StackScope::new("Other", &naming, BTreeMap::new());
        let error = other
            .export_handle("tableHandle", &table)
            .expect_err("foreign export should fail");
        assert_eq!(
            error,
            CompositionError::configuration("stack 'Other' does not own resource 'Storage/Todos'")
        );
    }

    #[test]
    fn duplicate_exports_and_outputs_conflict() {
        let naming = naming();
        let mut scope = StackScope::new("Storage", &naming, BTreeMap::new());
        let table = scope.declare("Todos", todos()).expect("declaration");
        scope.export_handle("tableHandle", &table).expect("export");
        assert_eq!(
            scope
                .export_name("tableHandle", &table)
                .expect_err("duplicate export")
                .category(),
            ErrorCategory::Conflict
        );
        scope
            .output("tablename", table.name(), None)
            .expect("output");
        assert_eq!(
            scope
                .output("tablename", table.name(), None)
                .expect_err("duplicate output")
                .category(),
            ErrorCategory::Conflict
        );
    }

    #[test]
    fn scaling_requires_an_owned_resource() {
        let naming = naming();
        let mut storage = StackScope::new("Storage", &naming, BTreeMap::new());
        let table = storage.declare("Todos", todos()).expect("declaration");

        let mut other = StackScope::new("Other", &naming, BTreeMap::new());
        let error = other
            .bind_scaling(&table, CapacityDimension::Read, 1, 50, 70)
            .expect_err("foreign table cannot be scaled here");
        assert_eq!(error.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn access_to_foreign_resources_requires_an_input() {
        let naming = naming();
        let mut storage = StackScope::new("Storage", &naming, BTreeMap::new());
        let table = storage.declare("Todos", todos()).expect("declaration");

        let mut identity = StackScope::new("Identity", &naming, BTreeMap::new());
        let function = identity
            .declare_executable(
                "CreateUser",
                Executable::new("./assets/fn", "index.handler", "nodejs10.x"),
            )
            .expect("function");
        let error = identity
            .bind_access("P", &function, &table, ["write"], Effect::Allow)
            .expect_err("table was not passed in");
        assert_eq!(
            error,
            CompositionError::configuration(
                "stack 'Identity' refers to 'Storage/Todos' without receiving it as an input"
            )
        );
    }

    #[test]
    fn triggers_bind_to_owned_directories() {
        let naming = naming();
        let mut scope = StackScope::new("Identity", &naming, BTreeMap::new());
        let directory = scope
            .declare("Users", UserDirectoryAttributes::default())
            .expect("directory");
        let function = scope
            .declare_executable(
                "CreateUser",
                Executable::new("./assets/fn", "index.handler", "nodejs10.x"),
            )
            .expect("function");
        scope
            .bind_trigger(
                &directory,
                LifecycleEvent::PostConfirmation,
                &function,
                TriggerConfig::default(),
            )
            .expect("trigger");

        let stack = scope.finish();
        assert_eq!(stack.triggers().len(), 1);
        assert!(stack.permissions_for(&function.identity()).is_empty());
        assert_eq!(stack.state(), StackState::Constructed);
    }
}

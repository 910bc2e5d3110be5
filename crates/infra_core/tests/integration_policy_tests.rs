mod support;

use std::collections::BTreeSet;

use infra_core::access::Effect;
use infra_core::lifecycle::LifecycleEvent;
use infra_core::resource::{CapacityMode, UserDirectoryAttributes};
use infra_core::scaling::CapacityDimension;
use infra_core::trigger::TriggerConfig;
use infra_core::{CompositionError, CompositionRoot, ErrorCategory, StackSpec};
use support::{function, naming, storage_stack, todos_table};

#[test]
fn grants_accumulate_across_bindings() {
    let deployment = CompositionRoot::new(naming())
        .stack(storage_stack("Storage"))
        .stack(
            StackSpec::from_fn("Api", |scope| {
                let table = scope.input_handle("table")?;
                let function = scope.declare_executable("Handler", function())?;
                scope.bind_access("Writes", &function, &table, ["write"], Effect::Allow)?;
                scope.bind_access("Reads", &function, &table, ["read", "query"], Effect::Allow)?;
                scope.bind_access("Writes", &function, &table, ["write"], Effect::Allow)
            })
            .input("table", "Storage", "tableHandle"),
        )
        .compose()
        .expect("composition should pass");

    let api = deployment.stack("Api").expect("api stack");
    let handler = api.resource("Handler").expect("handler").handle();
    let grantee = api
        .access_grants()
        .iter()
        .next()
        .expect("grant")
        .grantee()
        .clone();
    assert_eq!(grantee.address(), handler.address());

    let permissions = api.permissions_for(&grantee);
    assert_eq!(permissions.len(), 3);
    assert_eq!(
        permissions.actions(),
        BTreeSet::from(["query", "read", "write"])
    );
}

#[test]
fn scaling_rebinding_keeps_the_last_policy() {
    let deployment = CompositionRoot::new(naming())
        .stack(StackSpec::from_fn("Storage", |scope| {
            let table = scope.declare("Todos", todos_table())?;
            scope.bind_scaling(&table, CapacityDimension::Read, 1, 10, 50)?;
            scope.bind_scaling(&table, CapacityDimension::Read, 1, 50, 70)?;
            scope.bind_scaling(&table, CapacityDimension::Write, 1, 50, 70)?;
            Ok(())
        }))
        .compose()
        .expect("composition should pass");

    let storage = deployment.stack("Storage").expect("storage");
    let address = storage.resource("Todos").expect("table").address().clone();
    let read = storage
        .scaling_policies()
        .get(&address, CapacityDimension::Read)
        .expect("read policy");
    assert_eq!((read.min_capacity, read.max_capacity), (1, 50));
    assert_eq!(read.target_utilization_percent, 70);
    assert_eq!(storage.scaling_policies().len(), 2);
}

#[test]
fn scaling_a_directory_is_unsupported() {
    let error = CompositionRoot::new(naming())
        .stack(StackSpec::from_fn("Identity", |scope| {
            let directory = scope.declare("Users", UserDirectoryAttributes::default())?;
            scope.bind_scaling(&directory, CapacityDimension::Read, 1, 5, 70)?;
            Ok(())
        }))
        .compose()
        .expect_err("directories have no capacity");
    assert_eq!(error.category(), ErrorCategory::UnsupportedOperation);
}

#[test]
fn on_demand_tables_cannot_be_autoscaled() {
    let error = CompositionRoot::new(naming())
        .stack(StackSpec::from_fn("Storage", |scope| {
            let table = scope.declare(
                "Todos",
                todos_table().with_capacity_mode(CapacityMode::OnDemand),
            )?;
            scope.bind_scaling(&table, CapacityDimension::Write, 1, 5, 70)?;
            Ok(())
        }))
        .compose()
        .expect_err("on-demand table");
    assert_eq!(error.category(), ErrorCategory::UnsupportedOperation);
}

#[test]
fn trigger_does_not_imply_access() {
    let deployment = CompositionRoot::new(naming())
        .stack(StackSpec::from_fn("Identity", |scope| {
            let directory = scope.declare("Users", UserDirectoryAttributes::default())?;
            let function = scope.declare_executable("CreateUser", function())?;
            scope.bind_trigger(
                &directory,
                LifecycleEvent::PostConfirmation,
                &function,
                TriggerConfig::described("create the user's record"),
            )?;
            Ok(())
        }))
        .compose()
        .expect("composition should pass");

    let identity = deployment.stack("Identity").expect("identity");
    let binding = identity.triggers().iter().next().expect("trigger");
    assert_eq!(binding.event, LifecycleEvent::PostConfirmation);
    assert!(identity
        .permissions_for(&binding.executable.identity())
        .is_empty());
}

#[test]
fn triggers_on_foreign_resources_are_rejected() {
    let error = CompositionRoot::new(naming())
        .stack(storage_stack("Storage"))
        .stack(
            StackSpec::from_fn("Identity", |scope| {
                let table = scope.input_handle("table")?;
                let function = scope.declare_executable("CreateUser", function())?;
                scope.bind_trigger(
                    &table,
                    LifecycleEvent::PostConfirmation,
                    &function,
                    TriggerConfig::default(),
                )?;
                Ok(())
            })
            .input("table", "Storage", "tableHandle"),
        )
        .compose()
        .expect_err("table belongs to Storage");
    assert_eq!(
        error,
        CompositionError::configuration("stack 'Identity' does not own resource 'Storage/Todos'")
    );
}

#![allow(dead_code)]

use infra_core::resource::{
    AttributeType, Executable, KeyAttribute, TableAttributes, UserDirectoryAttributes,
};
use infra_core::{NamingContext, StackSpec};

pub fn naming() -> NamingContext {
    NamingContext::new("todo", "dev").expect("naming context")
}

pub fn todos_table() -> TableAttributes {
    TableAttributes::new()
        .with_name("Todos")
        .with_partition_key(KeyAttribute::new("PK", AttributeType::String))
        .with_sort_key(KeyAttribute::new("SK", AttributeType::String))
}

pub fn function() -> Executable {
    Executable::new("./assets/create-user", "index.handler", "nodejs10.x")
}

/// Declares the table and exports it as `tableHandle` and `tableName`.
pub fn storage_stack(name: &str) -> StackSpec {
    StackSpec::from_fn(name, |scope| {
        let table = scope.declare("Todos", todos_table())?;
        scope.export_handle("tableHandle", &table)?;
        scope.export_name("tableName", &table)
    })
}

/// Consumes `tableHandle` of `source` and grants a function `actions` on it.
pub fn consumer_stack(name: &str, source: &str, actions: &'static [&'static str]) -> StackSpec {
    StackSpec::from_fn(name, move |scope| {
        let table = scope.input_handle("table")?;
        let directory = scope.declare("Users", UserDirectoryAttributes::default())?;
        let function = scope.declare_executable("CreateUser", function())?;
        scope.bind_access(
            "TablePolicy",
            &function,
            &table,
            actions.iter().copied(),
            Default::default(),
        )?;
        scope.output("userpoolid", directory.reference(), None)
    })
    .input("table", source, "tableHandle")
}

//! Storage stack: the todo table with elastic read and write throughput.

use infra_core::resource::{AttributeType, KeyAttribute, TableAttributes};
use infra_core::scaling::CapacityDimension;
use infra_core::stack::StackConstructor;
use infra_core::{Result, StackScope};

use crate::config::TableSettings;

pub const STORAGE_STACK: &str = "Storage";
pub const TABLE_ID: &str = "Todos";
pub const TABLE_NAME_EXPORT: &str = "tableName";
pub const TABLE_HANDLE_EXPORT: &str = "tableHandle";

#[derive(Debug, Clone)]
pub struct StorageStack {
    table: TableSettings,
}

impl StorageStack {
    pub fn new(table: TableSettings) -> Self {
        Self { table }
    }
}

impl StackConstructor for StorageStack {
    fn construct(&self, scope: &mut StackScope<'_>) -> Result<()> {
        let table = scope.declare(
            TABLE_ID,
            TableAttributes::new()
                .with_name(self.table.name.clone())
                .with_partition_key(KeyAttribute::new("PK", AttributeType::String))
                .with_sort_key(KeyAttribute::new("SK", AttributeType::String)),
        )?;

        for dimension in [CapacityDimension::Read, CapacityDimension::Write] {
            scope.bind_scaling(
                &table,
                dimension,
                self.table.min_capacity,
                self.table.max_capacity,
                self.table.target_utilization_percent,
            )?;
        }

        scope.export_name(TABLE_NAME_EXPORT, &table)?;
        scope.export_handle(TABLE_HANDLE_EXPORT, &table)
    }
}

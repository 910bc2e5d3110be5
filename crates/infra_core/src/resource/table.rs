use std::str::FromStr;

use serde::Serialize;

use crate::error::{CompositionError, Result};

const DEFAULT_PROVISIONED_CAPACITY: u32 = 5;
const MIN_TABLE_NAME_LEN: usize = 3;
const MAX_TABLE_NAME_LEN: usize = 255;

/// Primitive type tag of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeType {
    String,
    Number,
    Binary,
}

impl FromStr for AttributeType {
    type Err = CompositionError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "STRING" => Ok(Self::String),
            "NUMBER" => Ok(Self::Number),
            "BINARY" => Ok(Self::Binary),
            _ => Err(CompositionError::configuration(format!(
                "unrecognized attribute type '{value}', expected STRING, NUMBER or BINARY"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }

    /// Builds a key from a textual type tag such as `"STRING"`.
    pub fn parse(name: impl Into<String>, type_tag: &str) -> Result<Self> {
        Ok(Self::new(name, type_tag.parse()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CapacityMode {
    Provisioned {
        read_capacity: u32,
        write_capacity: u32,
    },
    OnDemand,
}

impl Default for CapacityMode {
    fn default() -> Self {
        Self::Provisioned {
            read_capacity: DEFAULT_PROVISIONED_CAPACITY,
            write_capacity: DEFAULT_PROVISIONED_CAPACITY,
        }
    }
}

/// Key-value table with a partition key and optional sort key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partition_key: Option<KeyAttribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_key: Option<KeyAttribute>,
    capacity_mode: CapacityMode,
}

impl TableAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    pub fn with_partition_key(mut self, key: KeyAttribute) -> Self {
        self.partition_key = Some(key);
        self
    }

    pub fn with_sort_key(mut self, key: KeyAttribute) -> Self {
        self.sort_key = Some(key);
        self
    }

    pub fn with_capacity_mode(mut self, mode: CapacityMode) -> Self {
        self.capacity_mode = mode;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    pub fn partition_key(&self) -> Option<&KeyAttribute> {
        self.partition_key.as_ref()
    }

    pub fn sort_key(&self) -> Option<&KeyAttribute> {
        self.sort_key.as_ref()
    }

    pub fn capacity_mode(&self) -> CapacityMode {
        self.capacity_mode
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.table_name {
            validate_table_name(name)?;
        }

        let Some(partition_key) = &self.partition_key else {
            return Err(CompositionError::configuration(
                "table requires a partition key attribute",
            ));
        };
        if partition_key.name.trim().is_empty() {
            return Err(CompositionError::configuration(
                "partition key name cannot be empty",
            ));
        }

        if let Some(sort_key) = &self.sort_key {
            if sort_key.name.trim().is_empty() {
                return Err(CompositionError::configuration(
                    "sort key name cannot be empty",
                ));
            }
            if sort_key.name == partition_key.name {
                return Err(CompositionError::configuration(format!(
                    "sort key '{}' duplicates the partition key",
                    sort_key.name
                )));
            }
        }

        if let CapacityMode::Provisioned {
            read_capacity,
            write_capacity,
        } = self.capacity_mode
        {
            if read_capacity == 0 || write_capacity == 0 {
                return Err(CompositionError::configuration(
                    "provisioned read and write capacity must be positive",
                ));
            }
        }

        Ok(())
    }
}

fn validate_table_name(name: &str) -> Result<()> {
    if !(MIN_TABLE_NAME_LEN..=MAX_TABLE_NAME_LEN).contains(&name.len()) {
        return Err(CompositionError::configuration(format!(
            "table name '{name}' must be {MIN_TABLE_NAME_LEN}-{MAX_TABLE_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(CompositionError::configuration(format!(
            "table name '{name}' may only contain letters, digits, '_', '-' and '.'"
        )));
    }
    Ok(())
}

//! Stack exports and the cross-stack references that consume them.

use serde::{Deserialize, Serialize};

use crate::error::{CompositionError, Result};
use crate::resource::{ResourceAddress, ResourceHandle};
use crate::token::Token;

/// A value a stack publishes for later stacks. Always derived from one of
/// the publishing stack's own resources.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportValue {
    /// The typed handle itself, usable as a policy or trigger target.
    Handle { handle: ResourceHandle },
    /// A single attribute of a resource (its name, an ARN, ...).
    Value {
        source: ResourceAddress,
        token: Token,
    },
}

impl ExportValue {
    pub fn source(&self) -> &ResourceAddress {
        match self {
            Self::Handle { handle } => handle.address(),
            Self::Value { source, .. } => source,
        }
    }

    /// Token to embed into configuration; a handle exports its primary reference.
    pub fn token(&self) -> Token {
        match self {
            Self::Handle { handle } => handle.reference(),
            Self::Value { token, .. } => token.clone(),
        }
    }
}

/// Names one export of one stack, as declared in a stack's inputs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExportSelector {
    pub stack: String,
    pub export: String,
}

impl ExportSelector {
    pub fn new(stack: impl Into<String>, export: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            export: export.into(),
        }
    }
}

/// A resolved export of an already constructed stack.
///
/// Only the composition root creates these, and only from stacks that
/// finished construction.
#[derive(Debug, Clone, Serialize)]
pub struct CrossStackReference {
    source_stack: String,
    source_export: String,
    value: ExportValue,
}

impl CrossStackReference {
    pub(crate) fn new(selector: &ExportSelector, value: ExportValue) -> Self {
        Self {
            source_stack: selector.stack.clone(),
            source_export: selector.export.clone(),
            value,
        }
    }

    pub fn source_stack(&self) -> &str {
        &self.source_stack
    }

    pub fn source_export(&self) -> &str {
        &self.source_export
    }

    pub fn value(&self) -> &ExportValue {
        &self.value
    }

    pub fn token(&self) -> Token {
        self.value.token()
    }

    pub fn handle(&self) -> Result<&ResourceHandle> {
        match &self.value {
            ExportValue::Handle { handle } => Ok(handle),
            ExportValue::Value { .. } => Err(CompositionError::configuration(format!(
                "export '{}' of stack '{}' is a value, not a resource handle",
                self.source_export, self.source_stack
            ))),
        }
    }
}

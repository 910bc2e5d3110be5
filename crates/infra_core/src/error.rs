use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompositionError>;

/// Coarse error category, stable across message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Conflict,
    UnsupportedOperation,
    Ordering,
    CyclicDependency,
}

/// Structural errors detected while composing a deployment.
///
/// Every variant is fatal to the composition run. Nothing here is retried:
/// the same inputs always produce the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// Invalid or missing declarative input.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The same identifier was declared twice with different content.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// A policy was requested against a resource kind that cannot carry it.
    #[error("unsupported operation: {message}")]
    UnsupportedOperation { message: String },

    /// An export was read before its producing stack finished construction.
    #[error("ordering error: stack '{consumer}' needs export '{export}' of stack '{producer}', which is not constructed yet")]
    Ordering {
        consumer: String,
        producer: String,
        export: String,
    },

    /// The stack dependency graph contains a cycle.
    #[error("cyclic dependency among stacks [{}]", stacks.join(", "))]
    CyclicDependency { stacks: Vec<String> },
}

impl CompositionError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
        }
    }

    pub fn ordering(
        consumer: impl Into<String>,
        producer: impl Into<String>,
        export: impl Into<String>,
    ) -> Self {
        Self::Ordering {
            consumer: consumer.into(),
            producer: producer.into(),
            export: export.into(),
        }
    }

    pub fn cyclic<I, S>(stacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::CyclicDependency {
            stacks: stacks.into_iter().map(Into::into).collect(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::UnsupportedOperation { .. } => ErrorCategory::UnsupportedOperation,
            Self::Ordering { .. } => ErrorCategory::Ordering,
            Self::CyclicDependency { .. } => ErrorCategory::CyclicDependency,
        }
    }
}

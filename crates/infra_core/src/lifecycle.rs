use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CompositionError;
use crate::resource::ResourceKind;

/// Resource-owned lifecycle events an executable can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleEvent {
    PreSignUp,
    PostConfirmation,
    PreAuthentication,
    PostAuthentication,
    CustomMessage,
    PreTokenGeneration,
}

const ALL_EVENTS: [LifecycleEvent; 6] = [
    LifecycleEvent::PreSignUp,
    LifecycleEvent::PostConfirmation,
    LifecycleEvent::PreAuthentication,
    LifecycleEvent::PostAuthentication,
    LifecycleEvent::CustomMessage,
    LifecycleEvent::PreTokenGeneration,
];

impl LifecycleEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreSignUp => "pre-sign-up",
            Self::PostConfirmation => "post-confirmation",
            Self::PreAuthentication => "pre-authentication",
            Self::PostAuthentication => "post-authentication",
            Self::CustomMessage => "custom-message",
            Self::PreTokenGeneration => "pre-token-generation",
        }
    }

    pub fn is_recognized_for(self, kind: ResourceKind) -> bool {
        // Only user directories emit lifecycle events in this model.
        kind == ResourceKind::UserDirectory
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = CompositionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ALL_EVENTS
            .into_iter()
            .find(|event| event.as_str() == value.trim())
            .ok_or_else(|| {
                CompositionError::configuration(format!("unrecognized lifecycle event '{value}'"))
            })
    }
}

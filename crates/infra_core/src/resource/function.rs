use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{CompositionError, Result};
use crate::token::Token;

const MAX_TIMEOUT_SECS: u32 = 900;
const DEFAULT_TIMEOUT_SECS: u32 = 3;

/// Externally built runtime code, referenced by its asset identifier.
///
/// The core never looks inside the asset; it only carries the identifier,
/// the environment to inject and the invocation timeout.
#[derive(Debug, Clone, Serialize)]
pub struct Executable {
    code_asset: String,
    handler: String,
    runtime: String,
    environment: BTreeMap<String, Token>,
    timeout_secs: u32,
}

impl Executable {
    pub fn new(
        code_asset: impl Into<String>,
        handler: impl Into<String>,
        runtime: impl Into<String>,
    ) -> Self {
        Self {
            code_asset: code_asset.into(),
            handler: handler.into(),
            runtime: runtime.into(),
            environment: BTreeMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: Token) -> Self {
        self.environment.insert(key.into(), value);
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u32) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn code_asset(&self) -> &str {
        &self.code_asset
    }

    pub fn environment(&self) -> &BTreeMap<String, Token> {
        &self.environment
    }

    pub fn timeout_secs(&self) -> u32 {
        self.timeout_secs
    }

    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("code asset", &self.code_asset),
            ("handler", &self.handler),
            ("runtime", &self.runtime),
        ] {
            if value.trim().is_empty() {
                return Err(CompositionError::configuration(format!(
                    "executable {label} cannot be empty"
                )));
            }
        }

        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(CompositionError::configuration(format!(
                "executable timeout {}s must be within 1..={MAX_TIMEOUT_SECS}",
                self.timeout_secs
            )));
        }

        for key in self.environment.keys() {
            if !is_env_key(key) {
                return Err(CompositionError::configuration(format!(
                    "environment key '{key}' must match [A-Za-z][A-Za-z0-9_]*"
                )));
            }
        }

        Ok(())
    }
}

fn is_env_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

//! User directory, its app clients, and federated identity pools.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{CompositionError, Result};
use crate::token::Token;

const MAX_CUSTOM_ATTRIBUTE_NAME_LEN: usize = 20;
const MAX_STRING_ATTRIBUTE_LEN: u32 = 2048;
const PASSWORD_MIN_LENGTH_RANGE: std::ops::RangeInclusive<u32> = 6..=99;
const MAX_TEMPORARY_PASSWORD_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInAlias {
    Username,
    Email,
    Phone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardAttribute {
    Email,
    PhoneNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CustomAttributeType {
    String,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StringConstraints {
    pub min_length: u32,
    pub max_length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomAttribute {
    pub name: String,
    pub data_type: CustomAttributeType,
    pub mutable: bool,
    pub required: bool,
    pub developer_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_constraints: Option<StringConstraints>,
}

impl CustomAttribute {
    /// Optional, mutable string attribute with the given length bounds.
    pub fn string(name: impl Into<String>, min_length: u32, max_length: u32) -> Self {
        Self {
            name: name.into(),
            data_type: CustomAttributeType::String,
            mutable: true,
            required: false,
            developer_only: false,
            string_constraints: Some(StringConstraints {
                min_length,
                max_length,
            }),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CompositionError::configuration(
                "custom attribute name cannot be empty",
            ));
        }
        if self.name.len() > MAX_CUSTOM_ATTRIBUTE_NAME_LEN {
            return Err(CompositionError::configuration(format!(
                "custom attribute '{}' exceeds {MAX_CUSTOM_ATTRIBUTE_NAME_LEN} characters",
                self.name
            )));
        }
        let Some(constraints) = self.string_constraints else {
            return Ok(());
        };
        if self.data_type != CustomAttributeType::String {
            return Err(CompositionError::configuration(format!(
                "custom attribute '{}' has string constraints but is not a string",
                self.name
            )));
        }
        if constraints.min_length > constraints.max_length
            || constraints.max_length > MAX_STRING_ATTRIBUTE_LEN
        {
            return Err(CompositionError::configuration(format!(
                "custom attribute '{}' has invalid length bounds {}..{}",
                self.name, constraints.min_length, constraints.max_length
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordPolicy {
    pub minimum_length: u32,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_symbols: bool,
    pub require_numbers: bool,
    pub temporary_password_validity_days: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            minimum_length: 8,
            require_lowercase: true,
            require_uppercase: true,
            require_symbols: true,
            require_numbers: true,
            temporary_password_validity_days: 7,
        }
    }
}

impl PasswordPolicy {
    fn validate(&self) -> Result<()> {
        if !PASSWORD_MIN_LENGTH_RANGE.contains(&self.minimum_length) {
            return Err(CompositionError::configuration(format!(
                "password minimum length {} must be within {}..={}",
                self.minimum_length,
                PASSWORD_MIN_LENGTH_RANGE.start(),
                PASSWORD_MIN_LENGTH_RANGE.end()
            )));
        }
        if self.temporary_password_validity_days > MAX_TEMPORARY_PASSWORD_DAYS {
            return Err(CompositionError::configuration(format!(
                "temporary password validity of {} days exceeds {MAX_TEMPORARY_PASSWORD_DAYS}",
                self.temporary_password_validity_days
            )));
        }
        Ok(())
    }
}

/// User directory (user pool).
#[derive(Debug, Clone, Serialize)]
pub struct UserDirectoryAttributes {
    pub sign_in: SignInAlias,
    pub auto_verified: BTreeSet<StandardAttribute>,
    pub custom_attributes: Vec<CustomAttribute>,
    pub password_policy: PasswordPolicy,
}

impl Default for UserDirectoryAttributes {
    fn default() -> Self {
        Self {
            sign_in: SignInAlias::Username,
            auto_verified: BTreeSet::new(),
            custom_attributes: Vec::new(),
            password_policy: PasswordPolicy::default(),
        }
    }
}

impl UserDirectoryAttributes {
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for attribute in &self.custom_attributes {
            attribute.validate()?;
            if !seen.insert(attribute.name.as_str()) {
                return Err(CompositionError::configuration(format!(
                    "custom attribute '{}' is declared twice",
                    attribute.name
                )));
            }
        }
        self.password_policy.validate()
    }
}

/// App client of a user directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryClientAttributes {
    pub client_name: String,
    pub directory: Token,
    pub generate_secret: bool,
}

impl DirectoryClientAttributes {
    pub fn validate(&self) -> Result<()> {
        if self.client_name.trim().is_empty() {
            return Err(CompositionError::configuration(
                "directory client name cannot be empty",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentityProvider {
    pub provider_name: Token,
    pub client_id: Token,
}

/// Federated identity pool.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentityPoolAttributes {
    pub providers: Vec<IdentityProvider>,
    pub allow_unauthenticated_identities: bool,
}

impl IdentityPoolAttributes {
    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() && !self.allow_unauthenticated_identities {
            return Err(CompositionError::configuration(
                "identity pool needs an identity provider or must allow unauthenticated identities",
            ));
        }
        Ok(())
    }
}

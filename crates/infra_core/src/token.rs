//! Opaque deployment-time values.
//!
//! A [`Token`] stands for a value that only exists once the plan is
//! materialised (a generated id, an ARN). The composition core embeds tokens
//! into configuration and policy statements but never compares or inspects
//! them, which is why `Token` has no `PartialEq`.

use serde::Serialize;

use crate::resource::ResourceAddress;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TokenRepr {
    Literal {
        value: String,
    },
    Attribute {
        stack: String,
        resource: String,
        attribute: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Token(TokenRepr);

impl Token {
    /// A value already known at synthesis time.
    pub fn literal(value: impl Into<String>) -> Self {
        Self(TokenRepr::Literal {
            value: value.into(),
        })
    }

    pub(crate) fn attribute(address: &ResourceAddress, attribute: &str) -> Self {
        Self(TokenRepr::Attribute {
            stack: address.stack().to_string(),
            resource: address.id().as_str().to_string(),
            attribute: attribute.to_string(),
        })
    }

    /// Placeholder form handed to the deployment tool.
    pub fn render(&self) -> String {
        match &self.0 {
            TokenRepr::Literal { value } => value.clone(),
            TokenRepr::Attribute {
                stack,
                resource,
                attribute,
            } => format!("${{{stack}.{resource}.{attribute}}}"),
        }
    }
}

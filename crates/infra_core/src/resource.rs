//! Resource declarations and the handles stacks use to refer to them.

pub mod directory;
pub mod function;
pub mod table;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::actions;
use crate::error::{CompositionError, Result};
use crate::token::Token;

pub use directory::{
    CustomAttribute, CustomAttributeType, DirectoryClientAttributes, IdentityPoolAttributes,
    IdentityProvider, PasswordPolicy, SignInAlias, StandardAttribute, StringConstraints,
    UserDirectoryAttributes,
};
pub use function::Executable;
pub use table::{AttributeType, CapacityMode, KeyAttribute, TableAttributes};

/// Identifier of a resource, unique within its owning stack.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(CompositionError::configuration(
                "resource id cannot be empty",
            ));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(CompositionError::configuration(format!(
                "resource id '{value}' cannot contain whitespace"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structural identity of a resource across the whole deployment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceAddress {
    stack: String,
    id: ResourceId,
}

impl ResourceAddress {
    pub fn new(stack: impl Into<String>, id: ResourceId) -> Self {
        Self {
            stack: stack.into(),
            id,
        }
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.stack, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Table,
    UserDirectory,
    DirectoryClient,
    IdentityPool,
    Function,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::UserDirectory => "UserDirectory",
            Self::DirectoryClient => "DirectoryClient",
            Self::IdentityPool => "IdentityPool",
            Self::Function => "Function",
        }
    }

    /// Kinds with independently scalable read/write throughput.
    pub fn supports_capacity(self) -> bool {
        matches!(self, Self::Table)
    }

    pub fn recognizes_action(self, action: &str) -> bool {
        actions::provider_actions(self, action).is_some()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific configuration. The variant fixes the resource kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "properties")]
pub enum ResourceAttributes {
    Table(TableAttributes),
    UserDirectory(UserDirectoryAttributes),
    DirectoryClient(DirectoryClientAttributes),
    IdentityPool(IdentityPoolAttributes),
    Function(Executable),
}

impl ResourceAttributes {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Table(_) => ResourceKind::Table,
            Self::UserDirectory(_) => ResourceKind::UserDirectory,
            Self::DirectoryClient(_) => ResourceKind::DirectoryClient,
            Self::IdentityPool(_) => ResourceKind::IdentityPool,
            Self::Function(_) => ResourceKind::Function,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Table(attributes) => attributes.validate(),
            Self::UserDirectory(attributes) => attributes.validate(),
            Self::DirectoryClient(attributes) => attributes.validate(),
            Self::IdentityPool(attributes) => attributes.validate(),
            Self::Function(executable) => executable.validate(),
        }
    }

    fn physical_name(&self) -> Option<&str> {
        match self {
            Self::Table(attributes) => attributes.name(),
            _ => None,
        }
    }
}

impl From<TableAttributes> for ResourceAttributes {
    fn from(value: TableAttributes) -> Self {
        Self::Table(value)
    }
}

impl From<UserDirectoryAttributes> for ResourceAttributes {
    fn from(value: UserDirectoryAttributes) -> Self {
        Self::UserDirectory(value)
    }
}

impl From<DirectoryClientAttributes> for ResourceAttributes {
    fn from(value: DirectoryClientAttributes) -> Self {
        Self::DirectoryClient(value)
    }
}

impl From<IdentityPoolAttributes> for ResourceAttributes {
    fn from(value: IdentityPoolAttributes) -> Self {
        Self::IdentityPool(value)
    }
}

impl From<Executable> for ResourceAttributes {
    fn from(value: Executable) -> Self {
        Self::Function(value)
    }
}

/// A validated resource owned by exactly one stack.
#[derive(Debug, Clone)]
pub struct ResourceDeclaration {
    address: ResourceAddress,
    attributes: ResourceAttributes,
    canonical: Value,
}

impl ResourceDeclaration {
    pub fn new(address: ResourceAddress, attributes: ResourceAttributes) -> Result<Self> {
        attributes.validate()?;
        let canonical = serde_json::to_value(&attributes).map_err(|error| {
            CompositionError::configuration(format!(
                "attributes of '{address}' cannot be serialized: {error}"
            ))
        })?;
        Ok(Self {
            address,
            attributes,
            canonical,
        })
    }

    pub fn id(&self) -> &ResourceId {
        self.address.id()
    }

    pub fn address(&self) -> &ResourceAddress {
        &self.address
    }

    pub fn kind(&self) -> ResourceKind {
        self.attributes.kind()
    }

    pub fn attributes(&self) -> &ResourceAttributes {
        &self.attributes
    }

    /// Canonical JSON form of the attributes, tokens included.
    pub fn canonical_attributes(&self) -> &Value {
        &self.canonical
    }

    pub fn has_same_attributes(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }

    pub fn handle(&self) -> ResourceHandle {
        let name = match self.attributes.physical_name() {
            Some(name) => Token::literal(name),
            None => Token::attribute(&self.address, "Name"),
        };
        ResourceHandle {
            address: self.address.clone(),
            kind: self.kind(),
            name,
        }
    }
}

/// Typed handle to a declared resource, the unit stacks export and import.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceHandle {
    address: ResourceAddress,
    kind: ResourceKind,
    name: Token,
}

impl ResourceHandle {
    pub fn address(&self) -> &ResourceAddress {
        &self.address
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> Token {
        self.name.clone()
    }

    /// The resource's primary reference (table name, pool id, client id).
    pub fn reference(&self) -> Token {
        self.attribute("Ref")
    }

    pub fn arn(&self) -> Token {
        self.attribute("Arn")
    }

    pub fn attribute(&self, attribute: &str) -> Token {
        Token::attribute(&self.address, attribute)
    }
}

/// Stable identity of an executable's runtime role.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutableIdentity(ResourceAddress);

impl ExecutableIdentity {
    pub fn address(&self) -> &ResourceAddress {
        &self.0
    }
}

impl fmt::Display for ExecutableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a declared `Function`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutableHandle {
    resource: ResourceHandle,
}

impl ExecutableHandle {
    pub(crate) fn new(resource: ResourceHandle) -> Result<Self> {
        if resource.kind() != ResourceKind::Function {
            return Err(CompositionError::configuration(format!(
                "'{}' is a {}, not an executable",
                resource.address(),
                resource.kind()
            )));
        }
        Ok(Self { resource })
    }

    pub fn identity(&self) -> ExecutableIdentity {
        ExecutableIdentity(self.resource.address().clone())
    }

    pub fn resource(&self) -> &ResourceHandle {
        &self.resource
    }

    pub fn role_arn(&self) -> Token {
        self.resource.attribute("RoleArn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todos_table() -> TableAttributes {
        TableAttributes::new()
            .with_name("Todos")
            .with_partition_key(KeyAttribute::new("PK", AttributeType::String))
            .with_sort_key(KeyAttribute::new("SK", AttributeType::String))
    }

    fn address(id: &str) -> ResourceAddress {
        ResourceAddress::new("Storage", ResourceId::new(id).expect("id should pass"))
    }

    #[test]
    fn resource_id_rejects_empty_and_whitespace() {
        assert!(ResourceId::new("").is_err());
        assert!(ResourceId::new("Todo Table").is_err());
        assert_eq!(ResourceId::new("Todos").expect("id").as_str(), "Todos");
    }

    #[test]
    fn declaration_kind_follows_attributes() {
        let declaration = ResourceDeclaration::new(address("Todos"), todos_table().into())
            .expect("declaration should pass");
        assert_eq!(declaration.kind(), ResourceKind::Table);
        assert_eq!(declaration.handle().kind(), ResourceKind::Table);
    }

    #[test]
    fn explicit_table_name_becomes_a_literal_name_token() {
        let declaration = ResourceDeclaration::new(address("Todos"), todos_table().into())
            .expect("declaration should pass");
        let handle = declaration.handle();
        assert_eq!(handle.name().render(), "Todos");
        assert_eq!(handle.arn().render(), "${Storage.Todos.Arn}");
    }

    #[test]
    fn generated_names_stay_deployment_time_tokens() {
        let table = TableAttributes::new()
            .with_partition_key(KeyAttribute::new("PK", AttributeType::String));
        let declaration =
            ResourceDeclaration::new(address("Items"), table.into()).expect("declaration");
        assert_eq!(
            declaration.handle().name().render(),
            "${Storage.Items.Name}"
        );
    }

    #[test]
    fn same_attributes_compare_by_canonical_form() {
        let first = ResourceDeclaration::new(address("Todos"), todos_table().into())
            .expect("declaration");
        let second = ResourceDeclaration::new(address("Todos"), todos_table().into())
            .expect("declaration");
        let different = ResourceDeclaration::new(
            address("Todos"),
            todos_table()
                .with_capacity_mode(CapacityMode::OnDemand)
                .into(),
        )
        .expect("declaration");

        assert!(first.has_same_attributes(&second));
        assert!(!first.has_same_attributes(&different));
    }

    #[test]
    fn executable_handle_requires_function_kind() {
        let declaration = ResourceDeclaration::new(address("Todos"), todos_table().into())
            .expect("declaration");
        let error = ExecutableHandle::new(declaration.handle()).expect_err("table is not code");
        assert_eq!(
            error,
            CompositionError::configuration("'Storage/Todos' is a Table, not an executable")
        );
    }

    #[test]
    fn only_tables_support_capacity() {
        assert!(ResourceKind::Table.supports_capacity());
        assert!(!ResourceKind::UserDirectory.supports_capacity());
        assert!(!ResourceKind::Function.supports_capacity());
    }
}

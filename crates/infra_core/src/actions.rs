//! Per-kind action vocabulary and the provider permissions each action expands to.

use crate::resource::ResourceKind;

type ActionTable = &'static [(&'static str, &'static [&'static str])];

const TABLE_ACTIONS: ActionTable = &[
    ("read", &["dynamodb:GetItem", "dynamodb:BatchGetItem"]),
    ("write", &["dynamodb:PutItem"]),
    ("update", &["dynamodb:UpdateItem"]),
    ("delete", &["dynamodb:DeleteItem"]),
    ("query", &["dynamodb:Query"]),
    ("scan", &["dynamodb:Scan"]),
];

const USER_DIRECTORY_ACTIONS: ActionTable = &[
    ("describe", &["cognito-idp:DescribeUserPool"]),
    ("list-users", &["cognito-idp:ListUsers"]),
    ("admin-get-user", &["cognito-idp:AdminGetUser"]),
];

const DIRECTORY_CLIENT_ACTIONS: ActionTable =
    &[("describe", &["cognito-idp:DescribeUserPoolClient"])];

const IDENTITY_POOL_ACTIONS: ActionTable = &[
    ("describe", &["cognito-identity:DescribeIdentityPool"]),
    (
        "get-credentials",
        &["cognito-identity:GetCredentialsForIdentity"],
    ),
];

const FUNCTION_ACTIONS: ActionTable = &[("invoke", &["lambda:InvokeFunction"])];

fn table_for(kind: ResourceKind) -> ActionTable {
    match kind {
        ResourceKind::Table => TABLE_ACTIONS,
        ResourceKind::UserDirectory => USER_DIRECTORY_ACTIONS,
        ResourceKind::DirectoryClient => DIRECTORY_CLIENT_ACTIONS,
        ResourceKind::IdentityPool => IDENTITY_POOL_ACTIONS,
        ResourceKind::Function => FUNCTION_ACTIONS,
    }
}

/// Action names recognised for `kind`, in declaration order.
pub fn recognized_actions(kind: ResourceKind) -> impl Iterator<Item = &'static str> {
    table_for(kind).iter().map(|(name, _)| *name)
}

/// Provider permissions granted by `action` on `kind`, or `None` when the
/// action is not recognised for that kind.
pub fn provider_actions(kind: ResourceKind, action: &str) -> Option<&'static [&'static str]> {
    table_for(kind)
        .iter()
        .find(|(name, _)| *name == action)
        .map(|(_, provider)| *provider)
}

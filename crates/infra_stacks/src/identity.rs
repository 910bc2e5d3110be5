//! Identity stack: user directory, web client, federated identity pool and
//! the post-confirmation function that writes new users into the table.

use std::collections::BTreeSet;

use infra_core::access::Effect;
use infra_core::lifecycle::LifecycleEvent;
use infra_core::resource::{
    CustomAttribute, DirectoryClientAttributes, Executable, IdentityPoolAttributes,
    IdentityProvider, PasswordPolicy, SignInAlias, StandardAttribute, UserDirectoryAttributes,
};
use infra_core::stack::StackConstructor;
use infra_core::trigger::TriggerConfig;
use infra_core::{Result, StackScope};

use crate::config::FunctionSettings;

pub const IDENTITY_STACK: &str = "Identity";
pub const TABLE_INPUT: &str = "table";
pub const CREATE_USER_ID: &str = "TodoCreateUser";
pub const TABLE_ENV_VAR: &str = "DYNAMODBTABLE";

pub const USER_POOL_OUTPUT: &str = "userpoolid";
pub const WEB_CLIENT_OUTPUT: &str = "webclientid";
pub const IDENTITY_POOL_OUTPUT: &str = "identitypoolid";

#[derive(Debug, Clone)]
pub struct IdentityStack {
    create_user: FunctionSettings,
}

impl IdentityStack {
    pub fn new(create_user: FunctionSettings) -> Self {
        Self { create_user }
    }

    fn create_user(&self) -> Executable {
        Executable::new(
            self.create_user.code_asset.clone(),
            self.create_user.handler.clone(),
            self.create_user.runtime.clone(),
        )
        .with_timeout_secs(self.create_user.timeout_secs)
    }
}

fn user_directory() -> UserDirectoryAttributes {
    UserDirectoryAttributes {
        sign_in: SignInAlias::Email,
        auto_verified: BTreeSet::from([StandardAttribute::Email]),
        custom_attributes: vec![
            CustomAttribute::string("first_name", 1, 255),
            CustomAttribute::string("last_name", 1, 255),
        ],
        password_policy: PasswordPolicy {
            minimum_length: 8,
            require_lowercase: false,
            require_uppercase: false,
            require_symbols: false,
            require_numbers: false,
            temporary_password_validity_days: 7,
        },
    }
}

impl StackConstructor for IdentityStack {
    fn construct(&self, scope: &mut StackScope<'_>) -> Result<()> {
        let table = scope.input_handle(TABLE_INPUT)?;

        let naming = scope.naming();
        let pool_id = naming.qualify("TodoUserPool");
        let client_id = naming.qualify("TodoUserPoolClient");
        let identity_pool_id = naming.qualify("TodoIdentityPool");
        let policy_name = naming.qualify("ToDoPolicyLambdaToDynamo");

        let directory = scope.declare(&pool_id, user_directory())?;
        let client = scope.declare(
            &client_id,
            DirectoryClientAttributes {
                client_name: "web".to_string(),
                directory: directory.reference(),
                generate_secret: false,
            },
        )?;
        let identity_pool = scope.declare(
            &identity_pool_id,
            IdentityPoolAttributes {
                providers: vec![IdentityProvider {
                    provider_name: directory.attribute("ProviderName"),
                    client_id: client.reference(),
                }],
                allow_unauthenticated_identities: false,
            },
        )?;

        let create_user = scope.declare_executable(
            CREATE_USER_ID,
            self.create_user().with_env(TABLE_ENV_VAR, table.name()),
        )?;
        scope.bind_trigger(
            &directory,
            LifecycleEvent::PostConfirmation,
            &create_user,
            TriggerConfig::described("create the user's todo record after sign-up confirmation"),
        )?;
        scope.bind_access(&policy_name, &create_user, &table, ["write"], Effect::Allow)?;

        scope.output(USER_POOL_OUTPUT, directory.reference(), Some("userpoolid"))?;
        scope.output(WEB_CLIENT_OUTPUT, client.reference(), Some("webclientid"))?;
        scope.output(
            IDENTITY_POOL_OUTPUT,
            identity_pool.reference(),
            Some("identitypoolid"),
        )
    }
}

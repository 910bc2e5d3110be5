//! Least-privilege grants from an executable's identity to resource actions.
//!
//! Grants only accumulate. Nothing in this module removes or narrows an
//! earlier grant, so a grantee's permission set is the union of everything
//! bound to it, whatever order the bindings happened in.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::actions;
use crate::error::{CompositionError, Result};
use crate::resource::{ExecutableIdentity, ResourceAddress, ResourceHandle};

/// Only `Allow` is modelled; explicit deny is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Effect {
    #[default]
    Allow,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessGrant {
    policy_name: String,
    grantee: ExecutableIdentity,
    resource: ResourceHandle,
    actions: BTreeSet<String>,
    effect: Effect,
}

impl AccessGrant {
    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }

    pub fn grantee(&self) -> &ExecutableIdentity {
        &self.grantee
    }

    pub fn resource(&self) -> &ResourceHandle {
        &self.resource
    }

    pub fn actions(&self) -> &BTreeSet<String> {
        &self.actions
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Provider permission names the grant expands to.
    pub fn provider_actions(&self) -> BTreeSet<&'static str> {
        self.actions
            .iter()
            .filter_map(|action| actions::provider_actions(self.resource.kind(), action))
            .flatten()
            .copied()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccessGrants {
    grants: Vec<AccessGrant>,
}

impl AccessGrants {
    /// Appends a grant after checking every action against the resource kind.
    pub fn bind<I, S>(
        &mut self,
        policy_name: &str,
        grantee: ExecutableIdentity,
        resource: &ResourceHandle,
        actions: I,
        effect: Effect,
    ) -> Result<&AccessGrant>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let policy_name = policy_name.trim();
        if policy_name.is_empty() {
            return Err(CompositionError::configuration(
                "access policy name cannot be empty",
            ));
        }

        let mut normalized = BTreeSet::new();
        for action in actions {
            let action = action.as_ref().trim();
            if !resource.kind().recognizes_action(action) {
                return Err(CompositionError::configuration(format!(
                    "action '{action}' is not recognized for {} '{}'",
                    resource.kind(),
                    resource.address()
                )));
            }
            normalized.insert(action.to_string());
        }
        if normalized.is_empty() {
            return Err(CompositionError::configuration(format!(
                "access policy '{policy_name}' must grant at least one action"
            )));
        }

        debug!(
            policy = policy_name,
            grantee = %grantee,
            resource = %resource.address(),
            actions = ?normalized,
            "bound access grant"
        );
        self.grants.push(AccessGrant {
            policy_name: policy_name.to_string(),
            grantee,
            resource: resource.clone(),
            actions: normalized,
            effect,
        });
        let index = self.grants.len() - 1;
        Ok(&self.grants[index])
    }

    pub fn permissions_for(&self, grantee: &ExecutableIdentity) -> PermissionSet<'_> {
        PermissionSet {
            grants: self
                .grants
                .iter()
                .filter(|grant| &grant.grantee == grantee)
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessGrant> {
        self.grants.iter()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

/// Everything one grantee has been granted.
#[derive(Debug, Clone)]
pub struct PermissionSet<'a> {
    grants: Vec<&'a AccessGrant>,
}

impl<'a> PermissionSet<'a> {
    pub fn grants(&self) -> &[&'a AccessGrant] {
        &self.grants
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Union of actions across all grants.
    pub fn actions(&self) -> BTreeSet<&'a str> {
        self.grants
            .iter()
            .copied()
            .flat_map(|grant| grant.actions.iter().map(String::as_str))
            .collect()
    }

    pub fn actions_on(&self, resource: &ResourceAddress) -> BTreeSet<&'a str> {
        self.grants
            .iter()
            .copied()
            .filter(|grant| grant.resource.address() == resource)
            .flat_map(|grant| grant.actions.iter().map(String::as_str))
            .collect()
    }

    pub fn resources(&self) -> BTreeSet<&'a ResourceAddress> {
        self.grants
            .iter()
            .copied()
            .map(|grant| grant.resource.address())
            .collect()
    }

    pub fn allows(&self, resource: &ResourceAddress, action: &str) -> bool {
        self.actions_on(resource).contains(action)
    }
}

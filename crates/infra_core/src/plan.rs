//! Serialisable deployment plan handed to the deployment tool.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::access::{AccessGrant, Effect};
use crate::composition::Deployment;
use crate::lifecycle::LifecycleEvent;
use crate::naming::NamingContext;
use crate::reference::ExportValue;
use crate::resource::{ExecutableIdentity, ResourceAddress, ResourceKind};
use crate::scaling::ScalingPolicy;
use crate::stack::{Output, Stack};
use crate::token::Token;

pub const PLAN_SCHEMA_VERSION: &str = "v1";

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPlan {
    pub schema_version: String,
    pub naming: NamingContext,
    pub stacks: Vec<StackPlan>,
    pub outputs: BTreeMap<String, Output>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StackPlan {
    pub name: String,
    pub depends_on: BTreeSet<String>,
    pub resources: Vec<ResourcePlan>,
    pub scaling_policies: Vec<ScalingPolicy>,
    pub access_policies: Vec<AccessPolicyPlan>,
    pub triggers: Vec<TriggerPlan>,
    pub exports: BTreeMap<String, ExportValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourcePlan {
    pub id: String,
    pub kind: ResourceKind,
    pub attributes: Value,
}

/// One named inline policy attached to an executable's role.
#[derive(Debug, Clone, Serialize)]
pub struct AccessPolicyPlan {
    pub name: String,
    pub grantee: ExecutableIdentity,
    pub role: Token,
    pub statements: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: BTreeSet<&'static str>,
    pub resource: Token,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerPlan {
    pub resource: ResourceAddress,
    pub event: LifecycleEvent,
    pub function: Token,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DeploymentPlan {
    pub fn from_deployment(deployment: &Deployment) -> Self {
        Self {
            schema_version: PLAN_SCHEMA_VERSION.to_string(),
            naming: deployment.naming().clone(),
            stacks: deployment
                .stacks()
                .iter()
                .map(StackPlan::from_stack)
                .collect(),
            outputs: deployment.outputs().clone(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// SHA-256 of the compact JSON form; identical inputs give identical fingerprints.
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_string(self)?);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

impl StackPlan {
    fn from_stack(stack: &Stack) -> Self {
        Self {
            name: stack.name().to_string(),
            depends_on: stack
                .inputs()
                .values()
                .map(|input| input.source_stack().to_string())
                .collect(),
            resources: stack
                .resources()
                .map(|resource| ResourcePlan {
                    id: resource.id().to_string(),
                    kind: resource.kind(),
                    attributes: resource.canonical_attributes().clone(),
                })
                .collect(),
            scaling_policies: stack.scaling_policies().iter().cloned().collect(),
            access_policies: group_policies(stack.access_grants().iter()),
            triggers: stack
                .triggers()
                .iter()
                .map(|binding| TriggerPlan {
                    resource: binding.resource.clone(),
                    event: binding.event,
                    function: binding.executable.resource().arn(),
                    description: binding.config.description.clone(),
                })
                .collect(),
            exports: stack.exports().clone(),
        }
    }
}

/// Grants sharing a policy name and grantee become statements of one policy.
fn group_policies<'a>(grants: impl Iterator<Item = &'a AccessGrant>) -> Vec<AccessPolicyPlan> {
    let mut policies: BTreeMap<(String, ExecutableIdentity), AccessPolicyPlan> = BTreeMap::new();
    for grant in grants {
        let statement = PolicyStatement {
            effect: grant.effect(),
            actions: grant.provider_actions(),
            resource: grant.resource().arn(),
        };
        policies
            .entry((grant.policy_name().to_string(), grant.grantee().clone()))
            .or_insert_with(|| AccessPolicyPlan {
                name: grant.policy_name().to_string(),
                grantee: grant.grantee().clone(),
                role: Token::attribute(grant.grantee().address(), "RoleArn"),
                statements: Vec::new(),
            })
            .statements
            .push(statement);
    }
    policies.into_values().collect()
}

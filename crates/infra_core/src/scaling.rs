//! Elastic-capacity rules attached to a resource's read/write dimensions.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CompositionError, Result};
use crate::resource::{CapacityMode, ResourceAddress, ResourceAttributes, ResourceDeclaration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityDimension {
    Read,
    Write,
}

impl fmt::Display for CapacityDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScalingPolicy {
    pub resource: ResourceAddress,
    pub dimension: CapacityDimension,
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub target_utilization_percent: u32,
}

/// At most one policy per (resource, dimension); later bindings replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct ScalingPolicies {
    policies: BTreeMap<(ResourceAddress, CapacityDimension), ScalingPolicy>,
}

impl ScalingPolicies {
    /// Records a policy and returns the one it replaced, if any.
    pub fn bind(
        &mut self,
        resource: &ResourceDeclaration,
        dimension: CapacityDimension,
        min_capacity: u32,
        max_capacity: u32,
        target_utilization_percent: u32,
    ) -> Result<Option<ScalingPolicy>> {
        validate_bounds(min_capacity, max_capacity, target_utilization_percent)?;
        ensure_capacity_managed(resource)?;

        let policy = ScalingPolicy {
            resource: resource.address().clone(),
            dimension,
            min_capacity,
            max_capacity,
            target_utilization_percent,
        };
        debug!(
            resource = %policy.resource,
            %dimension,
            min_capacity,
            max_capacity,
            target_utilization_percent,
            "bound scaling policy"
        );

        let previous = self
            .policies
            .insert((policy.resource.clone(), dimension), policy);
        if let Some(previous) = &previous {
            warn!(
                resource = %previous.resource,
                %dimension,
                "scaling policy replaced an earlier binding"
            );
        }
        Ok(previous)
    }

    pub fn get(
        &self,
        resource: &ResourceAddress,
        dimension: CapacityDimension,
    ) -> Option<&ScalingPolicy> {
        self.policies.get(&(resource.clone(), dimension))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScalingPolicy> {
        self.policies.values()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

fn validate_bounds(
    min_capacity: u32,
    max_capacity: u32,
    target_utilization_percent: u32,
) -> Result<()> {
    if min_capacity == 0 || min_capacity > max_capacity {
        return Err(CompositionError::configuration(format!(
            "scaling bounds must satisfy 0 < min <= max, got min={min_capacity} max={max_capacity}"
        )));
    }
    if target_utilization_percent == 0 || target_utilization_percent > 100 {
        return Err(CompositionError::configuration(format!(
            "target utilization must be within 1..=100, got {target_utilization_percent}"
        )));
    }
    Ok(())
}

fn ensure_capacity_managed(resource: &ResourceDeclaration) -> Result<()> {
    if !resource.kind().supports_capacity() {
        return Err(CompositionError::unsupported(format!(
            "{} '{}' has no scalable capacity",
            resource.kind(),
            resource.address()
        )));
    }
    if let ResourceAttributes::Table(table) = resource.attributes() {
        if table.capacity_mode() == CapacityMode::OnDemand {
            return Err(CompositionError::unsupported(format!(
                "table '{}' uses on-demand capacity and cannot be autoscaled",
                resource.address()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::resource::{
        AttributeType, KeyAttribute, ResourceId, TableAttributes, UserDirectoryAttributes,
    };

    fn declare(id: &str, attributes: ResourceAttributes) -> ResourceDeclaration {
        let address = ResourceAddress::new("Storage", ResourceId::new(id).expect("id"));
        ResourceDeclaration::new(address, attributes).expect("declaration should pass")
    }

    fn table() -> ResourceDeclaration {
        declare(
            "Todos",
            TableAttributes::new()
                .with_partition_key(KeyAttribute::new("PK", AttributeType::String))
                .into(),
        )
    }

    #[test]
    fn accepts_valid_bounds() {
        let mut policies = ScalingPolicies::default();
        for (min, max, target) in [(1, 50, 70), (1, 1, 100), (10, 10, 1)] {
            policies
                .bind(&table(), CapacityDimension::Read, min, max, target)
                .expect("valid bounds should pass");
        }
    }

    #[test]
    fn rejects_invalid_bounds_with_configuration_error() {
        let mut policies = ScalingPolicies::default();
        for (min, max, target) in [(0, 50, 70), (51, 50, 70), (1, 50, 0), (1, 50, 101)] {
            let error = policies
                .bind(&table(), CapacityDimension::Write, min, max, target)
                .expect_err("invalid bounds should fail");
            assert_eq!(error.category(), ErrorCategory::Configuration);
        }
        assert!(policies.is_empty());
    }

    #[test]
    fn rebinding_replaces_the_previous_policy() {
        let mut policies = ScalingPolicies::default();
        let table = table();
        let first = policies
            .bind(&table, CapacityDimension::Read, 1, 50, 70)
            .expect("first binding");
        assert!(first.is_none());

        let replaced = policies
            .bind(&table, CapacityDimension::Read, 2, 20, 50)
            .expect("second binding")
            .expect("first policy is returned");
        assert_eq!(replaced.max_capacity, 50);

        let current = policies
            .get(table.address(), CapacityDimension::Read)
            .expect("policy recorded");
        assert_eq!(current.min_capacity, 2);
        assert_eq!(current.max_capacity, 20);
        assert_eq!(current.target_utilization_percent, 50);
        assert_eq!(policies.len(), 1);
    }

    #[test]
    fn read_and_write_dimensions_are_independent() {
        let mut policies = ScalingPolicies::default();
        let table = table();
        policies
            .bind(&table, CapacityDimension::Read, 1, 50, 70)
            .expect("read");
        policies
            .bind(&table, CapacityDimension::Write, 1, 10, 70)
            .expect("write");
        assert_eq!(policies.len(), 2);
    }

    #[test]
    fn rejects_resources_without_capacity() {
        let mut policies = ScalingPolicies::default();
        let directory = declare("Users", UserDirectoryAttributes::default().into());
        let error = policies
            .bind(&directory, CapacityDimension::Read, 1, 5, 70)
            .expect_err("directories do not scale");
        assert_eq!(error.category(), ErrorCategory::UnsupportedOperation);
    }

    #[test]
    fn rejects_on_demand_tables() {
        let mut policies = ScalingPolicies::default();
        let on_demand = declare(
            "Events",
            TableAttributes::new()
                .with_partition_key(KeyAttribute::new("PK", AttributeType::String))
                .with_capacity_mode(CapacityMode::OnDemand)
                .into(),
        );
        let error = policies
            .bind(&on_demand, CapacityDimension::Write, 1, 5, 70)
            .expect_err("on-demand tables do not scale");
        assert_eq!(
            error,
            CompositionError::unsupported(
                "table 'Storage/Events' uses on-demand capacity and cannot be autoscaled"
            )
        );
    }
}

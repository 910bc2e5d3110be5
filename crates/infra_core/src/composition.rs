//! Composition root: builds stacks in dependency order and threads exports
//! from producers into the inputs of consumers.

use std::collections::{BTreeMap, BTreeSet};

use pathfinding::directed::topological_sort::topological_sort_into_groups;
use tracing::{debug, info};

use crate::error::{CompositionError, Result};
use crate::naming::NamingContext;
use crate::plan::DeploymentPlan;
use crate::reference::{CrossStackReference, ExportSelector};
use crate::stack::{Output, Stack, StackConstructor, StackScope, StackState};

/// How the root picks the construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingMode {
    /// Derive the order from the stacks' inputs.
    #[default]
    Topological,
    /// Construct exactly in the order the stacks were added.
    AsDeclared,
}

/// A stack to be constructed: its name, its inputs and its constructor.
pub struct StackSpec {
    name: String,
    inputs: BTreeMap<String, ExportSelector>,
    rebound_inputs: BTreeSet<String>,
    constructor: Box<dyn StackConstructor>,
}

impl std::fmt::Debug for StackSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackSpec")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

impl StackSpec {
    pub fn new(name: impl Into<String>, constructor: impl StackConstructor + 'static) -> Self {
        Self {
            name: name.into(),
            inputs: BTreeMap::new(),
            rebound_inputs: BTreeSet::new(),
            constructor: Box::new(constructor),
        }
    }

    /// Same as [`StackSpec::new`] for closures, which need the explicit
    /// higher-ranked bound to accept any scope lifetime.
    pub fn from_fn<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&mut StackScope<'_>) -> Result<()> + 'static,
    {
        Self::new(name, constructor)
    }

    /// Feeds export `export` of stack `stack` into input `input`.
    ///
    /// Binding the same input name twice makes [`CompositionRoot::compose`]
    /// fail with a conflict.
    pub fn input(
        mut self,
        input: impl Into<String>,
        stack: impl Into<String>,
        export: impl Into<String>,
    ) -> Self {
        let input = input.into();
        let selector = ExportSelector::new(stack, export);
        if self.inputs.insert(input.clone(), selector).is_some() {
            self.rebound_inputs.insert(input);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &BTreeMap<String, ExportSelector> {
        &self.inputs
    }

    fn producers(&self) -> BTreeSet<&str> {
        self.inputs
            .values()
            .map(|selector| selector.stack.as_str())
            .collect()
    }
}

#[derive(Debug)]
pub struct CompositionRoot {
    naming: NamingContext,
    ordering: OrderingMode,
    specs: Vec<StackSpec>,
}

impl CompositionRoot {
    pub fn new(naming: NamingContext) -> Self {
        Self {
            naming,
            ordering: OrderingMode::default(),
            specs: Vec::new(),
        }
    }

    pub fn with_ordering(mut self, ordering: OrderingMode) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn stack(mut self, spec: StackSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn naming(&self) -> &NamingContext {
        &self.naming
    }

    /// Constructs every stack and gathers their outputs.
    ///
    /// Graph problems (invalid or duplicate names, rebound inputs, unknown
    /// producers, cycles) are reported before any constructor runs. Any error aborts the whole run.
    pub fn compose(&self) -> Result<Deployment> {
        let order = self.construction_order()?;
        let names: Vec<&str> = order.iter().map(|spec| spec.name()).collect();
        debug!(order = ?names, "construction order");

        let mut states: BTreeMap<&str, StackState> = self
            .specs
            .iter()
            .map(|spec| (spec.name(), StackState::Unconstructed))
            .collect();
        let mut constructed: BTreeMap<&str, Stack> = BTreeMap::new();
        let mut stacks = Vec::with_capacity(order.len());

        for spec in order {
            let inputs = resolve_inputs(spec, &states, &constructed)?;

            states.insert(spec.name(), StackState::Constructing);
            let mut scope = StackScope::new(spec.name(), &self.naming, inputs);
            spec.constructor.construct(&mut scope)?;
            let stack = scope.finish();
            states.insert(spec.name(), StackState::Constructed);

            info!(
                stack = spec.name(),
                resources = stack.resources().count(),
                exports = stack.exports().len(),
                "stack constructed"
            );
            constructed.insert(spec.name(), stack.clone());
            stacks.push(stack);
        }

        let outputs = collect_outputs(&stacks)?;
        info!(
            stacks = stacks.len(),
            outputs = outputs.len(),
            "composition complete"
        );
        Ok(Deployment {
            naming: self.naming.clone(),
            stacks,
            outputs,
        })
    }

    fn construction_order(&self) -> Result<Vec<&StackSpec>> {
        let mut by_name: BTreeMap<&str, &StackSpec> = BTreeMap::new();
        for spec in &self.specs {
            validate_stack_name(spec.name())?;
            if let Some(input) = spec.rebound_inputs.first() {
                return Err(CompositionError::conflict(format!(
                    "input '{input}' of stack '{}' is bound more than once",
                    spec.name()
                )));
            }
            if by_name.insert(spec.name(), spec).is_some() {
                return Err(CompositionError::conflict(format!(
                    "stack '{}' is declared more than once",
                    spec.name()
                )));
            }
        }

        let mut consumers: BTreeMap<&str, BTreeSet<&str>> = by_name
            .keys()
            .map(|name| (*name, BTreeSet::new()))
            .collect();
        for spec in &self.specs {
            for (input, selector) in spec.inputs() {
                let Some(producer) = consumers.get_mut(selector.stack.as_str()) else {
                    return Err(CompositionError::configuration(format!(
                        "input '{input}' of stack '{}' refers to unknown stack '{}'",
                        spec.name(),
                        selector.stack
                    )));
                };
                producer.insert(spec.name());
            }
        }

        let declared: Vec<&str> = self.specs.iter().map(|spec| spec.name()).collect();
        let position = |name: &str| declared.iter().position(|declared| *declared == name);
        let groups = topological_sort_into_groups(&declared, |name| {
            consumers
                .get(name)
                .into_iter()
                .flatten()
                .copied()
                .collect::<Vec<_>>()
        })
        .map_err(|(_, mut remaining)| {
            remaining.sort_by_key(|name| position(name));
            CompositionError::cyclic(remaining)
        })?;

        let order: Vec<&str> = match self.ordering {
            OrderingMode::Topological => groups
                .into_iter()
                .flat_map(|mut group| {
                    // Group members are independent; keep them in declaration order.
                    group.sort_by_key(|name| position(name));
                    group
                })
                .collect(),
            OrderingMode::AsDeclared => declared.clone(),
        };
        Ok(order
            .into_iter()
            .filter_map(|name| by_name.get(name).copied())
            .collect())
    }
}

fn validate_stack_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CompositionError::configuration(
            "stack name cannot be empty",
        ));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(CompositionError::configuration(format!(
            "stack name '{name}' cannot contain whitespace"
        )));
    }
    Ok(())
}

fn resolve_inputs(
    spec: &StackSpec,
    states: &BTreeMap<&str, StackState>,
    constructed: &BTreeMap<&str, Stack>,
) -> Result<BTreeMap<String, CrossStackReference>> {
    let mut inputs = BTreeMap::new();
    for (input, selector) in spec.inputs() {
        let producer = selector.stack.as_str();
        if states.get(producer) != Some(&StackState::Constructed) {
            return Err(CompositionError::ordering(
                spec.name(),
                producer,
                &selector.export,
            ));
        }
        let value = constructed
            .get(producer)
            .and_then(|stack| stack.export(&selector.export))
            .ok_or_else(|| {
                CompositionError::configuration(format!(
                    "stack '{producer}' has no export '{}' for input '{input}' of '{}'",
                    selector.export,
                    spec.name()
                ))
            })?;
        inputs.insert(
            input.clone(),
            CrossStackReference::new(selector, value.clone()),
        );
    }
    debug!(stack = spec.name(), producers = ?spec.producers(), "resolved inputs");
    Ok(inputs)
}

fn collect_outputs(stacks: &[Stack]) -> Result<BTreeMap<String, Output>> {
    let mut outputs = BTreeMap::new();
    for stack in stacks {
        for (name, output) in stack.outputs() {
            if let Some(previous) = outputs.insert(name.clone(), output.clone()) {
                return Err(CompositionError::conflict(format!(
                    "output '{name}' is declared by both '{}' and '{}'",
                    previous.stack,
                    stack.name()
                )));
            }
        }
    }
    Ok(outputs)
}

/// The result of a successful composition run.
#[derive(Debug, Clone)]
pub struct Deployment {
    naming: NamingContext,
    stacks: Vec<Stack>,
    outputs: BTreeMap<String, Output>,
}

impl Deployment {
    pub fn naming(&self) -> &NamingContext {
        &self.naming
    }

    /// Stacks in construction order.
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|stack| stack.name() == name)
    }

    pub fn outputs(&self) -> &BTreeMap<String, Output> {
        &self.outputs
    }

    /// Outputs rendered for operators.
    pub fn rendered_outputs(&self) -> BTreeMap<String, String> {
        self.outputs
            .iter()
            .map(|(name, output)| (name.clone(), output.value.render()))
            .collect()
    }

    pub fn plan(&self) -> DeploymentPlan {
        DeploymentPlan::from_deployment(self)
    }
}

//! Declarative composition of cloud infrastructure stacks.
//!
//! Stacks declare resources through a [`stack::StackScope`], publish exports,
//! and consume exports of other stacks as inputs. The
//! [`composition::CompositionRoot`] constructs stacks in dependency order,
//! rejects cycles and conflicting declarations, and produces a
//! [`composition::Deployment`] whose [`plan::DeploymentPlan`] is handed to the
//! deployment tool.

pub mod access;
pub mod actions;
pub mod composition;
pub mod error;
pub mod lifecycle;
pub mod naming;
pub mod plan;
pub mod reference;
pub mod resource;
pub mod scaling;
pub mod stack;
pub mod token;
pub mod trigger;

pub use composition::{CompositionRoot, Deployment, OrderingMode, StackSpec};
pub use error::{CompositionError, ErrorCategory, Result};
pub use naming::NamingContext;
pub use stack::{Stack, StackScope};
pub use token::Token;

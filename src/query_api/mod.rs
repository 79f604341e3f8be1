// SPDX-License-Identifier: MIT OR Apache-2.0

//! Descriptive query model.
//!
//! Everything in this module is plain data: operator kinds, stage
//! descriptors, capability sets. No closures, no streams. The runtime in
//! `crate::core` attaches behaviour to these descriptions; providers use
//! them to declare and negotiate what they can execute.

pub mod capability;
pub mod plan;

pub use self::capability::{Capability, CapabilitySet};
pub use self::plan::{OperatorKind, QueryPlan, SelectorVariant, StageDescriptor};

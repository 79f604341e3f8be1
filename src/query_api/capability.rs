// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider capability negotiation.
//!
//! A provider declares the operator families it can execute as a
//! [`CapabilitySet`]. Operator application checks the set eagerly, so an
//! unsupported operator fails at query-construction time rather than
//! somewhere inside enumeration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A single operator family a provider may support.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Synchronous projection (`select`, `select_indexed`).
    Select,
    /// Asynchronous projection (`select_async`, `select_indexed_async`).
    SelectAsync,
    /// Asynchronous projection whose selector observes the cancellation token.
    SelectCancellable,
    /// Synchronous prefix skipping (`skip_while`, `skip_while_indexed`).
    SkipWhile,
    /// Asynchronous prefix skipping.
    SkipWhileAsync,
    /// Asynchronous prefix skipping with token-aware predicates.
    SkipWhileCancellable,
    /// Ordered pairwise comparison terminal (`sequence_equal`, `sequence_equal_by`).
    SequenceEqual,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 7] = [
        Capability::Select,
        Capability::SelectAsync,
        Capability::SelectCancellable,
        Capability::SkipWhile,
        Capability::SkipWhileAsync,
        Capability::SkipWhileCancellable,
        Capability::SequenceEqual,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::Select => "Select",
            Capability::SelectAsync => "SelectAsync",
            Capability::SelectCancellable => "SelectCancellable",
            Capability::SkipWhile => "SkipWhile",
            Capability::SkipWhileAsync => "SkipWhileAsync",
            Capability::SkipWhileCancellable => "SkipWhileCancellable",
            Capability::SequenceEqual => "SequenceEqual",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of operator families a provider supports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    allowed: BTreeSet<Capability>,
}

impl CapabilitySet {
    /// A set allowing every operator family.
    pub fn all() -> Self {
        Self {
            allowed: Capability::ALL.iter().copied().collect(),
        }
    }

    /// A fully restricted set: every operator application is rejected.
    pub fn none() -> Self {
        Self {
            allowed: BTreeSet::new(),
        }
    }

    /// Builder-style: add a capability.
    pub fn with(mut self, capability: Capability) -> Self {
        self.allowed.insert(capability);
        self
    }

    /// Builder-style: remove a capability.
    pub fn without(mut self, capability: Capability) -> Self {
        self.allowed.remove(&capability);
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.allowed.contains(&capability)
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::all()
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query plan descriptors.
//!
//! An [`AsyncQueryable`](crate::core::queryable::AsyncQueryable) records one
//! [`StageDescriptor`] per applied operator. The resulting [`QueryPlan`] is
//! what shows up in log lines and error messages; it carries no behaviour.

use crate::query_api::capability::Capability;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator families understood by the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    Select,
    SkipWhile,
    SequenceEqual,
}

/// How the stage's selector or predicate executes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorVariant {
    /// Plain function, applied synchronously per element.
    Sync,
    /// Function returning a future, awaited per element.
    Async,
    /// Function returning a future and observing the cancellation token
    /// installed by the terminal operation.
    AsyncCancellable,
}

/// Description of one applied operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub operator: OperatorKind,
    pub variant: SelectorVariant,
    /// Selector/predicate also receives the element's 0-based position
    /// within this stage's input.
    pub indexed: bool,
    /// `sequence_equal_by`: a caller-supplied comparer instead of `PartialEq`.
    pub custom_comparer: bool,
}

impl StageDescriptor {
    pub fn new(operator: OperatorKind, variant: SelectorVariant) -> Self {
        Self {
            operator,
            variant,
            indexed: false,
            custom_comparer: false,
        }
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn with_custom_comparer(mut self) -> Self {
        self.custom_comparer = true;
        self
    }

    /// The capability a provider must declare for this stage to be admitted.
    /// Total: every descriptor maps to exactly one capability.
    pub fn required_capability(&self) -> Capability {
        match (self.operator, self.variant) {
            (OperatorKind::Select, SelectorVariant::Sync) => Capability::Select,
            (OperatorKind::Select, SelectorVariant::Async) => Capability::SelectAsync,
            (OperatorKind::Select, SelectorVariant::AsyncCancellable) => {
                Capability::SelectCancellable
            }
            (OperatorKind::SkipWhile, SelectorVariant::Sync) => Capability::SkipWhile,
            (OperatorKind::SkipWhile, SelectorVariant::Async) => Capability::SkipWhileAsync,
            (OperatorKind::SkipWhile, SelectorVariant::AsyncCancellable) => {
                Capability::SkipWhileCancellable
            }
            (OperatorKind::SequenceEqual, _) => Capability::SequenceEqual,
        }
    }
}

impl fmt::Display for StageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match (self.operator, self.variant) {
            (OperatorKind::Select, SelectorVariant::Sync) => "Select",
            (OperatorKind::Select, SelectorVariant::Async) => "SelectAsync",
            (OperatorKind::Select, SelectorVariant::AsyncCancellable) => "SelectCancellable",
            (OperatorKind::SkipWhile, SelectorVariant::Sync) => "SkipWhile",
            (OperatorKind::SkipWhile, SelectorVariant::Async) => "SkipWhileAsync",
            (OperatorKind::SkipWhile, SelectorVariant::AsyncCancellable) => "SkipWhileCancellable",
            (OperatorKind::SequenceEqual, _) => "SequenceEqual",
        };
        f.write_str(base)?;
        if self.indexed {
            f.write_str("Indexed")?;
        }
        if self.custom_comparer {
            f.write_str("By")?;
        }
        Ok(())
    }
}

/// Ordered record of the stages applied to a queryable, plus the name of the
/// provider the base stream came from. Append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub source: String,
    pub stages: Vec<StageDescriptor>,
}

impl QueryPlan {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            stages: Vec::new(),
        }
    }

    pub fn push(&mut self, stage: StageDescriptor) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// JSON rendering for structured logs and diagnostics.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        for stage in &self.stages {
            write!(f, " -> {}", stage)?;
        }
        Ok(())
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! # asyncquery
//!
//! LINQ-style asynchronous query adapter. A backing
//! [`QueryProvider`](crate::core::provider::QueryProvider) opens a typed
//! element stream and declares the operator families it supports; an
//! [`AsyncQueryable`](crate::core::queryable::AsyncQueryable) chains
//! projection and prefix-skipping stages over it and executes through a
//! single awaited terminal operation (`to_list`, `count`,
//! `sequence_equal`).
//!
//! Operator application is validated eagerly against the provider's
//! capability set, so unsupported operators fail at query-construction time
//! rather than during enumeration. Terminal operations take a
//! [`CancellationToken`](crate::core::cancellation::CancellationToken)
//! checked before the first element and between elements; token-aware
//! selector/predicate variants receive the same token.
//!
//! ```rust
//! use asyncquery::{CancellationToken, InMemoryProvider};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> asyncquery::QueryResult<()> {
//! let provider = InMemoryProvider::new(vec![1, 2, 3, 4]);
//! let doubled = provider
//!     .queryable()
//!     .await?
//!     .skip_while(|v| *v < 3)?
//!     .select(|v| v * 2)?
//!     .to_list(CancellationToken::none())
//!     .await?;
//! assert_eq!(doubled, vec![6, 8]);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod query_api;

pub use crate::core::cancellation::{CancellationSource, CancellationToken};
pub use crate::core::error::{QueryError, QueryResult};
pub use crate::core::provider::{InMemoryProvider, InMemoryProviderConfig, QueryProvider};
pub use crate::core::queryable::AsyncQueryable;
pub use crate::query_api::{
    Capability, CapabilitySet, OperatorKind, QueryPlan, SelectorVariant, StageDescriptor,
};

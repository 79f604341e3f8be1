// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query runtime: cancellation, errors, providers, stage executors and the
//! queryable surface.

pub mod cancellation;
pub mod error;
pub(crate) mod executor;
pub mod provider;
pub mod queryable;

pub use self::cancellation::{CancellationSource, CancellationToken};
pub use self::error::{QueryError, QueryResult};
pub use self::provider::{InMemoryProvider, InMemoryProviderConfig, QueryProvider};
pub use self::queryable::AsyncQueryable;

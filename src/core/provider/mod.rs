// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backing providers.
//!
//! A provider is the component a query executes against: it opens the base
//! element stream and declares which operator families it supports. The
//! in-memory provider is the reference implementation; databases or remote
//! stores would implement the same trait.

pub mod in_memory;

pub use self::in_memory::{InMemoryProvider, InMemoryProviderConfig};

use crate::core::error::QueryResult;
use crate::query_api::CapabilitySet;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Contract between the query runtime and a backing data source.
///
/// Opening may involve real connection work, so it is asynchronous and
/// fallible. The returned stream yields `Err` items for mid-enumeration
/// provider failures; the runtime passes those through untouched.
#[async_trait]
pub trait QueryProvider<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Provider name used in plans, log lines and error messages.
    fn name(&self) -> &str;

    /// Operator families this provider supports.
    fn capabilities(&self) -> &CapabilitySet;

    /// Open the base element stream for a new query.
    async fn open(&self) -> QueryResult<BoxStream<'static, QueryResult<T>>>;
}

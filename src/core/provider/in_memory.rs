// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory reference provider.
//!
//! Serves a `Vec<T>` as the base stream. Used as the ground-truth backing
//! store by the conformance suite; capability restriction and fault
//! injection are configurable so guard tests can exercise the negative
//! paths.

use crate::core::error::{QueryError, QueryResult};
use crate::core::provider::QueryProvider;
use crate::core::queryable::AsyncQueryable;
use crate::query_api::CapabilitySet;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use log::debug;

/// Configuration for an [`InMemoryProvider`].
#[derive(Clone, Debug)]
pub struct InMemoryProviderConfig {
    /// Name reported in plans and error messages.
    pub name: String,
    /// Operator families the provider admits.
    pub capabilities: CapabilitySet,
    /// Emit a provider error after this many elements, ending the stream.
    /// Positions past the end of the data never fire.
    pub error_after: Option<usize>,
    /// Yield the data in batches of this size, with a scheduler yield
    /// between batches. `None` serves everything in one batch. Must be
    /// positive when set.
    pub chunk_size: Option<usize>,
}

impl Default for InMemoryProviderConfig {
    fn default() -> Self {
        Self {
            name: "memory".to_string(),
            capabilities: CapabilitySet::all(),
            error_after: None,
            chunk_size: None,
        }
    }
}

/// Vec-backed provider with configurable capabilities.
#[derive(Clone, Debug)]
pub struct InMemoryProvider<T> {
    data: Vec<T>,
    config: InMemoryProviderConfig,
}

impl<T> InMemoryProvider<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Provider over `data` admitting every operator family.
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            config: InMemoryProviderConfig::default(),
        }
    }

    /// Provider from an explicit configuration. Rejects empty names, which
    /// would make plans and error messages useless, and zero chunk sizes,
    /// which could never make progress.
    pub fn from_config(data: Vec<T>, config: InMemoryProviderConfig) -> QueryResult<Self> {
        if config.name.is_empty() {
            return Err(QueryError::invalid_argument_with_parameter(
                "provider name must not be empty",
                "name",
            ));
        }
        if config.chunk_size == Some(0) {
            return Err(QueryError::invalid_argument_with_parameter(
                "chunk size must be positive",
                "chunk_size",
            ));
        }
        Ok(Self { data, config })
    }

    /// Builder-style: restrict the admitted operator families.
    pub fn with_capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.config.capabilities = capabilities;
        self
    }

    /// Builder-style: rename the provider.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Builder-style: inject a provider failure after `elements` elements.
    pub fn with_error_after(mut self, elements: usize) -> Self {
        self.config.error_after = Some(elements);
        self
    }

    /// Builder-style: serve the data in batches of `elements`, yielding to
    /// the scheduler between batches. Zero is rejected when the stream is
    /// opened.
    pub fn with_chunk_size(mut self, elements: usize) -> Self {
        self.config.chunk_size = Some(elements);
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Open a fresh queryable view over this provider's data.
    pub async fn queryable(&self) -> QueryResult<AsyncQueryable<T>> {
        AsyncQueryable::from_provider(self).await
    }
}

#[async_trait]
impl<T> QueryProvider<T> for InMemoryProvider<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &CapabilitySet {
        &self.config.capabilities
    }

    async fn open(&self) -> QueryResult<BoxStream<'static, QueryResult<T>>> {
        let mut items: Vec<QueryResult<T>> = Vec::with_capacity(self.data.len());
        for (position, value) in self.data.iter().enumerate() {
            if self.config.error_after == Some(position) {
                break;
            }
            items.push(Ok(value.clone()));
        }
        if let Some(position) = self.config.error_after {
            if position <= self.data.len() {
                items.push(Err(QueryError::provider(format!(
                    "provider '{}' failed after {} elements",
                    self.config.name, position
                ))));
            }
        }
        debug!(
            "provider '{}' opened: {} items",
            self.config.name,
            items.len()
        );
        match self.config.chunk_size {
            Some(0) => Err(QueryError::invalid_argument_with_parameter(
                "chunk size must be positive",
                "chunk_size",
            )),
            Some(size) => {
                let mut chunks: Vec<Vec<QueryResult<T>>> = Vec::new();
                let mut remaining = items.into_iter();
                loop {
                    let chunk: Vec<QueryResult<T>> = remaining.by_ref().take(size).collect();
                    if chunk.is_empty() {
                        break;
                    }
                    chunks.push(chunk);
                }
                Ok(futures::stream::iter(chunks)
                    .then(|chunk| async move {
                        tokio::task::yield_now().await;
                        futures::stream::iter(chunk)
                    })
                    .flatten()
                    .boxed())
            }
            None => Ok(tokio_stream::iter(items).boxed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_api::Capability;

    #[tokio::test]
    async fn test_open_yields_data_in_order() {
        let provider = InMemoryProvider::new(vec![1, 2, 3]);
        let mut stream = provider.open().await.unwrap();
        let mut seen = Vec::new();
        while let Some(item) = stream.next().await {
            seen.push(item.unwrap());
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_error_after_truncates_and_fails() {
        let provider = InMemoryProvider::new(vec![10, 20, 30]).with_error_after(1);
        let mut stream = provider.open().await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), 10);
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, QueryError::Provider { .. }));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_error_after_past_end_never_fires() {
        let provider = InMemoryProvider::new(vec![1]).with_error_after(5);
        let mut stream = provider.open().await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_from_config_rejects_empty_name() {
        let config = InMemoryProviderConfig {
            name: String::new(),
            ..InMemoryProviderConfig::default()
        };
        let result = InMemoryProvider::from_config(vec![1, 2], config);
        assert!(matches!(
            result.unwrap_err(),
            QueryError::InvalidArgument { .. }
        ));
    }

    #[tokio::test]
    async fn test_chunked_yield_preserves_order_and_content() {
        let provider = InMemoryProvider::new(vec![1, 2, 3, 4, 5]).with_chunk_size(2);
        let mut stream = provider.open().await.unwrap();
        let mut seen = Vec::new();
        while let Some(item) = stream.next().await {
            seen.push(item.unwrap());
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_chunked_yield_carries_injected_error() {
        let provider = InMemoryProvider::new(vec![1, 2, 3])
            .with_chunk_size(2)
            .with_error_after(2);
        let mut stream = provider.open().await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert_eq!(stream.next().await.unwrap().unwrap(), 2);
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, QueryError::Provider { .. }));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_zero_chunk_size_rejected_at_open() {
        let provider = InMemoryProvider::new(vec![1]).with_chunk_size(0);
        let err = provider.open().await.err().unwrap();
        assert!(matches!(err, QueryError::InvalidArgument { .. }));
    }

    #[test]
    fn test_from_config_rejects_zero_chunk_size() {
        let config = InMemoryProviderConfig {
            chunk_size: Some(0),
            ..InMemoryProviderConfig::default()
        };
        let result = InMemoryProvider::from_config(vec![1, 2], config);
        assert!(matches!(
            result.unwrap_err(),
            QueryError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_with_capabilities_restricts() {
        let provider =
            InMemoryProvider::new(vec![1]).with_capabilities(CapabilitySet::none());
        assert!(!provider.capabilities().supports(Capability::Select));
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! The async-queryable view.
//!
//! [`AsyncQueryable`] is what a provider hands out: a typed element stream
//! plus the provider's capability set and the plan recorded so far. Operator
//! application validates the required capability eagerly and returns a new
//! queryable; nothing executes until a terminal operation is awaited.
//!
//! Terminal operations take a [`CancellationToken`]. The token is checked
//! before the first element and between elements, and is also handed to the
//! token-aware (`*_cancellable`) selectors and predicates of earlier stages.

use crate::core::cancellation::{CancellationToken, TokenSlot};
use crate::core::error::{QueryError, QueryResult};
use crate::core::executor;
use crate::core::provider::QueryProvider;
use crate::query_api::{CapabilitySet, OperatorKind, QueryPlan, SelectorVariant, StageDescriptor};
use futures::stream::BoxStream;
use log::debug;
use std::future::Future;

pub struct AsyncQueryable<T> {
    stream: BoxStream<'static, QueryResult<T>>,
    capabilities: CapabilitySet,
    plan: QueryPlan,
    token_slot: TokenSlot,
}

impl<T> std::fmt::Debug for AsyncQueryable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncQueryable")
            .field("capabilities", &self.capabilities)
            .field("plan", &self.plan)
            .field("token_slot", &self.token_slot)
            .finish_non_exhaustive()
    }
}

impl<T> AsyncQueryable<T>
where
    T: Send + 'static,
{
    /// Open a queryable view over `provider`.
    pub async fn from_provider<P>(provider: &P) -> QueryResult<Self>
    where
        P: QueryProvider<T> + ?Sized,
    {
        let stream = provider.open().await?;
        Ok(Self {
            stream,
            capabilities: provider.capabilities().clone(),
            plan: QueryPlan::new(provider.name()),
            token_slot: TokenSlot::new(),
        })
    }

    /// The plan recorded so far.
    pub fn plan(&self) -> &QueryPlan {
        &self.plan
    }

    /// Capability check at operator-application time. On success the stage
    /// is recorded in the plan.
    fn admit(&mut self, stage: StageDescriptor) -> QueryResult<()> {
        let required = stage.required_capability();
        if !self.capabilities.supports(required) {
            return Err(QueryError::unsupported(
                stage.to_string(),
                self.plan.source.clone(),
            ));
        }
        self.plan.push(stage);
        debug!("admitted stage, plan now: {}", self.plan);
        Ok(())
    }

    // ---- Select family -------------------------------------------------

    /// Project each element through `selector`.
    pub fn select<U, F>(mut self, selector: F) -> QueryResult<AsyncQueryable<U>>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        self.admit(StageDescriptor::new(
            OperatorKind::Select,
            SelectorVariant::Sync,
        ))?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::select::map_sync(stream, selector),
            capabilities,
            plan,
            token_slot,
        })
    }

    /// Project each element through `selector`, which also receives the
    /// element's 0-based position.
    pub fn select_indexed<U, F>(mut self, selector: F) -> QueryResult<AsyncQueryable<U>>
    where
        U: Send + 'static,
        F: FnMut(T, usize) -> U + Send + 'static,
    {
        self.admit(
            StageDescriptor::new(OperatorKind::Select, SelectorVariant::Sync).indexed(),
        )?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::select::map_sync_indexed(stream, selector),
            capabilities,
            plan,
            token_slot,
        })
    }

    /// Project each element through an asynchronous `selector`, awaited per
    /// element.
    pub fn select_async<U, F, Fut>(mut self, selector: F) -> QueryResult<AsyncQueryable<U>>
    where
        U: Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = U> + Send + 'static,
    {
        self.admit(StageDescriptor::new(
            OperatorKind::Select,
            SelectorVariant::Async,
        ))?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::select::map_async(stream, selector),
            capabilities,
            plan,
            token_slot,
        })
    }

    pub fn select_indexed_async<U, F, Fut>(mut self, selector: F) -> QueryResult<AsyncQueryable<U>>
    where
        U: Send + 'static,
        F: FnMut(T, usize) -> Fut + Send + 'static,
        Fut: Future<Output = U> + Send + 'static,
    {
        self.admit(
            StageDescriptor::new(OperatorKind::Select, SelectorVariant::Async).indexed(),
        )?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::select::map_async_indexed(stream, selector),
            capabilities,
            plan,
            token_slot,
        })
    }

    /// Project through an asynchronous `selector` that receives the
    /// cancellation token installed by the terminal operation. The selector
    /// is fallible; its errors surface from the terminal operation.
    pub fn select_cancellable<U, F, Fut>(mut self, selector: F) -> QueryResult<AsyncQueryable<U>>
    where
        U: Send + 'static,
        F: FnMut(T, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = QueryResult<U>> + Send + 'static,
    {
        self.admit(StageDescriptor::new(
            OperatorKind::Select,
            SelectorVariant::AsyncCancellable,
        ))?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::select::map_cancellable(stream, selector, token_slot.clone()),
            capabilities,
            plan,
            token_slot,
        })
    }

    pub fn select_indexed_cancellable<U, F, Fut>(
        mut self,
        selector: F,
    ) -> QueryResult<AsyncQueryable<U>>
    where
        U: Send + 'static,
        F: FnMut(T, usize, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = QueryResult<U>> + Send + 'static,
    {
        self.admit(
            StageDescriptor::new(OperatorKind::Select, SelectorVariant::AsyncCancellable)
                .indexed(),
        )?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::select::map_cancellable_indexed(
                stream,
                selector,
                token_slot.clone(),
            ),
            capabilities,
            plan,
            token_slot,
        })
    }

    // ---- SkipWhile family ----------------------------------------------

    /// Discard elements while `predicate` holds; once it first returns
    /// false, everything after passes through unchanged and the predicate is
    /// not consulted again.
    pub fn skip_while<P>(mut self, predicate: P) -> QueryResult<AsyncQueryable<T>>
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        self.admit(StageDescriptor::new(
            OperatorKind::SkipWhile,
            SelectorVariant::Sync,
        ))?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::skip_while::skip_sync(stream, predicate),
            capabilities,
            plan,
            token_slot,
        })
    }

    pub fn skip_while_indexed<P>(mut self, predicate: P) -> QueryResult<AsyncQueryable<T>>
    where
        P: FnMut(&T, usize) -> bool + Send + 'static,
    {
        self.admit(
            StageDescriptor::new(OperatorKind::SkipWhile, SelectorVariant::Sync).indexed(),
        )?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::skip_while::skip_sync_indexed(stream, predicate),
            capabilities,
            plan,
            token_slot,
        })
    }

    /// Asynchronous skip predicate. Receives the element by value (a clone),
    /// since a borrow cannot cross the predicate's await point.
    pub fn skip_while_async<P, Fut>(mut self, predicate: P) -> QueryResult<AsyncQueryable<T>>
    where
        T: Clone,
        P: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.admit(StageDescriptor::new(
            OperatorKind::SkipWhile,
            SelectorVariant::Async,
        ))?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::skip_while::skip_async(stream, predicate),
            capabilities,
            plan,
            token_slot,
        })
    }

    pub fn skip_while_indexed_async<P, Fut>(
        mut self,
        predicate: P,
    ) -> QueryResult<AsyncQueryable<T>>
    where
        T: Clone,
        P: FnMut(T, usize) -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.admit(
            StageDescriptor::new(OperatorKind::SkipWhile, SelectorVariant::Async).indexed(),
        )?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::skip_while::skip_async_indexed(stream, predicate),
            capabilities,
            plan,
            token_slot,
        })
    }

    pub fn skip_while_cancellable<P, Fut>(
        mut self,
        predicate: P,
    ) -> QueryResult<AsyncQueryable<T>>
    where
        T: Clone,
        P: FnMut(T, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = QueryResult<bool>> + Send + 'static,
    {
        self.admit(StageDescriptor::new(
            OperatorKind::SkipWhile,
            SelectorVariant::AsyncCancellable,
        ))?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::skip_while::skip_cancellable(stream, predicate, token_slot.clone()),
            capabilities,
            plan,
            token_slot,
        })
    }

    pub fn skip_while_indexed_cancellable<P, Fut>(
        mut self,
        predicate: P,
    ) -> QueryResult<AsyncQueryable<T>>
    where
        T: Clone,
        P: FnMut(T, usize, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = QueryResult<bool>> + Send + 'static,
    {
        self.admit(
            StageDescriptor::new(OperatorKind::SkipWhile, SelectorVariant::AsyncCancellable)
                .indexed(),
        )?;
        let Self {
            stream,
            capabilities,
            plan,
            token_slot,
        } = self;
        Ok(AsyncQueryable {
            stream: executor::skip_while::skip_cancellable_indexed(
                stream,
                predicate,
                token_slot.clone(),
            ),
            capabilities,
            plan,
            token_slot,
        })
    }

    // ---- Terminal operations -------------------------------------------

    /// Materialize the query into a `Vec`, awaited once.
    pub async fn to_list(self, token: CancellationToken) -> QueryResult<Vec<T>> {
        debug!("executing plan via to_list: {}", self.plan);
        self.token_slot.install(token.clone());
        executor::drain(self.stream, &token, "to_list").await
    }

    /// Count the query's elements, awaited once.
    pub async fn count(self, token: CancellationToken) -> QueryResult<usize> {
        debug!("executing plan via count: {}", self.plan);
        self.token_slot.install(token.clone());
        executor::count(self.stream, &token, "count").await
    }

    /// Ordered pairwise comparison against `other` using `PartialEq`.
    pub async fn sequence_equal(
        mut self,
        other: AsyncQueryable<T>,
        token: CancellationToken,
    ) -> QueryResult<bool>
    where
        T: PartialEq,
    {
        self.admit(StageDescriptor::new(
            OperatorKind::SequenceEqual,
            SelectorVariant::Sync,
        ))?;
        self.run_sequence_equal(other, |a, b| a == b, token).await
    }

    /// Ordered pairwise comparison against `other` using a caller-supplied
    /// comparer.
    pub async fn sequence_equal_by<C>(
        mut self,
        other: AsyncQueryable<T>,
        comparer: C,
        token: CancellationToken,
    ) -> QueryResult<bool>
    where
        C: FnMut(&T, &T) -> bool + Send,
    {
        self.admit(
            StageDescriptor::new(OperatorKind::SequenceEqual, SelectorVariant::Sync)
                .with_custom_comparer(),
        )?;
        self.run_sequence_equal(other, comparer, token).await
    }

    async fn run_sequence_equal<C>(
        self,
        other: AsyncQueryable<T>,
        comparer: C,
        token: CancellationToken,
    ) -> QueryResult<bool>
    where
        C: FnMut(&T, &T) -> bool + Send,
    {
        debug!(
            "executing plan via sequence_equal: {} vs {}",
            self.plan, other.plan
        );
        self.token_slot.install(token.clone());
        other.token_slot.install(token.clone());
        executor::sequence_equal::compare(self.stream, other.stream, comparer, token).await
    }

    /// Escape hatch: the underlying element stream, for streaming
    /// consumption outside the terminal operations.
    pub fn into_stream(self) -> BoxStream<'static, QueryResult<T>> {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::InMemoryProvider;
    use crate::query_api::{Capability, CapabilitySet};

    #[tokio::test]
    async fn test_select_to_list_smoke() {
        let provider = InMemoryProvider::new(vec![1, 2, 3]);
        let out = provider
            .queryable()
            .await
            .unwrap()
            .select(|v| v * 2)
            .unwrap()
            .to_list(CancellationToken::none())
            .await
            .unwrap();
        assert_eq!(out, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn test_plan_records_applied_stages() {
        let provider = InMemoryProvider::new(vec![1, 2, 3]).with_name("unit");
        let query = provider
            .queryable()
            .await
            .unwrap()
            .select(|v| v + 1)
            .unwrap()
            .skip_while_indexed(|_, i| i < 1)
            .unwrap();
        assert_eq!(query.plan().to_string(), "unit -> Select -> SkipWhileIndexed");
    }

    #[tokio::test]
    async fn test_restricted_provider_rejects_eagerly() {
        let provider = InMemoryProvider::new(vec![1])
            .with_capabilities(CapabilitySet::none().with(Capability::Select));
        let query = provider.queryable().await.unwrap();
        // skip_while is not admitted, and the rejection happens before any
        // terminal call.
        let err = query.skip_while(|_| true).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedOperator { .. }));
    }

    #[tokio::test]
    async fn test_into_stream_yields_elements() {
        use futures::StreamExt;
        let provider = InMemoryProvider::new(vec![7, 8]);
        let mut stream = provider.queryable().await.unwrap().into_stream();
        assert_eq!(stream.next().await.unwrap().unwrap(), 7);
        assert_eq!(stream.next().await.unwrap().unwrap(), 8);
        assert!(stream.next().await.is_none());
    }
}

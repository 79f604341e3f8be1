// SPDX-License-Identifier: MIT OR Apache-2.0

//! Select (projection) stage executors.
//!
//! Indexed variants number elements from 0 over this stage's input; error
//! items neither invoke the selector nor advance the index.

use crate::core::cancellation::{CancellationToken, TokenSlot};
use crate::core::error::QueryResult;
use futures::StreamExt;
use futures::stream::BoxStream;
use std::future::Future;

pub(crate) fn map_sync<T, U, F>(
    input: BoxStream<'static, QueryResult<T>>,
    mut selector: F,
) -> BoxStream<'static, QueryResult<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T) -> U + Send + 'static,
{
    input.map(move |item| item.map(&mut selector)).boxed()
}

pub(crate) fn map_sync_indexed<T, U, F>(
    input: BoxStream<'static, QueryResult<T>>,
    mut selector: F,
) -> BoxStream<'static, QueryResult<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T, usize) -> U + Send + 'static,
{
    let mut index = 0usize;
    input
        .map(move |item| match item {
            Ok(value) => {
                let mapped = selector(value, index);
                index += 1;
                Ok(mapped)
            }
            Err(err) => Err(err),
        })
        .boxed()
}

pub(crate) fn map_async<T, U, F, Fut>(
    input: BoxStream<'static, QueryResult<T>>,
    mut selector: F,
) -> BoxStream<'static, QueryResult<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    input
        .then(move |item| {
            let prepared = match item {
                Ok(value) => Ok(selector(value)),
                Err(err) => Err(err),
            };
            async move {
                match prepared {
                    Ok(fut) => Ok(fut.await),
                    Err(err) => Err(err),
                }
            }
        })
        .boxed()
}

pub(crate) fn map_async_indexed<T, U, F, Fut>(
    input: BoxStream<'static, QueryResult<T>>,
    mut selector: F,
) -> BoxStream<'static, QueryResult<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T, usize) -> Fut + Send + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    let mut index = 0usize;
    input
        .then(move |item| {
            let prepared = match item {
                Ok(value) => {
                    let fut = selector(value, index);
                    index += 1;
                    Ok(fut)
                }
                Err(err) => Err(err),
            };
            async move {
                match prepared {
                    Ok(fut) => Ok(fut.await),
                    Err(err) => Err(err),
                }
            }
        })
        .boxed()
}

/// Token-aware selector: receives the token installed by the terminal
/// operation, read lazily per element from the slot.
pub(crate) fn map_cancellable<T, U, F, Fut>(
    input: BoxStream<'static, QueryResult<T>>,
    mut selector: F,
    slot: TokenSlot,
) -> BoxStream<'static, QueryResult<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = QueryResult<U>> + Send + 'static,
{
    input
        .then(move |item| {
            let prepared = match item {
                Ok(value) => Ok(selector(value, slot.current())),
                Err(err) => Err(err),
            };
            async move {
                match prepared {
                    Ok(fut) => fut.await,
                    Err(err) => Err(err),
                }
            }
        })
        .boxed()
}

pub(crate) fn map_cancellable_indexed<T, U, F, Fut>(
    input: BoxStream<'static, QueryResult<T>>,
    mut selector: F,
    slot: TokenSlot,
) -> BoxStream<'static, QueryResult<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T, usize, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = QueryResult<U>> + Send + 'static,
{
    let mut index = 0usize;
    input
        .then(move |item| {
            let prepared = match item {
                Ok(value) => {
                    let fut = selector(value, index, slot.current());
                    index += 1;
                    Ok(fut)
                }
                Err(err) => Err(err),
            };
            async move {
                match prepared {
                    Ok(fut) => fut.await,
                    Err(err) => Err(err),
                }
            }
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::QueryError;
    use futures::stream;

    fn items(values: Vec<QueryResult<i32>>) -> BoxStream<'static, QueryResult<i32>> {
        stream::iter(values).boxed()
    }

    #[tokio::test]
    async fn test_map_sync_indexed_skips_error_items() {
        let input = items(vec![Ok(10), Err(QueryError::provider("boom")), Ok(20)]);
        let out: Vec<QueryResult<(i32, usize)>> =
            map_sync_indexed(input, |v, i| (v, i)).collect().await;
        assert_eq!(*out[0].as_ref().unwrap(), (10, 0));
        assert!(out[1].is_err());
        // Error item did not consume an index.
        assert_eq!(*out[2].as_ref().unwrap(), (20, 1));
    }

    #[tokio::test]
    async fn test_map_async_awaits_per_element() {
        let input = items(vec![Ok(1), Ok(2)]);
        let out: Vec<QueryResult<i32>> = map_async(input, |v| async move {
            tokio::task::yield_now().await;
            v * 10
        })
        .collect()
        .await;
        let values: Vec<i32> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![10, 20]);
    }

    #[tokio::test]
    async fn test_map_cancellable_sees_uninstalled_slot_as_live() {
        let slot = TokenSlot::new();
        let input = items(vec![Ok(7)]);
        let out: Vec<QueryResult<bool>> =
            map_cancellable(input, |_, token| async move { Ok(token.is_cancelled()) }, slot)
                .collect()
                .await;
        assert_eq!(out.into_iter().map(|r| r.unwrap()).collect::<Vec<_>>(), vec![false]);
    }
}

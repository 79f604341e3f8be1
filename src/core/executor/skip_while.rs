// SPDX-License-Identifier: MIT OR Apache-2.0

//! SkipWhile stage executors.
//!
//! Each executor keeps a skip latch: while the latch is closed the predicate
//! decides whether an element is discarded; the first `false` opens the
//! latch and everything after passes through with the predicate never
//! consulted again. Error items pass through regardless of latch state.
//!
//! Async predicates take elements by value (a clone), since a borrow cannot
//! cross the predicate's await point.

use crate::core::cancellation::{CancellationToken, TokenSlot};
use crate::core::error::QueryResult;
use futures::StreamExt;
use futures::future;
use futures::stream::BoxStream;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) fn skip_sync<T, P>(
    input: BoxStream<'static, QueryResult<T>>,
    mut predicate: P,
) -> BoxStream<'static, QueryResult<T>>
where
    T: Send + 'static,
    P: FnMut(&T) -> bool + Send + 'static,
{
    let mut skipping = true;
    input
        .filter_map(move |item| {
            let keep = match &item {
                Ok(value) if skipping => {
                    if predicate(value) {
                        false
                    } else {
                        skipping = false;
                        true
                    }
                }
                _ => true,
            };
            future::ready(if keep { Some(item) } else { None })
        })
        .boxed()
}

pub(crate) fn skip_sync_indexed<T, P>(
    input: BoxStream<'static, QueryResult<T>>,
    mut predicate: P,
) -> BoxStream<'static, QueryResult<T>>
where
    T: Send + 'static,
    P: FnMut(&T, usize) -> bool + Send + 'static,
{
    let mut skipping = true;
    let mut index = 0usize;
    input
        .filter_map(move |item| {
            let keep = match &item {
                Ok(value) => {
                    let position = index;
                    index += 1;
                    if skipping {
                        if predicate(value, position) {
                            false
                        } else {
                            skipping = false;
                            true
                        }
                    } else {
                        true
                    }
                }
                Err(_) => true,
            };
            future::ready(if keep { Some(item) } else { None })
        })
        .boxed()
}

pub(crate) fn skip_async<T, P, Fut>(
    input: BoxStream<'static, QueryResult<T>>,
    mut predicate: P,
) -> BoxStream<'static, QueryResult<T>>
where
    T: Clone + Send + 'static,
    P: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    // The latch flips based on the awaited predicate result, so it is shared
    // between the sync closure and the async block. filter_map is strictly
    // sequential, hence relaxed ordering.
    let skipping = Arc::new(AtomicBool::new(true));
    input
        .filter_map(move |item| {
            let skipping = Arc::clone(&skipping);
            let pending = match &item {
                Ok(value) if skipping.load(Ordering::Relaxed) => Some(predicate(value.clone())),
                _ => None,
            };
            async move {
                match pending {
                    Some(fut) => {
                        if fut.await {
                            None
                        } else {
                            skipping.store(false, Ordering::Relaxed);
                            Some(item)
                        }
                    }
                    None => Some(item),
                }
            }
        })
        .boxed()
}

pub(crate) fn skip_async_indexed<T, P, Fut>(
    input: BoxStream<'static, QueryResult<T>>,
    mut predicate: P,
) -> BoxStream<'static, QueryResult<T>>
where
    T: Clone + Send + 'static,
    P: FnMut(T, usize) -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    let skipping = Arc::new(AtomicBool::new(true));
    let mut index = 0usize;
    input
        .filter_map(move |item| {
            let skipping = Arc::clone(&skipping);
            let pending = match &item {
                Ok(value) => {
                    let position = index;
                    index += 1;
                    if skipping.load(Ordering::Relaxed) {
                        Some(predicate(value.clone(), position))
                    } else {
                        None
                    }
                }
                Err(_) => None,
            };
            async move {
                match pending {
                    Some(fut) => {
                        if fut.await {
                            None
                        } else {
                            skipping.store(false, Ordering::Relaxed);
                            Some(item)
                        }
                    }
                    None => Some(item),
                }
            }
        })
        .boxed()
}

/// Token-aware predicate; a predicate error replaces the element in the
/// output stream and leaves the latch closed.
pub(crate) fn skip_cancellable<T, P, Fut>(
    input: BoxStream<'static, QueryResult<T>>,
    mut predicate: P,
    slot: TokenSlot,
) -> BoxStream<'static, QueryResult<T>>
where
    T: Clone + Send + 'static,
    P: FnMut(T, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = QueryResult<bool>> + Send + 'static,
{
    let skipping = Arc::new(AtomicBool::new(true));
    input
        .filter_map(move |item| {
            let skipping = Arc::clone(&skipping);
            let pending = match &item {
                Ok(value) if skipping.load(Ordering::Relaxed) => {
                    Some(predicate(value.clone(), slot.current()))
                }
                _ => None,
            };
            async move {
                match pending {
                    Some(fut) => match fut.await {
                        Ok(true) => None,
                        Ok(false) => {
                            skipping.store(false, Ordering::Relaxed);
                            Some(item)
                        }
                        Err(err) => Some(Err(err)),
                    },
                    None => Some(item),
                }
            }
        })
        .boxed()
}

pub(crate) fn skip_cancellable_indexed<T, P, Fut>(
    input: BoxStream<'static, QueryResult<T>>,
    mut predicate: P,
    slot: TokenSlot,
) -> BoxStream<'static, QueryResult<T>>
where
    T: Clone + Send + 'static,
    P: FnMut(T, usize, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = QueryResult<bool>> + Send + 'static,
{
    let skipping = Arc::new(AtomicBool::new(true));
    let mut index = 0usize;
    input
        .filter_map(move |item| {
            let skipping = Arc::clone(&skipping);
            let pending = match &item {
                Ok(value) => {
                    let position = index;
                    index += 1;
                    if skipping.load(Ordering::Relaxed) {
                        Some(predicate(value.clone(), position, slot.current()))
                    } else {
                        None
                    }
                }
                Err(_) => None,
            };
            async move {
                match pending {
                    Some(fut) => match fut.await {
                        Ok(true) => None,
                        Ok(false) => {
                            skipping.store(false, Ordering::Relaxed);
                            Some(item)
                        }
                        Err(err) => Some(Err(err)),
                    },
                    None => Some(item),
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
    use std::sync::atomic::AtomicUsize;

    fn items(values: Vec<i32>) -> BoxStream<'static, QueryResult<i32>> {
        stream::iter(values.into_iter().map(Ok)).boxed()
    }

    async fn values(stream: BoxStream<'static, QueryResult<i32>>) -> Vec<i32> {
        stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_latch_opens_once() {
        // 5 after the latch opens must survive even though it matches.
        let out = values(skip_sync(items(vec![5, 6, 1, 5, 2]), |v| *v >= 5)).await;
        assert_eq!(out, vec![1, 5, 2]);
    }

    #[tokio::test]
    async fn test_predicate_not_consulted_after_latch_opens() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let out = values(skip_sync(items(vec![5, 1, 5, 5]), move |v| {
            seen.fetch_add(1, Ordering::Relaxed);
            *v >= 5
        }))
        .await;
        assert_eq!(out, vec![1, 5, 5]);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_all_matching_yields_empty() {
        let out = values(skip_sync(items(vec![1, 2, 3]), |_| true)).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_indexed_positions_count_input() {
        // Skip while index < 2, regardless of value.
        let out = values(skip_sync_indexed(items(vec![9, 9, 9, 9]), |_, i| i < 2)).await;
        assert_eq!(out, vec![9, 9]);
    }

    #[tokio::test]
    async fn test_error_passes_through_while_skipping() {
        let input: Vec<QueryResult<i32>> =
            vec![Ok(5), Err(QueryError::provider("boom")), Ok(1), Ok(2)];
        let out: Vec<QueryResult<i32>> = skip_sync(stream::iter(input).boxed(), |v| *v >= 5)
            .collect()
            .await;
        assert!(out[0].is_err());
        assert_eq!(*out[1].as_ref().unwrap(), 1);
        assert_eq!(*out[2].as_ref().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_async_latch() {
        let out = values(skip_async(items(vec![1, 2, 3, 1]), |v| async move { v < 3 })).await;
        assert_eq!(out, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_async_predicate_not_consulted_after_latch_opens() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let out = values(skip_async(items(vec![5, 1, 5, 5]), move |v| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::Relaxed);
                v >= 5
            }
        }))
        .await;
        assert_eq!(out, vec![1, 5, 5]);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_cancellable_predicate_error_surfaces() {
        let slot = TokenSlot::new();
        let out: Vec<QueryResult<i32>> = skip_cancellable(
            items(vec![1, 2]),
            |_, _| async move { Err(QueryError::provider("predicate backend down")) },
            slot,
        )
        .collect()
        .await;
        assert!(out[0].is_err());
        assert!(out[1].is_err());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stage executors.
//!
//! One module per operator family, in the same shape: a function that wraps
//! the previous stage's stream into the next stage's stream. Error items
//! always pass through untouched; selectors and predicates are never invoked
//! on them. Terminal drains live here too so the cancellation-check cadence
//! is in one place.

pub(crate) mod select;
pub(crate) mod sequence_equal;
pub(crate) mod skip_while;

use crate::core::cancellation::CancellationToken;
use crate::core::error::QueryResult;
use futures::StreamExt;
use futures::stream::BoxStream;
use log::trace;

/// Materialize the pipeline into a `Vec`, checking the token before the
/// first element and after every awaited item.
pub(crate) async fn drain<T>(
    mut stream: BoxStream<'static, QueryResult<T>>,
    token: &CancellationToken,
    stage: &str,
) -> QueryResult<Vec<T>>
where
    T: Send,
{
    token.error_if_cancelled(stage)?;
    let mut out = Vec::new();
    while let Some(item) = stream.next().await {
        token.error_if_cancelled(stage)?;
        out.push(item?);
    }
    trace!("{}: drained {} elements", stage, out.len());
    Ok(out)
}

/// Count the pipeline's elements without materializing them.
pub(crate) async fn count<T>(
    mut stream: BoxStream<'static, QueryResult<T>>,
    token: &CancellationToken,
    stage: &str,
) -> QueryResult<usize>
where
    T: Send,
{
    token.error_if_cancelled(stage)?;
    let mut total = 0usize;
    while let Some(item) = stream.next().await {
        token.error_if_cancelled(stage)?;
        item?;
        total += 1;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cancellation::CancellationSource;
    use crate::core::error::QueryError;
    use futures::stream;

    fn ok_stream(values: Vec<i32>) -> BoxStream<'static, QueryResult<i32>> {
        stream::iter(values.into_iter().map(Ok)).boxed()
    }

    #[tokio::test]
    async fn test_drain_collects_everything() {
        let token = CancellationToken::none();
        let out = drain(ok_stream(vec![1, 2, 3]), &token, "to_list")
            .await
            .unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_drain_rejects_pre_cancelled_token() {
        let source = CancellationSource::new();
        source.cancel();
        let err = drain(ok_stream(vec![1]), &source.token(), "to_list")
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_drain_surfaces_stream_errors() {
        let items: Vec<QueryResult<i32>> =
            vec![Ok(1), Err(QueryError::provider("backing store gone"))];
        let err = drain(
            stream::iter(items).boxed(),
            &CancellationToken::none(),
            "to_list",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, QueryError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_count_does_not_need_clone() {
        let token = CancellationToken::none();
        let total = count(ok_stream(vec![4, 5, 6, 7]), &token, "count")
            .await
            .unwrap();
        assert_eq!(total, 4);
    }
}

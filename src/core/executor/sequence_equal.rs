// SPDX-License-Identifier: MIT OR Apache-2.0

//! SequenceEqual terminal executor.
//!
//! Ordered pairwise comparison of two pipelines. Two empty sequences are
//! equal; a length mismatch is decided as soon as one side ends. The token
//! is checked before the first pair and between pairs.

use crate::core::cancellation::CancellationToken;
use crate::core::error::QueryResult;
use futures::StreamExt;
use futures::stream::BoxStream;

pub(crate) async fn compare<T, C>(
    mut left: BoxStream<'static, QueryResult<T>>,
    mut right: BoxStream<'static, QueryResult<T>>,
    mut comparer: C,
    token: CancellationToken,
) -> QueryResult<bool>
where
    T: Send,
    C: FnMut(&T, &T) -> bool + Send,
{
    loop {
        token.error_if_cancelled("sequence_equal")?;
        let lhs = left.next().await.transpose()?;
        let rhs = right.next().await.transpose()?;
        match (lhs, rhs) {
            (Some(a), Some(b)) => {
                if !comparer(&a, &b) {
                    return Ok(false);
                }
            }
            (None, None) => return Ok(true),
            // Length mismatch; no need to drain the longer side.
            _ => return Ok(false),
        }
    }
}

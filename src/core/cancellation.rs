// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cooperative cancellation.
//!
//! Terminal operations take a [`CancellationToken`] and check it before
//! starting and between elements. Token-aware selectors and predicates
//! receive a clone of the same token via the slot installed at terminal
//! time.

use crate::core::error::{QueryError, QueryResult};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Owner side of a cancellation pair.
#[derive(Clone, Debug, Default)]
pub struct CancellationSource {
    flag: Arc<AtomicBool>,
}

impl CancellationSource {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Observed by every token handed out by this
    /// source; idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
        debug!("cancellation requested");
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            flag: Some(Arc::clone(&self.flag)),
        }
    }
}

/// Cheap cloneable handle for observing cancellation.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    /// `None` is the never-cancelled sentinel.
    flag: Option<Arc<AtomicBool>>,
}

impl CancellationToken {
    /// A token that is never cancelled.
    pub fn none() -> Self {
        Self { flag: None }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.flag {
            Some(flag) => flag.load(Ordering::Relaxed),
            None => false,
        }
    }

    /// `Err(QueryError::Cancelled)` naming `stage` if cancellation was
    /// requested, `Ok(())` otherwise.
    pub fn error_if_cancelled(&self, stage: &str) -> QueryResult<()> {
        if self.is_cancelled() {
            Err(QueryError::cancelled(stage))
        } else {
            Ok(())
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::none()
    }
}

/// Deferred token wiring between a queryable's stages and its terminal
/// operation. Stages capture a clone of the slot when the pipeline is built;
/// the terminal operation installs the caller's token before consuming the
/// stream. Reads before installation observe the never-cancelled token.
#[derive(Clone, Debug, Default)]
pub(crate) struct TokenSlot {
    cell: Arc<OnceLock<CancellationToken>>,
}

impl TokenSlot {
    pub(crate) fn new() -> Self {
        Self {
            cell: Arc::new(OnceLock::new()),
        }
    }

    /// Install the terminal operation's token. First installation wins; a
    /// queryable is consumed by exactly one terminal call.
    pub(crate) fn install(&self, token: CancellationToken) {
        let _ = self.cell.set(token);
    }

    pub(crate) fn current(&self) -> CancellationToken {
        self.cell.get().cloned().unwrap_or_else(CancellationToken::none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_and_token() {
        let source = CancellationSource::new();
        let token = source.token();
        assert!(!token.is_cancelled());
        assert!(token.error_if_cancelled("to_list").is_ok());

        source.cancel();
        assert!(token.is_cancelled());
        let err = token.error_if_cancelled("to_list").unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_none_token_never_cancels() {
        let token = CancellationToken::none();
        assert!(!token.is_cancelled());
        assert!(token.error_if_cancelled("count").is_ok());
    }

    #[test]
    fn test_token_slot_defaults_to_none() {
        let slot = TokenSlot::new();
        assert!(!slot.current().is_cancelled());

        let source = CancellationSource::new();
        source.cancel();
        slot.install(source.token());
        assert!(slot.current().is_cancelled());
    }

    #[test]
    fn test_token_slot_first_install_wins() {
        let slot = TokenSlot::new();
        let source = CancellationSource::new();
        slot.install(source.token());
        slot.install(CancellationToken::none());
        source.cancel();
        assert!(slot.current().is_cancelled());
    }
}

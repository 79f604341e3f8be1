// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query runtime error types.
//!
//! One taxonomy for the whole pipeline: eager validation failures surface at
//! operator-application time, cancellation and provider failures surface from
//! the awaited terminal operation.

use thiserror::Error;

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors produced while building or executing a query
#[derive(Error, Debug)]
pub enum QueryError {
    /// The cancellation token installed by the terminal operation was
    /// observed cancelled. `stage` names the operation that saw it.
    #[error("Query cancelled during '{stage}'")]
    Cancelled { stage: String },

    /// The provider does not declare the capability the operator requires.
    /// Raised at operator-application time, before any enumeration.
    #[error("Operator '{operator}' is not supported by provider '{provider}'")]
    UnsupportedOperator { operator: String, provider: String },

    /// A structurally invalid argument, rejected before any enumeration.
    #[error("Invalid argument '{parameter:?}': {message}")]
    InvalidArgument {
        message: String,
        parameter: Option<String>,
    },

    /// A backing-provider failure surfaced through the pipeline.
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

// Custom error creation helpers
impl QueryError {
    /// Create a cancellation error for the named stage
    pub fn cancelled(stage: impl Into<String>) -> Self {
        Self::Cancelled {
            stage: stage.into(),
        }
    }

    /// Create an unsupported-operator error
    pub fn unsupported(operator: impl Into<String>, provider: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            operator: operator.into(),
            provider: provider.into(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            parameter: None,
        }
    }

    /// Create an invalid-argument error naming the offending parameter
    pub fn invalid_argument_with_parameter(
        message: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            parameter: Some(parameter.into()),
        }
    }

    /// Create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Create a provider error with an underlying cause
    pub fn provider_with_source(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Provider {
            message: message.into(),
            source: Some(source),
        }
    }

    /// True if this error is a cancellation observation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error() {
        let error = QueryError::cancelled("to_list");
        assert!(error.is_cancelled());
        assert_eq!(error.to_string(), "Query cancelled during 'to_list'");
    }

    #[test]
    fn test_unsupported_error() {
        let error = QueryError::unsupported("SelectAsync", "memory");
        assert!(matches!(error, QueryError::UnsupportedOperator { .. }));
        assert!(!error.is_cancelled());
    }

    #[test]
    fn test_invalid_argument_error() {
        let error = QueryError::invalid_argument_with_parameter("must not be empty", "name");
        assert!(matches!(
            error,
            QueryError::InvalidArgument {
                parameter: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_provider_error_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "backing store gone");
        let error = QueryError::provider_with_source("read failed", Box::new(io));
        assert!(matches!(
            error,
            QueryError::Provider {
                source: Some(_),
                ..
            }
        ));
    }
}

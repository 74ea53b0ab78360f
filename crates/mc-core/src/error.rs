//! Core error type.
//!
//! Sub-crates define their own error enums and convert `CoreError` into them
//! via `From`, so configuration problems surface with the same message no
//! matter which layer rejected them.

use thiserror::Error;

/// Errors raised while validating ids and configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{what} count {got} does not fit in its id type")]
    IdOverflow {
        what: &'static str,
        got:  usize,
    },
}

/// Shorthand result type for `mc-core`.
pub type CoreResult<T> = Result<T, CoreError>;

//! Cross-cutting error types for Palanquée.
//!
//! Storage errors (`DatabaseError`) and configuration errors (`ConfigError`)
//! live in their respective crates. `CoreError` covers failures raised by the
//! pure domain code in this crate.

use thiserror::Error;

/// Errors that can be raised by the domain layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation, such as a rating outside 1..=3.
    #[error("Validation error: {0}")]
    Validation(String),
}

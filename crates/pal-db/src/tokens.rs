//! Evaluation link tokens.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::DatabaseError;

/// Random bytes per token (256 bits).
const TOKEN_BYTES: usize = 32;

/// A fresh unguessable URL-safe token from the OS CSPRNG.
///
/// # Errors
///
/// Returns `DatabaseError::Other` if the OS random source is unavailable.
pub fn new_token() -> Result<String, DatabaseError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut bytes)
        .map_err(|e| DatabaseError::Other(anyhow::anyhow!("random source unavailable: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

// crates/aecp-core/src/hashing.rs
// ============================================================================
// Module: Content Hashing
// Description: RFC 8785 canonical JSON plus SHA-256 content hashes for
//              audit-chain links and idempotency keys.
// Purpose: Give every hash the plane computes one deterministic,
//          canonicalization-first implementation.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! `spec.md` fixes the hash function at SHA-256 everywhere a hash appears
//! — audit-entry content hashes (§3, §4.6) and the idempotency key (§4.5)
//! — so, unlike a general-purpose hashing utility, this module carries no
//! algorithm-selection knob: there is only ever one algorithm to select.
//! What it does carry is RFC 8785 (JCS) canonicalization: two callers who
//! construct logically-equal JSON values always agree on the digest,
//! regardless of field insertion order, which is what lets the audit
//! chain's `previous_hash` links and the outbox's idempotency keys stay
//! stable across process restarts and re-serialization.

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

/// Errors raised when computing a content hash.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed (e.g. the value contains a non-finite
    /// float, which RFC 8785 cannot represent).
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes a serializable value's RFC 8785 canonical form with SHA-256,
/// returning a lowercase hex digest. Used for audit-entry content hashes
/// and idempotency keys — every content hash the plane computes goes
/// through this one function.
///
/// # Errors
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> Result<String, HashError> {
    let bytes = canonical_json_bytes(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();
    Ok(hex_encode(&digest))
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

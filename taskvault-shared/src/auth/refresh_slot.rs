//! Refresh token session slot
//!
//! Each user record holds at most one refresh token, stored as its SHA-256
//! digest. Issuing a new refresh token overwrites the slot, which invalidates
//! the previous one immediately. A presented token is accepted only while its
//! digest is the one in the slot.
//!
//! # Example
//!
//! ```
//! use taskvault_shared::auth::refresh_slot::{digest_token, slot_matches};
//!
//! let stored = Some(digest_token("token-a"));
//!
//! assert!(slot_matches(stored.as_deref(), "token-a"));
//! assert!(!slot_matches(stored.as_deref(), "token-b"));
//! assert!(!slot_matches(None, "token-a"));
//! ```

use sha2::{Digest, Sha256};

/// Length of a hex-encoded digest
pub const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 digest of a token, hex-encoded
pub fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Checks a presented token against the stored slot
///
/// An empty slot (after logout, or before the first login) never matches.
pub fn slot_matches(stored_digest: Option<&str>, presented: &str) -> bool {
    match stored_digest {
        Some(stored) => constant_time_compare(stored, &digest_token(presented)),
        None => false,
    }
}

/// Constant-time string comparison
///
/// Runs in time proportional to the input length regardless of where the
/// first mismatch is. Inputs of different length are unequal.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

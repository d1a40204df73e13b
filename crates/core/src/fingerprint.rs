// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request fingerprinting for duplicate suppression.
//!
//! The fingerprint is a stable 32-bit digest of the exact request bytes.
//! Two equal bodies always collide; unequal bodies collide rarely enough
//! that suppressing one as a duplicate is an accepted failure mode — the
//! key advises, it does not prove.

use sha2::{Digest, Sha256};

/// Digest the raw request bytes down to a 32-bit key.
pub fn fingerprint(raw: &[u8]) -> i32 {
    let digest = Sha256::digest(raw);
    i32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Hex form of a fingerprint, as handed to the orchestrator for its own
/// idempotency checks.
pub fn fingerprint_hex(key: i32) -> String {
    format!("{:x}", key as u32)
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;

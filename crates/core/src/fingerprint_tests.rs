// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn same_bytes_same_key() {
    let a = fingerprint(b"{\"model_id\":\"m\"}");
    let b = fingerprint(b"{\"model_id\":\"m\"}");
    assert_eq!(a, b);
}

#[test]
fn different_bytes_different_key() {
    // Not guaranteed in general, but these two must not collide for the
    // dedup tests to mean anything.
    let a = fingerprint(b"{\"run_id\":\"1\"}");
    let b = fingerprint(b"{\"run_id\":\"2\"}");
    assert_ne!(a, b);
}

#[test]
fn hex_form_is_unsigned() {
    let key = fingerprint(b"some body");
    let hex = fingerprint_hex(key);
    assert!(u32::from_str_radix(&hex, 16).is_ok());
    // Negative keys must not render with a sign.
    assert!(!fingerprint_hex(-1).starts_with('-'));
    assert_eq!(fingerprint_hex(-1), "ffffffff");
}

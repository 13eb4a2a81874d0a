// crates/query-shield-core/tests/hashing.rs
// ============================================================================
// Module: Content Hashing Tests
// Description: Integration tests for query content digests.
// Purpose: Pin digest values and the digest wire encoding.
// ============================================================================

//! Integration tests for content hashing.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use query_shield_core::DEFAULT_HASH_ALGORITHM;
use query_shield_core::HashAlgorithm;
use query_shield_core::hash_bytes;

/// Verifies the digest matches the published SHA-256 test vectors.
#[test]
fn sha256_matches_known_vectors() {
    let empty = hash_bytes(HashAlgorithm::Sha256, b"");
    assert_eq!(empty.value, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");

    let abc = hash_bytes(HashAlgorithm::Sha256, b"abc");
    assert_eq!(abc.value, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    assert_eq!(abc.algorithm, HashAlgorithm::Sha256);
}

/// Verifies equal bytes produce equal digests and the default algorithm holds.
#[test]
fn digests_are_deterministic() {
    let first = hash_bytes(DEFAULT_HASH_ALGORITHM, b"query { users }");
    let second = hash_bytes(DEFAULT_HASH_ALGORITHM, b"query { users }");
    assert_eq!(first, second);
    assert_eq!(first.algorithm, HashAlgorithm::Sha256);
    assert_eq!(first.value.len(), 64);
}

/// Verifies the digest serializes with a snake_case algorithm label.
#[test]
fn digest_serializes_with_algorithm_label() {
    let digest = hash_bytes(HashAlgorithm::Sha256, b"abc");
    let value = serde_json::to_value(&digest).expect("digest encodes");
    assert_eq!(value["algorithm"], "sha256");
    assert_eq!(
        value["value"],
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

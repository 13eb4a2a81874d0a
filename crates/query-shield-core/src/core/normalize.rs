// crates/query-shield-core/src/core/normalize.rs
// ============================================================================
// Module: Query Shield Normalizer
// Description: Whitespace canonicalization for GraphQL query documents.
// Purpose: Make semantically identical documents compare byte-equal.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The normalizer collapses whitespace in a query document while preserving
//! string-literal contents, so that every formatting of the same document maps
//! to one canonical byte sequence. Whitelist lookups key on that sequence.
//! The scan is O(n) and compacts the buffer in place without allocating.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while normalizing a query document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Input buffer contained no bytes.
    #[error("empty query")]
    EmptyQuery,
    /// Scan ended inside an open string literal.
    #[error("unclosed string")]
    UnclosedString,
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Normalizes a query buffer in place, truncating it to the compacted form.
///
/// # Errors
///
/// Returns [`NormalizeError::EmptyQuery`] when the buffer is empty and
/// [`NormalizeError::UnclosedString`] when the scan ends inside a string
/// literal. The buffer is left unchanged on the empty-input error and holds
/// partially compacted bytes on the unclosed-literal error.
pub fn normalize(buffer: &mut Vec<u8>) -> Result<(), NormalizeError> {
    let compacted = normalize_in_place(buffer.as_mut_slice())?;
    buffer.truncate(compacted);
    Ok(())
}

/// Compacts a query buffer in place and returns the normalized length.
///
/// Outside string literals, each maximal run of whitespace (space, tab,
/// newline) collapses to a single space; runs at the very start or end of the
/// buffer are deleted. Whitespace inside an open string literal is copied
/// through unchanged, and a backslash escapes the following byte only inside
/// a literal. The returned length aliases the input buffer; callers needing
/// the original bytes must copy first.
///
/// # Invariants
/// - Normalizing already-normalized text is a no-op.
///
/// # Errors
///
/// Returns [`NormalizeError::EmptyQuery`] when the buffer is empty and
/// [`NormalizeError::UnclosedString`] when the scan ends inside a string
/// literal.
pub fn normalize_in_place(buffer: &mut [u8]) -> Result<usize, NormalizeError> {
    if buffer.is_empty() {
        return Err(NormalizeError::EmptyQuery);
    }

    let mut write = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut pending_space = false;

    for read in 0 .. buffer.len() {
        let byte = buffer[read];

        if in_string {
            buffer[write] = byte;
            write += 1;
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        if is_collapsible(byte) {
            // Runs before the first visible byte are dropped outright.
            if write > 0 {
                pending_space = true;
            }
            continue;
        }

        if pending_space {
            buffer[write] = b' ';
            write += 1;
            pending_space = false;
        }
        buffer[write] = byte;
        write += 1;
        if byte == b'"' {
            in_string = true;
        }
    }

    if in_string {
        return Err(NormalizeError::UnclosedString);
    }

    Ok(write)
}

/// Returns whether a byte belongs to a collapsible whitespace run.
const fn is_collapsible(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n')
}

//! Output Evaluator - Whitespace-Tolerant Comparison
//!
//! **Core Responsibility:**
//! Decide whether the solution's output matches the expected output.
//!
//! **Critical Properties:**
//! - Knows nothing about processes or compilers
//! - Knows nothing about the result log
//! - `normalize` is a pure function; `compare` only reads files
//!
//! **Normalization Rules (applied to both sides, in order):**
//! 1. Trim leading and trailing whitespace, newlines and byte-order marks included
//! 2. Drop every carriage return (\r\n vs \n)
//! 3. Replace every `" \n"` with `"\n"` (one trailing space per line, single pass)
//!
//! **Preserves:**
//! - Case sensitivity
//! - Internal whitespace other than the above
//! - Empty lines within content

use crate::error::SessionError;
use std::path::Path;

/// Canonicalize an output blob for comparison
pub fn normalize(output: &str) -> String {
    output
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .replace('\r', "")
        .replace(" \n", "\n")
}

/// Compare two blobs after normalization
pub fn outputs_match(expected: &str, actual: &str) -> bool {
    normalize(expected) == normalize(actual)
}

/// Read a produced or author-provided text file.
/// Invalid UTF-8 is replaced rather than rejected so binary noise still compares.
pub async fn read_text(path: &Path) -> Result<String, SessionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SessionError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Compare the expected output file against the produced output file
///
/// ## Returns
/// `true` when both files are equal after normalization.
/// Fails with `SessionError::Io` when either file cannot be read.
pub async fn compare(expected_path: &Path, actual_path: &Path) -> Result<bool, SessionError> {
    let expected = read_text(expected_path).await?;
    let actual = read_text(actual_path).await?;
    Ok(outputs_match(&expected, &actual))
}

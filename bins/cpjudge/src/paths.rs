// Solution path refinement
use cpjudge_common::types::OsKind;
use std::path::PathBuf;

pub trait PathResolver: Send + Sync {
    /// Turn a user- or editor-supplied path into the path the harness works with
    fn refine_path(&self, raw: &str, os: OsKind) -> PathBuf;
}

/// Strips `file://` URIs, normalizes Windows separators and canonicalizes
/// paths that exist. Missing paths are returned as given so the caller can
/// report them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPathResolver;

impl PathResolver for DefaultPathResolver {
    fn refine_path(&self, raw: &str, os: OsKind) -> PathBuf {
        let trimmed = raw.trim();
        let mut path = trimmed.strip_prefix("file://").unwrap_or(trimmed).to_string();

        if os == OsKind::Windows {
            path = path.replace('\\', "/");
            // "/c:/x" from a URI becomes "c:/x"
            let bytes = path.as_bytes();
            if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':' {
                path.remove(0);
            }
            return PathBuf::from(path);
        }

        let path = PathBuf::from(path);
        std::fs::canonicalize(&path).unwrap_or(path)
    }
}

//! Per-book cache identity: mtime + size + partial content hash
//!
//! Mirrors the slug-generation and cache-key approach of this repository's
//! earlier single-mtime cache, extended with the richer four-field identity
//! a concurrent catalog needs to avoid serving a stale parse.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use sha1::{Digest, Sha1};

use crate::book::Book;
use crate::error::SwatchResult;
use crate::repository::expert_index::ExpertIndex;

/// Bytes hashed from the start of the file to fingerprint it cheaply
const PARTIAL_HASH_BYTES: u64 = 64 * 1024;

/// `(mtime, size, partial_hash)` identity of a file on disk, used to decide
/// whether a cached parse is still valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheIdentity {
    /// Last-modified time at the moment of computation
    pub mtime: SystemTime,
    /// File size in bytes
    pub size: u64,
    /// Hex-encoded SHA-1 of the first 64 KiB
    pub partial_hash: String,
}

impl CacheIdentity {
    /// Stat and partially hash `path`
    pub fn compute(path: &Path) -> SwatchResult<Self> {
        let metadata = std::fs::metadata(path)?;
        let mtime = metadata.modified()?;
        let size = metadata.len();
        let partial_hash = partial_hash(path)?;
        Ok(Self {
            mtime,
            size,
            partial_hash,
        })
    }
}

fn partial_hash(path: &Path) -> SwatchResult<String> {
    let file = File::open(path)?;
    let mut limited = file.take(PARTIAL_HASH_BYTES);
    let mut buffer = Vec::new();
    limited.read_to_end(&mut buffer)?;

    let mut hasher = Sha1::new();
    hasher.update(&buffer);
    let digest = hasher.finalize();
    Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
}

/// A cached parse outcome for one catalog entry, keyed by [`CacheIdentity`]
pub struct CacheEntry {
    /// Identity fields the parse was computed against
    pub identity: CacheIdentity,
    /// The parsed book, or the error message captured instead of panicking
    /// the whole catalog refresh
    pub outcome: Result<Arc<Book>, String>,
    /// Lazily built and disk-cached expert index, once requested
    pub expert_index: Option<Arc<ExpertIndex>>,
}

/// Derive a stable, unique, filesystem-safe id from a seed string
/// (`<stem>-<ext>`), collapsing non-alphanumerics to `-` and disambiguating
/// collisions with a numeric suffix.
pub fn unique_slug(seed: &str, used: &mut HashSet<String>) -> String {
    let mut base = String::new();
    let mut last_was_dash = false;
    for ch in seed.trim().to_ascii_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            base.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            base.push('-');
            last_was_dash = true;
        }
    }
    let base = base.trim_matches('-');
    let base = if base.is_empty() { "book" } else { base };

    if !used.contains(base) {
        used.insert(base.to_string());
        return base.to_string();
    }

    let mut index = 2u32;
    loop {
        let candidate = format!("{base}-{index}");
        if !used.contains(&candidate) {
            used.insert(candidate.clone());
            return candidate;
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_collapse_non_alphanumerics() {
        let mut used = HashSet::new();
        assert_eq!(unique_slug("Pantone Solid Coated-v4-acb", &mut used), "pantone-solid-coated-v4-acb");
    }

    #[test]
    fn colliding_slugs_get_numeric_suffixes() {
        let mut used = HashSet::new();
        assert_eq!(unique_slug("A!!B", &mut used), "a-b");
        assert_eq!(unique_slug("A??B", &mut used), "a-b-2");
        assert_eq!(unique_slug("A??B", &mut used), "a-b-3");
    }

    #[test]
    fn empty_seed_falls_back_to_book() {
        let mut used = HashSet::new();
        assert_eq!(unique_slug("...", &mut used), "book");
    }
}

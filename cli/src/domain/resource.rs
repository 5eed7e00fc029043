//! Filesystem resource specs consumed by the reconciler.

use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// What to do when the resource already exists with different content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentPolicy {
    /// Re-apply the source content on every run.
    OverwriteAlways,
    /// Write only when the file is missing (first-run defaults).
    CreateIfAbsent,
}

/// Expected format of a fetched asset body. Anything that fails the format
/// check is treated like a fetch failure: the previous copy is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchedFormat {
    Opaque,
    Yaml,
    Json,
}

impl FetchedFormat {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Opaque => "opaque",
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }
}

/// The three resource kinds the reconciler knows how to ensure.
#[derive(Debug, Clone)]
pub enum ResourceKind {
    Directory,
    Fetched {
        url: String,
        policy: ContentPolicy,
        format: FetchedFormat,
    },
    Generated {
        content: String,
        policy: ContentPolicy,
        /// Unix permission bits for the written file, when restricting access
        /// matters (credentials). `None` keeps the platform default.
        mode: Option<u32>,
    },
}

/// A declared filesystem resource: reconciling the same spec twice produces
/// the same end state.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    /// Short name used in operator-facing messages.
    pub name: &'static str,
    pub path: PathBuf,
    pub kind: ResourceKind,
}

/// Outcome of reconciling a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileResult {
    Created,
    AlreadyPresent,
    Overwritten,
}

impl ReconcileResult {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyPresent => "already present",
            Self::Overwritten => "refreshed",
        }
    }
}

/// SHA-256 hex digest of a byte slice, used to decide whether an
/// overwrite-always resource actually changed.
#[must_use]
pub fn content_digest(data: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for &b in digest.iter() {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_digest_is_stable() {
        assert_eq!(content_digest(b"abc"), content_digest(b"abc"));
        assert_ne!(content_digest(b"abc"), content_digest(b"abd"));
    }

    #[test]
    fn content_digest_of_empty_input_matches_known_sha256() {
        assert_eq!(
            content_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

//! Resource reconciliation: bring declared filesystem resources in line with
//! their specs without erroring when they are already correct.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};

use crate::application::ports::{AssetFetcher, LocalFs};
use crate::domain::error::FetchError;
use crate::domain::resource::{
    ContentPolicy, FetchedFormat, ReconcileResult, ResourceKind, ResourceSpec, content_digest,
};

/// Ensure one resource matches its spec.
///
/// Safe to run any number of times: a second run with unchanged inputs is a
/// no-op (`AlreadyPresent`) for directories and create-if-absent files, and a
/// deterministic refresh for overwrite-always files.
///
/// # Errors
///
/// Fetch failures propagate as [`FetchError`] inside the `anyhow` chain so
/// the orchestrator can downgrade them to warnings (the previous local copy,
/// if any, is left untouched). Filesystem failures propagate as-is.
pub fn reconcile(
    fs: &impl LocalFs,
    fetcher: &impl AssetFetcher,
    spec: &ResourceSpec,
) -> Result<ReconcileResult> {
    match &spec.kind {
        ResourceKind::Directory => reconcile_directory(fs, spec),
        ResourceKind::Fetched {
            url,
            policy,
            format,
        } => reconcile_fetched(fs, fetcher, spec, url, *policy, *format),
        ResourceKind::Generated {
            content,
            policy,
            mode,
        } => reconcile_generated(fs, spec, content, *policy, *mode),
    }
}

fn reconcile_directory(fs: &impl LocalFs, spec: &ResourceSpec) -> Result<ReconcileResult> {
    if fs.exists(&spec.path) {
        return Ok(ReconcileResult::AlreadyPresent);
    }
    fs.create_dir_all(&spec.path)
        .with_context(|| format!("creating {} directory", spec.name))?;
    Ok(ReconcileResult::Created)
}

fn reconcile_fetched(
    fs: &impl LocalFs,
    fetcher: &impl AssetFetcher,
    spec: &ResourceSpec,
    url: &str,
    policy: ContentPolicy,
    format: FetchedFormat,
) -> Result<ReconcileResult> {
    let existed = fs.exists(&spec.path);
    if policy == ContentPolicy::CreateIfAbsent && existed {
        return Ok(ReconcileResult::AlreadyPresent);
    }

    let body = fetcher.fetch(url)?;
    check_format(url, format, &body)?;

    if existed {
        let current = fs
            .read(&spec.path)
            .with_context(|| format!("reading existing {}", spec.name))?;
        if content_digest(&current) == content_digest(&body) {
            return Ok(ReconcileResult::AlreadyPresent);
        }
    }

    fs.write_atomic(&spec.path, &body, None)
        .with_context(|| format!("writing {}", spec.name))?;
    Ok(if existed {
        ReconcileResult::Overwritten
    } else {
        ReconcileResult::Created
    })
}

fn reconcile_generated(
    fs: &impl LocalFs,
    spec: &ResourceSpec,
    content: &str,
    policy: ContentPolicy,
    mode: Option<u32>,
) -> Result<ReconcileResult> {
    let existed = fs.exists(&spec.path);
    if policy == ContentPolicy::CreateIfAbsent && existed {
        return Ok(ReconcileResult::AlreadyPresent);
    }
    fs.write_atomic(&spec.path, content.as_bytes(), mode)
        .with_context(|| format!("writing {}", spec.name))?;
    Ok(if existed {
        ReconcileResult::Overwritten
    } else {
        ReconcileResult::Created
    })
}

/// Reject fetched bodies that do not parse as the declared format, so a
/// half-served or error-page response never replaces a working manifest.
fn check_format(url: &str, format: FetchedFormat, body: &[u8]) -> Result<(), FetchError> {
    let malformed = |reason: String| FetchError::Malformed {
        url: url.to_string(),
        format: format.label().to_string(),
        reason,
    };
    match format {
        FetchedFormat::Opaque => Ok(()),
        FetchedFormat::Yaml => serde_yaml::from_slice::<serde_yaml::Value>(body)
            .map(|_| ())
            .map_err(|e| malformed(e.to_string())),
        FetchedFormat::Json => serde_json::from_slice::<serde_json::Value>(body)
            .map(|_| ())
            .map_err(|e| malformed(e.to_string())),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────

//! Status and update workflows on top of [`reconcile`], persisting the
//! manifest with [`ManifestFile`].

use crate::manifest_file::{ManifestFile, ManifestFileError};
use crate::options::Options;
use crate::reconcile::{ReconcileError, Reconciliation, reconcile};
use crate::report::ChangeReport;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("Manifest file error: {0}")]
    ManifestFile(#[from] ManifestFileError),
    #[error("{0}")]
    Reconcile(#[from] ReconcileError),
    #[error("Not initialized: no manifest at {0} (use treediff init to initialize)")]
    NotInitialized(PathBuf),
    #[error("Already initialized: manifest exists at {0} (use treediff update instead)")]
    AlreadyInitialized(PathBuf),
    #[error("Digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// First scan: fail if a manifest already exists.
    pub init: bool,
    /// Accept a missing manifest without `init`, and an existing one with it.
    pub allow_init: bool,
    /// Only write the manifest if the change set has this digest.
    pub digest: Option<String>,
    /// Compute everything but write nothing.
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct UpdateResult {
    pub report: ChangeReport,
    pub digest: String,
    /// Whether the manifest file was (or, in a dry run, would have been)
    /// written.
    pub manifest_written: bool,
    pub files_tracked: usize,
}

/// Root-relative path of `manifest_path` when it lies inside `root`.
///
/// The manifest's directory must exist; the file itself need not.
fn manifest_in_tree(root: &Path, manifest_path: &Path) -> Option<PathBuf> {
    let root = root.canonicalize().ok()?;
    let parent = manifest_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let parent = parent.canonicalize().ok()?;
    let relative = parent.strip_prefix(&root).ok()?;
    Some(relative.join(manifest_path.file_name()?))
}

/// `options` with the manifest file excluded from the scan, so that writing
/// it never shows up as a change.
fn scan_options(root: &Path, manifest_path: &Path, options: &Options) -> Options {
    let mut options = options.clone();
    if let Some(relative) = manifest_in_tree(root, manifest_path) {
        debug!("Excluding manifest {} from the scan", relative.display());
        options.excluded_file = Some(relative);
    }
    options
}

/// Reconcile `root` against the manifest stored at `manifest_path` without
/// writing anything. A missing manifest counts as empty, so everything is
/// reported as added.
pub fn compute_status(
    root: &Path,
    manifest_path: &Path,
    options: &Options,
) -> Result<Reconciliation, UpdateError> {
    let existing = ManifestFile::load_if_exists(manifest_path)?;
    if existing.is_none() {
        debug!("No manifest at {}", manifest_path.display());
    }

    Ok(reconcile(
        root,
        existing.as_ref().map(|file| &file.root),
        &scan_options(root, manifest_path, options),
    )?)
}

/// Reconcile `root` against the manifest at `manifest_path` and write the
/// updated manifest back.
///
/// # Behavior
///
/// - Without `init`/`allow_init`, a missing manifest is `NotInitialized`.
/// - With `init` but not `allow_init`, an existing manifest is
///   `AlreadyInitialized`.
/// - With `digest`, the computed change-set digest must match or nothing is
///   written. The digest is checked after reconciling, so it describes
///   exactly the state that would be recorded.
/// - The file is only rewritten when the manifest actually changed.
pub fn update_manifest(
    root: &Path,
    manifest_path: &Path,
    options: &Options,
    update: &UpdateOptions,
) -> Result<UpdateResult, UpdateError> {
    let existing = ManifestFile::load_if_exists(manifest_path)?;

    match (&existing, update.init, update.allow_init) {
        (None, false, false) => {
            return Err(UpdateError::NotInitialized(manifest_path.to_path_buf()));
        }
        (Some(_), true, false) => {
            return Err(UpdateError::AlreadyInitialized(manifest_path.to_path_buf()));
        }
        _ => {}
    }

    let Reconciliation { manifest, report } = reconcile(
        root,
        existing.as_ref().map(|file| &file.root),
        &scan_options(root, manifest_path, options),
    )?;

    let digest = report.digest();
    if let Some(expected) = &update.digest
        && expected != &digest
    {
        return Err(UpdateError::DigestMismatch {
            expected: expected.clone(),
            actual: digest,
        });
    }

    let manifest_written = existing.as_ref().map(|file| &file.root) != Some(&manifest);
    let files_tracked = manifest.total_files();

    if manifest_written && !update.dry_run {
        ManifestFile::new(manifest).save(manifest_path)?;
        info!("Wrote manifest {}", manifest_path.display());
    }

    Ok(UpdateResult {
        report,
        digest,
        manifest_written,
        files_tracked,
    })
}

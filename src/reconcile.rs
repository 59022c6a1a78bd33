use crate::checksum::{ChecksumError, checksum_file};
use crate::dir_list::{DirListError, EntryKind, list_directory, probe};
use crate::manifest::{FileRecord, Manifest};
use crate::options::Options;
use crate::report::{Action, ChangeLog, ChangeReport, FileChange, ReportNode};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Directory listing error: {0}")]
    DirList(#[from] DirListError),
    #[error("Checksum error: {0}")]
    Checksum(#[from] ChecksumError),
    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Root is not a directory: {0}")]
    RootNotADirectory(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Updated copy of the prior manifest, to be persisted by the caller.
    pub manifest: Manifest,
    pub report: ChangeReport,
}

/// Compare the directory tree under `root` against `prior` and work out what
/// was added, modified and removed since `prior` was taken.
///
/// `prior` is never modified; the returned manifest is an updated copy of it
/// (or of an empty manifest when there is none, in which case everything on
/// disk is reported as added).
///
/// # Passes
///
/// 1. Every file and directory the manifest remembers is checked for
///    existence. Missing ones are reported as removed and dropped from the
///    copy. Directories that still exist get a `None` placeholder in the
///    report tree.
/// 2. The live tree is listed. Unknown entries are reported as added;
///    known files whose fingerprint changed are reported as modified.
/// 3. Report branches without any change are pruned.
///
/// All paths in the manifest and the report are relative to `root`.
///
/// # Errors
///
/// Any I/O failure aborts the whole reconciliation, including an entry that
/// disappears between being listed and being read. No partial result is
/// returned.
pub fn reconcile(
    root: &Path,
    prior: Option<&Manifest>,
    options: &Options,
) -> Result<Reconciliation, ReconcileError> {
    match probe(root)? {
        Some(EntryKind::Dir) => {}
        Some(EntryKind::File) => return Err(ReconcileError::RootNotADirectory(root.to_path_buf())),
        None => return Err(ReconcileError::RootNotFound(root.to_path_buf())),
    }

    let mut manifest = prior.cloned().unwrap_or_default();
    let mut report_root = ReportNode::default();
    let mut walker = Walker {
        root,
        options,
        log: ChangeLog::default(),
    };

    walker.manifest_walk(0, &mut manifest, &mut report_root)?;
    walker.disk_walk(0, Path::new(""), &mut manifest, Some(&mut report_root))?;
    report_root.compact();

    let report = walker.log.into_report(report_root);

    info!(
        "Reconciled {}: {} change(s)",
        root.display(),
        report.total_changes
    );

    Ok(Reconciliation { manifest, report })
}

struct Walker<'a> {
    root: &'a Path,
    options: &'a Options,
    log: ChangeLog,
}

impl Walker<'_> {
    /// Existence pass over the remembered entries of `node`, which lives
    /// `depth` levels below the root.
    fn manifest_walk(
        &mut self,
        depth: usize,
        node: &mut Manifest,
        report: &mut ReportNode,
    ) -> Result<(), ReconcileError> {
        if let Some(files) = &mut node.files {
            let names: Vec<String> = files.keys().cloned().collect();
            for name in names {
                let still_there =
                    probe(&self.root.join(&files[&name].path))? == Some(EntryKind::File);
                if still_there {
                    continue;
                }
                let Some(record) = files.remove(&name) else {
                    continue;
                };
                debug!("File removed: {}", record.path.display());
                self.log.record_file(
                    report,
                    &name,
                    FileChange {
                        path: record.path,
                        fingerprint: None,
                        old_fingerprint: Some(record.fingerprint),
                        action: Action::Removed,
                    },
                );
            }
        }

        let Some(dirs) = &mut node.dirs else {
            return Ok(());
        };

        let descend = self.options.may_descend_from(depth);
        let names: Vec<String> = dirs.keys().cloned().collect();

        for name in names {
            let path = dirs[&name].path.clone();

            if probe(&self.root.join(&path))? == Some(EntryKind::Dir) {
                let entry = self.log.record_dir(report, &name, &path, Action::None);
                if descend && let Some(child) = dirs.get_mut(&name) {
                    self.manifest_walk(depth + 1, child, &mut entry.contents)?;
                }
                continue;
            }

            let Some(mut child) = dirs.remove(&name) else {
                continue;
            };
            debug!("Directory removed: {}", path.display());
            let entry = self.log.record_dir(report, &name, &path, Action::Removed);
            if descend && !self.options.skip_directory_contents_on_add_remove {
                self.manifest_walk(depth + 1, &mut child, &mut entry.contents)?;
            }
        }

        Ok(())
    }

    /// Discovery pass over the directory `dir` (relative to the root), which
    /// `node` describes. With `report` set to `None` the manifest is still
    /// brought up to date but nothing is reported; used below a freshly added
    /// directory when only the directory itself should be reported.
    fn disk_walk(
        &mut self,
        depth: usize,
        dir: &Path,
        node: &mut Manifest,
        mut report: Option<&mut ReportNode>,
    ) -> Result<(), ReconcileError> {
        let entries = list_directory(&self.root.join(dir))?;

        for (name, kind) in entries {
            let path = dir.join(&name);
            if self.options.excludes(&path) {
                continue;
            }
            match kind {
                EntryKind::Dir => {
                    self.discover_dir(depth, &name, path, node, report.as_deref_mut())?
                }
                EntryKind::File => self.discover_file(&name, path, node, report.as_deref_mut())?,
            }
        }

        Ok(())
    }

    fn discover_dir(
        &mut self,
        depth: usize,
        name: &str,
        path: PathBuf,
        node: &mut Manifest,
        report: Option<&mut ReportNode>,
    ) -> Result<(), ReconcileError> {
        let dirs = node.dirs.get_or_insert_with(BTreeMap::new);
        let added = self.options.force_add_all || !dirs.contains_key(name);

        let child = dirs
            .entry(name.to_string())
            .or_insert_with(|| Manifest::for_dir(path.clone()));
        if added {
            child.path = path.clone();
        }

        let child_report = match report {
            Some(report) => {
                let action = if added { Action::Added } else { Action::None };
                if added {
                    debug!("Directory added: {}", path.display());
                }
                let entry = self.log.record_dir(report, name, &path, action);
                let coarse = added && self.options.skip_directory_contents_on_add_remove;
                (!coarse).then_some(&mut entry.contents)
            }
            None => None,
        };

        if self.options.may_descend_from(depth) {
            self.disk_walk(depth + 1, &path, child, child_report)?;
        }

        Ok(())
    }

    fn discover_file(
        &mut self,
        name: &str,
        path: PathBuf,
        node: &mut Manifest,
        report: Option<&mut ReportNode>,
    ) -> Result<(), ReconcileError> {
        if !self.options.includes(&path) {
            debug!("Skipping {} (extension not tracked)", path.display());
            return Ok(());
        }

        let files = node.files.get_or_insert_with(BTreeMap::new);
        let fingerprint = checksum_file(&self.root.join(&path))?;

        let previous = files
            .get(name)
            .map(|record| record.fingerprint)
            .filter(|_| !self.options.force_add_all);

        let change = match previous {
            Some(old) if old == fingerprint => return Ok(()),
            Some(old) => {
                debug!("File modified: {} ({} -> {})", path.display(), old, fingerprint);
                FileChange {
                    path: path.clone(),
                    fingerprint: Some(fingerprint),
                    old_fingerprint: Some(old),
                    action: Action::Modified,
                }
            }
            None => {
                debug!("File added: {}", path.display());
                FileChange {
                    path: path.clone(),
                    fingerprint: Some(fingerprint),
                    old_fingerprint: None,
                    action: Action::Added,
                }
            }
        };

        files.insert(name.to_string(), FileRecord { path, fingerprint });
        if let Some(report) = report {
            self.log.record_file(report, name, change);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

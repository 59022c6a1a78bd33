use super::*;
use crate::checksum::Fingerprint;
use crate::report::DirChange;
use std::fs;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn scan(root: &Path, prior: Option<&Manifest>) -> Reconciliation {
    reconcile(root, prior, &Options::default()).unwrap()
}

fn coarse() -> Options {
    Options {
        skip_directory_contents_on_add_remove: true,
        ..Options::default()
    }
}

fn sorted(paths: &[PathBuf]) -> Vec<String> {
    let mut names: Vec<String> = paths
        .iter()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .collect();
    names.sort();
    names
}

fn crc(content: &str) -> Fingerprint {
    Fingerprint(crc32fast::hash(content.as_bytes()))
}

/// Number of non-`None` entries anywhere in the report tree.
fn tree_changes(node: &ReportNode) -> usize {
    let files = node
        .files
        .values()
        .filter(|f| f.action != Action::None)
        .count();
    let dirs: usize = node
        .dirs
        .values()
        .map(|d: &DirChange| usize::from(d.action != Action::None) + tree_changes(&d.contents))
        .sum();
    files + dirs
}

fn assert_consistent(report: &ChangeReport) {
    let listed = report.files.added.len()
        + report.files.modified.len()
        + report.files.removed.len()
        + report.dirs.added.len()
        + report.dirs.removed.len();
    assert_eq!(report.total_changes, listed);
    assert_eq!(tree_changes(&report.root), listed);
}

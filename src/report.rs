use crate::checksum::Fingerprint;
use crate::util::hashing::DigestWriter;
use base64::Engine;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Added,
    Modified,
    Removed,
    /// Placeholder for a directory that still exists; anything found below it
    /// hangs off this entry. Pruned by [`ReportNode::compact`] when nothing did.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_fingerprint: Option<Fingerprint>,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirChange {
    pub path: PathBuf,
    pub action: Action,
    #[serde(flatten)]
    pub contents: ReportNode,
}

impl DirChange {
    pub(crate) fn unchanged(path: PathBuf) -> Self {
        DirChange {
            path,
            action: Action::None,
            contents: ReportNode::default(),
        }
    }
}

/// Per-directory view of the changes, keyed by entry name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportNode {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, FileChange>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dirs: BTreeMap<String, DirChange>,
}

impl ReportNode {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    /// Drops every `None` directory with nothing changed beneath it, leaving
    /// only the branches that lead to a change. Returns whether the node
    /// ended up empty.
    pub fn compact(&mut self) -> bool {
        self.dirs.retain(|_, dir| {
            let contents_empty = dir.contents.compact();
            dir.action != Action::None || !contents_empty
        });
        self.is_empty()
    }

    /// Looks up a directory entry by root-relative path, e.g. `a/b`.
    pub fn dir(&self, relative_path: impl AsRef<Path>) -> Option<&DirChange> {
        let mut names = component_names(relative_path.as_ref());
        let first = self.dirs.get(names.next()?)?;
        names.try_fold(first, |dir, name| dir.contents.dirs.get(name))
    }

    /// Looks up a file entry by root-relative path, e.g. `a/b/c.txt`.
    pub fn file(&self, relative_path: impl AsRef<Path>) -> Option<&FileChange> {
        let relative_path = relative_path.as_ref();
        let name = relative_path.file_name()?.to_str()?;
        let node = match relative_path.parent() {
            Some(parent) if parent.components().next().is_some() => &self.dir(parent)?.contents,
            _ => self,
        };
        node.files.get(name)
    }
}

pub(crate) fn component_names(path: &Path) -> impl Iterator<Item = &str> {
    path.components().filter_map(|c| match c {
        Component::Normal(name) => name.to_str(),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileChanges {
    pub added: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirChanges {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

/// Flat change lists plus the running total. Every change goes through
/// `record_file`/`record_dir`, which also write the per-directory entry, so
/// the lists and the tree cannot disagree.
#[derive(Debug, Default)]
pub(crate) struct ChangeLog {
    files: FileChanges,
    dirs: DirChanges,
    total_changes: usize,
}

impl ChangeLog {
    pub(crate) fn record_file(&mut self, node: &mut ReportNode, name: &str, change: FileChange) {
        let list = match change.action {
            Action::Added => &mut self.files.added,
            Action::Modified => &mut self.files.modified,
            Action::Removed => &mut self.files.removed,
            Action::None => return,
        };
        list.push(change.path.clone());
        self.total_changes += 1;
        node.files.insert(name.to_string(), change);
    }

    /// Marks the directory entry `name` of `node` with `action` and returns
    /// it so the caller can keep recording below it. Contents already
    /// recorded under the entry are kept.
    pub(crate) fn record_dir<'a>(
        &mut self,
        node: &'a mut ReportNode,
        name: &str,
        path: &Path,
        action: Action,
    ) -> &'a mut DirChange {
        let list = match action {
            Action::Added => Some(&mut self.dirs.added),
            Action::Removed => Some(&mut self.dirs.removed),
            Action::Modified | Action::None => None,
        };
        if let Some(list) = list {
            list.push(path.to_path_buf());
            self.total_changes += 1;
        }
        let entry = node
            .dirs
            .entry(name.to_string())
            .or_insert_with(|| DirChange::unchanged(path.to_path_buf()));
        entry.path = path.to_path_buf();
        entry.action = action;
        entry
    }

    pub(crate) fn into_report(self, root: ReportNode) -> ChangeReport {
        ChangeReport {
            files: self.files,
            dirs: self.dirs,
            total_changes: self.total_changes,
            root,
        }
    }
}

/// Everything one reconciliation found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub files: FileChanges,
    pub dirs: DirChanges,
    pub total_changes: usize,
    pub root: ReportNode,
}

/// Kind of a single change, in the flat form used for display and digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeKind {
    FileAdded,
    FileModified,
    FileRemoved,
    DirAdded,
    DirRemoved,
}

impl ChangeKind {
    pub fn code(self) -> &'static str {
        match self {
            ChangeKind::FileAdded | ChangeKind::DirAdded => "A",
            ChangeKind::FileModified => "M",
            ChangeKind::FileRemoved | ChangeKind::DirRemoved => "R",
        }
    }

    pub fn is_dir(self) -> bool {
        matches!(self, ChangeKind::DirAdded | ChangeKind::DirRemoved)
    }
}

impl ChangeReport {
    pub fn is_clean(&self) -> bool {
        self.total_changes == 0
    }

    /// All changes as `(path, kind)`, sorted by path.
    pub fn changes(&self) -> Vec<(&Path, ChangeKind)> {
        let lists: [(&[PathBuf], ChangeKind); 5] = [
            (self.files.added.as_slice(), ChangeKind::FileAdded),
            (self.files.modified.as_slice(), ChangeKind::FileModified),
            (self.files.removed.as_slice(), ChangeKind::FileRemoved),
            (self.dirs.added.as_slice(), ChangeKind::DirAdded),
            (self.dirs.removed.as_slice(), ChangeKind::DirRemoved),
        ];
        let mut changes: Vec<(&Path, ChangeKind)> = lists
            .into_iter()
            .flat_map(|(paths, kind)| paths.iter().map(move |p| (p.as_path(), kind)))
            .collect();
        changes.sort();
        changes
    }

    /// Stable identifier of this change set.
    ///
    /// Base64-encoded SHA-256 over the sorted changes. Two reports with the
    /// same changes have the same digest regardless of discovery order.
    pub fn digest(&self) -> String {
        let mut writer = DigestWriter::new();

        for (path, kind) in self.changes() {
            writer.path(path);
            let kind_str = match kind {
                ChangeKind::FileAdded => "FA",
                ChangeKind::FileModified => "FM",
                ChangeKind::FileRemoved => "FR",
                ChangeKind::DirAdded => "DA",
                ChangeKind::DirRemoved => "DR",
            };
            writer.field(kind_str.as_bytes());
        }

        base64::engine::general_purpose::STANDARD.encode(writer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_change(path: &str, action: Action) -> FileChange {
        FileChange {
            path: PathBuf::from(path),
            fingerprint: Some(Fingerprint(1)),
            old_fingerprint: None,
            action,
        }
    }

    #[test]
    fn test_record_keeps_lists_and_tree_in_step() {
        let mut log = ChangeLog::default();
        let mut root = ReportNode::default();

        log.record_file(&mut root, "a.txt", file_change("a.txt", Action::Added));
        let sub = log.record_dir(&mut root, "sub", Path::new("sub"), Action::Removed);
        log.record_file(
            &mut sub.contents,
            "b.txt",
            file_change("sub/b.txt", Action::Removed),
        );
        log.record_dir(&mut root, "kept", Path::new("kept"), Action::None);

        let report = log.into_report(root);

        assert_eq!(report.total_changes, 3);
        assert_eq!(report.files.added, vec![PathBuf::from("a.txt")]);
        assert_eq!(report.files.removed, vec![PathBuf::from("sub/b.txt")]);
        assert_eq!(report.dirs.removed, vec![PathBuf::from("sub")]);
        assert_eq!(report.root.dirs["kept"].action, Action::None);
        assert!(report.root.dirs["sub"].contents.files.contains_key("b.txt"));
    }

    #[test]
    fn test_record_dir_keeps_existing_contents() {
        let mut log = ChangeLog::default();
        let mut root = ReportNode::default();

        let dir = log.record_dir(&mut root, "d", Path::new("d"), Action::None);
        log.record_file(
            &mut dir.contents,
            "x.txt",
            file_change("d/x.txt", Action::Removed),
        );
        log.record_dir(&mut root, "d", Path::new("d"), Action::Added);

        assert_eq!(root.dirs["d"].action, Action::Added);
        assert!(root.dirs["d"].contents.files.contains_key("x.txt"));
    }

    #[test]
    fn test_compact_prunes_unchanged_branches() {
        let mut root = ReportNode::default();
        let mut log = ChangeLog::default();

        let a = log.record_dir(&mut root, "a", Path::new("a"), Action::None);
        let b = log.record_dir(&mut a.contents, "b", Path::new("a/b"), Action::None);
        log.record_file(&mut b.contents, "f", file_change("a/b/f", Action::Modified));
        log.record_dir(&mut a.contents, "quiet", Path::new("a/quiet"), Action::None);

        let c = log.record_dir(&mut root, "c", Path::new("c"), Action::None);
        log.record_dir(&mut c.contents, "d", Path::new("c/d"), Action::None);

        log.record_dir(&mut root, "gone", Path::new("gone"), Action::Removed);

        assert!(!root.compact());

        assert!(root.dir("a/b").is_some());
        assert!(root.dir("a/quiet").is_none());
        assert!(root.dir("c").is_none());
        assert_eq!(root.dir("gone").unwrap().action, Action::Removed);
    }

    #[test]
    fn test_compact_empties_unchanged_tree() {
        let mut root = ReportNode::default();
        let mut log = ChangeLog::default();
        let a = log.record_dir(&mut root, "a", Path::new("a"), Action::None);
        log.record_dir(&mut a.contents, "b", Path::new("a/b"), Action::None);

        assert!(root.compact());
        assert!(root.dirs.is_empty());
    }

    #[test]
    fn test_digest_ignores_discovery_order() {
        let mut one = ChangeReport::default();
        one.files.added = vec![PathBuf::from("b"), PathBuf::from("a")];
        one.total_changes = 2;

        let mut two = ChangeReport::default();
        two.files.added = vec![PathBuf::from("a"), PathBuf::from("b")];
        two.total_changes = 2;

        assert_eq!(one.digest(), two.digest());
    }

    #[test]
    fn test_digest_distinguishes_change_kind() {
        let mut added = ChangeReport::default();
        added.files.added = vec![PathBuf::from("a")];

        let mut removed = ChangeReport::default();
        removed.files.removed = vec![PathBuf::from("a")];

        let mut dir_added = ChangeReport::default();
        dir_added.dirs.added = vec![PathBuf::from("a")];

        assert_ne!(added.digest(), removed.digest());
        assert_ne!(added.digest(), dir_added.digest());
        assert_ne!(added.digest(), ChangeReport::default().digest());
    }

    #[test]
    fn test_action_serializes_upper_case() {
        let change = file_change("a.txt", Action::Added);
        let text = toml::to_string(&change).unwrap();
        assert!(text.contains(r#"action = "ADDED""#));
        assert!(text.contains(r#"fingerprint = "1""#));
        assert!(!text.contains("old_fingerprint"));
    }
}

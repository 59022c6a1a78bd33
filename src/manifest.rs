//! Snapshot of a directory tree as recorded by the previous reconciliation.
//!
//! A `None` map means that kind of entry was never recorded for the node,
//! while `Some` of an empty map means the node was visited and nothing of
//! that kind was found. The distinction survives serialization.

use crate::checksum::Fingerprint;
use crate::report::component_names;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Root-relative path of the directory this node describes. Empty for the
    /// root itself.
    #[serde(default)]
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<BTreeMap<String, FileRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirs: Option<BTreeMap<String, Manifest>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRecord {
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// An unvisited node for the directory at `path`.
    pub fn for_dir(path: PathBuf) -> Self {
        Manifest {
            path,
            files: None,
            dirs: None,
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn dir_count(&self) -> usize {
        self.dirs.as_ref().map_or(0, BTreeMap::len)
    }

    /// Looks up the record of a file by root-relative path, e.g. `a/b/c.txt`.
    pub fn file(&self, relative_path: impl AsRef<Path>) -> Option<&FileRecord> {
        let relative_path = relative_path.as_ref();
        let name = relative_path.file_name()?.to_str()?;
        let node = match relative_path.parent() {
            Some(parent) => self.dir(parent)?,
            None => self,
        };
        node.files.as_ref()?.get(name)
    }

    /// Looks up a directory node by root-relative path, e.g. `a/b`. The empty
    /// path is the root itself.
    pub fn dir(&self, relative_path: impl AsRef<Path>) -> Option<&Manifest> {
        component_names(relative_path.as_ref())
            .try_fold(self, |node, name| node.dirs.as_ref()?.get(name))
    }

    /// Number of file records in the whole tree.
    pub fn total_files(&self) -> usize {
        self.file_count()
            + self
                .dirs
                .iter()
                .flat_map(BTreeMap::values)
                .map(Manifest::total_files)
                .sum::<usize>()
    }
}

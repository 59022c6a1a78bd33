//! Detect which files in a directory tree were added, modified or removed
//! since a previous scan.
//!
//! [`reconcile`] compares a [`Manifest`] recorded by an earlier run with the
//! tree as it is now, returning an updated manifest and a [`ChangeReport`].
//! Storing the manifest between runs is up to the caller; [`manifest_file`]
//! provides the TOML file format the command line tool uses.

pub mod checksum;
pub mod dir_list;
pub mod manifest;
pub mod manifest_file;
pub mod options;
pub mod reconcile;
pub mod report;
pub mod update;
mod util;

pub use checksum::Fingerprint;
pub use manifest::{FileRecord, Manifest};
pub use options::Options;
pub use reconcile::{ReconcileError, Reconciliation, reconcile};
pub use report::{Action, ChangeKind, ChangeReport, DirChange, FileChange, ReportNode};

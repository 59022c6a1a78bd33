//! Non-recursive directory listing.
//!
//! Lists the immediate children of one directory as either files or
//! directories. Symlinks are followed, so a link to a directory lists as a
//! directory and a link to a file lists as a file; anything that is not a
//! directory counts as a file.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DirListError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Entry name is not valid UTF-8: {0}")]
    NonUtf8Name(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

fn map_io_error(path: &Path, e: std::io::Error) -> DirListError {
    if e.kind() == ErrorKind::PermissionDenied {
        DirListError::PermissionDenied(path.to_path_buf())
    } else {
        DirListError::Io(e)
    }
}

/// Lists the immediate children of `dir`, keyed (and therefore ordered) by name.
pub fn list_directory(dir: &Path) -> Result<BTreeMap<String, EntryKind>, DirListError> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| map_io_error(dir, e))?;

    let mut entries = BTreeMap::new();

    for entry in read_dir {
        let entry = entry.map_err(DirListError::Io)?;
        let path = entry.path();

        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| DirListError::NonUtf8Name(path.clone()))?;

        // Follows symlinks. An entry deleted after read_dir returned it
        // surfaces here as an error rather than being skipped.
        let metadata = std::fs::metadata(&path).map_err(|e| map_io_error(&path, e))?;

        let kind = if metadata.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };

        entries.insert(name, kind);
    }

    Ok(entries)
}

/// Reports what currently exists at `path`, or `None` if nothing does.
pub fn probe(path: &Path) -> Result<Option<EntryKind>, DirListError> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(Some(EntryKind::Dir)),
        Ok(_) => Ok(Some(EntryKind::File)),
        // NotADirectory: a parent component has since been replaced by a file.
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => Ok(None),
        Err(e) => Err(map_io_error(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_list_simple_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("file1.txt"), "content1").unwrap();
        fs::write(root.join("file2.txt"), "content2").unwrap();
        fs::create_dir(root.join("dir1")).unwrap();
        fs::write(root.join("dir1/file3.txt"), "content3").unwrap();

        let entries = list_directory(root).unwrap();

        let names: Vec<&str> = entries.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["dir1", "file1.txt", "file2.txt"]);
        assert_eq!(entries["dir1"], EntryKind::Dir);
        assert_eq!(entries["file1.txt"], EntryKind::File);

        let subdir_entries = list_directory(&root.join("dir1")).unwrap();
        assert_eq!(subdir_entries.len(), 1);
        assert_eq!(subdir_entries["file3.txt"], EntryKind::File);
    }

    #[test]
    fn test_list_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let entries = list_directory(temp_dir.path()).unwrap();

        assert!(entries.is_empty());
    }

    #[test]
    fn test_list_includes_dotfiles() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("file1.txt"), "content1").unwrap();
        fs::write(root.join(".treediff"), "manifest").unwrap();

        let entries = list_directory(root).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries.get(".treediff"), Some(&EntryKind::File));
    }

    #[test]
    fn test_list_missing_directory_is_error() {
        let temp_dir = TempDir::new().unwrap();

        let result = list_directory(&temp_dir.path().join("missing"));

        match result {
            Err(DirListError::Io(e)) => assert_eq!(e.kind(), ErrorKind::NotFound),
            other => panic!("Expected NotFound IO error, got {other:?}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_list_follows_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("real_dir")).unwrap();
        fs::write(root.join("real_file"), "content").unwrap();
        std::os::unix::fs::symlink(root.join("real_dir"), root.join("dir_link")).unwrap();
        std::os::unix::fs::symlink(root.join("real_file"), root.join("file_link")).unwrap();

        let entries = list_directory(root).unwrap();

        assert_eq!(entries["dir_link"], EntryKind::Dir);
        assert_eq!(entries["file_link"], EntryKind::File);
    }

    #[test]
    #[cfg(unix)]
    fn test_list_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let restricted_dir = temp_dir.path().join("restricted");
        fs::create_dir(&restricted_dir).unwrap();

        let mut perms = fs::metadata(&restricted_dir).unwrap().permissions();
        perms.set_mode(0o000);
        fs::set_permissions(&restricted_dir, perms.clone()).unwrap();

        let result = list_directory(&restricted_dir);

        perms.set_mode(0o755);
        fs::set_permissions(&restricted_dir, perms).unwrap();

        // Root ignores mode bits, in which case the listing succeeds.
        if let Err(e) = result {
            assert!(matches!(e, DirListError::PermissionDenied(_)));
        }
    }

    #[test]
    fn test_probe_kinds() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("file.txt"), "x").unwrap();
        fs::create_dir(root.join("dir")).unwrap();

        assert_eq!(probe(&root.join("file.txt")).unwrap(), Some(EntryKind::File));
        assert_eq!(probe(&root.join("dir")).unwrap(), Some(EntryKind::Dir));
        assert_eq!(probe(&root.join("missing")).unwrap(), None);
        assert_eq!(probe(&root.join("file.txt/below")).unwrap(), None);
    }
}

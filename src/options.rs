use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Knobs controlling a reconciliation.
///
/// Loadable from TOML with snake_case keys; the camelCase spellings
/// (`fileExtensions`, `maxRecurseDepth`, ...) are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Extensions (lowercase, with leading dot) of files to track. `None`
    /// tracks every file. Directories are never filtered.
    #[serde(alias = "fileExtensions", deserialize_with = "lenient_extensions")]
    pub file_extensions: Option<BTreeSet<String>>,

    /// Report every entry on disk as added, ignoring what the manifest knows.
    #[serde(alias = "forceAddAll")]
    pub force_add_all: bool,

    /// Subdirectories of a directory this many levels below the root (root is
    /// depth 0) or deeper are not entered. `0` examines the root only.
    #[serde(alias = "maxRecurseDepth")]
    pub max_recurse_depth: Option<usize>,

    /// Report a freshly added or removed directory as one change instead of
    /// also listing everything below it.
    #[serde(alias = "skipDirectoryContentsOnAddRemove")]
    pub skip_directory_contents_on_add_remove: bool,

    /// Root-relative path of one file that is never listed, such as a
    /// manifest stored inside the scanned tree. Not read from config files.
    #[serde(skip)]
    pub excluded_file: Option<PathBuf>,
}

impl Options {
    /// Restricts tracked files to the given extensions. `"TXT"` and `".txt"`
    /// are equivalent.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.file_extensions = Some(
            extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .collect(),
        );
        self
    }

    /// Whether a file at `path` is tracked.
    pub fn includes(&self, path: &Path) -> bool {
        let Some(extensions) = &self.file_extensions else {
            return true;
        };
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        extensions.contains(&extension)
    }

    /// Whether the root-relative `path` is the excluded file.
    pub(crate) fn excludes(&self, path: &Path) -> bool {
        self.excluded_file.as_deref() == Some(path)
    }

    /// Whether the walkers may enter the subdirectories of a directory
    /// `depth` levels below the root.
    pub(crate) fn may_descend_from(&self, depth: usize) -> bool {
        self.max_recurse_depth.is_none_or(|max| depth < max)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                ConfigError::PermissionDenied(path.to_path_buf())
            } else {
                ConfigError::Io(e)
            }
        })?;

        Self::from_toml(&content)
    }
}

fn normalize_extension(extension: &str) -> String {
    let extension = extension.trim().to_lowercase();
    if extension.is_empty() || extension.starts_with('.') {
        extension
    } else {
        format!(".{extension}")
    }
}

/// Anything other than a list of strings is treated as if the key were
/// absent, so every file is included.
fn lenient_extensions<'de, D>(deserializer: D) -> Result<Option<BTreeSet<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::List(list) => Some(list.iter().map(|e| normalize_extension(e)).collect()),
        Raw::Other(_) => {
            warn!("file_extensions is not a list of strings; including all files");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_includes_everything_without_filter() {
        let options = Options::default();

        assert!(options.includes(Path::new("a.txt")));
        assert!(options.includes(Path::new("Makefile")));
        assert!(options.includes(Path::new("dir/b.LOG")));
    }

    #[test]
    fn test_includes_matches_extension_case_insensitively() {
        let options = Options::default().with_extensions([".txt"]);

        assert!(options.includes(Path::new("a.txt")));
        assert!(options.includes(Path::new("dir/A.TXT")));
        assert!(!options.includes(Path::new("a.log")));
        assert!(!options.includes(Path::new("txt")));
        assert!(!options.includes(Path::new("a.txt.bak")));
    }

    #[test]
    fn test_with_extensions_normalizes() {
        let options = Options::default().with_extensions(["TXT", ".Md", ""]);

        let expected: BTreeSet<String> = [".txt", ".md", ""].iter().map(|s| s.to_string()).collect();
        assert_eq!(options.file_extensions, Some(expected));
        assert!(options.includes(Path::new("README")));
    }

    #[test]
    fn test_may_descend_from() {
        let unlimited = Options::default();
        assert!(unlimited.may_descend_from(1000));

        let limited = Options {
            max_recurse_depth: Some(2),
            ..Options::default()
        };
        assert!(limited.may_descend_from(0));
        assert!(limited.may_descend_from(1));
        assert!(!limited.may_descend_from(2));

        let root_only = Options {
            max_recurse_depth: Some(0),
            ..Options::default()
        };
        assert!(!root_only.may_descend_from(0));
    }

    #[test]
    fn test_parse_full_config() {
        let options = Options::from_toml(
            r#"
file_extensions = [".TXT", "md"]
force_add_all = true
max_recurse_depth = 3
skip_directory_contents_on_add_remove = true
"#,
        )
        .unwrap();

        assert_eq!(
            options.file_extensions,
            Some([".md".to_string(), ".txt".to_string()].into_iter().collect())
        );
        assert!(options.force_add_all);
        assert_eq!(options.max_recurse_depth, Some(3));
        assert!(options.skip_directory_contents_on_add_remove);
    }

    #[test]
    fn test_parse_camel_case_aliases() {
        let options = Options::from_toml(
            r#"
fileExtensions = [".txt"]
skipDirectoryContentsOnAddRemove = true
"#,
        )
        .unwrap();

        assert!(options.file_extensions.is_some());
        assert!(options.skip_directory_contents_on_add_remove);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Options::from_toml("").unwrap(), Options::default());
    }

    #[test]
    fn test_malformed_extensions_include_everything() {
        let options = Options::from_toml(r#"file_extensions = ".txt""#).unwrap();
        assert_eq!(options.file_extensions, None);
        assert!(options.includes(Path::new("a.log")));

        let options = Options::from_toml("file_extensions = [1, 2]").unwrap();
        assert_eq!(options.file_extensions, None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = Options::from_toml("max_depth = 3");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }
}

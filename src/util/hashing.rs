//! Canonical encoding for the change-set digest.
//!
//! Every field is length-prefixed so that no choice of names can make two
//! different change sets feed identical bytes to the hasher.

use sha2::{Digest, Sha256};
use std::path::{Component, Path};

pub(crate) struct DigestWriter {
    hasher: Sha256,
}

impl DigestWriter {
    pub(crate) fn new() -> Self {
        DigestWriter {
            hasher: Sha256::new(),
        }
    }

    /// Writes a byte field with an explicit big-endian length prefix.
    pub(crate) fn field(&mut self, bytes: &[u8]) {
        let len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        self.hasher.update(len.to_be_bytes());
        self.hasher.update(bytes);
    }

    /// Writes a root-relative path as its component count followed by one
    /// field per component, so `a/b` digests the same on every platform.
    pub(crate) fn path(&mut self, path: &Path) {
        let components: Vec<_> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name),
                _ => None,
            })
            .collect();
        let count = u64::try_from(components.len()).unwrap_or(u64::MAX);
        self.hasher.update(count.to_be_bytes());
        for name in components {
            self.field(name.to_string_lossy().as_bytes());
        }
    }

    pub(crate) fn finish(self) -> [u8; 32] {
        self.hasher.finalize().into()
    }
}

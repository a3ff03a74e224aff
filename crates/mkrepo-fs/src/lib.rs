// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! A [mkrepo_core::traits::Storage] backed by a plain local directory,
grounded on `original_source/storage.py`'s `FilesystemStorage`. */

use {
    mkrepo_core::{MkrepoError, Result},
    std::path::{Path, PathBuf},
};

/// Stores repository artifacts under a base directory on the local
/// filesystem. Keys are slash-separated and always interpreted relative to
/// `base_dir`, regardless of the host's path separator.
pub struct FilesystemStorage {
    base_dir: PathBuf,
}

impl FilesystemStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }

    fn io_err(&self, key: &str, source: std::io::Error) -> MkrepoError {
        MkrepoError::StorageFailure {
            key: key.to_string(),
            source,
        }
    }
}

impl mkrepo_core::traits::Storage for FilesystemStorage {
    fn read(&self, key: &str) -> Result<Vec<u8>> {
        std::fs::read(self.full_path(key)).map_err(|e| self.io_err(key, e))
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let fullpath = self.full_path(key);
        if !self.base_dir.exists() {
            return Err(self.io_err(
                key,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("base directory doesn't exist: '{}'", self.base_dir.display()),
                ),
            ));
        }
        if let Some(parent) = fullpath.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(key, e))?;
        }
        std::fs::write(&fullpath, data).map_err(|e| self.io_err(key, e))
    }

    fn delete(&self, key: &str) -> Result<()> {
        let fullpath = self.full_path(key);
        match std::fs::remove_file(&fullpath) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(key, e)),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.full_path(key).exists())
    }

    fn mtime(&self, key: &str) -> Result<f64> {
        let metadata = std::fs::metadata(self.full_path(key)).map_err(|e| self.io_err(key, e))?;
        let modified = metadata.modified().map_err(|e| self.io_err(key, e))?;
        let duration = modified
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        Ok(duration.as_secs_f64())
    }

    fn download(&self, key: &str, local_path: &Path) -> Result<()> {
        std::fs::copy(self.full_path(key), local_path).map_err(|e| self.io_err(key, e))?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let root = self.full_path(prefix);
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in walkdir::WalkDir::new(&root).into_iter() {
            let entry = entry.map_err(|e| {
                self.io_err(
                    prefix,
                    e.into_io_error()
                        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk failed")),
                )
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.base_dir)
                .unwrap_or(entry.path());
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            keys.push(key);
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, mkrepo_core::traits::Storage};

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());
        storage.write("pool/a/foo.deb", b"hello").unwrap();
        assert_eq!(storage.read("pool/a/foo.deb").unwrap(), b"hello");
        assert!(storage.exists("pool/a/foo.deb").unwrap());
    }

    #[test]
    fn list_finds_nested_files_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());
        storage.write("pool/a/foo.deb", b"1").unwrap();
        storage.write("pool/b/bar.deb", b"2").unwrap();
        storage.write("dists/stable/Release", b"3").unwrap();

        let mut pool = storage.list("pool/").unwrap();
        pool.sort();
        assert_eq!(pool, vec!["pool/a/foo.deb", "pool/b/bar.deb"]);
    }

    #[test]
    fn delete_missing_key_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());
        storage.delete("does/not/exist.txt").unwrap();
    }

    #[test]
    fn list_of_missing_prefix_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path());
        assert!(storage.list("nope/").unwrap().is_empty());
    }
}

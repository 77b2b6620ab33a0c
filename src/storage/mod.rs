//! File store adapter
//!
//! Resolves names under a configured root directory, loads and stores
//! containers, and enumerates `.wav` files for catalog queries.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;

use crate::constants::WAV_EXTENSION;
use crate::error::{Error, StorageError};
use crate::protocol::FileEntry;
use crate::wav::WavContainer;

/// Storage rooted at a single directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a relative name onto the root, refusing anything that escapes it
    pub fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(name);
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StorageError::InvalidName(name.to_string()));
                }
            }
        }
        Ok(resolved)
    }

    /// Read a whole file
    pub async fn load(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(name)?;
        fs::read(&path).await.map_err(|e| StorageError::io(&path, e))
    }

    /// Write a whole file, replacing any previous content
    ///
    /// Bytes go to a hidden sibling first and are renamed into place, so a
    /// failed write leaves no partial file under `name`.
    pub async fn store(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.resolve(name)?;
        let file_name = path
            .file_name()
            .ok_or_else(|| StorageError::InvalidName(name.to_string()))?
            .to_string_lossy()
            .into_owned();
        let partial = path.with_file_name(format!(".{}.part", file_name));

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }

        if let Err(e) = fs::write(&partial, bytes).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::io(&partial, e));
        }
        if let Err(e) = fs::rename(&partial, &path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::io(&path, e));
        }

        tracing::info!("Written {} bytes to '{}'", bytes.len(), path.display());
        Ok(path)
    }

    /// List `.wav` regular files in a directory below the root, sorted by name
    pub async fn list(&self, directory: &str) -> Result<Vec<FileEntry>, StorageError> {
        let dir = self.resolve(directory)?;
        tracing::debug!("Looking for all files in the directory {}", dir.display());

        let mut reader = fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, e))?;
        let mut entries = Vec::new();

        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&dir, e))?
        {
            let path = entry.path();
            if !has_wav_extension(&path) {
                continue;
            }
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| StorageError::io(&path, e))?;
            if !metadata.is_file() {
                continue;
            }

            entries.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Load and decode a container
    ///
    /// A missing file is a `StorageError::NotFound`; unparseable bytes are a
    /// format error. Validity is left to the caller.
    pub async fn load_container(&self, name: &str) -> Result<WavContainer, Error> {
        let bytes = self.load(name).await?;
        let container = WavContainer::decode(&bytes)?;
        Ok(container)
    }

    /// Encode and store a container
    pub async fn store_container(
        &self,
        name: &str,
        container: &WavContainer,
    ) -> Result<PathBuf, StorageError> {
        self.store(name, &container.encode()).await
    }
}

fn has_wav_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(WAV_EXTENSION))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::FormatDescriptor;

    fn container() -> WavContainer {
        WavContainer::construct(FormatDescriptor::pcm(1, 8000, 16), vec![7; 100]).unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let err = store.load_container("this_does_not_exist.wav").await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_store_then_load_container() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let original = container();

        let path = store.store_container("song.wav", &original).await.unwrap();
        assert_eq!(path, dir.path().join("song.wav"));
        assert!(!dir.path().join(".song.wav.part").exists());

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, original.encode());

        let loaded = store.load_container("song.wav").await.unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn test_store_creates_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.store("nested/a.wav", b"abc").await.unwrap();
        assert_eq!(store.load("nested/a.wav").await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_list_only_wav_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.wav"), b"12345").unwrap();
        std::fs::write(dir.path().join("a.WAV"), b"1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("folder.wav")).unwrap();

        let store = FileStore::new(dir.path());
        let entries = store.list(".").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(names, vec!["a.WAV", "b.wav"]);
        assert_eq!(entries[1].size, 5);
        assert!(entries[1].modified.is_some());
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let err = store.list("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let store = FileStore::new("/srv/audio");
        assert_eq!(
            store.resolve("./x/song.wav").unwrap(),
            PathBuf::from("/srv/audio/x/song.wav")
        );
        assert!(matches!(
            store.resolve("../etc/passwd"),
            Err(StorageError::InvalidName(_))
        ));
        assert!(matches!(
            store.resolve("/etc/passwd"),
            Err(StorageError::InvalidName(_))
        ));
    }
}

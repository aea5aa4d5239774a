use async_trait::async_trait;
use crate::storage::{ StateStorage, StorageError };
use log::debug;
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };

/// Stores each key as `<dir>/<key>.json`.
pub struct FileStateStorage {
    dir: PathBuf,
}

impl FileStateStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl StateStorage for FileStateStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Persisted {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_reads_and_removes() {
        let dir = TempDir::new().unwrap();
        let storage = FileStateStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get_item("easy-chat-store").await.unwrap(), None);
        storage.set_item("easy-chat-store", "{\"state\":{}}").await.unwrap();
        assert!(dir.path().join("nested/easy-chat-store.json").exists());
        assert_eq!(
            storage.get_item("easy-chat-store").await.unwrap().as_deref(),
            Some("{\"state\":{}}")
        );

        storage.remove_item("easy-chat-store").await.unwrap();
        storage.remove_item("easy-chat-store").await.unwrap();
        assert_eq!(storage.get_item("easy-chat-store").await.unwrap(), None);
    }

    #[test]
    fn key_is_sanitized_into_file_name() {
        let storage = FileStateStorage::new("/tmp/x");
        assert_eq!(storage.path_for("../evil key"), PathBuf::from("/tmp/x/___evil_key.json"));
    }
}

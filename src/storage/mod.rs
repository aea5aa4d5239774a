mod file;
mod memory;
mod redis;

pub use file::FileStateStorage;
pub use memory::MemoryStateStorage;
pub use self::redis::RedisStateStorage;

use async_trait::async_trait;
use crate::cli::Args;
use log::info;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Redis storage error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("State serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported storage type: {0}")]
    UnsupportedType(String),
}

/// Key/value persistence for the serialized store, shaped like browser local storage.
#[async_trait]
pub trait StateStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

pub fn create_state_storage(args: &Args) -> Result<Arc<dyn StateStorage>, StorageError> {
    match args.storage_type.to_lowercase().as_str() {
        "file" => Ok(Arc::new(FileStateStorage::new(&args.storage_path))),
        "memory" => Ok(Arc::new(MemoryStateStorage::default())),
        "redis" => {
            let store = RedisStateStorage::new(&args.storage_redis_url)?;
            Ok(Arc::new(store))
        }
        other => Err(StorageError::UnsupportedType(other.to_string())),
    }
}

pub fn initialize_state_storage(args: &Args) -> Result<Arc<dyn StateStorage>, StorageError> {
    let location = match args.storage_type.to_lowercase().as_str() {
        "file" => args.storage_path.as_str(),
        "redis" => args.storage_redis_url.as_str(),
        _ => "process memory",
    };
    info!("App state will be stored in: {} at {}", args.storage_type, location);
    create_state_storage(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_backend() {
        let mut args = Args::for_tests();
        args.storage_type = "sqlite".into();
        assert!(matches!(create_state_storage(&args), Err(StorageError::UnsupportedType(t)) if t == "sqlite"));
    }

    #[tokio::test]
    async fn memory_backend_round_trip() {
        let storage = create_state_storage(&Args::for_tests()).unwrap();
        assert_eq!(storage.get_item("k").await.unwrap(), None);
        storage.set_item("k", "v").await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("v"));
        storage.remove_item("k").await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap(), None);
    }
}

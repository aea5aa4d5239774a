use async_trait::async_trait;
use crate::storage::{ StateStorage, StorageError };
use redis::{ Client, AsyncCommands };

pub struct RedisStateStorage {
    client: Client,
}

impl RedisStateStorage {
    pub fn new(url: &str) -> Result<Self, StorageError> {
        Ok(Self {
            client: Client::open(url)?,
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

#[async_trait]
impl StateStorage for RedisStateStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

//! Redis-backed counter store.

use async_trait::async_trait;
use fred::error::Error as RedisError;
use fred::prelude::{Client, ClientLike, Config, KeysInterface};
use tracing::{debug, info};

use super::CounterStore;
use crate::error::{Result, TallyguardError};

/// Counter store backed by a Redis server.
///
/// Every contract operation maps to the Redis command of the same name, so
/// atomicity of `INCR` is provided by the server.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    /// Wrap an already connected client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from a `redis://` URL, connect, and wait for the
    /// connection to come up.
    pub async fn connect(url: &str) -> Result<Self> {
        let config = Config::from_url(url)
            .map_err(|e| TallyguardError::Config(format!("Invalid Redis URL: {}", e)))?;
        let client = Client::new(config, None, None, None);
        client.connect();
        client.wait_for_connect().await.map_err(store_error)?;

        info!("Connected to Redis");
        Ok(Self { client })
    }

    /// Close the underlying connection.
    pub async fn quit(&self) -> Result<()> {
        self.client.quit().await.map_err(store_error)?;
        Ok(())
    }
}

/// Client failures (refused connection, timeout, rejected command) all
/// surface as [`TallyguardError::Store`].
fn store_error(e: RedisError) -> TallyguardError {
    TallyguardError::Store(format!("Redis {:?}: {}", e.kind(), e.details()))
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        let current: i64 = self.client.incr(key).await.map_err(store_error)?;
        Ok(current)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<()> {
        let seconds = i64::try_from(seconds).map_err(|_| {
            TallyguardError::Store(format!("expiry of {} seconds is out of range", seconds))
        })?;
        debug!(key = %key, seconds, "Setting expiry");
        self.client
            .expire::<(), _>(key, seconds, None)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = self.client.get(key).await.map_err(store_error)?;
        Ok(value)
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.client.del::<(), _>(key).await.map_err(store_error)?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        let ttl: i64 = self.client.ttl(key).await.map_err(store_error)?;
        Ok(ttl)
    }
}

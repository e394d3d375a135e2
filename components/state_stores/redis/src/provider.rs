// Copyright 2025 The Drasi Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Redis implementation of the key-value store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use kvres_lib::state_store::{KeyValueStore, StoreError, StoreResult};
use log::{debug, info, warn};
use redis::aio::MultiplexedConnection;
use redis::{Client, RedisError};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::RedisStoreConfig;

/// Key-value store backed by a Redis server.
///
/// Cloning is cheap; clones share one multiplexed connection.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    conn: MultiplexedConnection,
}

impl std::fmt::Debug for RedisKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKeyValueStore").finish_non_exhaustive()
    }
}

impl RedisKeyValueStore {
    /// Connect using `config`, retrying with exponential backoff.
    ///
    /// # Errors
    ///
    /// Fails if no url can be resolved, the url is invalid, or the server
    /// cannot be reached within the configured number of attempts.
    pub async fn connect(config: &RedisStoreConfig) -> Result<Self> {
        let url = config.resolve_url()?;
        let client = Client::open(url.as_str()).context("Failed to create Redis client")?;
        let conn = connect_with_retry(&client, config.connect_retries.max(1)).await?;
        info!("Connected Redis key-value store");
        Ok(Self { conn })
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

async fn connect_with_retry(client: &Client, max_retries: u32) -> Result<MultiplexedConnection> {
    let mut retry_delay = Duration::from_millis(100);
    let mut attempt = 1;

    loop {
        match client.get_multiplexed_async_connection().await {
            Ok(conn) => return Ok(conn),
            Err(e) if attempt < max_retries => {
                warn!(
                    "Failed to connect to Redis (attempt {attempt}/{max_retries}): {e}. Retrying in {retry_delay:?}"
                );
                sleep(retry_delay).await;
                retry_delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e).context("Failed to connect to Redis after retries"),
        }
    }
}

fn map_redis_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
    {
        StoreError::ConnectionError(e.to_string())
    } else {
        StoreError::CommandError(e.to_string())
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: Option<u64>) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl_seconds {
            cmd.arg("EX").arg(ttl);
        }
        let _: () = cmd.query_async(&mut conn).await.map_err(map_redis_error)?;
        debug!("SET {key} (ttl: {ttl_seconds:?})");
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(removed > 0)
    }
}

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

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{KeyValueStore, StoreError, StoreResult};

struct Record {
    value: String,
    expires_at: Option<Instant>,
}

impl Record {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

/// In-memory implementation of `KeyValueStore`.
///
/// Data does not persist across restarts. Expiry is measured on the tokio
/// clock and expired records are purged lazily when touched.
///
/// # Usage
///
/// ```ignore
/// use kvres_lib::state_store::MemoryKeyValueStore;
///
/// let store = MemoryKeyValueStore::new();
/// store.set("user:u1", r#"{"id":"u1"}"#.to_string(), Some(60)).await?;
/// ```
#[derive(Clone)]
pub struct MemoryKeyValueStore {
    records: Arc<RwLock<HashMap<String, Record>>>,
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of live (unexpired) keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let records = self.records.read().await;
        records.values().filter(|r| r.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();
        {
            let records = self.records.read().await;
            match records.get(key) {
                None => return Ok(None),
                Some(record) if record.is_live(now) => return Ok(Some(record.value.clone())),
                Some(_) => {}
            }
        }

        let mut records = self.records.write().await;
        if records.get(key).is_some_and(|r| !r.is_live(now)) {
            records.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: Option<u64>) -> StoreResult<()> {
        let expires_at = match ttl_seconds.filter(|seconds| *seconds > 0) {
            Some(seconds) => Some(
                Instant::now()
                    .checked_add(Duration::from_secs(seconds))
                    .ok_or_else(|| {
                        StoreError::Other(format!("expiry of {seconds}s is out of range"))
                    })?,
            ),
            None => None,
        };

        let mut records = self.records.write().await;
        records.insert(key.to_string(), Record { value, expires_at });
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        let now = Instant::now();
        let mut records = self.records.write().await;
        Ok(records.remove(key).is_some_and(|r| r.is_live(now)))
    }
}

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

//! Storage adapter contract and its key-value implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::notifier::ChangeNotifier;
use crate::entity::Entity;
use crate::error::{ResourceError, Result};
use crate::state_store::KeyValueStore;

/// Acknowledgement returned by a delete. Serializes as `{"result": "OK"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub result: String,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            result: "OK".to_string(),
        }
    }
}

/// Operations a resource server needs from the storage behind a resource.
///
/// Implementations never retry, log or swallow errors; everything bubbles up
/// to the server, which turns it into an error reply.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    fn resource_name(&self) -> &str;

    /// Load the entity stored for `id`. A missing record is `Ok(None)`.
    async fn load(&self, id: &str) -> Result<Option<Entity>>;

    /// Store `body` under `id` and return the stored entity.
    ///
    /// The stored entity is a copy of `body` with its `id` field set to `id`.
    async fn upsert(&self, id: &str, body: &Entity) -> Result<Entity>;

    /// Remove the record for `id`, whether or not it exists.
    async fn delete(&self, id: &str) -> Result<Ack>;

    /// Bus-facing representation of a loaded entity.
    fn serialize(&self, instance: &Entity) -> Value {
        instance.clone().into_value()
    }
}

/// [`ResourceAdapter`] over a [`KeyValueStore`].
///
/// Entities are stored as JSON text at `<name>:<id>`. Each operation is one
/// store round-trip; nothing is cached. Concurrent writes to one id race at
/// the store and the last one to land wins.
pub struct KvAdapter {
    name: String,
    ttl_seconds: Option<u64>,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl std::fmt::Debug for KvAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvAdapter")
            .field("name", &self.name)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl KvAdapter {
    /// A `ttl_seconds` of 0 stores records without expiry.
    pub fn new(
        name: impl Into<String>,
        ttl_seconds: u64,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            name: name.into(),
            ttl_seconds: (ttl_seconds > 0).then_some(ttl_seconds),
            store,
            notifier,
        }
    }

    pub fn ttl_seconds(&self) -> Option<u64> {
        self.ttl_seconds
    }

    pub fn storage_key(&self, id: &str) -> String {
        format!("{}:{id}", self.name)
    }

    /// Write the entity without notifying.
    pub async fn commit(&self, id: &str, body: &Entity) -> Result<Entity> {
        if id.is_empty() {
            return Err(ResourceError::bad_request("id is required"));
        }

        let mut stored = body.clone();
        stored.set_id(id);
        let text = serde_json::to_string(&stored).map_err(anyhow::Error::from)?;

        self.store
            .set(&self.storage_key(id), text, self.ttl_seconds)
            .await?;
        Ok(stored)
    }

    /// Publish the change notification for an entity that was committed.
    pub async fn notify(&self, stored: &Entity) -> Result<()> {
        self.notifier
            .notify(&self.name, &self.serialize(stored))
            .await
            .map_err(|source| ResourceError::Notification {
                resource: self.name.clone(),
                id: stored.id().unwrap_or_default().to_string(),
                source,
            })
    }
}

#[async_trait]
impl ResourceAdapter for KvAdapter {
    fn resource_name(&self) -> &str {
        &self.name
    }

    async fn load(&self, id: &str) -> Result<Option<Entity>> {
        if id.is_empty() {
            return Ok(None);
        }

        let key = self.storage_key(id);
        match self.store.get(&key).await? {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| ResourceError::malformed_record(key, e)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, id: &str, body: &Entity) -> Result<Entity> {
        let stored = self.commit(id, body).await?;
        self.notify(&stored).await?;
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<Ack> {
        self.store.del(&self.storage_key(id)).await?;
        Ok(Ack::ok())
    }
}

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

//! Test doubles shared by unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::bus::{BusError, BusResult};
use crate::entity::Entity;
use crate::resource::ChangeNotifier;
use crate::state_store::{KeyValueStore, MemoryKeyValueStore, StoreError, StoreResult};

pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build an entity from a JSON object literal.
pub fn entity(value: Value) -> Entity {
    Entity::try_from(value).expect("entity literal must be a JSON object")
}

/// A call received by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(String),
    Set {
        key: String,
        value: String,
        ttl_seconds: Option<u64>,
    },
    Del(String),
}

/// Memory store that records every call and can be switched into failure.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryKeyValueStore,
    calls: Mutex<Vec<StoreCall>>,
    failing: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, StoreCall::Set { .. }))
            .collect()
    }

    /// Make every following call fail with a connection error.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Put raw text at a key, bypassing the recorder.
    pub async fn put_raw(&self, key: &str, value: &str) {
        self.inner.set(key, value.to_string(), None).await.unwrap();
    }

    fn record(&self, call: StoreCall) -> StoreResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionError("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.record(StoreCall::Get(key.to_string()))?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: Option<u64>) -> StoreResult<()> {
        self.record(StoreCall::Set {
            key: key.to_string(),
            value: value.clone(),
            ttl_seconds,
        })?;
        self.inner.set(key, value, ttl_seconds).await
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        self.record(StoreCall::Del(key.to_string()))?;
        self.inner.del(key).await
    }
}

/// Notifier that keeps every notification it was asked to publish.
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<(String, Value)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<(String, Value)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChangeNotifier for RecordingNotifier {
    async fn notify(&self, resource: &str, entity: &Value) -> BusResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        self.notifications
            .lock()
            .unwrap()
            .push((resource.to_string(), entity.clone()));
        Ok(())
    }
}

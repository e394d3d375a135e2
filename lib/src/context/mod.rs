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

//! Shared service handles injected into every resource.
//!
//! One `ServiceContext` is handed to the bootstrap facade, which passes it to
//! each resource it builds. The handles are never reassigned; cloning the
//! context only clones the `Arc`s.
//!
//! # Example
//!
//! ```ignore
//! use kvres_lib::context::ServiceContext;
//!
//! let store = Arc::new(RedisKeyValueStore::connect(&RedisStoreConfig::default()).await?);
//! let context = ServiceContext::new(store, Arc::new(LocalMessageBus::new()));
//! let resources = ResourcePlugin::from_config(config).init(&context).await?;
//! ```

use std::sync::Arc;

use crate::bus::{LocalMessageBus, MessageBus};
use crate::state_store::{KeyValueStore, MemoryKeyValueStore};

/// Key-value store and message bus shared by the resources of one bootstrap.
#[derive(Clone)]
pub struct ServiceContext {
    pub store: Arc<dyn KeyValueStore>,
    pub bus: Arc<dyn MessageBus>,
}

impl ServiceContext {
    pub fn new(store: Arc<dyn KeyValueStore>, bus: Arc<dyn MessageBus>) -> Self {
        Self { store, bus }
    }

    /// Context backed by `MemoryKeyValueStore` and `LocalMessageBus`.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(LocalMessageBus::new()),
        )
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext").finish_non_exhaustive()
    }
}

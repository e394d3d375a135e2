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

//! Redis Key-Value Store for kvres
//!
//! This crate implements `kvres_lib::state_store::KeyValueStore` on top of a
//! Redis server using a multiplexed async connection.
//!
//! # Usage
//!
//! ```ignore
//! use kvres_lib::{LocalMessageBus, ResourceDescriptor, ResourcePlugin, ServiceContext};
//! use kvres_store_redis::{RedisKeyValueStore, RedisStoreConfig};
//! use std::sync::Arc;
//!
//! // url from the config, or REDIS_SERVER when unset
//! let store = RedisKeyValueStore::connect(&RedisStoreConfig::default()).await?;
//! let context = ServiceContext::new(Arc::new(store), Arc::new(LocalMessageBus::new()));
//! let resources = ResourcePlugin::new([ResourceDescriptor::new("user")])
//!     .init(&context)
//!     .await?;
//! ```
//!
//! # Commands
//!
//! | Operation | Command |
//! |-----------|---------|
//! | `get`     | `GET key` |
//! | `set`     | `SET key value` or `SET key value EX ttl` |
//! | `del`     | `DEL key` |

mod config;
mod provider;

pub use config::{RedisStoreConfig, REDIS_SERVER_ENV};
pub use provider::RedisKeyValueStore;

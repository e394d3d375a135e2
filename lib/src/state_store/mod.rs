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

//! Key-Value Store Trait
//!
//! This module provides the `KeyValueStore` trait through which resources
//! persist their entities.
//!
//! # Architecture
//!
//! The store follows pure dependency inversion:
//! - **Lib** defines the `KeyValueStore` trait and provides an in-memory
//!   implementation (`MemoryKeyValueStore`)
//! - **External components** (in `components/state_stores/`) implement this
//!   trait for real backends such as Redis
//! - **Applications** hand a store to the bootstrap facade through a
//!   `ServiceContext`
//!
//! The store deals in opaque strings only. Key naming and serialization
//! belong to the resource adapter.

use async_trait::async_trait;
use thiserror::Error;

mod memory;

pub use memory::MemoryKeyValueStore;

/// Error type for key-value store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the connection dropped
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The store rejected or failed a command
    #[error("Command error: {0}")]
    CommandError(String),

    /// Generic error for other failures
    #[error("Key-value store error: {0}")]
    Other(String),
}

/// Result type for key-value store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Longest expiry a resource may configure, in seconds.
///
/// Every backend must be able to represent a deadline this far ahead; Redis
/// rejects `EX` values whose millisecond deadline overflows a signed 64-bit integer.
pub const MAX_TTL_SECONDS: u64 = u32::MAX as u64;

/// Trait defining the interface for key-value stores backing resources.
///
/// # Thread Safety
///
/// Implementations must be thread-safe; a single store is shared by every
/// resource created from one bootstrap.
///
/// # Example Implementation
///
/// ```ignore
/// use kvres_lib::state_store::{KeyValueStore, StoreResult};
/// use async_trait::async_trait;
///
/// pub struct MyStore { /* connection */ }
///
/// #[async_trait]
/// impl KeyValueStore for MyStore {
///     async fn get(&self, key: &str) -> StoreResult<Option<String>> { todo!() }
///     async fn set(&self, key: &str, value: String, ttl_seconds: Option<u64>) -> StoreResult<()> { todo!() }
///     async fn del(&self, key: &str) -> StoreResult<bool> { todo!() }
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under a key.
    ///
    /// # Returns
    /// * `Ok(Some(value))` - The value was found
    /// * `Ok(None)` - The key doesn't exist (or has expired)
    /// * `Err(e)` - An error occurred
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store a value under a key, replacing any previous value.
    ///
    /// The value must be durably written before this method returns. When
    /// `ttl_seconds` is `Some(n)` with `n > 0` the key expires after `n`
    /// seconds; otherwise it never expires.
    async fn set(&self, key: &str, value: String, ttl_seconds: Option<u64>) -> StoreResult<()>;

    /// Delete a key.
    ///
    /// # Returns
    /// * `Ok(true)` - The key existed and was deleted
    /// * `Ok(false)` - The key didn't exist
    /// * `Err(e)` - An error occurred
    async fn del(&self, key: &str) -> StoreResult<bool>;
}

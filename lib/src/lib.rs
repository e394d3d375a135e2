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

// ============================================================================
// Core Public Modules
// ============================================================================

/// Entity model and change-set merging
pub mod entity;

/// Error types for kvres-lib
pub mod error;

/// Key-value store trait and in-memory implementation
pub mod state_store;

/// Message bus trait and in-process implementation
pub mod bus;

/// Shared service handles injected into resources
pub mod context;

/// Resource configuration
pub mod config;

/// Resource server binding: actions, envelopes and the request listener
pub mod server;

/// Key-value backed resources and their default actions
pub mod resource;

/// Bootstrap facade for starting many resources at once
pub mod plugin;

/// Bus client for calling a resource
pub mod client;

// ============================================================================
// Internal Modules
// ============================================================================

mod logging;

#[cfg(test)]
mod test_support;

// ============================================================================
// Clean Public API - Everything Users Need
// ============================================================================

/// Error types for kvres-lib
pub use error::{ResourceError, Result};

/// Entity stored under one id of a resource
pub use entity::Entity;

/// Storage and transport seams
pub use bus::{BusError, LocalMessageBus, MessageBus};
pub use state_store::{KeyValueStore, MemoryKeyValueStore, StoreError};

/// Configuration types
pub use config::{
    JsonValidation, PluginConfig, ResourceConfig, ResourceDefaults, ResourceDescriptor,
};

/// Resource building blocks
pub use resource::{Ack, KvAdapter, KvResource, ResourceAdapter};
pub use server::{ActionRequest, InstanceAction, ResourceServer};

/// Bootstrap and client entry points
pub use client::ResourceClient;
pub use context::ServiceContext;
pub use plugin::{ResourceModel, ResourcePlugin, ResourceSet};

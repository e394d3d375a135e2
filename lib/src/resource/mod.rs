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

//! Key-value backed resources.
//!
//! A [`KvResource`] wires a [`KvAdapter`] and its actions into a
//! [`ResourceServer`]:
//!
//! ```text
//! request on <name> ──> ResourceServer ──> action ──> KvAdapter ──> KeyValueStore
//!                                                          │
//!                                                          └─ notify ──> <name>.changed
//! ```

use std::sync::Arc;

use crate::config::ResourceConfig;
use crate::context::ServiceContext;
use crate::entity::Entity;
use crate::error::Result;
use crate::logging::{log_resource_error, log_resource_start, log_resource_stop};
use crate::server::{InstanceAction, ResourceServer, ServerOptions};

pub mod actions;
mod adapter;
mod notifier;


pub use actions::default_actions;
pub use adapter::{Ack, KvAdapter, ResourceAdapter};
pub use notifier::{change_subject, BusChangeNotifier, ChangeNotifier};

/// A resource served from the key-value store.
#[derive(Debug)]
pub struct KvResource {
    config: ResourceConfig,
    adapter: Arc<KvAdapter>,
    server: ResourceServer,
}

impl KvResource {
    /// Build a resource with only its default actions (if enabled).
    pub fn new(context: &ServiceContext, config: ResourceConfig) -> Result<Self> {
        Self::with_actions(context, config, Vec::new())
    }

    /// Build a resource. Custom actions are registered after the default ones.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidConfig` if the configuration is invalid
    /// or a custom action clashes with another action.
    pub fn with_actions(
        context: &ServiceContext,
        config: ResourceConfig,
        custom_actions: Vec<InstanceAction>,
    ) -> Result<Self> {
        config.validate()?;

        let notifier: Arc<dyn ChangeNotifier> =
            Arc::new(BusChangeNotifier::new(context.bus.clone()));
        let adapter = Arc::new(KvAdapter::new(
            &config.name,
            config.ttl_seconds,
            context.store.clone(),
            notifier.clone(),
        ));

        let mut actions = if config.default_actions {
            default_actions(adapter.clone(), config.default_body_schema.clone())
        } else {
            Vec::new()
        };
        actions.extend(custom_actions);

        let options = ServerOptions::new(adapter.clone())
            .with_actions(actions)
            .with_json_validation(config.json_validation)
            .with_json_schemas(config.json_schemas.clone())
            .with_notifier(notifier);
        let server = ResourceServer::new(context.bus.clone(), &config.name, options)?;

        Ok(Self {
            config,
            adapter,
            server,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    pub fn adapter(&self) -> &Arc<KvAdapter> {
        &self.adapter
    }

    pub fn server(&self) -> &ResourceServer {
        &self.server
    }

    /// Begin serving requests on the bus.
    pub async fn start(&self) -> Result<()> {
        log_resource_start(self.name());
        self.server.start().await.inspect_err(|e| {
            log_resource_error(self.name(), &e.to_string());
        })
    }

    pub async fn stop(&self) {
        log_resource_stop(self.name());
        self.server.stop().await;
    }

    /// Publish a change notification for an entity.
    pub async fn emit(&self, entity: &Entity) -> Result<()> {
        self.server.emit(entity).await
    }
}

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

//! Bootstrap facade.
//!
//! [`ResourcePlugin`] takes one or more resource models, builds a
//! [`KvResource`] for each against a shared [`ServiceContext`] and starts
//! them in order.
//!
//! # Example
//!
//! ```ignore
//! let plugin = ResourcePlugin::new([
//!     ResourceDescriptor::new("user").with_default_body_schema("user"),
//!     ResourceDescriptor::new("session").with_ttl_seconds(3600),
//! ]);
//! let resources = plugin.init(&ServiceContext::in_memory()).await?;
//! ```

use log::{info, warn};
use std::sync::Arc;

use crate::config::{validate_resources, PluginConfig, ResourceDefaults, ResourceDescriptor};
use crate::context::ServiceContext;
use crate::error::Result;
use crate::resource::KvResource;
use crate::server::InstanceAction;

/// A resource descriptor plus the custom actions it exposes.
#[derive(Debug, Clone)]
pub struct ResourceModel {
    pub descriptor: ResourceDescriptor,
    /// Registered after the default actions
    pub actions: Vec<InstanceAction>,
}

impl ResourceModel {
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        Self {
            descriptor,
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: InstanceAction) -> Self {
        self.actions.push(action);
        self
    }
}

impl From<ResourceDescriptor> for ResourceModel {
    fn from(descriptor: ResourceDescriptor) -> Self {
        Self::new(descriptor)
    }
}

/// Builds and starts a set of resources.
#[derive(Debug, Clone, Default)]
pub struct ResourcePlugin {
    defaults: ResourceDefaults,
    models: Vec<ResourceModel>,
}

impl ResourcePlugin {
    pub fn new<I, M>(models: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<ResourceModel>,
    {
        Self {
            defaults: ResourceDefaults::default(),
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    /// Plugin for every resource of a loaded configuration.
    pub fn from_config(config: PluginConfig) -> Self {
        Self::new(config.resources).with_defaults(config.defaults)
    }

    /// Defaults applied to fields a descriptor leaves unset.
    pub fn with_defaults(mut self, defaults: ResourceDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn models(&self) -> &[ResourceModel] {
        &self.models
    }

    /// Build every resource, then start them in order.
    ///
    /// # Errors
    ///
    /// Any invalid configuration or duplicate resource name fails before a
    /// resource is started. If a resource fails to start, the resources
    /// already started are stopped again and the error is returned.
    pub async fn init(&self, context: &ServiceContext) -> Result<ResourceSet> {
        let configs: Vec<_> = self
            .models
            .iter()
            .map(|model| model.descriptor.resolve(&self.defaults))
            .collect();
        validate_resources(&configs)?;

        let mut resources = Vec::with_capacity(configs.len());
        for (model, config) in self.models.iter().zip(configs) {
            resources.push(Arc::new(KvResource::with_actions(
                context,
                config,
                model.actions.clone(),
            )?));
        }

        for (started, resource) in resources.iter().enumerate() {
            if let Err(e) = resource.start().await {
                warn!(
                    "Resource '{}' failed to start, stopping {started} started resource(s)",
                    resource.name()
                );
                for running in &resources[..started] {
                    running.stop().await;
                }
                return Err(e);
            }
        }

        info!("Started {} resource(s)", resources.len());
        Ok(ResourceSet { resources })
    }
}

/// Resources started by one [`ResourcePlugin::init`].
#[derive(Debug)]
pub struct ResourceSet {
    resources: Vec<Arc<KvResource>>,
}

impl ResourceSet {
    pub fn get(&self, name: &str) -> Option<&Arc<KvResource>> {
        self.resources.iter().find(|r| r.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<KvResource>> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Stop every resource, in reverse start order.
    pub async fn stop(&self) {
        for resource in self.resources.iter().rev() {
            resource.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusResult, LocalMessageBus, MessageBus, Subscription};
    use crate::config::JsonValidation;
    use crate::error::ResourceError;
    use crate::state_store::MemoryKeyValueStore;
    use crate::test_support::init_test_logging;
    use async_trait::async_trait;

    /// Bus that refuses subscriptions to one subject.
    struct RefusingBus {
        inner: LocalMessageBus,
        refuse: String,
    }

    #[async_trait]
    impl MessageBus for RefusingBus {
        async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
            self.inner.publish(subject, payload).await
        }

        async fn subscribe(&self, subject: &str) -> BusResult<Subscription> {
            if subject == self.refuse {
                return Err(crate::bus::BusError::Closed);
            }
            self.inner.subscribe(subject).await
        }

        async fn request(&self, subject: &str, payload: Vec<u8>) -> BusResult<Vec<u8>> {
            self.inner.request(subject, payload).await
        }
    }

    #[tokio::test]
    async fn test_init_starts_every_resource() {
        init_test_logging();
        let context = ServiceContext::in_memory();
        let plugin = ResourcePlugin::new([
            ResourceDescriptor::new("user"),
            ResourceDescriptor::new("session").with_ttl_seconds(60),
        ]);

        let resources = plugin.init(&context).await.unwrap();
        assert_eq!(resources.len(), 2);
        assert!(resources.iter().all(|r| r.server().is_running()));
        assert_eq!(
            resources.get("session").unwrap().adapter().ttl_seconds(),
            Some(60)
        );
        assert!(resources.get("missing").is_none());

        resources.stop().await;
        assert!(resources.iter().all(|r| !r.server().is_running()));
    }

    #[tokio::test]
    async fn test_defaults_apply_to_unset_fields() {
        let context = ServiceContext::in_memory();
        let plugin = ResourcePlugin::new([
            ResourceDescriptor::new("user"),
            ResourceDescriptor::new("audit").with_ttl_seconds(0),
        ])
        .with_defaults(ResourceDefaults {
            ttl_seconds: 300,
            ..Default::default()
        });

        let resources = plugin.init(&context).await.unwrap();
        assert_eq!(
            resources.get("user").unwrap().adapter().ttl_seconds(),
            Some(300)
        );
        assert_eq!(
            resources.get("audit").unwrap().adapter().ttl_seconds(),
            None
        );
    }

    #[tokio::test]
    async fn test_invalid_config_aborts_before_start() {
        let bus = Arc::new(LocalMessageBus::new());
        let context = ServiceContext::new(Arc::new(MemoryKeyValueStore::new()), bus.clone());
        let plugin = ResourcePlugin::new([
            ResourceDescriptor::new("user"),
            ResourceDescriptor::new("strict").with_json_validation(JsonValidation::Strict),
        ]);

        let err = plugin.init(&context).await.unwrap_err();
        assert!(matches!(err, ResourceError::InvalidConfig { .. }));
        assert_eq!(bus.subscriber_count("user").await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let context = ServiceContext::in_memory();
        let plugin = ResourcePlugin::new([
            ResourceDescriptor::new("user"),
            ResourceDescriptor::new("user"),
        ]);
        let err = plugin.init(&context).await.unwrap_err();
        assert!(err.to_string().contains("Duplicate resource name"));
    }

    #[tokio::test]
    async fn test_start_failure_stops_started_resources() {
        init_test_logging();
        let bus = Arc::new(RefusingBus {
            inner: LocalMessageBus::new(),
            refuse: "session".into(),
        });
        let context = ServiceContext::new(Arc::new(MemoryKeyValueStore::new()), bus.clone());
        let plugin = ResourcePlugin::new([
            ResourceDescriptor::new("user"),
            ResourceDescriptor::new("session"),
            ResourceDescriptor::new("audit"),
        ]);

        let err = plugin.init(&context).await.unwrap_err();
        assert!(matches!(err, ResourceError::Bus(_)));
        assert_eq!(bus.inner.subscriber_count("user").await, 0);
        assert_eq!(bus.inner.subscriber_count("audit").await, 0);
    }

    #[tokio::test]
    async fn test_models_carry_custom_actions() {
        let context = ServiceContext::in_memory();
        let ping = InstanceAction::from_fn("PING", |_| async {
            Ok::<_, ResourceError>(serde_json::json!("pong"))
        })
        .with_load_instance(false);
        let model = ResourceModel::new(ResourceDescriptor::new("user")).with_action(ping);
        let plugin = ResourcePlugin::new([model]);

        let resources = plugin.init(&context).await.unwrap();
        let reply = resources
            .get("user")
            .unwrap()
            .server()
            .dispatch(crate::server::ActionEnvelope::new("PING"))
            .await
            .unwrap();
        assert_eq!(reply, serde_json::json!("pong"));
    }

    #[test]
    fn test_from_config() {
        let config: PluginConfig = serde_yaml::from_str(
            "defaults:\n  ttlSeconds: 10\nresources:\n  - name: user\n  - name: session\n",
        )
        .unwrap();
        let plugin = ResourcePlugin::from_config(config);
        let names: Vec<_> = plugin
            .models()
            .iter()
            .map(|m| m.descriptor.name.as_str())
            .collect();
        assert_eq!(names, vec!["user", "session"]);
        assert_eq!(plugin.defaults.ttl_seconds, 10);
    }
}

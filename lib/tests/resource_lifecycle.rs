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

//! End-to-end resource lifecycle over the in-process bus.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kvres_lib::server::ActionEnvelope;
use kvres_lib::{
    InstanceAction, KeyValueStore, LocalMessageBus, MemoryKeyValueStore, PluginConfig,
    ResourceClient, ResourceDescriptor, ResourceError, ResourceModel, ResourcePlugin,
    ServiceContext,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

struct Harness {
    store: Arc<MemoryKeyValueStore>,
    bus: Arc<LocalMessageBus>,
    context: ServiceContext,
}

fn harness() -> Harness {
    init_logging();
    let store = Arc::new(MemoryKeyValueStore::new());
    let bus = Arc::new(LocalMessageBus::new());
    let context = ServiceContext::new(store.clone(), bus.clone());
    Harness {
        store,
        bus,
        context,
    }
}

#[tokio::test]
async fn test_user_scenario() {
    let h = harness();
    let resources = ResourcePlugin::new([ResourceDescriptor::new("user")])
        .init(&h.context)
        .await
        .unwrap();
    let users = ResourceClient::new(h.bus.clone(), "user");
    let mut changes = users.subscribe_changes().await.unwrap();

    let stored = users.put("u1", json!({"name": "Alice"})).await.unwrap();
    assert_eq!(stored.into_value(), json!({"id": "u1", "name": "Alice"}));

    let loaded = users.get("u1").await.unwrap();
    assert_eq!(loaded.into_value(), json!({"id": "u1", "name": "Alice"}));

    let ack = users.delete("u1").await.unwrap();
    assert_eq!(ack, json!({"result": "OK"}));

    match users.get("u1").await {
        Err(ResourceError::Remote { status: 404, .. }) => {}
        other => panic!("expected not found, got {other:?}"),
    }

    // exactly one change for the single write
    let change = changes.next().await.unwrap();
    let entity: Value = serde_json::from_slice(&change.payload).unwrap();
    assert_eq!(entity, json!({"id": "u1", "name": "Alice"}));
    assert!(
        tokio::time::timeout(Duration::from_millis(50), changes.next())
            .await
            .is_err()
    );

    resources.stop().await;
}

#[tokio::test]
async fn test_idle_change_subscriber_does_not_stall_writes() {
    let h = harness();
    let _resources = ResourcePlugin::new([ResourceDescriptor::new("user")])
        .init(&h.context)
        .await
        .unwrap();
    let users = ResourceClient::new(h.bus.clone(), "user");
    let _idle = users.subscribe_changes().await.unwrap();

    for i in 0..1100 {
        let id = format!("u{i}");
        let stored = users.put(&id, json!({"n": i})).await.unwrap();
        assert_eq!(stored.id(), Some(id.as_str()));
    }
    assert_eq!(h.store.len().await, 1100);
}

#[tokio::test]
async fn test_patch_over_the_bus() {
    let h = harness();
    let _resources = ResourcePlugin::new([ResourceDescriptor::new("doc")])
        .init(&h.context)
        .await
        .unwrap();
    let docs = ResourceClient::new(h.bus.clone(), "doc");

    docs.put("d1", json!({"a": {"x": 1, "y": 2}, "b": [1, 2]}))
        .await
        .unwrap();
    let patched = docs.patch("d1", json!({"a": {"y": 9}, "b": [3]})).await.unwrap();
    assert_eq!(
        patched.into_value(),
        json!({"id": "d1", "a": {"x": 1, "y": 9}, "b": [3]})
    );

    let raw = h.store.get("doc:d1").await.unwrap().unwrap();
    let raw: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(raw, json!({"id": "d1", "a": {"x": 1, "y": 9}, "b": [3]}));

    match docs.patch("d2", json!({"a": 1})).await {
        Err(ResourceError::Remote { status: 404, .. }) => {}
        other => panic!("expected not found, got {other:?}"),
    }
    match docs
        .call(ActionEnvelope::new("PATCH").with_id("d1"))
        .await
    {
        Err(ResourceError::Remote { status: 400, .. }) => {}
        other => panic!("expected bad request, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_record_is_server_error() {
    let h = harness();
    let _resources = ResourcePlugin::new([ResourceDescriptor::new("user")])
        .init(&h.context)
        .await
        .unwrap();
    h.store
        .set("user:broken", "{oops".to_string(), None)
        .await
        .unwrap();

    let users = ResourceClient::new(h.bus.clone(), "user");
    match users.get("broken").await {
        Err(ResourceError::Remote { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("user:broken"));
        }
        other => panic!("expected malformed record, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resources_from_config_file() {
    let h = harness();
    let config = PluginConfig::load_from_file(fixture_path("resources.yaml")).unwrap();
    config.validate().unwrap();

    let resources = ResourcePlugin::from_config(config)
        .init(&h.context)
        .await
        .unwrap();
    assert_eq!(resources.len(), 2);

    let session = resources.get("session").unwrap();
    assert_eq!(session.adapter().ttl_seconds(), Some(1800));
    let user = resources.get("user").unwrap();
    assert_eq!(user.config().default_body_schema.as_deref(), Some("user"));

    resources.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_session_expires() {
    let h = harness();
    let session = ResourceDescriptor::new("session").with_ttl_seconds(60);
    let _resources = ResourcePlugin::new([session])
        .init(&h.context)
        .await
        .unwrap();
    let sessions = ResourceClient::new(h.bus.clone(), "session");

    sessions.put("s1", json!({"user": "u1"})).await.unwrap();
    assert!(sessions.get("s1").await.is_ok());

    tokio::time::advance(Duration::from_secs(61)).await;
    match sessions.get("s1").await {
        Err(ResourceError::Remote { status: 404, .. }) => {}
        other => panic!("expected expiry, got {other:?}"),
    }
}

#[tokio::test]
async fn test_custom_action_over_the_bus() {
    let h = harness();
    let rename = InstanceAction::from_fn("RENAME", |request| async move {
        let instance = request
            .instance
            .ok_or_else(|| ResourceError::bad_request("id is required"))?;
        let name = instance
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_uppercase();
        Ok::<_, ResourceError>(json!({"id": instance.id(), "shout": name}))
    });
    let _resources = ResourcePlugin::new([
        ResourceModel::new(ResourceDescriptor::new("user")).with_action(rename)
    ])
    .init(&h.context)
    .await
    .unwrap();

    let users = ResourceClient::new(h.bus.clone(), "user");
    users.put("u1", json!({"name": "Alice"})).await.unwrap();
    let reply = users
        .call(ActionEnvelope::new("RENAME").with_id("u1"))
        .await
        .unwrap();
    assert_eq!(reply, json!({"id": "u1", "shout": "ALICE"}));
}

#[tokio::test]
async fn test_unknown_resource_has_no_responders() {
    let h = harness();
    let client = ResourceClient::new(h.bus.clone(), "nobody");
    match client.get("x").await {
        Err(ResourceError::Bus(kvres_lib::BusError::NoResponders { subject })) => {
            assert_eq!(subject, "nobody")
        }
        other => panic!("expected no responders, got {other:?}"),
    }
}

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

//! Entity model and change-set merging.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field that carries the entity id once persisted.
pub const ID_FIELD: &str = "id";

/// A JSON object stored under one id of a resource.
///
/// Serializes transparently as the underlying object, so the stored text is
/// the entity itself with no envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(Map<String, Value>);

impl Entity {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// The `id` field, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Overwrite the `id` field.
    pub fn set_id(&mut self, id: &str) {
        self.0
            .insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Merge a change-set into this entity.
    ///
    /// Nested objects are merged key by key; arrays, scalars and nulls in the
    /// change-set replace the current value outright.
    pub fn merge(&mut self, changes: &Map<String, Value>) {
        merge_objects(&mut self.0, changes);
    }
}

impl From<Map<String, Value>> for Entity {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        entity.into_value()
    }
}

impl TryFrom<Value> for Entity {
    /// Non-object values are handed back unchanged.
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(other),
        }
    }
}

/// Recursively merge `changes` into `target`.
pub fn deep_merge(target: &mut Value, changes: &Value) {
    match (target, changes) {
        (Value::Object(target), Value::Object(changes)) => merge_objects(target, changes),
        (target, changes) => *target = changes.clone(),
    }
}

fn merge_objects(target: &mut Map<String, Value>, changes: &Map<String, Value>) {
    for (key, change) in changes {
        match target.get_mut(key) {
            Some(current) => deep_merge(current, change),
            None => {
                target.insert(key.clone(), change.clone());
            }
        }
    }
}

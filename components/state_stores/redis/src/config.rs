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

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Environment variable consulted when no url is configured.
pub const REDIS_SERVER_ENV: &str = "REDIS_SERVER";

fn default_connect_retries() -> u32 {
    3
}

/// Connection settings for [`RedisKeyValueStore`](crate::RedisKeyValueStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RedisStoreConfig {
    /// `redis://host:port[/db]`; falls back to `REDIS_SERVER` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Attempts for the initial connection (default: 3)
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            connect_retries: default_connect_retries(),
        }
    }
}

impl RedisStoreConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// The url to connect to: the configured one, then `REDIS_SERVER`.
    pub fn resolve_url(&self) -> Result<String> {
        self.resolve_url_from(|name| std::env::var(name).ok())
    }

    /// Like [`resolve_url`](Self::resolve_url) with an explicit environment lookup.
    pub fn resolve_url_from<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = self.url.as_deref().filter(|url| !url.is_empty()) {
            return Ok(url.to_string());
        }
        lookup(REDIS_SERVER_ENV)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                anyhow!("Redis url is not configured and {REDIS_SERVER_ENV} is not set")
            })
    }
}

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

use log::{error, info};

pub fn log_resource_start(name: &str) {
    info!("Starting resource component: {name}");
}

pub fn log_resource_stop(name: &str) {
    info!("Stopping resource component: {name}");
}

pub fn log_resource_error(name: &str, error: &str) {
    error!("Error in resource component {name}: {error}");
}

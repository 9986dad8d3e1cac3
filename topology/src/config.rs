//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//


//! Topology configuration

/// Default first console TCP port on a hypervisor
pub const DEFAULT_BASE_CONSOLE: u16 = 2000;

/// Default first UDP port handed out for link endpoints
pub const DEFAULT_BASE_TRANSPORT_PORT: u16 = 10000;

/// Per-hypervisor resource configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyConfig {
    /// First console port tried for routers
    pub base_console: u16,

    /// First UDP port allocated for link endpoints
    pub base_transport_port: u16,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            base_console: DEFAULT_BASE_CONSOLE,
            base_transport_port: DEFAULT_BASE_TRANSPORT_PORT,
        }
    }
}

impl TopologyConfig {
    /// Set the first console port
    pub fn with_base_console(mut self, port: u16) -> Self {
        self.base_console = port;
        self
    }

    /// Set the first link transport port
    pub fn with_base_transport_port(mut self, port: u16) -> Self {
        self.base_transport_port = port;
        self
    }
}

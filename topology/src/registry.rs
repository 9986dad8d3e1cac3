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


//! Per-hypervisor device bookkeeping

use std::collections::HashMap;
use std::fmt;

/// Identifier of a device within one registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a registered device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Emulated router
    Router,
    /// Ethernet bridge
    Bridge,
    /// Frame Relay switch
    FrameRelaySwitch,
    /// ATM switch
    AtmSwitch,
    /// Ethernet switch
    EthernetSwitch,
}

impl DeviceKind {
    /// Prefix of generated device names
    pub fn name_prefix(self) -> &'static str {
        match self {
            DeviceKind::Router => "r",
            DeviceKind::Bridge => "b",
            DeviceKind::FrameRelaySwitch => "f",
            DeviceKind::AtmSwitch => "a",
            DeviceKind::EthernetSwitch => "s",
        }
    }
}

/// A device as the registry sees it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Registry identifier
    pub id: DeviceId,
    /// Device name on the hypervisor
    pub name: String,
    /// Device kind
    pub kind: DeviceKind,
    /// Per-kind instance number
    pub instance: u32,
    /// Console TCP port, if one is assigned
    pub console: Option<u16>,
}

/// Deterministic per-kind counters used for default names and instance numbers.
#[derive(Clone, Debug, Default)]
pub struct NameGenerator {
    counters: HashMap<String, u32>,
}

impl NameGenerator {
    /// Take the next instance number for `key`.
    pub fn next_instance(&mut self, key: &str) -> u32 {
        let counter = self.counters.entry(key.to_string()).or_insert(0);
        let instance = *counter;
        *counter += 1;
        instance
    }

    /// Take the next instance number of a device kind, along with its default name.
    pub fn device(&mut self, kind: DeviceKind) -> (u32, String) {
        let prefix = kind.name_prefix();
        let instance = self.next_instance(prefix);
        (instance, format!("{prefix}{instance}"))
    }

    /// Next default endpoint name for an endpoint tag such as `udp`, e.g. `nio_udp0`.
    pub fn nio(&mut self, tag: &str) -> String {
        let key = format!("nio_{tag}");
        let instance = self.next_instance(&key);
        format!("{key}{instance}")
    }
}

/// Ordered collection of the devices created on one hypervisor
#[derive(Clone, Debug, Default)]
pub struct DeviceRegistry {
    records: Vec<DeviceRecord>,
    names: NameGenerator,
    next_id: u64,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The name generator owned by this registry
    pub fn names(&mut self) -> &mut NameGenerator {
        &mut self.names
    }

    /// Add a device without a console port.
    pub fn register(&mut self, kind: DeviceKind, name: String, instance: u32) -> DeviceId {
        let id = DeviceId(self.next_id);
        self.next_id += 1;
        self.records.push(DeviceRecord {
            id,
            name,
            kind,
            instance,
            console: None,
        });
        id
    }

    /// Remove a device, returning its record.
    pub fn remove(&mut self, id: DeviceId) -> Option<DeviceRecord> {
        let index = self.records.iter().position(|record| record.id == id)?;
        Some(self.records.remove(index))
    }

    /// Look a device up
    pub fn get(&self, id: DeviceId) -> Option<&DeviceRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Record a device's console port. Returns `false` for unknown devices.
    pub fn set_console(&mut self, id: DeviceId, console: Option<u16>) -> bool {
        match self.records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.console = console;
                true
            }
            None => false,
        }
    }

    /// First device other than `excluding` whose console is `port`.
    pub fn find_console_conflict(
        &self,
        port: u16,
        excluding: Option<DeviceId>,
    ) -> Option<&DeviceRecord> {
        self.records
            .iter()
            .find(|record| record.console == Some(port) && Some(record.id) != excluding)
    }

    /// All devices in registration order
    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when no device is registered
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

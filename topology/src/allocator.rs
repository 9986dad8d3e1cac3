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


//! Console and transport port allocation

use crate::registry::{DeviceId, DeviceRegistry};
use crate::{Result, TopologyConfig, TopologyError};
use tracing::debug;

/// Port counters for one hypervisor.
///
/// Console ports are scanned for collisions against every device in the registry. Transport
/// ports come from a plain counter that only moves forward, even when the command that
/// used a port fails.
#[derive(Clone, Debug)]
pub struct ResourceAllocator {
    base_console: u16,
    next_transport: u32,
}

impl ResourceAllocator {
    /// Create an allocator from its configuration
    pub fn new(config: TopologyConfig) -> Self {
        Self {
            base_console: config.base_console,
            next_transport: u32::from(config.base_transport_port),
        }
    }

    /// First console port tried
    pub fn base_console(&self) -> u16 {
        self.base_console
    }

    /// Change the first console port tried for devices assigned from now on.
    pub fn set_base_console(&mut self, port: u16) {
        self.base_console = port;
    }

    /// Port the next call to [`next_transport_port`](Self::next_transport_port) returns
    pub fn peek_transport_port(&self) -> u32 {
        self.next_transport
    }

    /// Move the transport counter. The counter never moves backwards.
    pub fn set_next_transport_port(&mut self, port: u16) -> Result<()> {
        let port = u32::from(port);
        if port < self.next_transport {
            return Err(TopologyError::InvalidValue(format!(
                "transport port {port} was already handed out (next is {})",
                self.next_transport
            )));
        }
        self.next_transport = port;
        Ok(())
    }

    /// Hand out the next transport port.
    pub fn next_transport_port(&mut self) -> Result<u16> {
        let port = u16::try_from(self.next_transport)
            .map_err(|_| TopologyError::InvalidValue("transport ports exhausted".to_string()))?;
        self.next_transport += 1;
        debug!(port, "Allocated transport port");
        Ok(port)
    }

    /// First free console port for `device`.
    ///
    /// The scan starts at the base port plus the device's instance number and moves up past
    /// every port held by another device.
    pub fn next_console_port(&self, registry: &DeviceRegistry, device: DeviceId) -> Result<u16> {
        let instance = registry.get(device).map_or(0, |record| record.instance);
        let mut candidate = u32::from(self.base_console) + instance;
        loop {
            let port = u16::try_from(candidate)
                .map_err(|_| TopologyError::InvalidValue("console ports exhausted".to_string()))?;
            if registry.find_console_conflict(port, Some(device)).is_none() {
                return Ok(port);
            }
            candidate += 1;
        }
    }

    /// Assign a console port to `device` and record it in the registry.
    ///
    /// An explicit `preferred` port held by a different device fails with
    /// [`TopologyError::Conflict`]. Reassigning a device the port it already holds is fine.
    /// Without a preference the first free port is taken.
    pub fn assign_console(
        &self,
        registry: &mut DeviceRegistry,
        device: DeviceId,
        preferred: Option<u16>,
    ) -> Result<u16> {
        let port = match preferred {
            Some(0) => {
                return Err(TopologyError::InvalidValue(
                    "invalid console port 0".to_string(),
                ));
            }
            Some(port) => {
                if let Some(holder) = registry.find_console_conflict(port, Some(device)) {
                    return Err(TopologyError::Conflict {
                        port,
                        holder: holder.name.clone(),
                    });
                }
                port
            }
            None => self.next_console_port(registry, device)?,
        };
        if !registry.set_console(device, Some(port)) {
            return Err(TopologyError::InvalidValue(format!(
                "device {device} is not registered"
            )));
        }
        debug!(port, %device, "Assigned console port");
        Ok(port)
    }
}

impl Default for ResourceAllocator {
    fn default() -> Self {
        Self::new(TopologyConfig::default())
    }
}

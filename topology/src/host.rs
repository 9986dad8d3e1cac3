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


//! A hypervisor together with its resource bookkeeping

use crate::allocator::ResourceAllocator;
use crate::registry::{DeviceId, DeviceKind, DeviceRecord, DeviceRegistry};
use crate::{Result, TopologyConfig, TopologyError};
use dynalink_client::{Hypervisor, HypervisorConfig, Reply};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// One hypervisor process and everything allocated on it.
///
/// The allocator and registry are attached to the session itself, so every `Host` built over
/// the same live connection shares them. Cloning is cheap.
#[derive(Clone)]
pub struct Host {
    hypervisor: Hypervisor,
    resources: Arc<Mutex<HostResources>>,
}

/// Allocator and registry, locked together so console assignment sees a stable registry.
pub(crate) struct HostResources {
    pub(crate) allocator: ResourceAllocator,
    pub(crate) registry: DeviceRegistry,
}

impl Host {
    /// Wrap an open session.
    ///
    /// The first `Host` on a session creates its allocator from `config`. Later hosts on the
    /// same session join the existing allocator and registry and `config` is ignored.
    pub fn new(hypervisor: Hypervisor, config: TopologyConfig) -> Result<Self> {
        let resources = hypervisor
            .session_state(|| {
                Mutex::new(HostResources {
                    allocator: ResourceAllocator::new(config),
                    registry: DeviceRegistry::new(),
                })
            })
            .ok_or_else(|| {
                TopologyError::InvalidState(format!(
                    "hypervisor session {} already carries unrelated state",
                    hypervisor.address()
                ))
            })?;
        Ok(Self {
            hypervisor,
            resources,
        })
    }

    /// Open a session and wrap it
    pub async fn connect(hypervisor: HypervisorConfig, config: TopologyConfig) -> Result<Self> {
        Self::new(Hypervisor::connect(hypervisor).await?, config)
    }

    /// The control session
    pub fn hypervisor(&self) -> &Hypervisor {
        &self.hypervisor
    }

    /// Address other hypervisors use to reach this one
    pub fn address(&self) -> &str {
        self.hypervisor.host()
    }

    /// `true` when both hosts drive the same live connection
    pub fn same_instance(a: &Host, b: &Host) -> bool {
        a.hypervisor.same_session(&b.hypervisor)
    }

    /// Send one command
    pub async fn request(&self, command: &str) -> Result<Reply> {
        Ok(self.hypervisor.request(command).await?)
    }

    pub(crate) async fn resources(&self) -> MutexGuard<'_, HostResources> {
        self.resources.lock().await
    }

    /// Hand out the next link transport port.
    pub async fn next_transport_port(&self) -> Result<u16> {
        self.resources().await.allocator.next_transport_port()
    }

    /// Move the transport port counter forward.
    pub async fn set_next_transport_port(&self, port: u16) -> Result<()> {
        self.resources().await.allocator.set_next_transport_port(port)
    }

    /// Port the next transport allocation returns
    pub async fn peek_transport_port(&self) -> u32 {
        self.resources().await.allocator.peek_transport_port()
    }

    /// First console port tried for new routers
    pub async fn base_console(&self) -> u16 {
        self.resources().await.allocator.base_console()
    }

    /// Change the first console port tried for new routers.
    pub async fn set_base_console(&self, port: u16) {
        self.resources().await.allocator.set_base_console(port);
    }

    /// Snapshot of the registered devices
    pub async fn devices(&self) -> Vec<DeviceRecord> {
        self.resources().await.registry.records().to_vec()
    }

    /// Device other than `excluding` holding console `port`
    pub async fn find_console_conflict(
        &self,
        port: u16,
        excluding: Option<DeviceId>,
    ) -> Option<DeviceRecord> {
        self.resources()
            .await
            .registry
            .find_console_conflict(port, excluding)
            .cloned()
    }

    /// Reserve an instance number and a name for a new device.
    pub(crate) async fn reserve_name(&self, kind: DeviceKind, name: Option<&str>) -> (u32, String) {
        let (instance, generated) = self.resources().await.registry.names().device(kind);
        (instance, name.map_or(generated, str::to_string))
    }

    /// Name for a new endpoint
    pub(crate) async fn nio_name(&self, tag: &str) -> String {
        self.resources().await.registry.names().nio(tag)
    }

    pub(crate) async fn register(&self, kind: DeviceKind, name: &str, instance: u32) -> DeviceId {
        self.resources()
            .await
            .registry
            .register(kind, name.to_string(), instance)
    }

    pub(crate) async fn unregister(&self, id: DeviceId) {
        self.resources().await.registry.remove(id);
    }

    pub(crate) async fn console_of(&self, id: DeviceId) -> Option<u16> {
        self.resources()
            .await
            .registry
            .get(id)
            .and_then(|record| record.console)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("hypervisor", &self.hypervisor)
            .finish_non_exhaustive()
    }
}

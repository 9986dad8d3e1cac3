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


//! Emulated routers

use crate::adapter::{Adapter, check_slot};
use crate::attribute::RouterAttribute;
use crate::compat::AdapterKind;
use crate::nio::{FilterDirection, FilterKind, Nio};
use crate::registry::{DeviceId, DeviceKind};
use crate::{Host, Result, TopologyError};
use dynalink_client::Reply;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// c3600 chassis variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Chassis {
    /// 3620, 2 slots
    C3620,
    /// 3640, 4 slots
    C3640,
    /// 3660, 7 slots
    C3660,
}

impl Chassis {
    /// Chassis name on the wire
    pub fn name(self) -> &'static str {
        match self {
            Chassis::C3620 => "3620",
            Chassis::C3640 => "3640",
            Chassis::C3660 => "3660",
        }
    }
}

impl FromStr for Chassis {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "3620" => Ok(Chassis::C3620),
            "3640" => Ok(Chassis::C3640),
            "3660" => Ok(Chassis::C3660),
            _ => Err(TopologyError::InvalidValue(format!("invalid chassis type {s:?}"))),
        }
    }
}

/// Router platforms
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouterModel {
    /// Cisco 7200
    C7200,
    /// Cisco 2691
    C2691,
    /// Cisco 3725
    C3725,
    /// Cisco 3745
    C3745,
    /// Cisco 3600 series
    C3600(Chassis),
}

/// Catalog defaults recorded for a new router. None of these are sent at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouterDefaults {
    /// RAM in MB
    pub ram: u32,
    /// NVRAM in KB
    pub nvram: u32,
    /// disk0 in MB
    pub disk0: u32,
    /// disk1 in MB
    pub disk1: u32,
    /// Network processing engine, c7200 only
    pub npe: Option<&'static str>,
    /// Midplane, c7200 only
    pub midplane: Option<&'static str>,
}

impl RouterModel {
    /// Platform name used as the command target
    pub fn platform(self) -> &'static str {
        match self {
            RouterModel::C7200 => "c7200",
            RouterModel::C2691 => "c2691",
            RouterModel::C3725 => "c3725",
            RouterModel::C3745 => "c3745",
            RouterModel::C3600(_) => "c3600",
        }
    }

    /// Number of adapter slots
    pub fn slot_count(self) -> usize {
        match self {
            RouterModel::C7200 | RouterModel::C3600(Chassis::C3660) => 7,
            RouterModel::C2691 | RouterModel::C3600(Chassis::C3620) => 2,
            RouterModel::C3725 => 3,
            RouterModel::C3745 => 5,
            RouterModel::C3600(Chassis::C3640) => 4,
        }
    }

    /// Catalog defaults
    pub fn defaults(self) -> RouterDefaults {
        match self {
            RouterModel::C7200 => RouterDefaults {
                ram: 256,
                nvram: 128,
                disk0: 64,
                disk1: 0,
                npe: Some("npe-200"),
                midplane: Some("vxr"),
            },
            RouterModel::C2691 | RouterModel::C3725 => RouterDefaults {
                ram: 128,
                nvram: 55,
                disk0: 16,
                disk1: 0,
                npe: None,
                midplane: None,
            },
            RouterModel::C3745 => RouterDefaults {
                ram: 128,
                nvram: 151,
                disk0: 16,
                disk1: 0,
                npe: None,
                midplane: None,
            },
            RouterModel::C3600(_) => RouterDefaults {
                ram: 128,
                nvram: 128,
                disk0: 0,
                disk1: 0,
                npe: None,
                midplane: None,
            },
        }
    }

    fn default_attributes(self) -> BTreeMap<RouterAttribute, String> {
        let defaults = self.defaults();
        let mut attributes = BTreeMap::from([
            (RouterAttribute::Ram, defaults.ram.to_string()),
            (RouterAttribute::Nvram, defaults.nvram.to_string()),
            (RouterAttribute::Disk0, defaults.disk0.to_string()),
            (RouterAttribute::Disk1, defaults.disk1.to_string()),
            (RouterAttribute::ConfReg, "0x2102".to_string()),
            (RouterAttribute::RamMmap, "1".to_string()),
            (RouterAttribute::GhostStatus, "0".to_string()),
            (RouterAttribute::IdleMax, "1500".to_string()),
            (RouterAttribute::IdleSleep, "30".to_string()),
        ]);
        if let Some(npe) = defaults.npe {
            attributes.insert(RouterAttribute::Npe, npe.to_string());
        }
        if let Some(midplane) = defaults.midplane {
            attributes.insert(RouterAttribute::Midplane, midplane.to_string());
        }
        attributes
    }
}

impl fmt::Display for RouterModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterModel::C3600(chassis) => write!(f, "c{}", chassis.name()),
            other => f.write_str(other.platform()),
        }
    }
}

/// Router lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouterState {
    /// Not running
    Stopped,
    /// Running
    Running,
    /// Paused in memory
    Suspended,
}

/// Online idle-pc operations
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdleProp {
    /// Compute idle-pc candidates
    Get,
    /// Show the computed candidates
    Show,
    /// Apply a value to the running router
    Set(String),
}

/// An emulated router.
///
/// Cloning is cheap; clones refer to the same router.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    host: Host,
    id: DeviceId,
    name: String,
    model: RouterModel,
    instance: u32,
    status: Mutex<RouterStatus>,
}

struct RouterStatus {
    state: RouterState,
    aux: Option<u16>,
    slots: Vec<Option<Adapter>>,
    attributes: BTreeMap<RouterAttribute, String>,
}

impl Router {
    /// Create a router and give it the first free console port.
    pub async fn new(host: &Host, model: RouterModel, name: Option<&str>) -> Result<Router> {
        Router::create(host, model, name, true).await
    }

    /// Create a router without a console port, for use as an IOS ghost.
    pub async fn ghost(host: &Host, model: RouterModel, name: Option<&str>) -> Result<Router> {
        Router::create(host, model, name, false).await
    }

    #[instrument(skip(host, name), fields(host = host.address(), %model))]
    async fn create(
        host: &Host,
        model: RouterModel,
        name: Option<&str>,
        console: bool,
    ) -> Result<Router> {
        let (instance, name) = host.reserve_name(DeviceKind::Router, name).await;
        host.request(&format!("{} create {name} {instance}", model.platform()))
            .await?;
        if let RouterModel::C3600(chassis) = model {
            host.request(&format!("c3600 set_chassis {name} {}", chassis.name()))
                .await?;
        }

        let id = host.register(DeviceKind::Router, &name, instance).await;
        let router = Router {
            inner: Arc::new(RouterInner {
                host: host.clone(),
                id,
                name,
                model,
                instance,
                status: Mutex::new(RouterStatus {
                    state: RouterState::Stopped,
                    aux: None,
                    slots: vec![None; model.slot_count()],
                    attributes: model.default_attributes(),
                }),
            }),
        };

        if console {
            if let Err(error) = router.apply_console(None).await {
                host.unregister(id).await;
                return Err(error);
            }
        }
        let console = router.console().await;
        info!(router = %router.name(), ?console, "Created router");
        Ok(router)
    }

    /// Router name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Router model
    pub fn model(&self) -> RouterModel {
        self.inner.model
    }

    /// Host the router lives on
    pub fn host(&self) -> &Host {
        &self.inner.host
    }

    /// Registry identifier
    pub fn id(&self) -> DeviceId {
        self.inner.id
    }

    /// Instance number passed to the hypervisor at creation
    pub fn instance(&self) -> u32 {
        self.inner.instance
    }

    /// Current lifecycle state
    pub async fn state(&self) -> RouterState {
        self.inner.status.lock().await.state
    }

    /// Console TCP port
    pub async fn console(&self) -> Option<u16> {
        self.inner.host.console_of(self.inner.id).await
    }

    /// Aux TCP port
    pub async fn aux(&self) -> Option<u16> {
        self.inner.status.lock().await.aux
    }

    /// `true` when both handles refer to the same router
    pub fn same_router(&self, other: &Router) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    async fn transition(
        &self,
        command: String,
        next: RouterState,
        refuse: impl Fn(RouterState) -> Option<&'static str>,
    ) -> Result<Reply> {
        let mut status = self.inner.status.lock().await;
        if let Some(reason) = refuse(status.state) {
            return Err(TopologyError::InvalidState(format!(
                "router \"{}\" {reason}",
                self.inner.name
            )));
        }
        let reply = self.inner.host.request(&command).await?;
        status.state = next;
        info!(router = %self.inner.name, state = ?next, "Router state changed");
        Ok(reply)
    }

    /// Start the router.
    pub async fn start(&self) -> Result<Reply> {
        let command = format!("{} start {}", self.inner.model.platform(), self.inner.name);
        self.transition(command, RouterState::Running, |state| match state {
            RouterState::Running => Some("is already running"),
            RouterState::Suspended => Some("is suspended and cannot be started. Use resume."),
            RouterState::Stopped => None,
        })
        .await
    }

    /// Stop the router.
    pub async fn stop(&self) -> Result<Reply> {
        let command = format!("{} stop {}", self.inner.model.platform(), self.inner.name);
        self.transition(command, RouterState::Stopped, |state| match state {
            RouterState::Stopped => Some("is already stopped"),
            _ => None,
        })
        .await
    }

    /// Suspend a running router.
    pub async fn suspend(&self) -> Result<Reply> {
        let command = format!("vm suspend {}", self.inner.name);
        self.transition(command, RouterState::Suspended, |state| match state {
            RouterState::Suspended => Some("is already suspended"),
            RouterState::Stopped => Some("is stopped and cannot be suspended"),
            RouterState::Running => None,
        })
        .await
    }

    /// Resume a suspended router.
    pub async fn resume(&self) -> Result<Reply> {
        let command = format!("vm resume {}", self.inner.name);
        self.transition(command, RouterState::Running, |state| match state {
            RouterState::Running => Some("is already running"),
            RouterState::Stopped => Some("is stopped and cannot be resumed"),
            RouterState::Suspended => None,
        })
        .await
    }

    /// Delete the router from the hypervisor and the registry.
    pub async fn delete(&self) -> Result<()> {
        self.inner
            .host
            .request(&format!(
                "{} delete {}",
                self.inner.model.platform(),
                self.inner.name
            ))
            .await?;
        self.inner.host.unregister(self.inner.id).await;
        info!(router = %self.inner.name, "Deleted router");
        Ok(())
    }

    /// Run an online idle-pc operation. Only valid while the router is not stopped.
    pub async fn idle_prop(&self, operation: IdleProp) -> Result<Reply> {
        let mut status = self.inner.status.lock().await;
        if status.state == RouterState::Stopped {
            return Err(TopologyError::InvalidState(format!(
                "router \"{}\" is stopped. Idle-pc functions can only be used on running routers",
                self.inner.name
            )));
        }
        let name = &self.inner.name;
        let command = match &operation {
            IdleProp::Get => format!("vm get_idle_pc_prop {name} 0"),
            IdleProp::Show => format!("vm show_idle_pc_prop {name} 0"),
            IdleProp::Set(value) => format!("vm set_idle_pc_online {name} 0 {value}"),
        };
        let reply = self.inner.host.request(&command).await?;
        if let IdleProp::Set(value) = operation {
            status.attributes.insert(RouterAttribute::IdlePc, value);
        }
        Ok(reply)
    }

    /// Timer drift report, without the status line
    pub async fn idle_pc_drift(&self) -> Result<Vec<String>> {
        let reply = self
            .inner
            .host
            .request(&format!("vm show_timer_drift {} 0", self.inner.name))
            .await?;
        Ok(reply.payload().to_vec())
    }

    async fn apply_console(&self, preferred: Option<u16>) -> Result<u16> {
        let host = &self.inner.host;
        let (port, previous) = {
            let mut resources = host.resources().await;
            let resources = &mut *resources;
            let previous = resources
                .registry
                .get(self.inner.id)
                .and_then(|record| record.console);
            let port = resources.allocator.assign_console(
                &mut resources.registry,
                self.inner.id,
                preferred,
            )?;
            (port, previous)
        };

        let command = format!("vm set_con_tcp_port {} {port}", self.inner.name);
        if let Err(error) = host.request(&command).await {
            host.resources()
                .await
                .registry
                .set_console(self.inner.id, previous);
            return Err(error);
        }
        Ok(port)
    }

    /// Move the console to `port`. Fails with a conflict when another device holds it.
    pub async fn set_console(&self, port: u16) -> Result<()> {
        self.apply_console(Some(port)).await.map(|_| ())
    }

    /// Set the aux port.
    pub async fn set_aux(&self, port: u16) -> Result<()> {
        if port == 0 {
            return Err(TopologyError::InvalidValue("invalid aux port 0".to_string()));
        }
        let mut status = self.inner.status.lock().await;
        self.inner
            .host
            .request(&format!("vm set_aux_tcp_port {} {port}", self.inner.name))
            .await?;
        status.aux = Some(port);
        Ok(())
    }

    /// Validate and apply an attribute.
    ///
    /// ```no_run
    /// # use dynalink_topology::{Router, RouterAttribute};
    /// # async fn example(router: &Router) -> dynalink_topology::Result<()> {
    /// router.set_attribute(RouterAttribute::Ram, 160).await?;
    /// router.set_attribute(RouterAttribute::Image, "/opt/ios/c7200.image").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn set_attribute(
        &self,
        attribute: RouterAttribute,
        value: impl fmt::Display,
    ) -> Result<()> {
        let model = self.inner.model;
        if !attribute.applies_to(model) {
            return Err(TopologyError::InvalidValue(format!(
                "{attribute} does not apply to {model}"
            )));
        }
        let value = attribute.rule().check(attribute, &value.to_string())?;
        let mut status = self.inner.status.lock().await;
        self.inner
            .host
            .request(&attribute.command(model, &self.inner.name, &value))
            .await?;
        status.attributes.insert(attribute, value);
        Ok(())
    }

    /// Last value applied for an attribute, or its catalog default
    pub async fn attribute(&self, attribute: RouterAttribute) -> Option<String> {
        self.inner
            .status
            .lock()
            .await
            .attributes
            .get(&attribute)
            .cloned()
    }

    /// Insert an adapter into `slot`.
    pub async fn install_adapter(&self, slot: usize, kind: AdapterKind) -> Result<()> {
        check_slot(kind, self.inner.model, slot)?;
        let mut status = self.inner.status.lock().await;
        if let Some(command) = kind.binding_command() {
            self.inner
                .host
                .request(&format!(
                    "{} {command} {} {slot} {kind}",
                    self.inner.model.platform(),
                    self.inner.name
                ))
                .await?;
        }
        if let Some(previous) = status.slots[slot].replace(Adapter::new(kind, slot)) {
            warn!(router = %self.inner.name, slot, previous = %previous.kind(), "Replaced adapter");
        }
        Ok(())
    }

    /// Snapshot of the adapter in `slot`
    pub async fn adapter(&self, slot: usize) -> Result<Option<Adapter>> {
        let status = self.inner.status.lock().await;
        status
            .slots
            .get(slot)
            .cloned()
            .ok_or_else(|| self.missing_slot(slot))
    }

    fn missing_slot(&self, slot: usize) -> TopologyError {
        TopologyError::InvalidAdapter(format!(
            "slot {slot} does not exist on router \"{}\"",
            self.inner.name
        ))
    }

    fn empty_slot(&self, slot: usize) -> TopologyError {
        TopologyError::InvalidAdapter(format!(
            "invalid adapter or no adapter present in slot {slot} of router \"{}\"",
            self.inner.name
        ))
    }

    /// Kind of the adapter in `slot`, failing when the slot is empty.
    pub async fn adapter_kind(&self, slot: usize) -> Result<AdapterKind> {
        self.adapter(slot)
            .await?
            .map(|adapter| adapter.kind())
            .ok_or_else(|| self.empty_slot(slot))
    }

    /// Fail unless `slot` holds an adapter with a port numbered `port`.
    pub async fn check_port(&self, slot: usize, port: usize) -> Result<()> {
        match self.adapter(slot).await? {
            Some(adapter) => adapter.check_port(port),
            None => Err(self.empty_slot(slot)),
        }
    }

    /// Endpoint bound to a port
    pub async fn nio(&self, slot: usize, port: usize) -> Result<Option<Nio>> {
        match self.adapter(slot).await? {
            Some(adapter) => Ok(adapter.nio(port)?.cloned()),
            None => Err(self.empty_slot(slot)),
        }
    }

    /// `true` when a port has an endpoint bound
    pub async fn connected(&self, slot: usize, port: usize) -> bool {
        matches!(self.nio(slot, port).await, Ok(Some(_)))
    }

    /// Bind an endpoint to a port.
    pub async fn bind_nio(&self, slot: usize, port: usize, nio: Nio) -> Result<()> {
        if !nio.kind().is_bindable() {
            return Err(TopologyError::InvalidAdapter(format!(
                "invalid NETIO {}: {} endpoints cannot be bound to a router port",
                nio.name(),
                nio.kind().tag()
            )));
        }
        let mut status = self.inner.status.lock().await;
        let adapter = match status.slots.get_mut(slot) {
            Some(Some(adapter)) => adapter,
            Some(None) => return Err(self.empty_slot(slot)),
            None => return Err(self.missing_slot(slot)),
        };
        adapter.check_port(port)?;
        self.inner
            .host
            .request(&format!(
                "{} add_nio_binding {} {slot} {port} {}",
                self.inner.model.platform(),
                self.inner.name,
                nio.name()
            ))
            .await?;
        adapter.set_nio(port, nio)
    }

    /// Apply a traffic filter to the endpoint bound to a port.
    pub async fn filter(
        &self,
        slot: usize,
        port: usize,
        filter: FilterKind,
        direction: FilterDirection,
        options: Option<&str>,
    ) -> Result<()> {
        let nio = self.nio(slot, port).await?.ok_or_else(|| {
            TopologyError::InvalidAdapter(format!(
                "Invalid interface: slot {slot} port {port} of router \"{}\" is not connected",
                self.inner.name
            ))
        })?;
        nio.filter(&self.inner.host, filter, direction, options).await
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("name", &self.inner.name)
            .field("model", &self.inner.model)
            .field("instance", &self.inner.instance)
            .finish_non_exhaustive()
    }
}

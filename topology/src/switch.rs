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


//! Frame Relay, ATM and Ethernet switches
//!
//! All three keep their port table locally. Frame Relay and ATM switches only talk to the
//! hypervisor when a circuit is mapped between two bound ports; the Ethernet switch registers
//! every endpoint as soon as it is bound.

use crate::nio::Nio;
use crate::registry::{DeviceId, DeviceKind};
use crate::{Host, Result, TopologyError};
use dynalink_client::Reply;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Identity shared by every switch kind
struct SwitchCore {
    host: Host,
    id: DeviceId,
    name: String,
    subsystem: &'static str,
}

impl SwitchCore {
    async fn create(
        host: &Host,
        kind: DeviceKind,
        subsystem: &'static str,
        name: Option<&str>,
    ) -> Result<SwitchCore> {
        let (instance, name) = host.reserve_name(kind, name).await;
        host.request(&format!("{subsystem} create {name}")).await?;
        let id = host.register(kind, &name, instance).await;
        info!(switch = %name, kind = subsystem, host = host.address(), "Created switch");
        Ok(SwitchCore {
            host: host.clone(),
            id,
            name,
            subsystem,
        })
    }

    async fn delete(&self) -> Result<()> {
        self.host
            .request(&format!("{} delete {}", self.subsystem, self.name))
            .await?;
        self.host.unregister(self.id).await;
        Ok(())
    }

    fn unconnected(&self, port: usize) -> TopologyError {
        TopologyError::InvalidAdapter(format!(
            "port {port} of {} \"{}\" has no NIO bound",
            self.subsystem, self.name
        ))
    }
}

fn bound<'a>(core: &SwitchCore, ports: &'a BTreeMap<usize, Nio>, port: usize) -> Result<&'a Nio> {
    ports.get(&port).ok_or_else(|| core.unconnected(port))
}

fn reject_null(core: &SwitchCore, nio: &Nio) -> Result<()> {
    if nio.kind().is_bindable() {
        Ok(())
    } else {
        Err(TopologyError::InvalidAdapter(format!(
            "invalid NETIO {}: null endpoints cannot be bound to {} \"{}\"",
            nio.name(),
            core.subsystem,
            core.name
        )))
    }
}

macro_rules! switch_identity {
    ($switch:ident) => {
        impl $switch {
            /// Switch name
            pub fn name(&self) -> &str {
                &self.inner.core.name
            }

            /// Host the switch lives on
            pub fn host(&self) -> &Host {
                &self.inner.core.host
            }

            /// Registry identifier
            pub fn id(&self) -> DeviceId {
                self.inner.core.id
            }

            /// Delete the switch from the hypervisor and the registry.
            pub async fn delete(&self) -> Result<()> {
                self.inner.core.delete().await
            }
        }

        impl fmt::Debug for $switch {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($switch))
                    .field("name", &self.inner.core.name)
                    .finish_non_exhaustive()
            }
        }
    };
}

// ============================================================================
// Frame Relay
// ============================================================================

/// A Frame Relay switch
#[derive(Clone)]
pub struct FrameRelaySwitch {
    inner: Arc<FrameRelayInner>,
}

struct FrameRelayInner {
    core: SwitchCore,
    state: Mutex<FrameRelayState>,
}

#[derive(Default)]
struct FrameRelayState {
    ports: BTreeMap<usize, Nio>,
    dlcis: BTreeMap<usize, Vec<u32>>,
}

switch_identity!(FrameRelaySwitch);

impl FrameRelaySwitch {
    /// Create a Frame Relay switch on `host`.
    pub async fn new(host: &Host, name: Option<&str>) -> Result<FrameRelaySwitch> {
        let core = SwitchCore::create(host, DeviceKind::FrameRelaySwitch, "frsw", name).await?;
        Ok(FrameRelaySwitch {
            inner: Arc::new(FrameRelayInner {
                core,
                state: Mutex::new(FrameRelayState::default()),
            }),
        })
    }

    /// Bind an endpoint to `port`. Nothing is sent until a circuit is mapped.
    pub async fn bind_nio(&self, port: usize, nio: Nio) -> Result<()> {
        reject_null(&self.inner.core, &nio)?;
        debug!(switch = %self.name(), port, nio = %nio, "Bound NIO");
        self.inner.state.lock().await.ports.insert(port, nio);
        Ok(())
    }

    /// Endpoint bound to `port`
    pub async fn nio(&self, port: usize) -> Option<Nio> {
        self.inner.state.lock().await.ports.get(&port).cloned()
    }

    /// `true` when `port` has an endpoint bound
    pub async fn connected(&self, port: usize) -> bool {
        self.inner.state.lock().await.ports.contains_key(&port)
    }

    /// Map DLCI `dlci1` on `port1` to DLCI `dlci2` on `port2`.
    pub async fn map(&self, port1: usize, dlci1: u32, port2: usize, dlci2: u32) -> Result<()> {
        let core = &self.inner.core;
        let mut state = self.inner.state.lock().await;
        let nio1 = bound(core, &state.ports, port1)?;
        let nio2 = bound(core, &state.ports, port2)?;
        core.host
            .request(&format!(
                "frsw create_vc {} {nio1} {dlci1} {nio2} {dlci2}",
                core.name
            ))
            .await?;
        state.dlcis.entry(port1).or_default().push(dlci1);
        state.dlcis.entry(port2).or_default().push(dlci2);
        Ok(())
    }

    /// DLCIs mapped on `port`, in mapping order
    pub async fn dlcis(&self, port: usize) -> Vec<u32> {
        let state = self.inner.state.lock().await;
        state.dlcis.get(&port).cloned().unwrap_or_default()
    }
}

// ============================================================================
// ATM
// ============================================================================

/// An ATM switch
#[derive(Clone)]
pub struct AtmSwitch {
    inner: Arc<AtmInner>,
}

struct AtmInner {
    core: SwitchCore,
    state: Mutex<AtmState>,
}

#[derive(Default)]
struct AtmState {
    ports: BTreeMap<usize, Nio>,
    vpis: BTreeMap<usize, Vec<u32>>,
}

switch_identity!(AtmSwitch);

impl AtmSwitch {
    /// Create an ATM switch on `host`.
    pub async fn new(host: &Host, name: Option<&str>) -> Result<AtmSwitch> {
        let core = SwitchCore::create(host, DeviceKind::AtmSwitch, "atmsw", name).await?;
        Ok(AtmSwitch {
            inner: Arc::new(AtmInner {
                core,
                state: Mutex::new(AtmState::default()),
            }),
        })
    }

    /// Bind an endpoint to `port`. Nothing is sent until a path or circuit is mapped.
    pub async fn bind_nio(&self, port: usize, nio: Nio) -> Result<()> {
        reject_null(&self.inner.core, &nio)?;
        debug!(switch = %self.name(), port, nio = %nio, "Bound NIO");
        self.inner.state.lock().await.ports.insert(port, nio);
        Ok(())
    }

    /// Endpoint bound to `port`
    pub async fn nio(&self, port: usize) -> Option<Nio> {
        self.inner.state.lock().await.ports.get(&port).cloned()
    }

    /// `true` when `port` has an endpoint bound
    pub async fn connected(&self, port: usize) -> bool {
        self.inner.state.lock().await.ports.contains_key(&port)
    }

    /// Map virtual path `vpi1` on `port1` to `vpi2` on `port2`.
    pub async fn map_vp(&self, port1: usize, vpi1: u32, port2: usize, vpi2: u32) -> Result<()> {
        let core = &self.inner.core;
        let mut state = self.inner.state.lock().await;
        let nio1 = bound(core, &state.ports, port1)?;
        let nio2 = bound(core, &state.ports, port2)?;
        core.host
            .request(&format!(
                "atmsw create_vpc {} {nio1} {vpi1} {nio2} {vpi2}",
                core.name
            ))
            .await?;
        state.vpis.entry(port1).or_default().push(vpi1);
        state.vpis.entry(port2).or_default().push(vpi2);
        Ok(())
    }

    /// Map virtual circuit `vpi1`/`vci1` on `port1` to `vpi2`/`vci2` on `port2`.
    pub async fn map_vc(
        &self,
        (port1, vpi1, vci1): (usize, u32, u32),
        (port2, vpi2, vci2): (usize, u32, u32),
    ) -> Result<()> {
        let core = &self.inner.core;
        let mut state = self.inner.state.lock().await;
        let nio1 = bound(core, &state.ports, port1)?;
        let nio2 = bound(core, &state.ports, port2)?;
        core.host
            .request(&format!(
                "atmsw create_vcc {} {nio1} {vpi1} {vci1} {nio2} {vpi2} {vci2}",
                core.name
            ))
            .await?;
        state.vpis.entry(port1).or_default().push(vpi1);
        state.vpis.entry(port2).or_default().push(vpi2);
        Ok(())
    }

    /// VPIs mapped on `port`, in mapping order
    pub async fn vpis(&self, port: usize) -> Vec<u32> {
        let state = self.inner.state.lock().await;
        state.vpis.get(&port).cloned().unwrap_or_default()
    }
}

// ============================================================================
// Ethernet
// ============================================================================

/// Ethernet switch port modes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortMode {
    /// Untagged member of one VLAN
    Access,
    /// 802.1Q trunk with the given native VLAN
    Dot1q,
}

impl PortMode {
    fn command(self) -> &'static str {
        match self {
            PortMode::Access => "set_access_port",
            PortMode::Dot1q => "set_dot1q_port",
        }
    }
}

impl FromStr for PortMode {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "access" => Ok(PortMode::Access),
            "dot1q" => Ok(PortMode::Dot1q),
            _ => Err(TopologyError::InvalidValue(format!("invalid port mode {s:?}"))),
        }
    }
}

/// An Ethernet switch
#[derive(Clone)]
pub struct EthernetSwitch {
    inner: Arc<EthernetInner>,
}

struct EthernetInner {
    core: SwitchCore,
    state: Mutex<EthernetState>,
}

#[derive(Default)]
struct EthernetState {
    ports: BTreeMap<usize, Nio>,
    modes: BTreeMap<usize, (PortMode, u16)>,
}

switch_identity!(EthernetSwitch);

impl EthernetSwitch {
    /// Create an Ethernet switch on `host`.
    pub async fn new(host: &Host, name: Option<&str>) -> Result<EthernetSwitch> {
        let core = SwitchCore::create(host, DeviceKind::EthernetSwitch, "ethsw", name).await?;
        Ok(EthernetSwitch {
            inner: Arc::new(EthernetInner {
                core,
                state: Mutex::new(EthernetState::default()),
            }),
        })
    }

    /// Register an endpoint on `port`, then apply `mode` if one is given.
    pub async fn add_nio(&self, port: usize, nio: Nio, mode: Option<(PortMode, u16)>) -> Result<()> {
        let core = &self.inner.core;
        if !nio.kind().is_bridgeable() {
            return Err(TopologyError::InvalidAdapter(format!(
                "invalid NETIO {}: {} endpoints cannot be added to ethsw \"{}\"",
                nio.name(),
                nio.kind().tag(),
                core.name
            )));
        }
        {
            let mut state = self.inner.state.lock().await;
            core.host
                .request(&format!("ethsw add_nio {} {nio}", core.name))
                .await?;
            state.ports.insert(port, nio);
        }
        match mode {
            Some((mode, vlan)) => self.set_port(port, mode, vlan).await,
            None => Ok(()),
        }
    }

    /// Put a bound port into `mode` on `vlan`.
    pub async fn set_port(&self, port: usize, mode: PortMode, vlan: u16) -> Result<()> {
        let core = &self.inner.core;
        let mut state = self.inner.state.lock().await;
        let nio = bound(core, &state.ports, port)?;
        core.host
            .request(&format!("ethsw {} {} {nio} {vlan}", mode.command(), core.name))
            .await?;
        state.modes.insert(port, (mode, vlan));
        Ok(())
    }

    /// Mode and VLAN last applied to `port`
    pub async fn port_mode(&self, port: usize) -> Option<(PortMode, u16)> {
        self.inner.state.lock().await.modes.get(&port).copied()
    }

    /// Endpoint bound to `port`
    pub async fn nio(&self, port: usize) -> Option<Nio> {
        self.inner.state.lock().await.ports.get(&port).cloned()
    }

    /// `true` when `port` has an endpoint bound
    pub async fn connected(&self, port: usize) -> bool {
        self.inner.state.lock().await.ports.contains_key(&port)
    }

    /// Current MAC address table, one entry per line
    pub async fn show_mac(&self) -> Result<Vec<String>> {
        let core = &self.inner.core;
        let reply: Reply = core
            .host
            .request(&format!("ethsw show_mac_addr_table {}", core.name))
            .await?;
        Ok(reply.payload().to_vec())
    }

    /// Flush the MAC address table.
    pub async fn clear_mac(&self) -> Result<()> {
        let core = &self.inner.core;
        core.host
            .request(&format!("ethsw clear_mac_addr_table {}", core.name))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_modes() {
        assert_eq!("access".parse::<PortMode>().unwrap(), PortMode::Access);
        assert_eq!("DOT1Q".parse::<PortMode>().unwrap(), PortMode::Dot1q);
        assert!("trunk".parse::<PortMode>().is_err());
        assert_eq!(PortMode::Dot1q.command(), "set_dot1q_port");
    }
}

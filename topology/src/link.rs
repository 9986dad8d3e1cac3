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


//! Point-to-point links
//!
//! [`connect`] joins two interfaces with a pair of UDP endpoints, one on each side's
//! hypervisor, each addressed at the other. The two sides may live on different
//! hypervisors; requests to them are issued one after the other and nothing is rolled back
//! when a later step fails.

use crate::bridge::Bridge;
use crate::compat::{InterfaceKind, validate_link};
use crate::nio::Nio;
use crate::router::Router;
use crate::switch::{AtmSwitch, EthernetSwitch, FrameRelaySwitch};
use crate::{Host, Result, TopologyError};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Address both endpoints use when the two sides share a hypervisor
pub const LOOPBACK: &str = "127.0.0.1";

/// One side of a link
#[derive(Clone, Debug)]
pub enum EndpointRef {
    /// A port on a router adapter
    RouterPort {
        /// Router
        router: Router,
        /// Adapter slot
        slot: usize,
        /// Port on the adapter
        port: usize,
    },
    /// A Frame Relay switch port
    FrameRelayPort {
        /// Switch
        switch: FrameRelaySwitch,
        /// Port
        port: usize,
    },
    /// An ATM switch port
    AtmPort {
        /// Switch
        switch: AtmSwitch,
        /// Port
        port: usize,
    },
    /// An Ethernet switch port
    EthernetPort {
        /// Switch
        switch: EthernetSwitch,
        /// Port
        port: usize,
    },
    /// A bridge, which takes any number of endpoints and has no numbered ports
    Bridge(Bridge),
}

impl EndpointRef {
    /// Port `port` of the adapter in `slot` of `router`
    pub fn router(router: &Router, slot: usize, port: usize) -> Self {
        EndpointRef::RouterPort {
            router: router.clone(),
            slot,
            port,
        }
    }

    /// Port `port` of a Frame Relay switch
    pub fn frame_relay(switch: &FrameRelaySwitch, port: usize) -> Self {
        EndpointRef::FrameRelayPort {
            switch: switch.clone(),
            port,
        }
    }

    /// Port `port` of an ATM switch
    pub fn atm(switch: &AtmSwitch, port: usize) -> Self {
        EndpointRef::AtmPort {
            switch: switch.clone(),
            port,
        }
    }

    /// Port `port` of an Ethernet switch
    pub fn ethernet(switch: &EthernetSwitch, port: usize) -> Self {
        EndpointRef::EthernetPort {
            switch: switch.clone(),
            port,
        }
    }

    /// A bridge
    pub fn bridge(bridge: &Bridge) -> Self {
        EndpointRef::Bridge(bridge.clone())
    }

    /// Host the interface lives on
    pub fn host(&self) -> &Host {
        match self {
            EndpointRef::RouterPort { router, .. } => router.host(),
            EndpointRef::FrameRelayPort { switch, .. } => switch.host(),
            EndpointRef::AtmPort { switch, .. } => switch.host(),
            EndpointRef::EthernetPort { switch, .. } => switch.host(),
            EndpointRef::Bridge(bridge) => bridge.host(),
        }
    }

    /// Interface kind, failing when a router slot is empty
    pub async fn interface_kind(&self) -> Result<InterfaceKind> {
        Ok(match self {
            EndpointRef::RouterPort { router, slot, .. } => {
                InterfaceKind::Adapter(router.adapter_kind(*slot).await?)
            }
            EndpointRef::FrameRelayPort { .. } => InterfaceKind::FrameRelaySwitch,
            EndpointRef::AtmPort { .. } => InterfaceKind::AtmSwitch,
            EndpointRef::EthernetPort { .. } => InterfaceKind::EthernetSwitch,
            EndpointRef::Bridge(_) => InterfaceKind::Bridge,
        })
    }

    async fn check_port(&self) -> Result<()> {
        match self {
            EndpointRef::RouterPort { router, slot, port } => router.check_port(*slot, *port).await,
            _ => Ok(()),
        }
    }

    async fn bind(&self, nio: Nio) -> Result<()> {
        match self {
            EndpointRef::RouterPort { router, slot, port } => {
                router.bind_nio(*slot, *port, nio).await
            }
            EndpointRef::FrameRelayPort { switch, port } => switch.bind_nio(*port, nio).await,
            EndpointRef::AtmPort { switch, port } => switch.bind_nio(*port, nio).await,
            EndpointRef::EthernetPort { switch, port } => switch.add_nio(*port, nio, None).await,
            EndpointRef::Bridge(bridge) => bridge.add_nio(nio).await,
        }
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRef::RouterPort { router, slot, port } => {
                write!(f, "{} {slot}/{port}", router.name())
            }
            EndpointRef::FrameRelayPort { switch, port } => write!(f, "{} {port}", switch.name()),
            EndpointRef::AtmPort { switch, port } => write!(f, "{} {port}", switch.name()),
            EndpointRef::EthernetPort { switch, port } => write!(f, "{} {port}", switch.name()),
            EndpointRef::Bridge(bridge) => f.write_str(bridge.name()),
        }
    }
}

/// A completed link
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    source: Nio,
    destination: Nio,
}

impl Link {
    /// Endpoint created on the source side
    pub fn source(&self) -> &Nio {
        &self.source
    }

    /// Endpoint created on the destination side
    pub fn destination(&self) -> &Nio {
        &self.destination
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.source, self.destination)
    }
}

fn partial(orphaned: &[&Nio], source: TopologyError) -> TopologyError {
    let orphaned: Vec<String> = orphaned.iter().map(|nio| nio.name().to_string()).collect();
    warn!(?orphaned, error = %source, "Link failed after creating endpoints");
    TopologyError::PartialLink {
        orphaned,
        source: Box::new(source),
    }
}

/// Link `src` to `dst`.
///
/// Compatibility and port numbers are checked before anything is allocated, so an
/// incompatible pair leaves both hosts untouched. Transport ports are then taken from each
/// side's own allocator and are never returned. Once the first endpoint exists any further
/// failure is reported as [`TopologyError::PartialLink`] naming the endpoints left behind.
#[instrument(skip_all, fields(src = %src, dst = %dst))]
pub async fn connect(src: &EndpointRef, dst: &EndpointRef) -> Result<Link> {
    let src_kind = src.interface_kind().await?;
    let dst_kind = dst.interface_kind().await?;
    validate_link(src_kind, dst_kind)?;
    src.check_port().await?;
    dst.check_port().await?;

    let src_host = src.host();
    let dst_host = dst.host();
    let (src_ip, dst_ip) = if Host::same_instance(src_host, dst_host) {
        (LOOPBACK, LOOPBACK)
    } else {
        (src_host.address(), dst_host.address())
    };

    let src_port = src_host.next_transport_port().await?;
    let dst_port = dst_host.next_transport_port().await?;
    debug!(src_ip, src_port, dst_ip, dst_port, "Allocated transport ports");

    let src_nio = Nio::udp(src_host, src_port, dst_ip, dst_port, None).await?;
    let dst_nio = match Nio::udp(dst_host, dst_port, src_ip, src_port, None).await {
        Ok(nio) => nio,
        Err(error) => return Err(partial(&[&src_nio], error)),
    };

    let link = Link {
        source: src_nio.clone(),
        destination: dst_nio.clone(),
    };
    if let Err(error) = src.bind(src_nio).await {
        return Err(partial(&[&link.source, &link.destination], error));
    }
    if let Err(error) = dst.bind(dst_nio).await {
        return Err(partial(&[&link.source, &link.destination], error));
    }

    info!(%link, "Linked {src} to {dst}");
    Ok(link)
}

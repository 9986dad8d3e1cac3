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


//! Network I/O endpoints
//!
//! A NIO is a named transport attachment created on one hypervisor and later bound to a
//! router port, a switch port or a bridge by name.

use crate::{Host, Result, TopologyError};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Endpoint kinds and their parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NioKind {
    /// Paired UDP tunnel
    Udp {
        /// Local UDP port
        local_port: u16,
        /// Remote host name or address
        remote_host: String,
        /// Remote UDP port
        remote_port: u16,
    },
    /// Linux raw Ethernet interface
    LinuxEth {
        /// Host interface name
        interface: String,
    },
    /// Generic Ethernet interface through pcap
    GenEth {
        /// Host interface name
        interface: String,
    },
    /// TAP device
    Tap {
        /// TAP device name
        device: String,
    },
    /// Unix domain socket pair
    Unix {
        /// Local socket path
        local: String,
        /// Remote socket path
        remote: String,
    },
    /// VDE switch
    Vde {
        /// VDE control socket
        control: String,
        /// Local socket
        local: String,
    },
    /// Discards everything
    Null,
}

impl NioKind {
    /// Tag used in hypervisor commands and default names, e.g. `udp`
    pub fn tag(&self) -> &'static str {
        match self {
            NioKind::Udp { .. } => "udp",
            NioKind::LinuxEth { .. } => "linux_eth",
            NioKind::GenEth { .. } => "gen_eth",
            NioKind::Tap { .. } => "tap",
            NioKind::Unix { .. } => "unix",
            NioKind::Vde { .. } => "vde",
            NioKind::Null => "null",
        }
    }

    fn arguments(&self) -> String {
        match self {
            NioKind::Udp {
                local_port,
                remote_host,
                remote_port,
            } => format!(" {local_port} {remote_host} {remote_port}"),
            NioKind::LinuxEth { interface } | NioKind::GenEth { interface } => {
                format!(" {interface}")
            }
            NioKind::Tap { device } => format!(" {device}"),
            NioKind::Unix { local, remote } => format!(" {local} {remote}"),
            NioKind::Vde { control, local } => format!(" {control} {local}"),
            NioKind::Null => String::new(),
        }
    }

    /// `true` when the endpoint can be bound to a router or switch port
    pub fn is_bindable(&self) -> bool {
        !matches!(self, NioKind::Null)
    }

    /// `true` when the endpoint can join a bridge or an Ethernet switch
    pub fn is_bridgeable(&self) -> bool {
        !matches!(self, NioKind::Null | NioKind::Vde { .. })
    }
}

/// A created endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nio {
    name: String,
    kind: NioKind,
}

impl Nio {
    /// Create an endpoint on `host`. Without a `name` the next default name is used.
    pub async fn create(host: &Host, kind: NioKind, name: Option<&str>) -> Result<Nio> {
        let name = match name {
            Some(name) => name.to_string(),
            None => host.nio_name(kind.tag()).await,
        };
        host.request(&format!(
            "nio create_{} {name}{}",
            kind.tag(),
            kind.arguments()
        ))
        .await?;
        debug!(nio = %name, kind = kind.tag(), host = host.address(), "Created NIO");
        Ok(Nio { name, kind })
    }

    /// Create a UDP tunnel endpoint.
    pub async fn udp(
        host: &Host,
        local_port: u16,
        remote_host: &str,
        remote_port: u16,
        name: Option<&str>,
    ) -> Result<Nio> {
        let kind = NioKind::Udp {
            local_port,
            remote_host: remote_host.to_string(),
            remote_port,
        };
        Nio::create(host, kind, name).await
    }

    /// Create a Linux raw Ethernet endpoint.
    pub async fn linux_eth(host: &Host, interface: &str, name: Option<&str>) -> Result<Nio> {
        let kind = NioKind::LinuxEth {
            interface: interface.to_string(),
        };
        Nio::create(host, kind, name).await
    }

    /// Create a generic Ethernet endpoint.
    pub async fn gen_eth(host: &Host, interface: &str, name: Option<&str>) -> Result<Nio> {
        let kind = NioKind::GenEth {
            interface: interface.to_string(),
        };
        Nio::create(host, kind, name).await
    }

    /// Create a TAP endpoint.
    pub async fn tap(host: &Host, device: &str, name: Option<&str>) -> Result<Nio> {
        let kind = NioKind::Tap {
            device: device.to_string(),
        };
        Nio::create(host, kind, name).await
    }

    /// Create a Unix socket endpoint.
    pub async fn unix(host: &Host, local: &str, remote: &str, name: Option<&str>) -> Result<Nio> {
        let kind = NioKind::Unix {
            local: local.to_string(),
            remote: remote.to_string(),
        };
        Nio::create(host, kind, name).await
    }

    /// Create a VDE endpoint.
    pub async fn vde(host: &Host, control: &str, local: &str, name: Option<&str>) -> Result<Nio> {
        let kind = NioKind::Vde {
            control: control.to_string(),
            local: local.to_string(),
        };
        Nio::create(host, kind, name).await
    }

    /// Create a null endpoint.
    pub async fn null(host: &Host, name: Option<&str>) -> Result<Nio> {
        Nio::create(host, NioKind::Null, name).await
    }

    /// Endpoint name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoint kind and parameters
    pub fn kind(&self) -> &NioKind {
        &self.kind
    }

    /// Apply, or with [`FilterKind::None`] remove, a traffic filter on this endpoint.
    ///
    /// `options` are passed to `nio setup_filter` after binding; without options only the
    /// binding is sent.
    pub async fn filter(
        &self,
        host: &Host,
        filter: FilterKind,
        direction: FilterDirection,
        options: Option<&str>,
    ) -> Result<()> {
        let direction = direction.code();
        if filter == FilterKind::None {
            host.request(&format!("nio unbind_filter {} {direction}", self.name))
                .await?;
            return Ok(());
        }
        host.request(&format!(
            "nio bind_filter {} {direction} {}",
            self.name,
            filter.name()
        ))
        .await?;
        if let Some(options) = options {
            host.request(&format!(
                "nio setup_filter {} {direction} {options}",
                self.name
            ))
            .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
impl Nio {
    pub(crate) fn detached(name: &str) -> Nio {
        Nio {
            name: name.to_string(),
            kind: NioKind::Null,
        }
    }
}

impl fmt::Display for Nio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Traffic filters understood by the hypervisor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    /// Drop one packet out of every N
    FreqDrop,
    /// Remove the filter
    None,
}

impl FilterKind {
    /// Filter name on the wire
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::FreqDrop => "freq_drop",
            FilterKind::None => "none",
        }
    }
}

impl FromStr for FilterKind {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "freq_drop" => Ok(FilterKind::FreqDrop),
            "none" => Ok(FilterKind::None),
            _ => Err(TopologyError::InvalidValue(format!("invalid filter {s:?}"))),
        }
    }
}

/// Direction a filter applies to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterDirection {
    /// Received traffic
    In,
    /// Transmitted traffic
    Out,
}

impl FilterDirection {
    fn code(self) -> u8 {
        match self {
            FilterDirection::In => 0,
            FilterDirection::Out => 1,
        }
    }
}

impl FromStr for FilterDirection {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "in" => Ok(FilterDirection::In),
            "out" => Ok(FilterDirection::Out),
            _ => Err(TopologyError::InvalidValue(format!(
                "invalid filter direction {s:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_arguments() {
        let udp = NioKind::Udp {
            local_port: 10000,
            remote_host: "127.0.0.1".to_string(),
            remote_port: 10001,
        };
        assert_eq!(udp.tag(), "udp");
        assert_eq!(udp.arguments(), " 10000 127.0.0.1 10001");
        assert_eq!(NioKind::Null.arguments(), "");
        let unix = NioKind::Unix {
            local: "/tmp/a".to_string(),
            remote: "/tmp/b".to_string(),
        };
        assert_eq!(unix.arguments(), " /tmp/a /tmp/b");
    }

    #[test]
    fn bindability() {
        let vde = NioKind::Vde {
            control: "/tmp/ctl".to_string(),
            local: "/tmp/local".to_string(),
        };
        assert!(!NioKind::Null.is_bindable());
        assert!(vde.is_bindable());
        assert!(!vde.is_bridgeable());
        assert!(NioKind::Tap { device: "tap0".to_string() }.is_bridgeable());
    }

    #[test]
    fn parse_filters() {
        assert_eq!("FREQ_DROP".parse::<FilterKind>().unwrap(), FilterKind::FreqDrop);
        assert_eq!("none".parse::<FilterKind>().unwrap(), FilterKind::None);
        assert!("delay".parse::<FilterKind>().is_err());
        assert_eq!("out".parse::<FilterDirection>().unwrap(), FilterDirection::Out);
        assert!("both".parse::<FilterDirection>().is_err());
    }
}

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


//! Interface classification and link compatibility
//!
//! Every interface that can terminate a link belongs to exactly one [`Family`]. Two
//! interfaces may be linked only when their families match, and two bridges may never be
//! linked to each other.

use crate::{Result, TopologyError};
use std::fmt;
use std::str::FromStr;

/// Compatibility class of an interface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    /// Ethernet and FastEthernet
    Ethernet,
    /// Synchronous serial, including Frame Relay
    Serial,
    /// ATM
    Atm,
    /// Packet over SONET
    Pos,
}

/// How an adapter is attached to its router
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// c7200 port adapter, bound with `add_pa_binding`
    PortAdapter,
    /// Network module, bound with `add_nm_binding`
    NetworkModule,
    /// Built into the motherboard. No binding command is sent.
    Integrated,
}

/// Every adapter and network module a router slot can hold
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// C7200-IO-FE, 1 FastEthernet port, slot 0 only
    C7200IoFe,
    /// PA-A1, 1 ATM port
    PaA1,
    /// PA-FE-TX, 1 FastEthernet port
    PaFeTx,
    /// PA-4T+, 4 serial ports
    Pa4T,
    /// PA-8T, 8 serial ports
    Pa8T,
    /// PA-4E, 4 Ethernet ports
    Pa4E,
    /// PA-8E, 8 Ethernet ports
    Pa8E,
    /// PA-POS-OC3, 1 POS port
    PaPosOc3,
    /// NM-1FE-TX, 1 FastEthernet port
    Nm1FeTx,
    /// NM-1E, 1 Ethernet port
    Nm1E,
    /// NM-4E, 4 Ethernet ports
    Nm4E,
    /// NM-4T, 4 serial ports
    Nm4T,
    /// NM-16ESW, 16 switched Ethernet ports
    Nm16Esw,
    /// Leopard-2FE, 2 FastEthernet ports integrated in the 3660
    Leopard2Fe,
    /// GT96100-FE, 2 FastEthernet ports integrated in the 2691, 3725 and 3745
    Gt96100Fe,
}

impl AdapterKind {
    /// All adapter kinds
    pub const ALL: [AdapterKind; 15] = [
        AdapterKind::C7200IoFe,
        AdapterKind::PaA1,
        AdapterKind::PaFeTx,
        AdapterKind::Pa4T,
        AdapterKind::Pa8T,
        AdapterKind::Pa4E,
        AdapterKind::Pa8E,
        AdapterKind::PaPosOc3,
        AdapterKind::Nm1FeTx,
        AdapterKind::Nm1E,
        AdapterKind::Nm4E,
        AdapterKind::Nm4T,
        AdapterKind::Nm16Esw,
        AdapterKind::Leopard2Fe,
        AdapterKind::Gt96100Fe,
    ];

    /// Model name as the hypervisor knows it
    pub fn model_name(self) -> &'static str {
        match self {
            AdapterKind::C7200IoFe => "C7200-IO-FE",
            AdapterKind::PaA1 => "PA-A1",
            AdapterKind::PaFeTx => "PA-FE-TX",
            AdapterKind::Pa4T => "PA-4T+",
            AdapterKind::Pa8T => "PA-8T",
            AdapterKind::Pa4E => "PA-4E",
            AdapterKind::Pa8E => "PA-8E",
            AdapterKind::PaPosOc3 => "PA-POS-OC3",
            AdapterKind::Nm1FeTx => "NM-1FE-TX",
            AdapterKind::Nm1E => "NM-1E",
            AdapterKind::Nm4E => "NM-4E",
            AdapterKind::Nm4T => "NM-4T",
            AdapterKind::Nm16Esw => "NM-16ESW",
            AdapterKind::Leopard2Fe => "Leopard-2FE",
            AdapterKind::Gt96100Fe => "GT96100-FE",
        }
    }

    /// Compatibility family
    pub fn family(self) -> Family {
        match self {
            AdapterKind::C7200IoFe
            | AdapterKind::PaFeTx
            | AdapterKind::Pa4E
            | AdapterKind::Pa8E
            | AdapterKind::Nm1FeTx
            | AdapterKind::Nm1E
            | AdapterKind::Nm4E
            | AdapterKind::Nm16Esw
            | AdapterKind::Leopard2Fe
            | AdapterKind::Gt96100Fe => Family::Ethernet,
            AdapterKind::Pa4T | AdapterKind::Pa8T | AdapterKind::Nm4T => Family::Serial,
            AdapterKind::PaA1 => Family::Atm,
            AdapterKind::PaPosOc3 => Family::Pos,
        }
    }

    /// Number of ports
    pub fn port_count(self) -> usize {
        match self {
            AdapterKind::C7200IoFe
            | AdapterKind::PaA1
            | AdapterKind::PaFeTx
            | AdapterKind::PaPosOc3
            | AdapterKind::Nm1FeTx
            | AdapterKind::Nm1E => 1,
            AdapterKind::Leopard2Fe | AdapterKind::Gt96100Fe => 2,
            AdapterKind::Pa4T | AdapterKind::Pa4E | AdapterKind::Nm4E | AdapterKind::Nm4T => 4,
            AdapterKind::Pa8T | AdapterKind::Pa8E => 8,
            AdapterKind::Nm16Esw => 16,
        }
    }

    /// How the adapter is attached
    pub fn attachment(self) -> Attachment {
        match self {
            AdapterKind::C7200IoFe
            | AdapterKind::PaA1
            | AdapterKind::PaFeTx
            | AdapterKind::Pa4T
            | AdapterKind::Pa8T
            | AdapterKind::Pa4E
            | AdapterKind::Pa8E
            | AdapterKind::PaPosOc3 => Attachment::PortAdapter,
            AdapterKind::Nm1FeTx
            | AdapterKind::Nm1E
            | AdapterKind::Nm4E
            | AdapterKind::Nm4T
            | AdapterKind::Nm16Esw
            | AdapterKind::Leopard2Fe => Attachment::NetworkModule,
            AdapterKind::Gt96100Fe => Attachment::Integrated,
        }
    }

    /// Hypervisor subcommand that inserts the adapter, if any
    pub fn binding_command(self) -> Option<&'static str> {
        match self.attachment() {
            Attachment::PortAdapter => Some("add_pa_binding"),
            Attachment::NetworkModule => Some("add_nm_binding"),
            Attachment::Integrated => None,
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_name())
    }
}

impl FromStr for AdapterKind {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        AdapterKind::ALL
            .into_iter()
            .find(|kind| kind.model_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TopologyError::InvalidAdapter(format!("unknown adapter {s:?}")))
    }
}

/// Kind of an interface that can terminate a link
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    /// A port on a router adapter
    Adapter(AdapterKind),
    /// An Ethernet bridge
    Bridge,
    /// A Frame Relay switch port
    FrameRelaySwitch,
    /// An ATM switch port
    AtmSwitch,
    /// An Ethernet switch port
    EthernetSwitch,
}

impl InterfaceKind {
    /// Compatibility family
    pub fn family(self) -> Family {
        match self {
            InterfaceKind::Adapter(kind) => kind.family(),
            InterfaceKind::Bridge | InterfaceKind::EthernetSwitch => Family::Ethernet,
            InterfaceKind::FrameRelaySwitch => Family::Serial,
            InterfaceKind::AtmSwitch => Family::Atm,
        }
    }

    /// Short name used in messages
    pub fn name(self) -> &'static str {
        match self {
            InterfaceKind::Adapter(kind) => kind.model_name(),
            InterfaceKind::Bridge => "Bridge",
            InterfaceKind::FrameRelaySwitch => "FRSW",
            InterfaceKind::AtmSwitch => "ATMSW",
            InterfaceKind::EthernetSwitch => "ETHSW",
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `true` when `a` and `b` may be linked.
///
/// ```
/// use dynalink_topology::{AdapterKind, InterfaceKind, compatible};
///
/// let fe = InterfaceKind::Adapter(AdapterKind::PaFeTx);
/// assert!(compatible(fe, InterfaceKind::Bridge));
/// assert!(!compatible(fe, InterfaceKind::FrameRelaySwitch));
/// assert!(!compatible(InterfaceKind::Bridge, InterfaceKind::Bridge));
/// ```
pub fn compatible(a: InterfaceKind, b: InterfaceKind) -> bool {
    if a == InterfaceKind::Bridge && b == InterfaceKind::Bridge {
        return false;
    }
    a.family() == b.family()
}

/// Fail with [`TopologyError::IncompatibleLink`] unless `a` and `b` may be linked.
pub fn validate_link(a: InterfaceKind, b: InterfaceKind) -> Result<()> {
    if compatible(a, b) {
        Ok(())
    } else {
        Err(TopologyError::IncompatibleLink { from: a, to: b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn interface_kinds() -> Vec<InterfaceKind> {
        let mut kinds: Vec<InterfaceKind> = AdapterKind::ALL
            .into_iter()
            .map(InterfaceKind::Adapter)
            .collect();
        kinds.extend([
            InterfaceKind::Bridge,
            InterfaceKind::FrameRelaySwitch,
            InterfaceKind::AtmSwitch,
            InterfaceKind::EthernetSwitch,
        ]);
        kinds
    }

    #[test]
    fn families_follow_adapter_catalog() {
        let ethernet = [
            "C7200-IO-FE",
            "PA-FE-TX",
            "PA-4E",
            "PA-8E",
            "NM-1FE-TX",
            "NM-1E",
            "NM-4E",
            "NM-16ESW",
            "Leopard-2FE",
            "GT96100-FE",
        ];
        for name in ethernet {
            assert_eq!(name.parse::<AdapterKind>().unwrap().family(), Family::Ethernet);
        }
        for name in ["PA-4T+", "PA-8T", "NM-4T"] {
            assert_eq!(name.parse::<AdapterKind>().unwrap().family(), Family::Serial);
        }
        assert_eq!(AdapterKind::PaA1.family(), Family::Atm);
        assert_eq!(AdapterKind::PaPosOc3.family(), Family::Pos);
        assert_eq!(InterfaceKind::EthernetSwitch.family(), Family::Ethernet);
        assert_eq!(InterfaceKind::FrameRelaySwitch.family(), Family::Serial);
        assert_eq!(InterfaceKind::AtmSwitch.family(), Family::Atm);
    }

    #[test]
    fn model_names_round_trip() {
        for kind in AdapterKind::ALL {
            assert_eq!(kind.model_name().parse::<AdapterKind>().unwrap(), kind);
        }
        assert!("PA-9000".parse::<AdapterKind>().is_err());
    }

    #[test]
    fn binding_commands() {
        assert_eq!(AdapterKind::Pa8E.binding_command(), Some("add_pa_binding"));
        assert_eq!(AdapterKind::Nm16Esw.binding_command(), Some("add_nm_binding"));
        assert_eq!(AdapterKind::Gt96100Fe.binding_command(), None);
    }

    #[test]
    fn bridges_never_link_to_bridges() {
        let err = validate_link(InterfaceKind::Bridge, InterfaceKind::Bridge).unwrap_err();
        assert!(matches!(err, TopologyError::IncompatibleLink { .. }));
        assert!(validate_link(InterfaceKind::Bridge, InterfaceKind::EthernetSwitch).is_ok());
    }

    proptest! {
        #[test]
        fn compatible_iff_same_family(a in 0usize..19, b in 0usize..19) {
            let kinds = interface_kinds();
            let (a, b) = (kinds[a], kinds[b]);
            let both_bridges = a == InterfaceKind::Bridge && b == InterfaceKind::Bridge;
            prop_assert_eq!(compatible(a, b), !both_bridges && a.family() == b.family());
            prop_assert_eq!(compatible(a, b), compatible(b, a));
        }
    }
}

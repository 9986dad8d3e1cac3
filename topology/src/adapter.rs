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


//! Router slot contents

use crate::compat::{AdapterKind, Attachment};
use crate::nio::Nio;
use crate::router::{Chassis, RouterModel};
use crate::{Result, TopologyError};

/// An adapter installed in a router slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Adapter {
    kind: AdapterKind,
    slot: usize,
    ports: Vec<Option<Nio>>,
}

impl Adapter {
    pub(crate) fn new(kind: AdapterKind, slot: usize) -> Self {
        Self {
            kind,
            slot,
            ports: vec![None; kind.port_count()],
        }
    }

    /// Adapter model
    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    /// Slot the adapter sits in
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Number of ports, fixed for the adapter's lifetime
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Endpoint bound to `port`
    pub fn nio(&self, port: usize) -> Result<Option<&Nio>> {
        self.check_port(port)?;
        Ok(self.ports[port].as_ref())
    }

    /// `true` when `port` has an endpoint bound
    pub fn connected(&self, port: usize) -> bool {
        self.ports.get(port).is_some_and(Option::is_some)
    }

    pub(crate) fn check_port(&self, port: usize) -> Result<()> {
        if port < self.ports.len() {
            Ok(())
        } else {
            Err(TopologyError::InvalidAdapter(format!(
                "invalid port {port} on {} in slot {} ({} ports)",
                self.kind,
                self.slot,
                self.ports.len()
            )))
        }
    }

    pub(crate) fn set_nio(&mut self, port: usize, nio: Nio) -> Result<()> {
        self.check_port(port)?;
        self.ports[port] = Some(nio);
        Ok(())
    }
}

/// Check that `kind` may be installed in `slot` of a `model` router.
pub fn check_slot(kind: AdapterKind, model: RouterModel, slot: usize) -> Result<()> {
    let invalid = |reason: &str| Err(TopologyError::InvalidAdapter(format!("invalid slot. {reason}")));

    if slot >= model.slot_count() {
        return invalid(&format!(
            "{} has {} slots, slot {slot} does not exist",
            model,
            model.slot_count()
        ));
    }

    match kind.attachment() {
        Attachment::PortAdapter if model != RouterModel::C7200 => {
            return invalid(&format!("{kind} is a c7200 port adapter"));
        }
        Attachment::NetworkModule | Attachment::Integrated if model == RouterModel::C7200 => {
            return invalid(&format!("{kind} is a network module and c7200 takes port adapters"));
        }
        _ => {}
    }

    match kind {
        AdapterKind::C7200IoFe if slot != 0 => invalid("C7200-IO-FE only supported in slot 0"),
        AdapterKind::C7200IoFe => Ok(()),
        _ if kind.attachment() == Attachment::PortAdapter && !(1..=6).contains(&slot) => {
            invalid(&format!("{kind} only supported in slots 1-6"))
        }
        AdapterKind::Leopard2Fe
            if slot != 0 || model != RouterModel::C3600(Chassis::C3660) =>
        {
            invalid("Leopard-2FE only supported in slot 0 on a 3660")
        }
        AdapterKind::Gt96100Fe
            if slot != 0
                || !matches!(
                    model,
                    RouterModel::C2691 | RouterModel::C3725 | RouterModel::C3745
                ) =>
        {
            invalid("GT96100-FE only supported in slot 0 on a 2691/3725/3745")
        }
        AdapterKind::Nm1FeTx
        | AdapterKind::Nm1E
        | AdapterKind::Nm4E
        | AdapterKind::Nm4T
        | AdapterKind::Nm16Esw
            if slot == 0 && model == RouterModel::C3600(Chassis::C3660) =>
        {
            invalid(&format!("{kind} only supported in slots 1-6 on the 3660"))
        }
        _ => Ok(()),
    }
}

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


//! Uniform router attributes
//!
//! Each attribute maps to exactly one hypervisor command of the form
//! `<target> set_<attribute> <name> [<extra>] <value>`, guarded by a validation [`Rule`].

use crate::router::RouterModel;
use crate::{Result, TopologyError};
use std::fmt;

/// Settable router attributes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouterAttribute {
    /// RAM in MB
    Ram,
    /// NVRAM in KB
    Nvram,
    /// PCMCIA disk0 size in MB
    Disk0,
    /// PCMCIA disk1 size in MB
    Disk1,
    /// CPU clock divisor
    ClockDivisor,
    /// Map guest RAM to a file
    RamMmap,
    /// IOS image path on the hypervisor host
    Image,
    /// Startup configuration imported into NVRAM
    Config,
    /// Configuration register
    ConfReg,
    /// Idle PC value
    IdlePc,
    /// Idle PC maximum
    IdleMax,
    /// Idle sleep time in milliseconds
    IdleSleep,
    /// Exec area size in MB
    ExecArea,
    /// IOS ghosting: 0 off, 1 ghost instance, 2 use a ghost
    GhostStatus,
    /// Ghost file name
    GhostFile,
    /// c7200 network processing engine
    Npe,
    /// c7200 midplane
    Midplane,
    /// c3600 I/O memory in percent, a multiple of 5
    IoMem,
}

/// Validation applied to an attribute value before it is sent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Any non-empty single token
    Text,
    /// Integer no smaller than the bound
    AtLeast(i64),
    /// Boolean, sent as `1` or `0`
    Flag,
    /// One of a fixed set of values
    OneOf(&'static [&'static str]),
    /// Integer multiple of the value
    MultipleOf(i64),
}

const NPE_TYPES: &[&str] = &[
    "npe-100", "npe-150", "npe-175", "npe-200", "npe-225", "npe-300", "npe-400",
];
const MIDPLANES: &[&str] = &["std", "vxr"];
const GHOST_STATES: &[&str] = &["0", "1", "2"];

impl Rule {
    /// Validate `value` and return the form sent to the hypervisor.
    pub fn check(self, attribute: RouterAttribute, value: &str) -> Result<String> {
        let value = value.trim();
        let invalid = || TopologyError::InvalidValue(format!("invalid {attribute} {value:?}"));
        match self {
            Rule::Text => {
                if value.is_empty() || value.contains(char::is_whitespace) {
                    return Err(invalid());
                }
                Ok(value.to_string())
            }
            Rule::AtLeast(min) => match value.parse::<i64>() {
                Ok(number) if number >= min => Ok(number.to_string()),
                _ => Err(invalid()),
            },
            Rule::Flag => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => Ok("1".to_string()),
                "0" | "false" | "off" => Ok("0".to_string()),
                _ => Err(invalid()),
            },
            Rule::OneOf(allowed) => allowed
                .iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(value))
                .map(|candidate| (*candidate).to_string())
                .ok_or_else(invalid),
            Rule::MultipleOf(step) => match value.parse::<i64>() {
                Ok(number) if number >= 0 && number % step == 0 => Ok(number.to_string()),
                _ => Err(TopologyError::InvalidValue(format!(
                    "{attribute} must be a multiple of {step}, got {value:?}"
                ))),
            },
        }
    }
}

impl RouterAttribute {
    /// All attributes
    pub const ALL: [RouterAttribute; 18] = [
        RouterAttribute::Ram,
        RouterAttribute::Nvram,
        RouterAttribute::Disk0,
        RouterAttribute::Disk1,
        RouterAttribute::ClockDivisor,
        RouterAttribute::RamMmap,
        RouterAttribute::Image,
        RouterAttribute::Config,
        RouterAttribute::ConfReg,
        RouterAttribute::IdlePc,
        RouterAttribute::IdleMax,
        RouterAttribute::IdleSleep,
        RouterAttribute::ExecArea,
        RouterAttribute::GhostStatus,
        RouterAttribute::GhostFile,
        RouterAttribute::Npe,
        RouterAttribute::Midplane,
        RouterAttribute::IoMem,
    ];

    /// Attribute name
    pub fn name(self) -> &'static str {
        match self {
            RouterAttribute::Ram => "ram",
            RouterAttribute::Nvram => "nvram",
            RouterAttribute::Disk0 => "disk0",
            RouterAttribute::Disk1 => "disk1",
            RouterAttribute::ClockDivisor => "clock",
            RouterAttribute::RamMmap => "mmap",
            RouterAttribute::Image => "image",
            RouterAttribute::Config => "cnfg",
            RouterAttribute::ConfReg => "confreg",
            RouterAttribute::IdlePc => "idlepc",
            RouterAttribute::IdleMax => "idlemax",
            RouterAttribute::IdleSleep => "idlesleep",
            RouterAttribute::ExecArea => "exec_area",
            RouterAttribute::GhostStatus => "ghost_status",
            RouterAttribute::GhostFile => "ghost_file",
            RouterAttribute::Npe => "npe",
            RouterAttribute::Midplane => "midplane",
            RouterAttribute::IoMem => "iomem",
        }
    }

    /// Validation rule
    pub fn rule(self) -> Rule {
        match self {
            RouterAttribute::Ram
            | RouterAttribute::Nvram
            | RouterAttribute::ClockDivisor => Rule::AtLeast(1),
            RouterAttribute::Disk0
            | RouterAttribute::Disk1
            | RouterAttribute::IdleMax
            | RouterAttribute::IdleSleep
            | RouterAttribute::ExecArea => Rule::AtLeast(0),
            RouterAttribute::RamMmap => Rule::Flag,
            RouterAttribute::Image
            | RouterAttribute::Config
            | RouterAttribute::ConfReg
            | RouterAttribute::IdlePc
            | RouterAttribute::GhostFile => Rule::Text,
            RouterAttribute::GhostStatus => Rule::OneOf(GHOST_STATES),
            RouterAttribute::Npe => Rule::OneOf(NPE_TYPES),
            RouterAttribute::Midplane => Rule::OneOf(MIDPLANES),
            RouterAttribute::IoMem => Rule::MultipleOf(5),
        }
    }

    /// `true` when routers of `model` have this attribute
    pub fn applies_to(self, model: RouterModel) -> bool {
        match self {
            RouterAttribute::Npe | RouterAttribute::Midplane => model == RouterModel::C7200,
            RouterAttribute::IoMem => matches!(model, RouterModel::C3600(_)),
            _ => true,
        }
    }

    /// Command that sets an already validated value on router `router`
    pub fn command(self, model: RouterModel, router: &str, value: &str) -> String {
        let platform = model.platform();
        match self {
            RouterAttribute::Ram => format!("vm set_ram {router} {value}"),
            RouterAttribute::Nvram => format!("vm set_nvram {router} {value}"),
            RouterAttribute::Disk0 => format!("vm set_disk0 {router} {value}"),
            RouterAttribute::Disk1 => format!("vm set_disk1 {router} {value}"),
            RouterAttribute::ClockDivisor => format!("vm set_clock_divisor {router} {value}"),
            RouterAttribute::RamMmap => format!("vm set_ram_mmap {router} {value}"),
            RouterAttribute::Image => format!("vm set_ios {router} {value}"),
            RouterAttribute::Config => format!("vm set_config {router} {value}"),
            RouterAttribute::ConfReg => format!("vm set_conf_reg {router} {value}"),
            RouterAttribute::IdlePc => format!("vm set_idle_pc {router} {value}"),
            RouterAttribute::IdleMax => format!("vm set_idle_max {router} 0 {value}"),
            RouterAttribute::IdleSleep => format!("vm set_idle_sleep_time {router} 0 {value}"),
            RouterAttribute::ExecArea => format!("vm set_exec_area {router} {value}"),
            RouterAttribute::GhostStatus => format!("vm set_ghost_status {router} {value}"),
            RouterAttribute::GhostFile => format!("vm set_ghost_file {router} {value}"),
            RouterAttribute::Npe => format!("{platform} set_npe {router} {value}"),
            RouterAttribute::Midplane => format!("{platform} set_midplane {router} {value}"),
            RouterAttribute::IoMem => format!("{platform} set_iomem {router} {value}"),
        }
    }
}

impl fmt::Display for RouterAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

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


//! # Dynalink Topology
//!
//! Builds virtual networks out of emulated routers, switches and bridges by issuing
//! commands to one or more hypervisors.
//!
//! Each hypervisor is wrapped in a [`Host`], which owns the console and transport port
//! allocator and the registry of devices created through it. Devices are cheap clonable
//! handles bound to their host. [`connect`] joins two interfaces, possibly on different
//! hosts, with a pair of UDP endpoints.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dynalink_client::HypervisorConfig;
//! use dynalink_topology::{
//!     AdapterKind, EndpointRef, Host, Router, RouterAttribute, RouterModel, TopologyConfig,
//!     connect,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = Host::connect(HypervisorConfig::new("localhost", 7200), TopologyConfig::default())
//!         .await?;
//!
//!     let r1 = Router::new(&host, RouterModel::C7200, Some("R1")).await?;
//!     let r2 = Router::new(&host, RouterModel::C7200, Some("R2")).await?;
//!     for router in [&r1, &r2] {
//!         router.set_attribute(RouterAttribute::Image, "/opt/ios/c7200.image").await?;
//!         router.install_adapter(1, AdapterKind::PaFeTx).await?;
//!     }
//!
//!     let link = connect(&EndpointRef::router(&r1, 1, 0), &EndpointRef::router(&r2, 1, 0)).await?;
//!     println!("{link}");
//!
//!     r1.start().await?;
//!     r2.start().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Model
//!
//! Nothing is retried and nothing is rolled back. Errors from the backend keep their literal
//! message, see [`TopologyError::backend_message`]. A link that fails after its first
//! endpoint was created reports [`TopologyError::PartialLink`].

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod adapter;
mod allocator;
mod attribute;
mod bridge;
mod compat;
mod config;
mod error;
mod host;
mod link;
mod nio;
mod registry;
mod router;
mod switch;

pub use adapter::{Adapter, check_slot};
pub use allocator::ResourceAllocator;
pub use attribute::{RouterAttribute, Rule};
pub use bridge::Bridge;
pub use compat::{AdapterKind, Attachment, Family, InterfaceKind, compatible, validate_link};
pub use config::{DEFAULT_BASE_CONSOLE, DEFAULT_BASE_TRANSPORT_PORT, TopologyConfig};
pub use error::{Result, TopologyError};
pub use host::Host;
pub use link::{EndpointRef, LOOPBACK, Link, connect};
pub use nio::{FilterDirection, FilterKind, Nio, NioKind};
pub use registry::{DeviceId, DeviceKind, DeviceRecord, DeviceRegistry, NameGenerator};
pub use router::{Chassis, IdleProp, Router, RouterDefaults, RouterModel, RouterState};
pub use switch::{AtmSwitch, EthernetSwitch, FrameRelaySwitch, PortMode};

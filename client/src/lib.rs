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

//! # Dynalink Hypervisor Client
//!
//! Async control session for a network-device emulation hypervisor.
//!
//! ## Features
//!
//! - **Half-Duplex Exchanges** - One command in flight per session, enforced by the session
//! - **Verbatim Errors** - Backend error lines are surfaced exactly as received
//! - **Dry Run** - Build topologies without sending a single byte
//! - **Testable** - Runs over any `AsyncRead + AsyncWrite` stream, with a scripted
//!   [`mock::MockBackend`] included
//!
//! ## Quick Start
//!
//! ```no_run
//! use dynalink_client::{Hypervisor, HypervisorConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HypervisorConfig::new("localhost", 7200)
//!         .with_timeout(Duration::from_secs(30));
//!
//!     let hypervisor = Hypervisor::connect(config).await?;
//!     println!("Hypervisor version {}", hypervisor.version());
//!
//!     hypervisor.set_working_dir("/tmp/lab").await?;
//!     for line in hypervisor.list("vm").await? {
//!         println!("{line}");
//!     }
//!
//!     hypervisor.close().await?;
//!     Ok(())
//! }
//! ```

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

mod config;
mod error;
mod hypervisor;
pub mod mock;

pub use config::{DEFAULT_HYPERVISOR_PORT, HypervisorConfig};
pub use error::{HypervisorError, Result};
pub use hypervisor::{Hypervisor, Transport, UNKNOWN_VERSION};

// Re-export reply types so callers do not need a direct codec dependency
pub use dynalink_replycodec::{CodecError, LineClass, Reply, ReplyStatus};

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


//! Topology error types

use crate::compat::InterfaceKind;
use dynalink_client::HypervisorError;
use thiserror::Error;

/// Result type for topology operations
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Topology error types
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The hypervisor session failed or the backend rejected a command
    #[error(transparent)]
    Hypervisor(#[from] HypervisorError),

    /// A console port is already held by another device on the same hypervisor
    #[error("console port {port} is already in use by device: {holder}")]
    Conflict {
        /// Port that was requested
        port: u16,
        /// Name of the device holding it
        holder: String,
    },

    /// The two interfaces cannot be linked
    #[error("attempt to connect {from} to {to}")]
    IncompatibleLink {
        /// Interface kind of the source endpoint
        from: InterfaceKind,
        /// Interface kind of the destination endpoint
        to: InterfaceKind,
    },

    /// A slot, port or adapter does not exist, or an endpoint of the wrong kind was supplied
    #[error("{0}")]
    InvalidAdapter(String),

    /// The operation is not valid in the device's current lifecycle state
    #[error("{0}")]
    InvalidState(String),

    /// An argument failed validation
    #[error("{0}")]
    InvalidValue(String),

    /// A link failed after at least one of its endpoints was created on a backend.
    ///
    /// Nothing is torn down. The named endpoints stay allocated on their hypervisors.
    #[error("link left partially built (orphaned: {}): {source}", .orphaned.join(", "))]
    PartialLink {
        /// Names of the endpoints left behind
        orphaned: Vec<String>,
        /// The failure that interrupted the link
        source: Box<TopologyError>,
    },
}

impl TopologyError {
    /// Check if the error left endpoints behind on a backend
    pub fn is_partial(&self) -> bool {
        matches!(self, TopologyError::PartialLink { .. })
    }

    /// Names of endpoints left behind by a partial link
    pub fn orphaned(&self) -> &[String] {
        match self {
            TopologyError::PartialLink { orphaned, .. } => orphaned,
            _ => &[],
        }
    }

    /// The backend's literal error line, if the error came from the backend
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            TopologyError::Hypervisor(error) => error.backend_message(),
            TopologyError::PartialLink { source, .. } => source.backend_message(),
            _ => None,
        }
    }
}

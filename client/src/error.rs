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

//! Hypervisor session error types

use dynalink_replycodec::CodecError;
use std::time::Duration;
use thiserror::Error;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, HypervisorError>;

/// Hypervisor session error types
#[derive(Debug, Error)]
pub enum HypervisorError {
    /// The control socket could not be established
    #[error("could not connect to hypervisor at {address}: {source}")]
    Connection {
        /// Address that was dialed
        address: String,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// No complete reply arrived within the deadline
    #[error("timed out after {0:?} waiting for a reply")]
    Timeout(Duration),

    /// The hypervisor answered with an error terminator. Carries the literal line.
    #[error("{0}")]
    Protocol(String),

    /// The hypervisor closed the connection without sending anything
    #[error("no data returned from hypervisor, server crashed?")]
    NoData,

    /// Reading from or writing to the control socket failed
    #[error("lost communication with hypervisor: {0}")]
    ConnectionLost(#[source] CodecError),

    /// The session was closed or stopped
    #[error("hypervisor session is closed")]
    Closed,

    /// The command could not be framed as a single line. Nothing was sent.
    #[error("invalid command: {0}")]
    InvalidCommand(#[source] CodecError),
}

impl HypervisorError {
    /// Check if the error came from the hypervisor rather than the transport
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, HypervisorError::Protocol(_))
    }

    /// Check if the error means the session can no longer be used
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            HypervisorError::Connection { .. }
                | HypervisorError::NoData
                | HypervisorError::ConnectionLost(_)
                | HypervisorError::Closed
        )
    }

    /// The backend's literal message, when the error carries one
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            HypervisorError::Protocol(line) => Some(line),
            _ => None,
        }
    }
}

impl From<CodecError> for HypervisorError {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::MultilineCommand(_) => HypervisorError::InvalidCommand(error),
            other => HypervisorError::ConnectionLost(other),
        }
    }
}

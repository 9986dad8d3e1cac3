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

//! Hypervisor session configuration

use dynalink_replycodec::consts::DEFAULT_MAX_LINES;
use std::time::Duration;

/// Default TCP port a hypervisor listens on
pub const DEFAULT_HYPERVISOR_PORT: u16 = 7200;

/// Hypervisor session configuration
#[derive(Debug, Clone)]
pub struct HypervisorConfig {
    /// Hypervisor hostname or IP address
    pub host: String,

    /// Hypervisor control port
    pub port: u16,

    /// How long to wait for a complete reply to a command
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Size of each socket read
    pub read_chunk_size: usize,

    /// Upper bound on the number of lines in a single reply
    pub max_reply_lines: usize,

    /// Suppress all socket traffic. Requests return empty replies.
    pub dry_run: bool,

    /// Log every command and reply at debug level instead of trace
    pub verbose: bool,
}

impl Default for HypervisorConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_HYPERVISOR_PORT,
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            read_chunk_size: 1024,
            max_reply_lines: DEFAULT_MAX_LINES,
            dry_run: false,
            verbose: false,
        }
    }
}

impl HypervisorConfig {
    /// Create a new configuration for the hypervisor at `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the reply timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the socket read size
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Set the reply line limit
    pub fn with_max_reply_lines(mut self, lines: usize) -> Self {
        self.max_reply_lines = lines;
        self
    }

    /// Enable or disable dry run mode
    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Enable or disable verbose command logging
    pub fn with_verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Get the hypervisor address as a string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

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

//! In-memory hypervisor for tests
//!
//! [`MockBackend`] answers commands over a [`tokio::io::duplex`] pipe according to a list of
//! prefix rules and records every command it receives. Unmatched commands are answered with
//! `100-OK`, and `hypervisor version` with `100-<version>`.
//!
//! ```no_run
//! use dynalink_client::HypervisorConfig;
//! use dynalink_client::mock::MockBackend;
//!
//! # async fn example() -> dynalink_client::Result<()> {
//! let (hypervisor, handle) = MockBackend::new()
//!     .reply("vm list", &["101 R1", "100-OK"])
//!     .fail("vm start", "206-unable to start VM instance 'R1'")
//!     .start(HypervisorConfig::default())
//!     .await?;
//!
//! assert_eq!(hypervisor.list("vm").await?.len(), 2);
//! assert_eq!(handle.commands(), vec!["hypervisor version", "vm list"]);
//! # Ok(())
//! # }
//! ```

use crate::{Hypervisor, HypervisorConfig, Result};
use futures::StreamExt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::trace;

const PIPE_CAPACITY: usize = 64 * 1024;

/// How the mock answers a matching command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Send these lines, each terminated with `\r\n`
    Lines(Vec<String>),
    /// Close the connection without answering
    Hangup,
    /// Never answer
    Silent,
}

/// A scripted hypervisor
#[derive(Debug, Clone)]
pub struct MockBackend {
    version: String,
    rules: Vec<(String, MockReply)>,
    chunk_size: Option<usize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            version: "0.2.8-RC2-amd64".to_string(),
            rules: Vec::new(),
            chunk_size: None,
        }
    }
}

impl MockBackend {
    /// A backend that accepts every command
    pub fn new() -> Self {
        Self::default()
    }

    /// Version string returned for `hypervisor version`
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Write replies in pieces of at most `size` bytes.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size.max(1));
        self
    }

    /// Answer commands starting with `prefix` using `lines`. Later rules take precedence.
    pub fn reply(mut self, prefix: impl Into<String>, lines: &[&str]) -> Self {
        let lines = lines.iter().map(|line| (*line).to_string()).collect();
        self.rules.push((prefix.into(), MockReply::Lines(lines)));
        self
    }

    /// Answer commands starting with `prefix` with a single error line.
    pub fn fail(self, prefix: impl Into<String>, error_line: &str) -> Self {
        self.reply(prefix, &[error_line])
    }

    /// Drop the connection when a command starting with `prefix` arrives.
    pub fn hangup(mut self, prefix: impl Into<String>) -> Self {
        self.rules.push((prefix.into(), MockReply::Hangup));
        self
    }

    /// Ignore commands starting with `prefix`.
    pub fn silent(mut self, prefix: impl Into<String>) -> Self {
        self.rules.push((prefix.into(), MockReply::Silent));
        self
    }

    fn answer(&self, command: &str) -> MockReply {
        if let Some((_, reply)) = self
            .rules
            .iter()
            .rev()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
        {
            return reply.clone();
        }
        if command == "hypervisor version" {
            MockReply::Lines(vec![format!("100-{}", self.version)])
        } else {
            MockReply::Lines(vec!["100-OK".to_string()])
        }
    }

    /// Spawn the backend task and return the client end of the pipe.
    pub fn spawn(self) -> (DuplexStream, MockHandle) {
        let (client, server) = tokio::io::duplex(PIPE_CAPACITY);
        let handle = MockHandle::default();
        let commands = handle.clone();

        tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(server);
            let mut lines = FramedRead::new(read, LinesCodec::new());
            while let Some(Ok(command)) = lines.next().await {
                trace!(command = %command, "Mock hypervisor received command");
                commands.record(&command);
                let wire = match self.answer(&command) {
                    MockReply::Lines(reply) => reply
                        .iter()
                        .map(|line| format!("{line}\r\n"))
                        .collect::<String>(),
                    MockReply::Hangup => break,
                    MockReply::Silent => continue,
                };
                let chunk_size = self.chunk_size.unwrap_or(wire.len().max(1));
                for chunk in wire.as_bytes().chunks(chunk_size) {
                    if write.write_all(chunk).await.is_err() || write.flush().await.is_err() {
                        return;
                    }
                }
            }
        });

        (client, handle)
    }

    /// Spawn the backend and open a session against it.
    pub async fn start(self, config: HypervisorConfig) -> Result<(Hypervisor, MockHandle)> {
        let (stream, handle) = self.spawn();
        let hypervisor = Hypervisor::with_stream(stream, config).await?;
        Ok((hypervisor, handle))
    }
}

/// Record of the commands a [`MockBackend`] received
#[derive(Debug, Clone, Default)]
pub struct MockHandle {
    commands: Arc<Mutex<Vec<String>>>,
}

impl MockHandle {
    fn record(&self, command: &str) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.to_string());
    }

    /// Every command received so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Commands received so far that start with `prefix`
    pub fn commands_starting_with(&self, prefix: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|command| command.starts_with(prefix))
            .collect()
    }

    /// Forget every recorded command.
    pub fn clear(&self) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

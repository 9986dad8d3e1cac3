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

//! Hypervisor control session

use crate::{HypervisorConfig, HypervisorError, Result};
use dynalink_replycodec::{Reply, ReplyCodec};
use futures::{SinkExt, StreamExt};
use std::any::Any;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, timeout};
use tokio_util::codec::Framed;
use tracing::{debug, info, instrument, trace, warn};

/// Version reported when no version could be fetched
pub const UNKNOWN_VERSION: &str = "N/A";

/// Any byte stream a session can run over
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

type FramedTransport = Framed<Box<dyn Transport>, ReplyCodec>;

/// A control session with one hypervisor process.
///
/// Exchanges are strictly half-duplex. Each [`request`](Hypervisor::request) holds the
/// transport for the whole send/receive round trip, so clones of the handle can be shared
/// between tasks without interleaving commands and replies.
///
/// Cloning is cheap; every clone refers to the same live connection.
#[derive(Clone)]
pub struct Hypervisor {
    inner: Arc<HypervisorInner>,
}

struct HypervisorInner {
    config: HypervisorConfig,
    dry_run: AtomicBool,
    verbose: AtomicBool,
    version: String,
    working_dir: RwLock<Option<String>>,
    state: OnceLock<Arc<dyn Any + Send + Sync>>,
    transport: Mutex<Option<FramedTransport>>,
}

impl Hypervisor {
    /// Connect to the hypervisor described by `config` and fetch its version.
    ///
    /// In dry run mode no socket is opened and the version is reported as `"N/A"`.
    #[instrument(skip(config), fields(address = %config.address()))]
    pub async fn connect(config: HypervisorConfig) -> Result<Self> {
        if config.dry_run {
            return Self::open(None, config).await;
        }

        let address = config.address();
        let stream = match timeout(config.connect_timeout, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(HypervisorError::Connection { address, source }),
            Err(_) => {
                return Err(HypervisorError::Connection {
                    address,
                    source: io::Error::new(io::ErrorKind::TimedOut, "connection timed out"),
                });
            }
        };
        stream
            .set_nodelay(true)
            .map_err(|source| HypervisorError::Connection {
                address: address.clone(),
                source,
            })?;

        Self::open(Some(Box::new(stream)), config).await
    }

    /// Run a session over an already established stream.
    pub async fn with_stream<S: Transport>(stream: S, config: HypervisorConfig) -> Result<Self> {
        Self::open(Some(Box::new(stream)), config).await
    }

    async fn open(stream: Option<Box<dyn Transport>>, config: HypervisorConfig) -> Result<Self> {
        let mut framed = stream.map(|io| {
            Framed::with_capacity(
                io,
                ReplyCodec::with_max_lines(config.max_reply_lines),
                config.read_chunk_size,
            )
        });

        let version = match framed.as_mut() {
            Some(framed) if !config.dry_run => {
                let reply =
                    exchange(framed, "hypervisor version", config.timeout, config.verbose).await?;
                reply.message().unwrap_or(UNKNOWN_VERSION).to_string()
            }
            _ => UNKNOWN_VERSION.to_string(),
        };
        info!(address = %config.address(), %version, "Hypervisor session opened");

        Ok(Hypervisor {
            inner: Arc::new(HypervisorInner {
                dry_run: AtomicBool::new(config.dry_run),
                verbose: AtomicBool::new(config.verbose),
                version,
                working_dir: RwLock::new(None),
                state: OnceLock::new(),
                transport: Mutex::new(framed),
                config,
            }),
        })
    }

    /// Send one command and wait for its complete reply.
    ///
    /// The command is trimmed and terminated with a line feed. An error terminator from the
    /// backend becomes [`HypervisorError::Protocol`] carrying the literal line; the session
    /// stays usable afterwards. Transport failures and timeouts close the session, since a
    /// late reply would otherwise be read as the answer to the next command.
    ///
    /// In dry run mode nothing is sent and an empty reply is returned.
    #[instrument(level = "trace", skip(self), fields(address = %self.address()))]
    pub async fn request(&self, command: &str) -> Result<Reply> {
        let command = command.trim();
        let verbose = self.is_verbose();

        if self.is_dry_run() {
            if verbose {
                debug!(command, "Dry run, command not sent");
            } else {
                trace!(command, "Dry run, command not sent");
            }
            return Ok(Reply::empty());
        }

        let mut guard = self.inner.transport.lock().await;
        let framed = guard.as_mut().ok_or(HypervisorError::Closed)?;
        let result = exchange(framed, command, self.inner.config.timeout, verbose).await;
        if let Err(error) = &result {
            if error.is_connection_error() || matches!(error, HypervisorError::Timeout(_)) {
                *guard = None;
            }
        }
        result
    }

    /// Send an arbitrary command and return every reply line.
    pub async fn send_raw(&self, command: &str) -> Result<Vec<String>> {
        Ok(self.request(command).await?.into_lines())
    }

    /// List the objects of a subsystem, e.g. `nio`, `frsw` or `vm`.
    pub async fn list(&self, subsystem: &str) -> Result<Vec<String>> {
        self.send_raw(&format!("{subsystem} list")).await
    }

    /// Change the directory the hypervisor writes its files to.
    pub async fn set_working_dir(&self, dir: &str) -> Result<()> {
        self.request(&format!("hypervisor working_dir {dir}")).await?;
        *self.inner.working_dir.write().await = Some(dir.to_string());
        Ok(())
    }

    /// The working directory last set through this session
    pub async fn working_dir(&self) -> Option<String> {
        self.inner.working_dir.read().await.clone()
    }

    /// Reset the hypervisor, destroying every object it holds.
    pub async fn reset(&self) -> Result<()> {
        self.request("hypervisor reset").await?;
        Ok(())
    }

    /// Close the control connection and leave the hypervisor running.
    #[instrument(skip(self), fields(address = %self.address()))]
    pub async fn close(&self) -> Result<()> {
        self.shutdown("hypervisor close").await
    }

    /// Shut the hypervisor process down and close the connection.
    #[instrument(skip(self), fields(address = %self.address()))]
    pub async fn stop(&self) -> Result<()> {
        self.shutdown("hypervisor stop").await
    }

    async fn shutdown(&self, command: &str) -> Result<()> {
        let result = self.request(command).await.map(|_| ());
        if let Some(mut framed) = self.inner.transport.lock().await.take() {
            if let Err(error) = SinkExt::<&str>::close(&mut framed).await {
                debug!(%error, "Error while closing transport");
            }
        }
        info!(address = %self.address(), "Hypervisor session closed");
        result
    }

    /// `true` while the session still owns a transport
    pub async fn is_open(&self) -> bool {
        self.inner.transport.lock().await.is_some()
    }

    /// Version reported by the hypervisor when the session was opened
    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// Hostname or address of the hypervisor
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Control port of the hypervisor
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// `host:port` of the hypervisor
    pub fn address(&self) -> String {
        self.inner.config.address()
    }

    /// Session configuration
    pub fn config(&self) -> &HypervisorConfig {
        &self.inner.config
    }

    /// `true` when commands are suppressed
    pub fn is_dry_run(&self) -> bool {
        self.inner.dry_run.load(Ordering::Relaxed)
    }

    /// Suppress or resume socket traffic, effective on the next request.
    pub fn set_dry_run(&self, enabled: bool) {
        self.inner.dry_run.store(enabled, Ordering::Relaxed);
    }

    /// `true` when commands and replies are logged at debug level
    pub fn is_verbose(&self) -> bool {
        self.inner.verbose.load(Ordering::Relaxed)
    }

    /// Enable or disable verbose logging, effective on the next request.
    pub fn set_verbose(&self, enabled: bool) {
        self.inner.verbose.store(enabled, Ordering::Relaxed);
    }

    /// `true` when both handles refer to the same live connection
    pub fn same_session(&self, other: &Hypervisor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// State attached to the session, created by `init` on first use.
    ///
    /// Every handle on the session sees the same value, so bookkeeping that must be unique per
    /// hypervisor lives here rather than in a wrapper. Returns `None` when the session already
    /// carries state of another type.
    pub fn session_state<T, F>(&self, init: F) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let state = self
            .inner
            .state
            .get_or_init(|| Arc::new(init()) as Arc<dyn Any + Send + Sync>);
        Arc::clone(state).downcast::<T>().ok()
    }
}

/// One send/receive round trip on an open transport
async fn exchange(
    framed: &mut FramedTransport,
    command: &str,
    limit: Duration,
    verbose: bool,
) -> Result<Reply> {
    if verbose {
        debug!(command, "Sending command");
    } else {
        trace!(command, "Sending command");
    }
    let sent = framed.send(command).await;
    if let Err(error) = sent {
        let error = HypervisorError::from(error);
        if error.is_connection_error() {
            warn!(%error, "Failed to send command, closing session");
        }
        return Err(error);
    }

    let outcome = timeout(limit, framed.next()).await;
    let reply = match outcome {
        Ok(Some(Ok(reply))) => reply,
        Ok(Some(Err(error))) => {
            warn!(%error, command, "Lost communication with hypervisor");
            return Err(HypervisorError::ConnectionLost(error));
        }
        Ok(None) => {
            warn!(command, "Hypervisor closed the connection without replying");
            return Err(HypervisorError::NoData);
        }
        Err(_) => {
            warn!(command, ?limit, "Timed out waiting for reply, closing session");
            return Err(HypervisorError::Timeout(limit));
        }
    };

    if verbose {
        debug!(command, lines = ?reply.lines(), "Received reply");
    } else {
        trace!(command, lines = ?reply.lines(), "Received reply");
    }

    if reply.is_error() {
        let line = reply.terminator().unwrap_or_default().to_string();
        warn!(command, error = %line, "Hypervisor returned an error");
        return Err(HypervisorError::Protocol(line));
    }
    Ok(reply)
}

impl fmt::Debug for Hypervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hypervisor")
            .field("address", &self.address())
            .field("version", &self.version())
            .field("dry_run", &self.is_dry_run())
            .finish_non_exhaustive()
    }
}

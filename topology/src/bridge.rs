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


//! NIO bridges

use crate::nio::Nio;
use crate::registry::{DeviceId, DeviceKind};
use crate::{Host, Result, TopologyError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// A bridge joining an unordered set of endpoints.
///
/// Cloning is cheap; clones refer to the same bridge.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    host: Host,
    id: DeviceId,
    name: String,
    nios: Mutex<Vec<Nio>>,
}

impl Bridge {
    /// Create a bridge on `host`.
    pub async fn new(host: &Host, name: Option<&str>) -> Result<Bridge> {
        let (instance, name) = host.reserve_name(DeviceKind::Bridge, name).await;
        host.request(&format!("nio_bridge create {name}")).await?;
        let id = host.register(DeviceKind::Bridge, &name, instance).await;
        info!(bridge = %name, host = host.address(), "Created bridge");
        Ok(Bridge {
            inner: Arc::new(BridgeInner {
                host: host.clone(),
                id,
                name,
                nios: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Bridge name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Host the bridge lives on
    pub fn host(&self) -> &Host {
        &self.inner.host
    }

    /// Registry identifier
    pub fn id(&self) -> DeviceId {
        self.inner.id
    }

    /// Attach an endpoint to the bridge.
    pub async fn add_nio(&self, nio: Nio) -> Result<()> {
        if !nio.kind().is_bridgeable() {
            return Err(TopologyError::InvalidAdapter(format!(
                "invalid NETIO {}: {} endpoints cannot be added to a bridge",
                nio.name(),
                nio.kind().tag()
            )));
        }
        let mut nios = self.inner.nios.lock().await;
        self.inner
            .host
            .request(&format!("nio_bridge add_nio {} {}", self.inner.name, nio.name()))
            .await?;
        nios.push(nio);
        Ok(())
    }

    /// Endpoints attached so far, in attachment order
    pub async fn nios(&self) -> Vec<Nio> {
        self.inner.nios.lock().await.clone()
    }

    /// Delete the bridge from the hypervisor and the registry.
    pub async fn delete(&self) -> Result<()> {
        self.inner
            .host
            .request(&format!("nio_bridge delete {}", self.inner.name))
            .await?;
        self.inner.host.unregister(self.inner.id).await;
        Ok(())
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

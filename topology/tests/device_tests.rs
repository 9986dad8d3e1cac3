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


//! Device tests against an in-memory hypervisor

use dynalink_client::HypervisorConfig;
use dynalink_client::mock::{MockBackend, MockHandle};
use dynalink_topology::{
    AdapterKind, Chassis, FilterDirection, FilterKind, Host, IdleProp, Nio, Router,
    RouterAttribute, RouterModel, RouterState, TopologyConfig, TopologyError,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

async fn mock_host(backend: MockBackend) -> (Host, MockHandle) {
    init_tracing();
    let (hypervisor, handle) = backend
        .start(HypervisorConfig::new("10.0.0.1", 7200))
        .await
        .unwrap();
    let host = Host::new(hypervisor, TopologyConfig::default()).unwrap();
    handle.clear();
    (host, handle)
}

// ============================================================================
// Creation and Consoles
// ============================================================================

#[tokio::test]
async fn test_router_creation_commands() {
    let (host, handle) = mock_host(MockBackend::new()).await;

    let r1 = Router::new(&host, RouterModel::C7200, Some("R1")).await.unwrap();
    let r2 = Router::new(&host, RouterModel::C3600(Chassis::C3640), None).await.unwrap();

    assert_eq!(r2.name(), "r1");
    assert_eq!(r2.instance(), 1);
    assert_eq!(
        handle.commands(),
        vec![
            "c7200 create R1 0",
            "vm set_con_tcp_port R1 2000",
            "c3600 create r1 1",
            "c3600 set_chassis r1 3640",
            "vm set_con_tcp_port r1 2001",
        ]
    );
    assert_eq!(r1.console().await, Some(2000));
    assert_eq!(r1.state().await, RouterState::Stopped);
    assert_eq!(r1.attribute(RouterAttribute::Npe).await.as_deref(), Some("npe-200"));
    assert_eq!(host.devices().await.len(), 2);
}

#[tokio::test]
async fn test_third_device_gets_next_free_console() {
    let (host, _handle) = mock_host(MockBackend::new()).await;

    let a = Router::new(&host, RouterModel::C2691, Some("A")).await.unwrap();
    let b = Router::new(&host, RouterModel::C2691, Some("B")).await.unwrap();
    assert_eq!(a.console().await, Some(2000));
    assert_eq!(b.console().await, Some(2001));

    // C starts scanning at 2002. D starts at 2003, which A now holds.
    a.set_console(2003).await.unwrap();
    let c = Router::new(&host, RouterModel::C2691, Some("C")).await.unwrap();
    let d = Router::new(&host, RouterModel::C2691, Some("D")).await.unwrap();
    assert_eq!(c.console().await, Some(2002));
    assert_eq!(d.console().await, Some(2004));
}

#[tokio::test]
async fn test_console_conflict_and_idempotency() {
    let (host, handle) = mock_host(MockBackend::new()).await;
    let a = Router::new(&host, RouterModel::C7200, Some("A")).await.unwrap();
    let b = Router::new(&host, RouterModel::C7200, Some("B")).await.unwrap();
    handle.clear();

    a.set_console(2000).await.unwrap();
    assert_eq!(handle.commands(), vec!["vm set_con_tcp_port A 2000"]);

    let err = b.set_console(2000).await.unwrap_err();
    assert!(matches!(&err, TopologyError::Conflict { port: 2000, holder } if holder == "A"));
    assert_eq!(b.console().await, Some(2001));

    let conflict = host.find_console_conflict(2001, Some(a.id())).await.unwrap();
    assert_eq!(conflict.name, "B");
}

#[tokio::test]
async fn test_rejected_console_keeps_previous_port() {
    let (host, _handle) = mock_host(
        MockBackend::new().fail("vm set_con_tcp_port R1 2100", "206-port in use"),
    )
    .await;
    let router = Router::new(&host, RouterModel::C7200, Some("R1")).await.unwrap();

    let err = router.set_console(2100).await.unwrap_err();
    assert_eq!(err.backend_message(), Some("206-port in use"));
    assert_eq!(router.console().await, Some(2000));
}

#[tokio::test]
async fn test_ghost_has_no_console() {
    let (host, handle) = mock_host(MockBackend::new()).await;
    let ghost = Router::ghost(&host, RouterModel::C7200, Some("ghost")).await.unwrap();
    assert_eq!(ghost.console().await, None);
    assert_eq!(handle.commands(), vec!["c7200 create ghost 0"]);
}

#[tokio::test]
async fn test_delete_unregisters() {
    let (host, handle) = mock_host(MockBackend::new()).await;
    let router = Router::new(&host, RouterModel::C3745, Some("R1")).await.unwrap();
    router.delete().await.unwrap();
    assert!(host.devices().await.is_empty());
    assert_eq!(handle.commands().last().map(String::as_str), Some("c3745 delete R1"));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_lifecycle_transitions() {
    let (host, handle) = mock_host(MockBackend::new()).await;
    let router = Router::new(&host, RouterModel::C7200, Some("R1")).await.unwrap();
    handle.clear();

    assert!(matches!(router.suspend().await, Err(TopologyError::InvalidState(_))));
    assert!(matches!(router.resume().await, Err(TopologyError::InvalidState(_))));
    assert!(matches!(router.stop().await, Err(TopologyError::InvalidState(_))));

    router.start().await.unwrap();
    assert!(matches!(router.start().await, Err(TopologyError::InvalidState(_))));
    router.suspend().await.unwrap();
    assert_eq!(router.state().await, RouterState::Suspended);
    assert!(matches!(router.start().await, Err(TopologyError::InvalidState(_))));
    router.resume().await.unwrap();
    router.stop().await.unwrap();

    assert_eq!(
        handle.commands(),
        vec![
            "c7200 start R1",
            "vm suspend R1",
            "vm resume R1",
            "c7200 stop R1",
        ]
    );
}

#[tokio::test]
async fn test_failed_start_keeps_state() {
    let (host, _handle) = mock_host(
        MockBackend::new().fail("c7200 start", "206-unable to start VM instance 'R1'"),
    )
    .await;
    let router = Router::new(&host, RouterModel::C7200, Some("R1")).await.unwrap();

    let err = router.start().await.unwrap_err();
    assert_eq!(err.to_string(), "206-unable to start VM instance 'R1'");
    assert_eq!(router.state().await, RouterState::Stopped);
}

#[tokio::test]
async fn test_idle_pc_requires_running_router() {
    let (host, handle) = mock_host(MockBackend::new().reply(
        "vm show_timer_drift",
        &["101 Timer Drift: 0", "100-OK"],
    ))
    .await;
    let router = Router::new(&host, RouterModel::C3725, Some("R1")).await.unwrap();

    let err = router.idle_prop(IdleProp::Get).await.unwrap_err();
    assert!(matches!(err, TopologyError::InvalidState(_)));

    router.start().await.unwrap();
    handle.clear();
    router.idle_prop(IdleProp::Get).await.unwrap();
    router.idle_prop(IdleProp::Show).await.unwrap();
    router
        .idle_prop(IdleProp::Set("0x60606f80".to_string()))
        .await
        .unwrap();
    assert_eq!(router.idle_pc_drift().await.unwrap(), vec!["101 Timer Drift: 0"]);
    assert_eq!(
        handle.commands(),
        vec![
            "vm get_idle_pc_prop R1 0",
            "vm show_idle_pc_prop R1 0",
            "vm set_idle_pc_online R1 0 0x60606f80",
            "vm show_timer_drift R1 0",
        ]
    );
    assert_eq!(
        router.attribute(RouterAttribute::IdlePc).await.as_deref(),
        Some("0x60606f80")
    );
}

// ============================================================================
// Attributes
// ============================================================================

#[tokio::test]
async fn test_attributes_validated_before_sending() {
    let (host, handle) = mock_host(MockBackend::new()).await;
    let c7200 = Router::new(&host, RouterModel::C7200, Some("R1")).await.unwrap();
    let c3660 = Router::new(&host, RouterModel::C3600(Chassis::C3660), Some("R2"))
        .await
        .unwrap();
    handle.clear();

    c7200.set_attribute(RouterAttribute::Ram, 160).await.unwrap();
    c7200.set_attribute(RouterAttribute::IdleMax, 1500).await.unwrap();
    c7200.set_attribute(RouterAttribute::Npe, "npe-400").await.unwrap();
    c3660.set_attribute(RouterAttribute::IoMem, 10).await.unwrap();
    c7200.set_attribute(RouterAttribute::RamMmap, "false").await.unwrap();

    assert!(matches!(
        c7200.set_attribute(RouterAttribute::Ram, 0).await,
        Err(TopologyError::InvalidValue(_))
    ));
    assert!(matches!(
        c3660.set_attribute(RouterAttribute::Npe, "npe-400").await,
        Err(TopologyError::InvalidValue(_))
    ));
    assert!(matches!(
        c3660.set_attribute(RouterAttribute::IoMem, 7).await,
        Err(TopologyError::InvalidValue(_))
    ));

    assert_eq!(
        handle.commands(),
        vec![
            "vm set_ram R1 160",
            "vm set_idle_max R1 0 1500",
            "c7200 set_npe R1 npe-400",
            "c3600 set_iomem R2 10",
            "vm set_ram_mmap R1 0",
        ]
    );
    assert_eq!(c7200.attribute(RouterAttribute::Ram).await.as_deref(), Some("160"));
    assert_eq!(c7200.attribute(RouterAttribute::RamMmap).await.as_deref(), Some("0"));
}

#[tokio::test]
async fn test_aux_port() {
    let (host, handle) = mock_host(MockBackend::new()).await;
    let router = Router::new(&host, RouterModel::C2691, Some("R1")).await.unwrap();
    assert!(router.set_aux(0).await.is_err());
    router.set_aux(2501).await.unwrap();
    assert_eq!(router.aux().await, Some(2501));
    assert_eq!(
        handle.commands().last().map(String::as_str),
        Some("vm set_aux_tcp_port R1 2501")
    );
}

// ============================================================================
// Adapters and Endpoints
// ============================================================================

#[tokio::test]
async fn test_adapter_binding_commands() {
    let (host, handle) = mock_host(MockBackend::new()).await;
    let c7200 = Router::new(&host, RouterModel::C7200, Some("R1")).await.unwrap();
    let c3725 = Router::new(&host, RouterModel::C3725, Some("R2")).await.unwrap();
    handle.clear();

    c7200.install_adapter(0, AdapterKind::C7200IoFe).await.unwrap();
    c3725.install_adapter(0, AdapterKind::Gt96100Fe).await.unwrap();
    c3725.install_adapter(1, AdapterKind::Nm4T).await.unwrap();
    assert!(c3725.install_adapter(1, AdapterKind::PaA1).await.is_err());
    assert!(c3725.install_adapter(3, AdapterKind::Nm1E).await.is_err());

    assert_eq!(
        handle.commands(),
        vec![
            "c7200 add_pa_binding R1 0 C7200-IO-FE",
            "c3725 add_nm_binding R2 1 NM-4T",
        ]
    );
    let adapter = c3725.adapter(0).await.unwrap().unwrap();
    assert_eq!(adapter.kind(), AdapterKind::Gt96100Fe);
    assert_eq!(adapter.port_count(), 2);
    assert!(c3725.adapter(2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_null_endpoint_cannot_be_bound() {
    let (host, handle) = mock_host(MockBackend::new()).await;
    let router = Router::new(&host, RouterModel::C7200, Some("R1")).await.unwrap();
    router.install_adapter(1, AdapterKind::PaFeTx).await.unwrap();

    let nio = Nio::null(&host, None).await.unwrap();
    assert_eq!(nio.name(), "nio_null0");
    let err = router.bind_nio(1, 0, nio).await.unwrap_err();
    assert!(matches!(err, TopologyError::InvalidAdapter(_)));
    assert!(!router.connected(1, 0).await);
    assert!(handle.commands_starting_with("c7200 add_nio_binding").is_empty());
}

#[tokio::test]
async fn test_endpoint_kinds_and_filters() {
    let (host, handle) = mock_host(MockBackend::new()).await;
    let router = Router::new(&host, RouterModel::C7200, Some("R1")).await.unwrap();
    router.install_adapter(1, AdapterKind::PaFeTx).await.unwrap();
    handle.clear();

    let tap = Nio::tap(&host, "tap0", None).await.unwrap();
    Nio::linux_eth(&host, "eth0", Some("lab_eth")).await.unwrap();
    router.bind_nio(1, 0, tap).await.unwrap();
    router
        .filter(1, 0, FilterKind::FreqDrop, FilterDirection::In, Some("3"))
        .await
        .unwrap();
    router
        .filter(1, 0, FilterKind::None, FilterDirection::In, None)
        .await
        .unwrap();
    assert!(router
        .filter(1, 0, FilterKind::FreqDrop, FilterDirection::Out, None)
        .await
        .is_ok());

    assert_eq!(
        handle.commands(),
        vec![
            "nio create_tap nio_tap0 tap0",
            "nio create_linux_eth lab_eth eth0",
            "c7200 add_nio_binding R1 1 0 nio_tap0",
            "nio bind_filter nio_tap0 0 freq_drop",
            "nio setup_filter nio_tap0 0 3",
            "nio unbind_filter nio_tap0 0",
            "nio bind_filter nio_tap0 1 freq_drop",
        ]
    );
    assert_eq!(
        router.nio(1, 0).await.unwrap().map(|nio| nio.name().to_string()),
        Some("nio_tap0".to_string())
    );
}

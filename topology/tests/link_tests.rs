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


//! Link tests against in-memory hypervisors

use dynalink_client::HypervisorConfig;
use dynalink_client::mock::{MockBackend, MockHandle};
use dynalink_topology::{
    AdapterKind, AtmSwitch, Bridge, EndpointRef, EthernetSwitch, FrameRelaySwitch, Host,
    InterfaceKind, PortMode, Router, RouterModel, TopologyConfig, TopologyError, connect,
};
use tracing_test::traced_test;

// ============================================================================
// Helper Functions
// ============================================================================

async fn host_at(address: &str, backend: MockBackend) -> (Host, MockHandle) {
    let (hypervisor, handle) = backend
        .start(HypervisorConfig::new(address, 7200))
        .await
        .unwrap();
    (Host::new(hypervisor, TopologyConfig::default()).unwrap(), handle)
}

async fn router_with(host: &Host, name: &str, kind: AdapterKind) -> Router {
    let router = Router::new(host, RouterModel::C7200, Some(name)).await.unwrap();
    router.install_adapter(1, kind).await.unwrap();
    router
}

// ============================================================================
// Same Host
// ============================================================================

#[tokio::test]
async fn test_same_host_link_uses_loopback() {
    let (host, handle) = host_at("10.0.0.1", MockBackend::new()).await;
    let r1 = router_with(&host, "R1", AdapterKind::PaFeTx).await;
    let r2 = router_with(&host, "R2", AdapterKind::PaFeTx).await;
    handle.clear();

    let link = connect(&EndpointRef::router(&r1, 1, 0), &EndpointRef::router(&r2, 1, 0))
        .await
        .unwrap();

    assert_eq!(link.source().name(), "nio_udp0");
    assert_eq!(link.destination().name(), "nio_udp1");
    assert_eq!(
        handle.commands(),
        vec![
            "nio create_udp nio_udp0 10000 127.0.0.1 10001",
            "nio create_udp nio_udp1 10001 127.0.0.1 10000",
            "c7200 add_nio_binding R1 1 0 nio_udp0",
            "c7200 add_nio_binding R2 1 0 nio_udp1",
        ]
    );
    assert!(r1.connected(1, 0).await);
    assert!(r2.connected(1, 0).await);
    assert!(!r1.connected(1, 1).await);
    assert_eq!(host.peek_transport_port().await, 10002);
}

#[tokio::test]
async fn test_hosts_sharing_a_session_share_allocations() {
    let (hypervisor, handle) = MockBackend::new()
        .start(HypervisorConfig::new("10.0.0.1", 7200))
        .await
        .unwrap();
    let host_a = Host::new(hypervisor.clone(), TopologyConfig::default()).unwrap();
    let host_b = Host::new(hypervisor, TopologyConfig::default().with_base_console(3000)).unwrap();
    assert!(Host::same_instance(&host_a, &host_b));

    let r1 = router_with(&host_a, "R1", AdapterKind::PaFeTx).await;
    let r2 = router_with(&host_b, "R2", AdapterKind::PaFeTx).await;
    assert_eq!(r1.console().await, Some(2000));
    assert_eq!(r2.console().await, Some(2001));
    handle.clear();

    connect(&EndpointRef::router(&r1, 1, 0), &EndpointRef::router(&r2, 1, 0))
        .await
        .unwrap();

    assert_eq!(
        handle.commands_starting_with("nio create_udp"),
        vec![
            "nio create_udp nio_udp0 10000 127.0.0.1 10001",
            "nio create_udp nio_udp1 10001 127.0.0.1 10000",
        ]
    );
    assert_eq!(host_a.devices().await.len(), 2);
    assert_eq!(host_b.peek_transport_port().await, 10002);
}

#[tokio::test]
async fn test_incompatible_link_has_no_side_effects() {
    let (host, handle) = host_at("10.0.0.1", MockBackend::new()).await;
    let r1 = router_with(&host, "R1", AdapterKind::PaFeTx).await;
    let r2 = router_with(&host, "R2", AdapterKind::Pa4T).await;
    handle.clear();

    let err = connect(&EndpointRef::router(&r1, 1, 0), &EndpointRef::router(&r2, 1, 0))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TopologyError::IncompatibleLink {
            from: InterfaceKind::Adapter(AdapterKind::PaFeTx),
            to: InterfaceKind::Adapter(AdapterKind::Pa4T),
        }
    ));
    assert_eq!(err.to_string(), "attempt to connect PA-FE-TX to PA-4T+");
    assert!(handle.commands().is_empty());
    assert_eq!(host.peek_transport_port().await, 10000);
}

#[tokio::test]
async fn test_empty_slot_and_bad_port_rejected_before_allocation() {
    let (host, handle) = host_at("10.0.0.1", MockBackend::new()).await;
    let r1 = router_with(&host, "R1", AdapterKind::PaFeTx).await;
    let r2 = router_with(&host, "R2", AdapterKind::PaFeTx).await;
    handle.clear();

    let err = connect(&EndpointRef::router(&r1, 2, 0), &EndpointRef::router(&r2, 1, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, TopologyError::InvalidAdapter(_)));

    let err = connect(&EndpointRef::router(&r1, 1, 1), &EndpointRef::router(&r2, 1, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, TopologyError::InvalidAdapter(_)));

    assert!(handle.commands().is_empty());
    assert_eq!(host.peek_transport_port().await, 10000);
}

// ============================================================================
// Across Hosts
// ============================================================================

#[tokio::test]
async fn test_cross_host_link_uses_host_addresses() {
    let (host_a, handle_a) = host_at("10.0.0.1", MockBackend::new()).await;
    let (host_b, handle_b) = host_at("10.0.0.2", MockBackend::new()).await;
    let r1 = router_with(&host_a, "R1", AdapterKind::PaFeTx).await;
    let r2 = router_with(&host_b, "R2", AdapterKind::PaFeTx).await;

    connect(&EndpointRef::router(&r1, 1, 0), &EndpointRef::router(&r2, 1, 0))
        .await
        .unwrap();

    assert_eq!(
        handle_a.commands_starting_with("nio"),
        vec!["nio create_udp nio_udp0 10000 10.0.0.2 10000"]
    );
    assert_eq!(
        handle_b.commands_starting_with("nio"),
        vec!["nio create_udp nio_udp0 10000 10.0.0.1 10000"]
    );
    assert_eq!(host_a.peek_transport_port().await, 10001);
    assert_eq!(host_b.peek_transport_port().await, 10001);
}

#[tokio::test]
#[traced_test]
async fn test_second_side_failure_reports_partial_link() {
    let (host_a, handle_a) = host_at("10.0.0.1", MockBackend::new()).await;
    let (host_b, _handle_b) = host_at(
        "10.0.0.2",
        MockBackend::new().fail("nio create_udp", "201-unable to create UDP NIO"),
    )
    .await;
    let r1 = router_with(&host_a, "R1", AdapterKind::PaFeTx).await;
    let r2 = router_with(&host_b, "R2", AdapterKind::PaFeTx).await;

    let err = connect(&EndpointRef::router(&r1, 1, 0), &EndpointRef::router(&r2, 1, 0))
        .await
        .unwrap_err();

    assert!(err.is_partial());
    assert_eq!(err.orphaned(), &["nio_udp0".to_string()]);
    assert_eq!(err.backend_message(), Some("201-unable to create UDP NIO"));
    assert!(logs_contain("Link failed after creating endpoints"));

    // The orphan stays on host A and nothing was bound.
    assert_eq!(handle_a.commands_starting_with("nio create_udp").len(), 1);
    assert!(handle_a.commands_starting_with("c7200 add_nio_binding").is_empty());
    assert!(!r1.connected(1, 0).await);
    assert_eq!(host_a.peek_transport_port().await, 10001);
    assert_eq!(host_b.peek_transport_port().await, 10001);
}

#[tokio::test]
async fn test_bind_failure_reports_both_endpoints() {
    let (host, _handle) = host_at(
        "10.0.0.1",
        MockBackend::new().fail("c7200 add_nio_binding R2", "206-slot 1 is busy"),
    )
    .await;
    let r1 = router_with(&host, "R1", AdapterKind::PaFeTx).await;
    let r2 = router_with(&host, "R2", AdapterKind::PaFeTx).await;

    let err = connect(&EndpointRef::router(&r1, 1, 0), &EndpointRef::router(&r2, 1, 0))
        .await
        .unwrap_err();

    assert_eq!(
        err.orphaned(),
        &["nio_udp0".to_string(), "nio_udp1".to_string()]
    );
    assert!(r1.connected(1, 0).await);
    assert!(!r2.connected(1, 0).await);
}

// ============================================================================
// Bridges and Switches
// ============================================================================

#[tokio::test]
async fn test_link_to_bridge() {
    let (host, handle) = host_at("10.0.0.1", MockBackend::new()).await;
    let r1 = router_with(&host, "R1", AdapterKind::PaFeTx).await;
    let bridge = Bridge::new(&host, Some("B1")).await.unwrap();

    connect(&EndpointRef::router(&r1, 1, 0), &EndpointRef::bridge(&bridge))
        .await
        .unwrap();

    assert_eq!(
        handle.commands_starting_with("nio_bridge"),
        vec!["nio_bridge create B1", "nio_bridge add_nio B1 nio_udp1"]
    );
    let nios = bridge.nios().await;
    assert_eq!(nios.len(), 1);
    assert_eq!(nios[0].name(), "nio_udp1");

    let other = Bridge::new(&host, None).await.unwrap();
    assert_eq!(other.name(), "b1");
    let err = connect(&EndpointRef::bridge(&bridge), &EndpointRef::bridge(&other))
        .await
        .unwrap_err();
    assert!(matches!(err, TopologyError::IncompatibleLink { .. }));
}

#[tokio::test]
async fn test_frame_relay_circuit() {
    let (host, handle) = host_at("10.0.0.1", MockBackend::new()).await;
    let r1 = router_with(&host, "R1", AdapterKind::Pa4T).await;
    let r2 = router_with(&host, "R2", AdapterKind::Pa4T).await;
    let frsw = FrameRelaySwitch::new(&host, Some("F1")).await.unwrap();

    connect(&EndpointRef::router(&r1, 1, 0), &EndpointRef::frame_relay(&frsw, 1))
        .await
        .unwrap();
    connect(&EndpointRef::router(&r2, 1, 0), &EndpointRef::frame_relay(&frsw, 2))
        .await
        .unwrap();
    assert!(handle.commands_starting_with("frsw create_vc").is_empty());

    frsw.map(1, 102, 2, 201).await.unwrap();
    assert_eq!(
        handle.commands_starting_with("frsw create_vc"),
        vec!["frsw create_vc F1 nio_udp1 102 nio_udp3 201"]
    );
    assert_eq!(frsw.dlcis(1).await, vec![102]);
    assert_eq!(frsw.dlcis(2).await, vec![201]);

    let err = frsw.map(1, 103, 3, 301).await.unwrap_err();
    assert!(matches!(err, TopologyError::InvalidAdapter(_)));
    assert_eq!(frsw.dlcis(1).await, vec![102]);
}

#[tokio::test]
async fn test_atm_paths_and_circuits() {
    let (host, handle) = host_at("10.0.0.1", MockBackend::new()).await;
    let r1 = router_with(&host, "R1", AdapterKind::PaA1).await;
    let r2 = router_with(&host, "R2", AdapterKind::PaA1).await;
    let atmsw = AtmSwitch::new(&host, Some("A1")).await.unwrap();

    connect(&EndpointRef::router(&r1, 1, 0), &EndpointRef::atm(&atmsw, 1))
        .await
        .unwrap();
    connect(&EndpointRef::router(&r2, 1, 0), &EndpointRef::atm(&atmsw, 2))
        .await
        .unwrap();

    atmsw.map_vp(1, 10, 2, 20).await.unwrap();
    atmsw.map_vc((1, 11, 100), (2, 21, 200)).await.unwrap();
    assert_eq!(
        handle.commands_starting_with("atmsw"),
        vec![
            "atmsw create A1",
            "atmsw create_vpc A1 nio_udp1 10 nio_udp3 20",
            "atmsw create_vcc A1 nio_udp1 11 100 nio_udp3 21 200",
        ]
    );
    assert_eq!(atmsw.vpis(1).await, vec![10, 11]);

    let fe = router_with(&host, "R3", AdapterKind::PaFeTx).await;
    let err = connect(&EndpointRef::router(&fe, 1, 0), &EndpointRef::atm(&atmsw, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, TopologyError::IncompatibleLink { .. }));
}

#[tokio::test]
async fn test_ethernet_switch_ports() {
    let (host, handle) = host_at(
        "10.0.0.1",
        MockBackend::new().reply(
            "ethsw show_mac_addr_table",
            &["101 c201.0104.0001 1 nio_udp1", "100-OK"],
        ),
    )
    .await;
    let r1 = router_with(&host, "R1", AdapterKind::PaFeTx).await;
    let ethsw = EthernetSwitch::new(&host, Some("S1")).await.unwrap();

    connect(&EndpointRef::router(&r1, 1, 0), &EndpointRef::ethernet(&ethsw, 1))
        .await
        .unwrap();
    assert!(ethsw.connected(1).await);
    assert_eq!(ethsw.port_mode(1).await, None);

    ethsw.set_port(1, PortMode::Access, 10).await.unwrap();
    assert_eq!(ethsw.port_mode(1).await, Some((PortMode::Access, 10)));

    let err = ethsw.set_port(2, PortMode::Dot1q, 1).await.unwrap_err();
    assert!(matches!(err, TopologyError::InvalidAdapter(_)));

    assert_eq!(ethsw.show_mac().await.unwrap(), vec!["101 c201.0104.0001 1 nio_udp1"]);
    ethsw.clear_mac().await.unwrap();
    assert_eq!(
        handle.commands_starting_with("ethsw"),
        vec![
            "ethsw create S1",
            "ethsw add_nio S1 nio_udp1",
            "ethsw set_access_port S1 nio_udp1 10",
            "ethsw show_mac_addr_table S1",
            "ethsw clear_mac_addr_table S1",
        ]
    );
}

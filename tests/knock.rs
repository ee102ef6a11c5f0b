// ABOUTME: Integration tests for the knock client over real TCP sockets.
// ABOUTME: Uses localhost listeners so no external network is needed.

use krouo::knock::{Error, IpVersion, KnockClient, KnockSpec};
use krouo::types::Port;
use std::time::Duration;
use tokio::net::TcpListener;

async fn local_listener() -> (TcpListener, Port) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
    (listener, port)
}

/// Test: Knock a two-port sequence where both ports are listening.
/// Expected: The whole sequence is delivered and the knock succeeds.
#[tokio::test]
async fn knock_sequence_against_listening_ports_succeeds() {
    let (_l1, p1) = local_listener().await;
    let (_l2, p2) = local_listener().await;

    let spec = KnockSpec::new("127.0.0.1", vec![p1, p2]).ip_version(IpVersion::V4);
    let client = KnockClient::new().attempt_timeout(Duration::from_millis(200));

    client.knock(&spec).await.expect("knock should succeed");
}

/// Test: Knock a port nothing is listening on.
/// Expected: Success. A refused connection still delivered the knock packet.
#[tokio::test]
async fn refused_port_counts_as_delivered() {
    // Bind then drop to get a local port that answers with RST.
    let (listener, port) = local_listener().await;
    drop(listener);

    let spec = KnockSpec::new("127.0.0.1", vec![port]);
    let client = KnockClient::new().attempt_timeout(Duration::from_millis(200));

    client
        .knock(&spec)
        .await
        .expect("refused connection should still count as a delivered knock");
}

/// Test: Knock with an empty sequence.
/// Expected: Trivial success.
#[tokio::test]
async fn empty_sequence_succeeds() {
    let spec = KnockSpec::new("127.0.0.1", vec![]);
    let client = KnockClient::new();

    client.knock(&spec).await.expect("empty knock should succeed");
}

/// Test: Knock with an empty host.
/// Expected: InvalidSpec, before any network activity.
#[tokio::test]
async fn empty_host_is_invalid() {
    let spec = KnockSpec::new("", vec![Port::new(1111).unwrap()]);
    let client = KnockClient::new();

    let err = client.knock(&spec).await.unwrap_err();
    assert!(
        matches!(err, Error::InvalidSpec { .. }),
        "expected InvalidSpec, got: {:?}",
        err
    );
}

/// Test: IPv6-only knock against a host that only resolves to IPv4.
/// Expected: ProbeFailed at the first port.
#[tokio::test]
async fn ip_version_mismatch_fails_at_first_port() {
    let (_listener, port) = local_listener().await;

    let spec = KnockSpec::new("127.0.0.1", vec![port]).ip_version(IpVersion::V6);
    let client = KnockClient::new().attempt_timeout(Duration::from_millis(200));

    let err = client.knock(&spec).await.unwrap_err();
    match err {
        Error::ProbeFailed { port: failed, .. } => assert_eq!(failed, port.get()),
        other => panic!("expected ProbeFailed, got: {:?}", other),
    }
}

/// Test: Knock against an unresolvable host.
/// Expected: ProbeFailed at the first port, remaining ports never attempted.
#[tokio::test]
async fn unresolvable_host_fails_at_first_port() {
    let spec = KnockSpec::new(
        "nonexistent.invalid.host.example",
        vec![Port::new(1111).unwrap(), Port::new(2222).unwrap()],
    );
    let client = KnockClient::new().attempt_timeout(Duration::from_millis(200));

    let err = client.knock(&spec).await.unwrap_err();
    match err {
        Error::ProbeFailed { port, .. } => assert_eq!(port, 1111),
        other => panic!("expected ProbeFailed at 1111, got: {:?}", other),
    }
}

/// Test: End-to-end knock-then-connect gating.
/// Expected: A successful knock lets the downstream step run exactly once;
/// a failed knock never reaches it.
#[tokio::test]
async fn downstream_step_runs_only_after_successful_knock() {
    let (_l1, p1) = local_listener().await;
    let (_l2, p2) = local_listener().await;

    let client = KnockClient::new().attempt_timeout(Duration::from_millis(200));

    let good = KnockSpec::new("127.0.0.1", vec![p1, p2]).ip_version(IpVersion::V4);
    let mut downstream_connects = 0;
    if client.knock(&good).await.is_ok() {
        downstream_connects += 1;
    }
    assert_eq!(downstream_connects, 1);

    let bad = KnockSpec::new("nonexistent.invalid.host.example", vec![p1]);
    if client.knock(&bad).await.is_ok() {
        downstream_connects += 1;
    }
    assert_eq!(downstream_connects, 1, "failed knock must not reach SSH");
}

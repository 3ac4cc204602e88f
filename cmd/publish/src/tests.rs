//! End-to-end tests: publisher against an embedded rumqttd broker.

use std::time::{Duration, Instant};

use mqforward_mqtt::{Conn, Dialer, QoS};
use mqforward_payload::{Payload, decode_fields};

use crate::config::Config;
use crate::publisher::{FlushMode, PublishSettings, publish};

fn find_available_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

async fn start_broker(port: u16) {
    let mut broker = rumqttd::Broker::new(create_rumqttd_config(port));
    let _handle = std::thread::spawn(move || {
        broker.start().unwrap();
    });

    // Wait for broker to start
    tokio::time::sleep(Duration::from_millis(200)).await;
}

fn create_rumqttd_config(port: u16) -> rumqttd::Config {
    use rumqttd::{Config, ConnectionSettings, RouterConfig, ServerSettings};
    use std::collections::HashMap;
    use std::net::SocketAddr;

    let socket_addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();

    let mut servers = HashMap::new();
    servers.insert(
        "tcp".to_string(),
        ServerSettings {
            name: "tcp".to_string(),
            listen: socket_addr,
            tls: None,
            next_connection_delay_ms: 1,
            connections: ConnectionSettings {
                connection_timeout_ms: 60000,
                max_payload_size: 1024 * 1024,
                max_inflight_count: 100,
                auth: None,
                external_auth: None,
                dynamic_filters: false,
            },
        },
    );

    Config {
        id: 0,
        router: RouterConfig {
            max_connections: 100,
            max_outgoing_packet_count: 200,
            max_segment_size: 1024 * 1024,
            max_segment_count: 10,
            ..Default::default()
        },
        v4: Some(servers),
        v5: None,
        ws: None,
        prometheus: None,
        metrics: None,
        console: None,
        bridge: None,
        cluster: None,
    }
}

fn local_settings(port: u16) -> PublishSettings {
    let mut s = PublishSettings::from_config(&Config::default());
    s.host = "127.0.0.1".to_string();
    s.port = port;
    s.connect_timeout = Duration::from_secs(2);
    s
}

async fn watch_pipeline(port: u16) -> Conn {
    let watcher = Dialer::new()
        .with_id("pipeline-watcher")
        .dial(&format!("127.0.0.1:{}", port))
        .await
        .unwrap();
    watcher.subscribe("mqforward/#").await.unwrap();
    watcher
}

/// Asserts exactly one `{a: 10, b: 10.0}` message on `mqforward/a/b` within 1s of `start`.
async fn assert_single_payload(watcher: &Conn, start: Instant) {
    let msg = watcher
        .recv_timeout(Duration::from_secs(1).saturating_sub(start.elapsed()))
        .await
        .expect("no message within 1s");

    assert_eq!(msg.topic, "mqforward/a/b");
    assert_eq!(Payload::decode(&msg.payload).unwrap(), Payload { a: 10, b: 10.0 });

    let fields = decode_fields(&msg.payload).unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields["a"].as_i64(), Some(10));
    assert!(fields["b"].is_f64());
    assert_eq!(fields["b"].as_f64(), Some(10.0));

    assert!(
        watcher.recv_timeout(Duration::from_millis(300)).await.is_none(),
        "more than one message observed"
    );
}

#[tokio::test]
async fn test_publish_with_ack_flush() {
    let port = find_available_port();
    start_broker(port).await;
    let watcher = watch_pipeline(port).await;

    let start = Instant::now();
    let report = publish(&local_settings(port), &Payload::default()).await.unwrap();

    assert_eq!(report.topic, "mqforward/a/b");
    assert_eq!(report.bytes, 15);
    assert_eq!(report.payload_hex, "82a1610aa162cb4024000000000000");
    assert_eq!(report.flush, FlushMode::Ack);
    assert!(report.client_id.starts_with("mqforward-"));

    assert_single_payload(&watcher, start).await;
    watcher.close().await.unwrap();
}

#[tokio::test]
async fn test_publish_with_fixed_delay() {
    let port = find_available_port();
    start_broker(port).await;
    let watcher = watch_pipeline(port).await;

    let mut settings = local_settings(port);
    settings.flush = FlushMode::Sleep;
    settings.delay = Duration::from_millis(50);

    let start = Instant::now();
    publish(&settings, &Payload::default()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(50));

    assert_single_payload(&watcher, start).await;
    watcher.close().await.unwrap();
}

#[tokio::test]
async fn test_publish_qos1() {
    let port = find_available_port();
    start_broker(port).await;
    let watcher = watch_pipeline(port).await;

    let mut settings = local_settings(port);
    settings.qos = QoS::AtLeastOnce;
    settings.client_id = Some("qos1-publisher".to_string());

    let start = Instant::now();
    let report = publish(&settings, &Payload::default()).await.unwrap();
    assert_eq!(report.client_id, "qos1-publisher");

    assert_single_payload(&watcher, start).await;
    watcher.close().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_broker_fails() {
    let settings = local_settings(find_available_port());

    let start = Instant::now();
    let err = publish(&settings, &Payload::default()).await.unwrap_err();

    assert!(err.to_string().starts_with("connect to mqtt://127.0.0.1:"));
    assert!(start.elapsed() < Duration::from_secs(3));
}

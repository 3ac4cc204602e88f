//! One-shot publish of the test payload.

use std::time::Duration;

use anyhow::Context as _;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mqforward_mqtt::{Dialer, QoS, WriteOption};
use mqforward_payload::{Payload, to_hex};

use crate::config::Config;

/// How the publisher makes sure the message left before exiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FlushMode {
    /// Wait until the publish is written (or acknowledged for QoS 1/2), then disconnect.
    #[default]
    Ack,
    /// Sleep for a fixed delay and exit without disconnecting.
    Sleep,
}

/// Resolved settings for one publish run.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub qos: QoS,
    pub client_id: Option<String>,
    pub keep_alive: u16,
    pub connect_timeout: Duration,
    pub flush: FlushMode,
    pub delay: Duration,
}

impl PublishSettings {
    /// Settings taken from a loaded config file.
    pub fn from_config(cfg: &Config) -> Self {
        let mqtt = &cfg.mqtt;
        Self {
            host: mqtt.hostname.clone(),
            port: mqtt.port,
            topic: mqtt.topic.clone(),
            qos: QoS::from(mqtt.qos),
            client_id: (!mqtt.client_id.is_empty()).then(|| mqtt.client_id.clone()),
            keep_alive: mqtt.keep_alive,
            connect_timeout: Duration::from_secs(mqtt.connect_timeout),
            flush: cfg.publish.flush,
            delay: Duration::from_millis(cfg.publish.delay_ms),
        }
    }

    /// Broker address in `mqtt://host:port` form.
    pub fn broker_addr(&self) -> String {
        let port = if self.port == 0 {
            mqforward_mqtt::DEFAULT_PORT
        } else {
            self.port
        };

        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("mqtt://[{}]:{}", self.host, port)
        } else {
            format!("mqtt://{}:{}", self.host, port)
        }
    }
}

/// Summary of a completed publish.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub broker: String,
    pub client_id: String,
    pub topic: String,
    pub bytes: usize,
    pub payload_hex: String,
    pub flush: FlushMode,
}

/// Connects, publishes `payload` once, flushes and exits.
///
/// There is no retry: any error ends the run.
pub async fn publish(settings: &PublishSettings, payload: &Payload) -> anyhow::Result<PublishReport> {
    let data = payload.encode().context("serialize payload")?;
    debug!(payload = %to_hex(&data), "payload encoded");

    let broker = settings.broker_addr();

    let mut dialer = Dialer::new()
        .with_keep_alive(settings.keep_alive)
        .with_connect_timeout(settings.connect_timeout);
    if let Some(id) = &settings.client_id {
        dialer = dialer.with_id(id);
    }

    let conn = dialer
        .dial(&broker)
        .await
        .with_context(|| format!("connect to {}", broker))?;

    conn.write_to_topic_with_opts(&data, &settings.topic, &[WriteOption::Qos(settings.qos)])
        .await
        .with_context(|| format!("publish to {}", settings.topic))?;

    match settings.flush {
        FlushMode::Ack => {
            conn.flush(settings.connect_timeout).await.context("flush publish")?;
            conn.close().await.context("disconnect")?;
        }
        FlushMode::Sleep => {
            tokio::time::sleep(settings.delay).await;
        }
    }

    info!(topic = %settings.topic, bytes = data.len(), "published");

    Ok(PublishReport {
        broker,
        client_id: conn.id().to_string(),
        topic: settings.topic.clone(),
        bytes: data.len(),
        payload_hex: to_hex(&data),
        flush: settings.flush,
    })
}

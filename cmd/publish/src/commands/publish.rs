//! Publish command.

use std::time::Duration;

use clap::Args;
use mqforward_mqtt::QoS;
use mqforward_payload::Payload;

use super::output_result;
use crate::Cli;
use crate::config::Config;
use crate::publisher::{self, FlushMode, PublishSettings};

/// Publish `{a: 10, b: 10.0}` once.
#[derive(Args, Default)]
pub struct PublishCommand {
    /// Broker host (overrides config file)
    #[arg(long)]
    host: Option<String>,
    /// Broker port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,
    /// Topic to publish to (overrides config file)
    #[arg(short, long)]
    topic: Option<String>,
    /// QoS level 0, 1 or 2 (overrides config file)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=2))]
    qos: Option<u8>,
    /// Client ID (default: random mqforward-XXXXXXXXXX)
    #[arg(long)]
    client_id: Option<String>,
    /// How to make sure the message is sent before exit
    #[arg(long, value_enum)]
    flush: Option<FlushMode>,
    /// Delay before exit in sleep mode, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
    /// Connect timeout in seconds
    #[arg(long)]
    connect_timeout_secs: Option<u64>,
}

impl PublishCommand {
    pub async fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let settings = self.settings(cfg);
        let report = publisher::publish(&settings, &Payload::default()).await?;

        if cli.json {
            output_result(&report, true)?;
        }
        Ok(())
    }

    /// Applies flags on top of the config file.
    fn settings(&self, cfg: &Config) -> PublishSettings {
        let mut s = PublishSettings::from_config(cfg);

        if let Some(host) = &self.host {
            s.host = host.clone();
        }
        if let Some(port) = self.port {
            s.port = port;
        }
        if let Some(topic) = &self.topic {
            s.topic = topic.clone();
        }
        if let Some(qos) = self.qos {
            s.qos = QoS::from(qos);
        }
        if let Some(id) = &self.client_id {
            s.client_id = Some(id.clone());
        }
        if let Some(flush) = self.flush {
            s.flush = flush;
        }
        if let Some(ms) = self.delay_ms {
            s.delay = Duration::from_millis(ms);
        }
        if let Some(secs) = self.connect_timeout_secs {
            s.connect_timeout = Duration::from_secs(secs);
        }

        s
    }
}

//! Encode command: show the bytes that `publish` would send.

use clap::Args;
use serde::Serialize;

use mqforward_payload::{Fields, Payload, TOPIC, to_hex};

use super::{output_bytes, output_result};
use crate::Cli;

/// Print the MessagePack encoding of the test payload.
#[derive(Args)]
pub struct EncodeCommand {
    /// Write the raw bytes to this file instead of printing hex
    #[arg(short = 'o', long)]
    output: Option<String>,
}

#[derive(Serialize)]
struct EncodeResult {
    topic: &'static str,
    fields: Fields,
    bytes: usize,
    hex: String,
}

impl EncodeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let payload = Payload::default();
        let data = payload.encode()?;

        if let Some(path) = &self.output {
            output_bytes(&data, path)?;
            tracing::info!("wrote {} bytes to {}", data.len(), path);
            return Ok(());
        }

        if cli.json {
            let result = EncodeResult {
                topic: TOPIC,
                fields: payload.fields(),
                bytes: data.len(),
                hex: to_hex(&data),
            };
            output_result(&result, true)?;
        } else {
            println!("{}", to_hex(&data));
        }
        Ok(())
    }
}

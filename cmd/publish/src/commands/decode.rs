//! Decode command: inspect a captured payload.

use clap::Args;

use mqforward_payload::{decode_fields, from_hex};

use super::output_result;
use crate::Cli;

/// Decode a payload given as hex or read from a file.
///
/// Accepts MessagePack maps, JSON objects and bare numbers.
#[derive(Args)]
pub struct DecodeCommand {
    /// Payload as hex
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    hex: Option<String>,

    /// Read the raw payload from a file
    #[arg(short = 'f', long)]
    file: Option<String>,
}

impl DecodeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let data = match (&self.hex, &self.file) {
            (Some(hex), _) => from_hex(hex)?,
            (None, Some(path)) => std::fs::read(path)?,
            (None, None) => anyhow::bail!("payload hex or --file is required"),
        };

        let fields = decode_fields(&data)?;
        output_result(&fields, cli.json)
    }
}

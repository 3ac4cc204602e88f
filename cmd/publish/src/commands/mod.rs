//! CLI commands module.

mod decode;
mod encode;
mod publish;
mod util;

pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use publish::PublishCommand;

pub(crate) use util::*;

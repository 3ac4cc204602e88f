//! MQTT publish client for mqforward test tooling.
//!
//! This crate wraps rumqttc with a small API for one-shot publishers:
//! connect, publish, wait for the publish to leave the client, disconnect.
//! Subscribing is supported so tests can observe what was published.
//!
//! # Example
//!
//! ```no_run
//! use mqforward_mqtt::{Dialer, QoS, WriteOption};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> mqforward_mqtt::Result<()> {
//!     let conn = Dialer::new()
//!         .with_connect_timeout(Duration::from_secs(5))
//!         .dial("mqtt://127.0.0.1:1883")
//!         .await?;
//!
//!     conn.write_to_topic_with_opts(b"hello", "mqforward/a/b", &[WriteOption::Qos(QoS::AtLeastOnce)])
//!         .await?;
//!     conn.flush(Duration::from_secs(1)).await?;
//!
//!     conn.close().await?;
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{CLIENT_ID_PREFIX, Conn, DEFAULT_PORT, Dialer, SubscribeOption, WriteOption, dial};
pub use error::{Error, Result};
pub use types::{Message, QoS};

//! Error types for the MQTT library.

use std::time::Duration;

use thiserror::Error;

/// Error type for MQTT operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Broker address could not be parsed.
    #[error("mqtt: invalid broker address: {0}")]
    InvalidAddress(String),

    /// Topic is not valid for publishing.
    #[error("mqtt: invalid topic: {0:?}")]
    InvalidTopic(String),

    /// Connection error.
    #[error("mqtt: connection error: {0}")]
    Connection(String),

    /// An operation did not complete in time.
    #[error("mqtt: {op} timed out after {after:?}")]
    Timeout {
        op: &'static str,
        after: Duration,
    },

    /// Publish error.
    #[error("mqtt: publish error: {0}")]
    Publish(String),

    /// Subscribe error.
    #[error("mqtt: subscribe error: {0}")]
    Subscribe(String),

    /// Client error from rumqttc.
    #[error("mqtt client error: {0}")]
    ClientError(#[from] rumqttc::ClientError),

    /// Connection error from rumqttc.
    #[error("mqtt connection error: {0}")]
    ConnectionError(#[from] rumqttc::ConnectionError),
}

/// Result type for MQTT operations.
pub type Result<T> = std::result::Result<T, Error>;

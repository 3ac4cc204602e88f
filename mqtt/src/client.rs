//! MQTT client implementation using rumqttc.
//!
//! Provides a single-connection MQTT 3.1.1 client with:
//! - Bounded connect that fails on the first transport error
//! - Publish with an explicit flush instead of a fixed delay
//! - Subscribe and receive, used by test harnesses to observe publishes

use crate::error::{Error, Result};
use crate::types::{Message, QoS};
use parking_lot::Mutex;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::{Host, Url};
use uuid::Uuid;

/// Default MQTT port.
pub const DEFAULT_PORT: u16 = 1883;

/// Prefix of generated client IDs.
pub const CLIENT_ID_PREFIX: &str = "mqforward-";

const CLIENT_ID_RANDOM_LEN: usize = 10;
const DEFAULT_KEEP_ALIVE_SECS: u16 = 20;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CAPACITY: usize = 100;

/// Options for publishing a message.
pub enum WriteOption {
    /// Set QoS level.
    Qos(QoS),
    /// Set retain flag.
    Retain,
}

/// Options for subscribing to a topic.
pub enum SubscribeOption {
    /// Set QoS level.
    Qos(QoS),
}

/// MQTT client dialer.
///
/// Contains all options to establish an MQTT connection.
#[derive(Debug, Default)]
pub struct Dialer {
    /// Keep-alive interval in seconds.
    pub keep_alive: Option<u16>,
    /// Clean session flag (defaults to true).
    pub clean_session: Option<bool>,
    /// Bound on the whole connect handshake, and on subscribe and close.
    pub connect_timeout: Option<Duration>,
    /// Client ID (defaults to `mqforward-` plus random characters).
    pub id: Option<String>,
    /// Capacity of the request and incoming message queues.
    pub capacity: Option<usize>,
}

impl Dialer {
    /// Create a new dialer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the keep-alive interval.
    pub fn with_keep_alive(mut self, seconds: u16) -> Self {
        self.keep_alive = Some(seconds);
        self
    }

    /// Set the clean session flag.
    pub fn with_clean_session(mut self, clean: bool) -> Self {
        self.clean_session = Some(clean);
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the queue capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Connect to the MQTT broker at the given address.
    ///
    /// Address format: `[mqtt://|tcp://]host[:port]`, port defaults to 1883.
    ///
    /// Resolves once the broker has sent CONNACK. The first connection error
    /// is returned as is; there is no reconnect.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mqforward_mqtt::Dialer;
    ///
    /// #[tokio::main]
    /// async fn main() -> mqforward_mqtt::Result<()> {
    ///     let conn = Dialer::new().dial("mqtt://127.0.0.1:1883").await?;
    ///     conn.write_to_topic(b"hello", "mqforward/a/b").await?;
    ///     conn.flush(std::time::Duration::from_secs(1)).await?;
    ///     conn.close().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn dial(self, addr: &str) -> Result<Conn> {
        let (host, port) = parse_addr(addr)?;

        let id = self.id.unwrap_or_else(random_client_id);
        let keep_alive = self.keep_alive.unwrap_or(DEFAULT_KEEP_ALIVE_SECS);
        let timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let capacity = self.capacity.unwrap_or(DEFAULT_CAPACITY).max(1);

        let mut mqtt_options = MqttOptions::new(&id, host.as_str(), port);
        mqtt_options.set_keep_alive(Duration::from_secs(keep_alive as u64));
        mqtt_options.set_clean_session(self.clean_session.unwrap_or(true));

        info!(broker = %format!("{}:{}", host, port), client_id = %id, "connecting");

        let (client, event_loop) = AsyncClient::new(mqtt_options, capacity);

        let connected = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = oneshot::channel();
        let (incoming_tx, incoming_rx) = mpsc::channel(capacity);
        let (progress_tx, progress_rx) = watch::channel(Progress::default());

        let handle = tokio::spawn(run_event_loop(
            event_loop,
            connected.clone(),
            ready_tx,
            incoming_tx,
            progress_tx,
        ));

        match tokio::time::timeout(timeout, ready_rx).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => return Err(e),
            Ok(Err(_)) => {
                return Err(Error::Connection(
                    "event loop stopped before connack".to_string(),
                ));
            }
            Err(_) => {
                handle.abort();
                return Err(Error::Timeout {
                    op: "connect",
                    after: timeout,
                });
            }
        }

        Ok(Conn {
            client,
            id,
            timeout,
            connected,
            published: AtomicU64::new(0),
            awaiting_ack: AtomicU64::new(0),
            subscribed: AtomicU64::new(0),
            progress: progress_rx,
            incoming: tokio::sync::Mutex::new(incoming_rx),
            event_loop: Mutex::new(Some(handle)),
        })
    }
}

/// Counters reported by the event loop.
#[derive(Debug, Clone, Copy, Default)]
struct Progress {
    /// PUBLISH packets written to the socket.
    written: u64,
    /// PUBACK and PUBCOMP packets received.
    acked: u64,
    /// SUBACK packets received.
    subacked: u64,
    /// Event loop has exited.
    closed: bool,
}

async fn run_event_loop(
    mut event_loop: EventLoop,
    connected: Arc<AtomicBool>,
    ready: oneshot::Sender<Result<()>>,
    incoming: mpsc::Sender<Message>,
    progress: watch::Sender<Progress>,
) {
    let mut ready = Some(ready);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                info!(session_present = connack.session_present, "connected to mqtt broker");
                connected.store(true, Ordering::SeqCst);
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Ok(()));
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!(topic = %publish.topic, bytes = publish.payload.len(), "message received");
                match incoming.try_send(Message::from(publish)) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(msg)) => {
                        warn!(topic = %msg.topic, "incoming queue full, message dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {}
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                debug!(pkid = suback.pkid, "subscription acknowledged");
                progress.send_modify(|p| p.subacked += 1);
            }
            Ok(Event::Incoming(Packet::PubAck(puback))) => {
                debug!(pkid = puback.pkid, "publish acknowledged");
                progress.send_modify(|p| p.acked += 1);
            }
            Ok(Event::Incoming(Packet::PubComp(pubcomp))) => {
                debug!(pkid = pubcomp.pkid, "publish completed");
                progress.send_modify(|p| p.acked += 1);
            }
            Ok(Event::Outgoing(Outgoing::Publish(pkid))) => {
                debug!(pkid, "publish written");
                progress.send_modify(|p| p.written += 1);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                info!("disconnected from mqtt broker");
                break;
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                warn!("broker closed the session");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                match ready.take() {
                    Some(tx) => {
                        let _ = tx.send(Err(Error::from(e)));
                    }
                    None => error!("connection lost: {}", e),
                }
                break;
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
    progress.send_modify(|p| p.closed = true);
}

/// MQTT connection.
pub struct Conn {
    client: AsyncClient,
    id: String,
    timeout: Duration,
    connected: Arc<AtomicBool>,
    /// Publishes handed to the event loop.
    published: AtomicU64,
    /// Publishes at QoS 1 or 2.
    awaiting_ack: AtomicU64,
    /// Subscribe requests handed to the event loop.
    subscribed: AtomicU64,
    progress: watch::Receiver<Progress>,
    incoming: tokio::sync::Mutex<mpsc::Receiver<Message>>,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl Conn {
    /// Client ID used for this connection.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Publish a message to a topic.
    pub async fn write_to_topic(&self, payload: &[u8], topic: &str) -> Result<()> {
        self.write_to_topic_with_opts(payload, topic, &[]).await
    }

    /// Publish a message to a topic with options.
    ///
    /// Returns once the publish is queued. Use [`Conn::flush`] to wait until
    /// it has left the client.
    pub async fn write_to_topic_with_opts(
        &self,
        payload: &[u8],
        topic: &str,
        opts: &[WriteOption],
    ) -> Result<()> {
        validate_publish_topic(topic)?;

        let mut qos = QoS::AtMostOnce;
        let mut retain = false;

        for opt in opts {
            match opt {
                WriteOption::Qos(q) => qos = *q,
                WriteOption::Retain => retain = true,
            }
        }

        self.client
            .publish(topic, qos.into(), retain, payload.to_vec())
            .await
            .map_err(|e| Error::Publish(e.to_string()))?;

        self.published.fetch_add(1, Ordering::SeqCst);
        if qos.is_acknowledged() {
            self.awaiting_ack.fetch_add(1, Ordering::SeqCst);
        }

        debug!(topic, bytes = payload.len(), ?qos, retain, "publish queued");
        Ok(())
    }

    /// Wait until every publish queued so far has been written to the socket,
    /// and acknowledged by the broker when sent at QoS 1 or 2.
    pub async fn flush(&self, timeout: Duration) -> Result<()> {
        let written = self.published.load(Ordering::SeqCst);
        let acked = self.awaiting_ack.load(Ordering::SeqCst);

        self.wait_progress("flush", timeout, |p| p.written >= written && p.acked >= acked)
            .await?;

        debug!(written, acked, "flushed");
        Ok(())
    }

    /// Subscribe to a topic filter and wait for the broker's SUBACK.
    pub async fn subscribe(&self, filter: &str) -> Result<()> {
        self.subscribe_with_opts(filter, &[]).await
    }

    /// Subscribe to a topic filter with options.
    pub async fn subscribe_with_opts(&self, filter: &str, opts: &[SubscribeOption]) -> Result<()> {
        let mut qos = QoS::AtMostOnce;

        for opt in opts {
            match opt {
                SubscribeOption::Qos(q) => qos = *q,
            }
        }

        self.client
            .subscribe(filter, qos.into())
            .await
            .map_err(|e| Error::Subscribe(e.to_string()))?;

        let expected = self.subscribed.fetch_add(1, Ordering::SeqCst) + 1;
        self.wait_progress("subscribe", self.timeout, |p| p.subacked >= expected)
            .await?;

        info!(filter, ?qos, "subscribed");
        Ok(())
    }

    /// Receive the next message from the subscribed topics.
    ///
    /// Returns `None` once the connection is closed and the queue is drained.
    pub async fn recv(&self) -> Option<Message> {
        self.incoming.lock().await.recv().await
    }

    /// Receive the next message, giving up after `timeout`.
    pub async fn recv_timeout(&self, timeout: Duration) -> Option<Message> {
        tokio::time::timeout(timeout, self.recv()).await.ok().flatten()
    }

    /// Send DISCONNECT and wait for the event loop to finish.
    pub async fn close(&self) -> Result<()> {
        if self.is_connected() {
            self.client.disconnect().await?;
        }

        let handle = self.event_loop.lock().take();
        if let Some(handle) = handle {
            match tokio::time::timeout(self.timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(Error::Connection(e.to_string())),
                Err(_) => {
                    return Err(Error::Timeout {
                        op: "disconnect",
                        after: self.timeout,
                    });
                }
            }
        }

        Ok(())
    }

    async fn wait_progress(
        &self,
        op: &'static str,
        timeout: Duration,
        done: impl Fn(&Progress) -> bool,
    ) -> Result<()> {
        let mut rx = self.progress.clone();

        let reached = tokio::time::timeout(timeout, rx.wait_for(|p| p.closed || done(p)))
            .await
            .map_err(|_| Error::Timeout { op, after: timeout })?
            .map(|p| done(&p))
            .unwrap_or(false);

        if reached {
            Ok(())
        } else {
            Err(Error::Connection(format!("connection closed during {}", op)))
        }
    }
}

impl Drop for Conn {
    fn drop(&mut self) {
        if let Some(handle) = self.event_loop.lock().take() {
            handle.abort();
        }
    }
}

/// Connect to an MQTT broker with default options.
///
/// This is a convenience function equivalent to `Dialer::new().dial(addr)`.
pub async fn dial(addr: &str) -> Result<Conn> {
    Dialer::new().dial(addr).await
}

/// Split a broker address into host and port.
pub(crate) fn parse_addr(addr: &str) -> Result<(String, u16)> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(Error::InvalidAddress(addr.to_string()));
    }

    let with_scheme = if addr.contains("://") {
        addr.to_string()
    } else {
        format!("mqtt://{}", addr)
    };

    let url = Url::parse(&with_scheme).map_err(|e| Error::InvalidAddress(format!("{}: {}", addr, e)))?;

    match url.scheme() {
        "mqtt" | "tcp" => {}
        other => {
            return Err(Error::InvalidAddress(format!(
                "{}: unsupported scheme {:?}",
                addr, other
            )));
        }
    }

    let host = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        _ => return Err(Error::InvalidAddress(format!("{}: missing host", addr))),
    };

    Ok((host, url.port().unwrap_or(DEFAULT_PORT)))
}

/// Generate a client ID of the form `mqforward-XXXXXXXXXX`.
pub(crate) fn random_client_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}{}", CLIENT_ID_PREFIX, &random[..CLIENT_ID_RANDOM_LEN])
}

fn validate_publish_topic(topic: &str) -> Result<()> {
    if topic.is_empty() || topic.contains(['+', '#']) {
        return Err(Error::InvalidTopic(topic.to_string()));
    }
    Ok(())
}

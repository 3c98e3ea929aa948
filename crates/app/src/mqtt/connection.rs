use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, TlsConfiguration,
    Transport,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use common::channel::DeviceChannelSession;
use common::envelope::{Command, CommandEnvelope};

use super::error::{ConnectionError, Failure};
use super::tls::broker_tls_config;

pub const KEEP_ALIVE: Duration = Duration::from_secs(30);
/// Time a graceful disconnect may take before the event loop is aborted
pub const DISCONNECT_GRACE: Duration = Duration::from_millis(250);

const REQUEST_CAPACITY: usize = 10;
const INBOUND_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    pub publish_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            publish_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed(Failure),
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Failed(failure) => write!(f, "failed ({})", failure),
        }
    }
}

/// A message received on the user topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    /// Parse the payload as a signed envelope
    pub fn envelope(&self) -> Result<CommandEnvelope, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

/// rumqttc options for a device channel: TLS, MQTT 3.1.1, clean session,
/// 30 second keep-alive
pub fn mqtt_options(channel: &DeviceChannelSession) -> MqttOptions {
    let mut options = MqttOptions::new(
        channel.client_id.clone(),
        channel.broker.host.clone(),
        channel.broker.port,
    );
    options
        .set_keep_alive(KEEP_ALIVE)
        .set_clean_session(true)
        .set_credentials(channel.username.clone(), channel.password.clone())
        .set_transport(Transport::tls_with_config(TlsConfiguration::Rustls(
            Arc::new(broker_tls_config()),
        )));
    options
}

/// An open MQTT channel to one device
///
/// Owned by a single task; `send` takes `&mut self` so publishes on one
/// connection are serialized. Dropping the connection cancels its event loop.
pub struct DeviceConnection {
    channel: DeviceChannelSession,
    key: String,
    options: ConnectOptions,
    client: AsyncClient,
    state: Arc<watch::Sender<ConnectionState>>,
    published: mpsc::UnboundedReceiver<u16>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl fmt::Debug for DeviceConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConnection")
            .field("channel", &self.channel)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl DeviceConnection {
    /// Connect to the device's broker and subscribe to the user topic
    ///
    /// Resolves once the broker accepts the connection. A refusal, TLS or
    /// network error fails the connection without retrying; so does running
    /// past `options.connect_timeout`.
    pub async fn connect(
        channel: DeviceChannelSession,
        key: impl Into<String>,
        options: ConnectOptions,
    ) -> Result<(Self, mpsc::Receiver<InboundMessage>), ConnectionError> {
        let mqtt = mqtt_options(&channel);
        let (mut connection, inbound) = Self::spawn(channel, key.into(), options, mqtt);
        let broker = connection.channel.broker.to_string();
        tracing::info!(%broker, client_id = %connection.channel.client_id, "connecting");

        let mut state = connection.state.subscribe();
        let settled = timeout(
            options.connect_timeout,
            state.wait_for(|s| *s != ConnectionState::Connecting),
        )
        .await
        .map(|res| res.map(|s| s.clone()));

        match settled {
            Ok(Ok(ConnectionState::Connected)) => Ok((connection, inbound)),
            Ok(Ok(ConnectionState::Failed(failure))) => {
                connection.abort();
                Err(ConnectionError::Failed { broker, failure })
            }
            Ok(Ok(other)) => {
                connection.abort();
                Err(ConnectionError::NotConnected(other))
            }
            Ok(Err(_)) => {
                connection.abort();
                Err(ConnectionError::NotConnected(ConnectionState::Disconnected))
            }
            Err(_) => {
                tracing::warn!(%broker, "connect timed out");
                connection.abort();
                Err(ConnectionError::ConnectTimeout {
                    broker,
                    timeout: options.connect_timeout,
                })
            }
        }
    }

    /// Start the event loop without waiting for the broker
    fn spawn(
        channel: DeviceChannelSession,
        key: String,
        options: ConnectOptions,
        mqtt: MqttOptions,
    ) -> (Self, mpsc::Receiver<InboundMessage>) {
        let (client, eventloop) = AsyncClient::new(mqtt, REQUEST_CAPACITY);
        let (state_tx, _) = watch::channel(ConnectionState::Connecting);
        let state = Arc::new(state_tx);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (published_tx, published_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(drive(EventLoopTask {
            eventloop,
            client: client.clone(),
            user_topic: channel.user_topic.clone(),
            state: state.clone(),
            inbound: inbound_tx,
            published: published_tx,
            shutdown: shutdown_rx,
        }));

        let connection = Self {
            channel,
            key,
            options,
            client,
            state,
            published: published_rx,
            shutdown: shutdown_tx,
            task: Some(task),
        };
        (connection, inbound_rx)
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn channel(&self) -> &DeviceChannelSession {
        &self.channel
    }

    pub async fn turn_on(&mut self) -> Result<CommandEnvelope, ConnectionError> {
        self.send(Command::turn_on()).await
    }

    pub async fn turn_off(&mut self) -> Result<CommandEnvelope, ConnectionError> {
        self.send(Command::turn_off()).await
    }

    /// Publish a freshly signed envelope on the device's request topic
    ///
    /// Waits until the event loop reports the publish written, bounded by
    /// `publish_timeout`. Returns the envelope that was sent.
    pub async fn send(&mut self, command: Command) -> Result<CommandEnvelope, ConnectionError> {
        let state = self.state();
        if state != ConnectionState::Connected {
            return Err(ConnectionError::NotConnected(state));
        }

        let envelope = CommandEnvelope::build(&self.channel, &self.key, command);
        let payload = envelope.to_vec()?;

        // stale notifications from earlier publishes
        while self.published.try_recv().is_ok() {}

        let topic = self.channel.request_topic.clone();
        let publish_timeout = self.options.publish_timeout;
        let client = &self.client;
        let published = &mut self.published;
        let acked = timeout(publish_timeout, async move {
            client
                .publish(topic, QoS::AtMostOnce, false, payload)
                .await?;
            Ok::<_, ConnectionError>(published.recv().await)
        })
        .await;

        match acked {
            Ok(Ok(Some(_))) => {
                tracing::debug!(
                    topic = %self.channel.request_topic,
                    message_id = %envelope.header.message_id,
                    "published"
                );
                Ok(envelope)
            }
            Ok(Ok(None)) => Err(ConnectionError::NotConnected(self.state())),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(ConnectionError::PublishTimeout(publish_timeout)),
        }
    }

    /// Close the connection gracefully
    ///
    /// Waits up to [`DISCONNECT_GRACE`] for the broker to see the disconnect,
    /// then aborts the event loop. Calling this again is a no-op.
    pub async fn disconnect(&mut self) {
        let Some(mut task) = self.task.take() else {
            return;
        };

        if self.state() == ConnectionState::Connected {
            if let Err(err) = self.client.try_disconnect() {
                tracing::debug!(error = %err, "disconnect request not queued");
            }
        }

        if timeout(DISCONNECT_GRACE, &mut task).await.is_err() {
            let _ = self.shutdown.send(true);
            task.abort();
        }

        self.state.send_replace(ConnectionState::Disconnected);
        tracing::info!(broker = %self.channel.broker, "disconnected");
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.shutdown.send(true);
            task.abort();
        }
    }
}

impl Drop for DeviceConnection {
    fn drop(&mut self) {
        self.abort();
    }
}

struct EventLoopTask {
    eventloop: EventLoop,
    client: AsyncClient,
    user_topic: String,
    state: Arc<watch::Sender<ConnectionState>>,
    inbound: mpsc::Sender<InboundMessage>,
    published: mpsc::UnboundedSender<u16>,
    shutdown: watch::Receiver<bool>,
}

async fn drive(mut task: EventLoopTask) {
    loop {
        let event = tokio::select! {
            _ = task.shutdown.changed() => break,
            event = task.eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                if let Err(err) = task
                    .client
                    .try_subscribe(task.user_topic.clone(), QoS::AtMostOnce)
                {
                    tracing::warn!(error = %err, topic = %task.user_topic, "subscribe failed");
                }
                task.state.send_replace(ConnectionState::Connected);
                tracing::info!(topic = %task.user_topic, "connected");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = InboundMessage {
                    topic: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                };
                tracing::debug!(topic = %message.topic, bytes = message.payload.len(), "inbound message");
                if task.inbound.try_send(message).is_err() {
                    tracing::debug!("inbound receiver full or closed, dropping message");
                }
            }
            Ok(Event::Outgoing(Outgoing::Publish(pkid))) => {
                let _ = task.published.send(pkid);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                task.state.send_replace(ConnectionState::Disconnected);
                break;
            }
            Ok(_) => {}
            Err(err) => {
                let failure = Failure::from(&err);
                tracing::warn!(error = %err, "connection failed");
                task.state.send_replace(ConnectionState::Failed(failure));
                break;
            }
        }
    }
}

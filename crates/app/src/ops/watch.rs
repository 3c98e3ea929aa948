use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use clap::Args;
use tokio::sync::mpsc;
use tokio::time::Instant;

use meross::mqtt::{ConnectionError, DeviceConnection, InboundMessage};

use super::targets::{self, DeviceOpError, DeviceSelector};

/// Print messages pushed to the account's user topic
#[derive(Args, Debug, Clone)]
pub struct Watch {
    #[command(flatten)]
    pub selector: DeviceSelector,

    /// Seconds to listen before disconnecting
    #[arg(long, default_value_t = 30)]
    pub duration: u64,
}

#[async_trait::async_trait]
impl crate::op::Op for Watch {
    type Error = DeviceOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (settings, client, devices) = targets::login_and_select(ctx, &self.selector).await?;
        let key = client.session()?.key().to_string();
        let duration = Duration::from_secs(self.duration);
        // every connection subscribes to the same user topic
        let seen = SeenMessages::default();
        let seen = &seen;
        targets::on_each_device(&client, &devices, settings.connect, |_, connection, inbound| {
            watch(connection, inbound, key.clone(), duration, seen)
        })
        .await
    }
}

/// Messages already printed, keyed by message id or raw content
#[derive(Debug, Default)]
pub struct SeenMessages(Mutex<HashSet<String>>);

impl SeenMessages {
    /// True the first time a message is offered
    pub fn first_sighting(&self, message: &InboundMessage) -> bool {
        let id = match message.envelope() {
            Ok(envelope) => envelope.header.message_id,
            Err(_) => format!(
                "{} {}",
                message.topic,
                String::from_utf8_lossy(&message.payload)
            ),
        };
        match self.0.lock() {
            Ok(mut seen) => seen.insert(id),
            Err(poisoned) => poisoned.into_inner().insert(id),
        }
    }
}

async fn watch(
    mut connection: DeviceConnection,
    mut inbound: mpsc::Receiver<InboundMessage>,
    key: String,
    duration: Duration,
    seen: &SeenMessages,
) -> Result<String, ConnectionError> {
    let deadline = Instant::now() + duration;
    let mut received = 0usize;

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,
            message = inbound.recv() => match message {
                Some(message) => {
                    if seen.first_sighting(&message) {
                        received += 1;
                        println!("{}", describe(&message, &key));
                    }
                }
                // event loop ended; the connection state says why
                None => break,
            },
        }
    }

    let state = connection.state();
    connection.disconnect().await;
    Ok(format!("{} new message(s), connection {}", received, state))
}

/// One line per message: topic, then the envelope header or the raw payload
pub fn describe(message: &InboundMessage, key: &str) -> String {
    match message.envelope() {
        Ok(envelope) => format!(
            "{} {} {} ({}) {}",
            message.topic,
            envelope.header.method,
            envelope.header.namespace,
            if envelope.verify(key) { "signed" } else { "bad signature" },
            envelope.payload
        ),
        Err(_) => format!(
            "{} {}",
            message.topic,
            String::from_utf8_lossy(&message.payload)
        ),
    }
}

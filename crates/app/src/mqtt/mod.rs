//! Direct MQTT channel to a device through the vendor broker
//!
//! A [`DeviceConnection`] is created from a freshly derived
//! [`common::channel::DeviceChannelSession`] and owns its own event-loop
//! task. Inbound messages arrive on the channel returned by
//! [`DeviceConnection::connect`]; commands are published with
//! [`DeviceConnection::send`].

mod connection;
mod error;
mod tls;

pub use connection::{
    mqtt_options, ConnectOptions, ConnectionState, DeviceConnection, InboundMessage,
    DISCONNECT_GRACE, KEEP_ALIVE,
};
pub use error::{ConnectionError, Failure};

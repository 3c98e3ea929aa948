// Library exports for the CLI and integration tests

// Signed cloud API client (login, device list)
pub mod cloud;

// Config file and flag resolution
pub mod config;

// Per-device MQTT channel
pub mod mqtt;

// Re-export key types for convenience
pub use cloud::{ApiError, CloudClient, Credentials};
pub use config::{AppConfig, ConfigError, Overrides, Settings};
pub use mqtt::{ConnectOptions, ConnectionError, ConnectionState, DeviceConnection};

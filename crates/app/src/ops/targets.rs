use std::future::Future;

use clap::Args;
use futures::future::join_all;
use tokio::sync::mpsc;

use common::device::DeviceDescriptor;
use meross::cloud::{ApiError, CloudClient};
use meross::config::{ConfigError, Settings};
use meross::mqtt::{ConnectOptions, ConnectionError, DeviceConnection, InboundMessage};

use crate::op::OpContext;

/// Which devices an op applies to; all devices when empty
#[derive(Args, Debug, Clone, Default)]
pub struct DeviceSelector {
    /// Device uuid (repeatable)
    #[arg(long = "uuid")]
    pub uuids: Vec<String>,

    /// Device name (repeatable)
    #[arg(long = "name")]
    pub names: Vec<String>,
}

impl DeviceSelector {
    /// Keep the devices matching any requested uuid or name
    ///
    /// Every requested uuid and name must match at least one device.
    pub fn select(
        &self,
        devices: Vec<DeviceDescriptor>,
    ) -> Result<Vec<DeviceDescriptor>, DeviceOpError> {
        if devices.is_empty() {
            return Err(DeviceOpError::NoDevices);
        }
        if self.uuids.is_empty() && self.names.is_empty() {
            return Ok(devices);
        }

        for uuid in &self.uuids {
            if !devices.iter().any(|d| &d.uuid == uuid) {
                return Err(DeviceOpError::NoMatch(format!("uuid {}", uuid)));
            }
        }
        for name in &self.names {
            if !devices.iter().any(|d| &d.name == name) {
                return Err(DeviceOpError::NoMatch(format!("name {}", name)));
            }
        }

        Ok(devices
            .into_iter()
            .filter(|d| self.uuids.contains(&d.uuid) || self.names.contains(&d.name))
            .collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceOpError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("no devices found")]
    NoDevices,
    #[error("no device matches {0}")]
    NoMatch(String),
    #[error("{failed} of {total} devices failed\n{report}")]
    DevicesFailed {
        failed: usize,
        total: usize,
        report: String,
    },
}

/// Failure for a single device; other devices are unaffected
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Resolve settings and log in
pub async fn login(ctx: &OpContext) -> Result<(Settings, CloudClient), DeviceOpError> {
    let settings = ctx.settings()?;
    let mut client = settings.cloud_client()?;
    client.login().await?;
    Ok((settings, client))
}

/// Log in, list devices and apply `selector`
pub async fn login_and_select(
    ctx: &OpContext,
    selector: &DeviceSelector,
) -> Result<(Settings, CloudClient, Vec<DeviceDescriptor>), DeviceOpError> {
    let (settings, client) = login(ctx).await?;
    let devices = client.list_devices().await?;
    let devices = selector.select(devices)?;
    Ok((settings, client, devices))
}

/// Connect to every device concurrently and run `action` on each connection
///
/// Channel credentials are derived per device from the current session.
/// `action` owns the connection and is expected to disconnect it. Returns a
/// report line per device, or [`DeviceOpError::DevicesFailed`] carrying the
/// same report when any device failed.
pub async fn on_each_device<F, Fut>(
    client: &CloudClient,
    devices: &[DeviceDescriptor],
    options: ConnectOptions,
    action: F,
) -> Result<String, DeviceOpError>
where
    F: Fn(DeviceDescriptor, DeviceConnection, mpsc::Receiver<InboundMessage>) -> Fut,
    Fut: Future<Output = Result<String, ConnectionError>>,
{
    let key = client.session()?.key().to_string();
    let action = &action;

    let runs = devices.iter().map(|device| {
        let key = key.clone();
        async move {
            let result = async move {
                let channel = client.channel_session(device)?;
                let (connection, inbound) = DeviceConnection::connect(channel, key, options).await?;
                Ok::<_, DeviceError>(action(device.clone(), connection, inbound).await?)
            }
            .await;
            (device, result)
        }
    });
    let results = join_all(runs).await;

    let total = results.len();
    let mut failed = 0;
    let mut lines = Vec::with_capacity(total);
    for (device, result) in results {
        match result {
            Ok(summary) => lines.push(format!("{} ({}): {}", device.name, device.uuid, summary)),
            Err(err) => {
                failed += 1;
                tracing::warn!(uuid = %device.uuid, error = %err, "device failed");
                lines.push(format!("{} ({}): error: {}", device.name, device.uuid, err));
            }
        }
    }

    let report = lines.join("\n");
    if failed > 0 {
        return Err(DeviceOpError::DevicesFailed {
            failed,
            total,
            report,
        });
    }
    Ok(report)
}

use clap::Args;

use common::device::DeviceDescriptor;

use super::targets::{self, DeviceOpError, DeviceSelector};

/// List the devices bound to the account
#[derive(Args, Debug, Clone)]
pub struct Devices {
    #[command(flatten)]
    pub selector: DeviceSelector,
}

#[async_trait::async_trait]
impl crate::op::Op for Devices {
    type Error = DeviceOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_, _, devices) = targets::login_and_select(ctx, &self.selector).await?;
        Ok(devices.iter().map(describe).collect::<Vec<_>>().join("\n"))
    }
}

fn describe(device: &DeviceDescriptor) -> String {
    let channels = device
        .channels
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let domain = if device.domain.is_empty() {
        "-"
    } else {
        device.domain.as_str()
    };
    format!(
        "{}\t{}\t{}\t{}\t[{}]",
        device.name,
        device.uuid,
        device.device_type,
        domain,
        channels
    )
}

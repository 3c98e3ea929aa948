use clap::Args;

use common::envelope::Command;
use meross::mqtt::{ConnectionError, DeviceConnection};

use super::targets::{self, DeviceOpError, DeviceSelector};

/// Switch the selected plugs on
#[derive(Args, Debug, Clone)]
pub struct On {
    #[command(flatten)]
    pub selector: DeviceSelector,
}

/// Switch the selected plugs off
#[derive(Args, Debug, Clone)]
pub struct Off {
    #[command(flatten)]
    pub selector: DeviceSelector,
}

#[async_trait::async_trait]
impl crate::op::Op for On {
    type Error = DeviceOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        toggle(ctx, &self.selector, Command::turn_on()).await
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Off {
    type Error = DeviceOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        toggle(ctx, &self.selector, Command::turn_off()).await
    }
}

async fn toggle(
    ctx: &crate::op::OpContext,
    selector: &DeviceSelector,
    command: Command,
) -> Result<String, DeviceOpError> {
    let (settings, client, devices) = targets::login_and_select(ctx, selector).await?;
    targets::on_each_device(
        &client,
        &devices,
        settings.connect,
        move |_, connection, _| send_once(connection, command),
    )
    .await
}

/// Publish one command and disconnect, whatever the outcome
pub async fn send_once(
    mut connection: DeviceConnection,
    command: Command,
) -> Result<String, ConnectionError> {
    let sent = connection.send(command).await;
    connection.disconnect().await;
    let envelope = sent?;
    Ok(format!(
        "{} {} sent (message {})",
        envelope.header.method, envelope.header.namespace, envelope.header.message_id
    ))
}

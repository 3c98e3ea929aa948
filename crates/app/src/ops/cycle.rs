use std::time::Duration;

use clap::Args;

use common::envelope::Command;
use meross::mqtt::{ConnectionError, DeviceConnection};

use super::targets::{self, DeviceOpError, DeviceSelector};

/// Switch the selected plugs off, wait, then back on
#[derive(Args, Debug, Clone)]
pub struct Cycle {
    #[command(flatten)]
    pub selector: DeviceSelector,

    /// Seconds to stay off
    #[arg(long, default_value_t = 5)]
    pub delay: u64,
}

#[async_trait::async_trait]
impl crate::op::Op for Cycle {
    type Error = DeviceOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (settings, client, devices) = targets::login_and_select(ctx, &self.selector).await?;
        let delay = Duration::from_secs(self.delay);
        targets::on_each_device(&client, &devices, settings.connect, move |_, connection, _| {
            cycle(connection, delay)
        })
        .await
    }
}

async fn cycle(mut connection: DeviceConnection, delay: Duration) -> Result<String, ConnectionError> {
    let result = async {
        connection.send(Command::turn_off()).await?;
        tracing::info!(topic = %connection.channel().request_topic, ?delay, "switched off, waiting");
        tokio::time::sleep(delay).await;
        connection.send(Command::turn_on()).await
    }
    .await;
    connection.disconnect().await;
    result?;
    Ok(format!("cycled off for {}s", delay.as_secs()))
}

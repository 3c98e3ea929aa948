use clap::Args;

use super::targets::{self, DeviceOpError};

/// Sign in and report the account the session belongs to
#[derive(Args, Debug, Clone)]
pub struct Login;

#[async_trait::async_trait]
impl crate::op::Op for Login {
    type Error = DeviceOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (settings, client) = targets::login(ctx).await?;
        let session = client.session()?;
        Ok(format!(
            "Logged in as {} (user {}) at {}",
            settings.credentials.email,
            session.user_id(),
            client.base_url()
        ))
    }
}

use clap::Args;

use meross::config::{AppConfig, ConfigError};

/// Write a config file pre-filled with the global flags given
#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Seconds to wait for the broker to accept a connection
    #[arg(long, default_value_t = 10)]
    pub connect_timeout: u64,

    /// Seconds to wait for a command to be handed to the broker
    #[arg(long, default_value_t = 10)]
    pub publish_timeout: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    Config(#[from] ConfigError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let overrides = ctx.overrides.clone();
        let config = AppConfig {
            email: overrides.email,
            password: overrides.password,
            salt: overrides.salt,
            base_url: overrides.base_url,
            connect_timeout_secs: self.connect_timeout,
            publish_timeout_secs: self.publish_timeout,
        };

        let missing: Vec<&str> = [
            ("email", config.email.is_none()),
            ("password", config.password.is_none()),
            ("salt", config.salt.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let path = AppConfig::init(ctx.config_path.clone(), Some(config))?;

        let mut output = format!("Initialized config at: {}", path.display());
        if !missing.is_empty() {
            output.push_str(&format!(
                "\n- Still needed (flag, environment or config file): {}",
                missing.join(", ")
            ));
        }
        Ok(output)
    }
}

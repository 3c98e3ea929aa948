use std::error::Error;
use std::path::PathBuf;

use meross::config::{AppConfig, ConfigError, Overrides, Settings};

#[derive(Clone)]
pub struct OpContext {
    /// Flag and environment values, applied over the config file
    pub overrides: Overrides,
    /// Optional custom config path (defaults to ~/.meross/config.toml)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(overrides: Overrides, config_path: Option<PathBuf>) -> Self {
        Self {
            overrides,
            config_path,
        }
    }

    /// Resolve credentials, salt and timeouts for ops that talk to the cloud
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let file = AppConfig::load_or_default(self.config_path.clone())?;
        Settings::resolve(self.overrides.clone(), file)
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}

use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "meross")]
#[command(about = "Control Meross smart plugs through the vendor cloud")]
#[command(version)]
pub struct Args {
    /// Account email
    #[arg(long, global = true, env = "MEROSS_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, global = true, env = "MEROSS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Secret mixed into every request signature
    #[arg(long, global = true, env = "MEROSS_SALT", hide_env_values = true)]
    pub salt: Option<String>,

    /// Cloud API base URL (defaults to https://iot.meross.com)
    #[arg(long, global = true, env = "MEROSS_BASE_URL")]
    pub base_url: Option<Url>,

    /// Path to the config file (defaults to ~/.meross/config.toml)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: crate::Command,
}

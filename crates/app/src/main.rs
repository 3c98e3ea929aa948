// CLI modules
mod args;
mod op;
mod ops;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Cycle, Devices, Init, Login, Off, On, Version, Watch};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use meross::config::Overrides;

command_enum! {
    (Login, Login),
    (Devices, Devices),
    (On, On),
    (Off, Off),
    (Cycle, Cycle),
    (Watch, Watch),
    (Init, Init),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logs go to stderr so command output stays clean on stdout
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let log_level: tracing::Level = args.log_level.parse().unwrap_or(tracing::Level::WARN);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();

    let overrides = Overrides {
        email: args.email,
        password: args.password,
        salt: args.salt,
        base_url: args.base_url,
    };
    let ctx = op::OpContext::new(overrides, args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush buffered logs before exiting
    drop(guard);
    std::process::exit(code);
}

pub mod cycle;
pub mod devices;
pub mod init;
pub mod login;
pub mod targets;
pub mod toggle;
pub mod version;
pub mod watch;

pub use cycle::Cycle;
pub use devices::Devices;
pub use init::Init;
pub use login::Login;
pub use toggle::{Off, On};
pub use version::Version;
pub use watch::Watch;

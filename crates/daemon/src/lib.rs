// Configuration (file + command line)
pub mod config;
// Session layer and FUSE transport
pub mod fuse;
// Logging and mount lifecycle
pub mod process;

pub use config::{AppConfig, Config, ConfigError};
pub use fuse::{FsError, SecretFs};
#[cfg(feature = "fuse")]
pub use process::run_mount;
pub use process::MountError;

pub mod utils;

use std::io;
use std::path::{Path, PathBuf};

use common::farm::FarmError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("unable to translate {path} into a full path: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Farm(#[from] FarmError),
    #[error("mount option {0:?} is not supported on a read-only filesystem")]
    UnsupportedOption(String),
    #[error("failed to mount at {mountpoint}: {source}")]
    Spawn {
        mountpoint: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for a shutdown signal: {0}")]
    Signal(#[source] io::Error),
}

/// Initialize logging, panic handler, and build info reporting.
/// Returns guards that must be kept alive for the duration of the program.
pub fn init_logging(config: &Config) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    let mut guards = Vec::new();

    // Stdout layer
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);

    let stdout_env_filter = EnvFilter::builder()
        .with_default_directive(config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(stdout_env_filter);

    // File layer (if log_dir is set)
    if let Some(log_dir) = &config.log_dir {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_appender = tracing_appender::rolling::daily(log_dir, "secretfs.log");
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_env_filter = EnvFilter::builder()
            .with_default_directive(config.log_level.into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_filter(file_env_filter);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_layer).init();
    }

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

/// `realpath` for a command line argument
pub fn canonicalize(path: &Path) -> Result<PathBuf, MountError> {
    path.canonicalize().map_err(|source| MountError::Canonicalize {
        path: path.to_path_buf(),
        source,
    })
}

/// Mount options for a read-only secretfs mount.
///
/// Always read-only with kernel permission checks; `allow_other` adds
/// automatic unmounting. Extra options use the `-o` syntax, comma separated.
#[cfg(feature = "fuse")]
pub fn mount_options(config: &Config) -> Result<Vec<fuser::MountOption>, MountError> {
    use fuser::MountOption;

    let mut options = vec![
        MountOption::FSName(config.fs_name.clone()),
        MountOption::RO,
        MountOption::DefaultPermissions,
    ];
    if config.allow_other {
        options.push(MountOption::AllowOther);
        options.push(MountOption::AutoUnmount);
    }

    for option in config
        .mount_options
        .iter()
        .flat_map(|o| o.split(','))
        .map(str::trim)
        .filter(|o| !o.is_empty())
    {
        let parsed = match option {
            "rw" => return Err(MountError::UnsupportedOption(option.to_string())),
            "ro" => MountOption::RO,
            "allow_other" => MountOption::AllowOther,
            "allow_root" => MountOption::AllowRoot,
            "auto_unmount" => MountOption::AutoUnmount,
            "default_permissions" => MountOption::DefaultPermissions,
            "dev" => MountOption::Dev,
            "nodev" => MountOption::NoDev,
            "suid" => MountOption::Suid,
            "nosuid" => MountOption::NoSuid,
            "exec" => MountOption::Exec,
            "noexec" => MountOption::NoExec,
            "atime" => MountOption::Atime,
            "noatime" => MountOption::NoAtime,
            "sync" => MountOption::Sync,
            "async" => MountOption::Async,
            "dirsync" => MountOption::DirSync,
            other => match other.split_once('=') {
                Some(("fsname", name)) => MountOption::FSName(name.to_string()),
                Some(("subtype", name)) => MountOption::Subtype(name.to_string()),
                _ => MountOption::CUSTOM(other.to_string()),
            },
        };
        if !options.contains(&parsed) {
            options.push(parsed);
        }
    }

    Ok(options)
}

/// Serve the farm at `farm` on `mountpoint` until SIGINT or SIGTERM
#[cfg(feature = "fuse")]
pub async fn run_mount(farm: &Path, mountpoint: &Path, config: &Config) -> Result<(), MountError> {
    use common::farm::ShareFarm;

    use crate::fuse::SecretFs;

    let farm = canonicalize(farm)?;
    let mountpoint = canonicalize(mountpoint)?;
    let options = mount_options(config)?;

    let share_farm = ShareFarm::open(&farm)?;
    let fs = SecretFs::new(share_farm).with_attr_ttl(config.attr_ttl);

    tracing::info!("mounting {} onto {}", farm.display(), mountpoint.display());
    let session =
        fuser::spawn_mount2(fs, &mountpoint, &options).map_err(|source| MountError::Spawn {
            mountpoint: mountpoint.clone(),
            source,
        })?;

    utils::shutdown_signal().await.map_err(MountError::Signal)?;

    drop(session);
    tracing::info!("unmounted {}", mountpoint.display());
    Ok(())
}

#[cfg(all(test, feature = "fuse"))]
mod tests {
    use fuser::MountOption;

    use super::*;

    #[test]
    fn test_default_options_are_read_only() {
        let options = mount_options(&Config::default()).unwrap();
        assert_eq!(
            options,
            vec![
                MountOption::FSName("secretfs".into()),
                MountOption::RO,
                MountOption::DefaultPermissions,
            ]
        );
    }

    #[test]
    fn test_allow_other_adds_auto_unmount() {
        let config = Config {
            allow_other: true,
            ..Config::default()
        };
        let options = mount_options(&config).unwrap();
        assert!(options.contains(&MountOption::AllowOther));
        assert!(options.contains(&MountOption::AutoUnmount));
    }

    #[test]
    fn test_extra_options_are_parsed() {
        let config = Config {
            mount_options: vec!["noatime,nosuid".into(), "ro, max_read=4096".into()],
            ..Config::default()
        };
        let options = mount_options(&config).unwrap();
        assert!(options.contains(&MountOption::NoAtime));
        assert!(options.contains(&MountOption::NoSuid));
        assert!(options.contains(&MountOption::CUSTOM("max_read=4096".into())));
        assert_eq!(options.iter().filter(|o| **o == MountOption::RO).count(), 1);
    }

    #[test]
    fn test_rw_is_rejected() {
        let config = Config {
            mount_options: vec!["rw".into()],
            ..Config::default()
        };
        let err = mount_options(&config).unwrap_err();
        assert!(matches!(err, MountError::UnsupportedOption(o) if o == "rw"));
    }

    #[test]
    fn test_canonicalize_reports_the_path() {
        let missing = Path::new("/definitely/not/here");
        let err = canonicalize(missing).unwrap_err();
        assert!(matches!(err, MountError::Canonicalize { ref path, .. } if path == missing));
    }
}

use std::path::PathBuf;

use clap::Args;

use secretfs::{run_mount, MountError};

#[derive(Args, Debug, Clone)]
pub struct Mount {
    /// Directory holding the share files
    pub farm: PathBuf,

    /// Where to mount the filesystem
    pub mountpoint: PathBuf,

    /// Allow other users to access the mount (implies auto unmount)
    #[arg(long)]
    pub allow_other: bool,

    /// Name shown as the mount source (default from config)
    #[arg(long)]
    pub fs_name: Option<String>,

    /// Extra FUSE mount options, comma separated
    #[arg(short = 'o', long = "option")]
    pub options: Vec<String>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Mount {
    type Error = MountError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = ctx.config.clone();
        config.allow_other |= self.allow_other;
        if let Some(fs_name) = &self.fs_name {
            config.fs_name = fs_name.clone();
        }
        config.mount_options.extend(self.options.iter().cloned());

        let _guards = secretfs::process::init_logging(&config);
        run_mount(&self.farm, &self.mountpoint, &config).await?;

        Ok(format!("unmounted {}", self.mountpoint.display()))
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::split::split_secret;
use crate::farm::{FarmError, ShareFarm, ShareName};

/// A share farm in a temporary directory, removed on drop
pub struct TestFarm {
    dir: TempDir,
}

impl TestFarm {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Open the directory as a [`ShareFarm`]
    pub fn open(&self) -> Result<ShareFarm, FarmError> {
        ShareFarm::open(self.dir.path())
    }

    /// Path of the share file for `stem` and `index`
    pub fn share_path(&self, stem: &str, index: u8) -> PathBuf {
        let name = ShareName {
            stem: stem.to_string(),
            index,
        };
        self.dir.path().join(name.to_string())
    }

    /// Split `secret` and write one `stem.NNN` file per index
    pub fn add_secret(
        &self,
        stem: &str,
        secret: &[u8],
        indices: &[u8],
        threshold: usize,
    ) -> io::Result<Vec<PathBuf>> {
        let shares = split_secret(secret, indices, threshold)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        shares
            .into_iter()
            .map(|(index, bytes)| {
                let path = self.share_path(stem, index);
                fs::write(&path, bytes)?;
                Ok(path)
            })
            .collect()
    }

    /// Write an arbitrary file into the farm
    pub fn write_file(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn remove_share(&self, stem: &str, index: u8) -> io::Result<()> {
        fs::remove_file(self.share_path(stem, index))
    }

    /// Replace a share with a dangling symlink so it lists but fails to stat
    pub fn break_share(&self, stem: &str, index: u8) -> io::Result<()> {
        let path = self.share_path(stem, index);
        if fs::symlink_metadata(&path).is_ok() {
            fs::remove_file(&path)?;
        }
        std::os::unix::fs::symlink(self.dir.path().join(".missing"), &path)
    }

    /// Cut a share file down to `len` bytes
    pub fn truncate_share(&self, stem: &str, index: u8, len: u64) -> io::Result<()> {
        fs::OpenOptions::new()
            .write(true)
            .open(self.share_path(stem, index))?
            .set_len(len)
    }

    pub fn set_mode(&self, stem: &str, index: u8, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(self.share_path(stem, index), fs::Permissions::from_mode(mode))
    }
}

//! Path-level filesystem operations over a share farm
//!
//! [`SecretFs`] answers the requests of a read-only, single-directory
//! filesystem. The root lists one regular file per content of the farm;
//! opening a file reconstructs its secret into a locked buffer owned by a
//! session, and reads are served from that buffer until the handle is
//! released.

use std::time::Duration;

use common::crypto::{GfShare, Reconstructor};
use common::farm::{Attributes, ShareFarm};
use parking_lot::Mutex;

use super::error::FsError;
use super::inode_table::InodeTable;
use super::session::SessionTable;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub attr: Attributes,
}

/// Filesystem statistics reported by `statfs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFs {
    pub blocks: u64,
    pub bfree: u64,
    pub bavail: u64,
    pub files: u64,
    pub ffree: u64,
    pub bsize: u32,
    pub namelen: u32,
    pub frsize: u32,
}

impl StatFs {
    /// The farm has no meaningful capacity, so fixed figures are reported
    pub const FIXED: StatFs = StatFs {
        blocks: 1024,
        bfree: 1,
        bavail: 1,
        files: 1024,
        ffree: 1023,
        bsize: 1024,
        namelen: 255,
        frsize: 1024,
    };
}

/// Read-only filesystem exposing reconstructed secrets
pub struct SecretFs<R = GfShare> {
    farm: ShareFarm<R>,
    sessions: Mutex<SessionTable>,
    pub(crate) inodes: Mutex<InodeTable>,
    attr_ttl: Duration,
}

impl<R: Reconstructor> SecretFs<R> {
    /// Default TTL for attributes handed to the kernel
    pub const DEFAULT_ATTR_TTL: Duration = Duration::from_secs(1);

    pub fn new(farm: ShareFarm<R>) -> Self {
        Self {
            farm,
            sessions: Mutex::new(SessionTable::new()),
            inodes: Mutex::new(InodeTable::new()),
            attr_ttl: Self::DEFAULT_ATTR_TTL,
        }
    }

    pub fn with_attr_ttl(mut self, attr_ttl: Duration) -> Self {
        self.attr_ttl = attr_ttl;
        self
    }

    pub fn farm(&self) -> &ShareFarm<R> {
        &self.farm
    }

    pub fn attr_ttl(&self) -> Duration {
        self.attr_ttl
    }

    /// Number of currently open sessions
    pub fn open_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    fn is_root(path: &str) -> bool {
        path == InodeTable::ROOT_PATH
    }

    fn stem_of(path: &str) -> &str {
        path.strip_prefix('/').unwrap_or(path)
    }

    pub fn getattr(&self, path: &str) -> Result<Attributes, FsError> {
        if Self::is_root(path) {
            return Ok(*self.farm.root_attr());
        }

        let content = self.farm.lookup(Self::stem_of(path))?;
        Ok(content.attr)
    }

    pub fn opendir(&self, path: &str) -> Result<(), FsError> {
        if !Self::is_root(path) {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        Ok(())
    }

    pub fn releasedir(&self, _path: &str) -> Result<(), FsError> {
        Ok(())
    }

    /// List the root: `.`, `..`, then one entry per content from a fresh scan
    pub fn readdir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        if !Self::is_root(path) {
            return Err(FsError::NotADirectory(path.to_string()));
        }

        let root_attr = *self.farm.root_attr();
        let contents = self.farm.scan()?;

        let mut entries = Vec::with_capacity(contents.len() + 2);
        entries.push(DirEntry {
            name: ".".to_string(),
            attr: root_attr,
        });
        entries.push(DirEntry {
            name: "..".to_string(),
            attr: root_attr,
        });
        entries.extend(contents.into_iter().map(|content| DirEntry {
            name: content.stem,
            attr: content.attr,
        }));

        Ok(entries)
    }

    /// Reconstruct the content at `path` and open a session on it
    pub fn open(&self, path: &str) -> Result<u64, FsError> {
        if Self::is_root(path) {
            return Err(FsError::NoSuchEntry(path.to_string()));
        }

        let stem = Self::stem_of(path);
        let buffer = self.farm.read_secret(stem).map_err(|e| {
            tracing::warn!("failed to open {}: {}", path, e);
            FsError::from(e)
        })?;

        let len = buffer.len();
        let fh = self.sessions.lock().insert(stem.to_string(), buffer);
        tracing::debug!(fh, stem, len, "opened session");
        Ok(fh)
    }

    /// Hand `f` the bytes of session `fh` in `offset..offset + size`, clamped
    /// to the secret's length. Reading at or past the end yields no bytes.
    pub fn read_with<T>(
        &self,
        fh: u64,
        offset: u64,
        size: usize,
        f: impl FnOnce(&[u8]) -> T,
    ) -> Result<T, FsError> {
        let sessions = self.sessions.lock();
        let session = sessions.get(fh).ok_or(FsError::BadHandle(fh))?;

        let data: &[u8] = &session.buffer;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        let end = start.saturating_add(size).min(data.len());
        Ok(f(&data[start..end]))
    }

    /// Copy bytes of session `fh` starting at `offset` into `buf`, returning
    /// how many were produced
    pub fn read(&self, fh: u64, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        self.read_with(fh, offset, buf.len(), |data| {
            buf[..data.len()].copy_from_slice(data);
            data.len()
        })
    }

    /// Drop session `fh`, scrubbing and unlocking its buffer. Unknown handles
    /// are ignored.
    pub fn release(&self, fh: u64) -> Result<(), FsError> {
        let session = self.sessions.lock().remove(fh);
        match session {
            Some(session) => {
                tracing::debug!(fh, stem = %session.stem, "released session");
                session.buffer.release();
            }
            None => tracing::debug!(fh, "release of unknown handle"),
        }
        Ok(())
    }

    pub fn statfs(&self) -> StatFs {
        StatFs::FIXED
    }
}

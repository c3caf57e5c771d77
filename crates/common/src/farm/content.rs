use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Permission bits kept from a share's mode (drops setuid, setgid and sticky)
pub const PERM_MASK: u16 = 0o777;
/// Permission bits kept when any share of a content is missing
pub const OWNER_PERM_MASK: u16 = 0o700;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
}

/// Attributes presented for an entry of the virtual filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    pub kind: EntryKind,
    pub size: u64,
    pub perm: u16,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
}

impl Attributes {
    /// Zeroed regular-file record, used for stems with no share on disk
    pub fn empty_file() -> Self {
        Self {
            kind: EntryKind::RegularFile,
            size: 0,
            perm: 0,
            nlink: 0,
            uid: 0,
            gid: 0,
            atime: UNIX_EPOCH,
            mtime: UNIX_EPOCH,
            ctime: UNIX_EPOCH,
        }
    }

    /// Snapshot of a share file's stat, typed as a regular file
    pub fn from_share_metadata(meta: &Metadata) -> Self {
        Self {
            kind: EntryKind::RegularFile,
            perm: (meta.mode() as u16) & PERM_MASK,
            ..Self::from_metadata(meta)
        }
    }

    /// Snapshot of the farm directory's own stat
    pub fn from_dir_metadata(meta: &Metadata) -> Self {
        Self {
            kind: EntryKind::Directory,
            ..Self::from_metadata(meta)
        }
    }

    fn from_metadata(meta: &Metadata) -> Self {
        Self {
            kind: EntryKind::RegularFile,
            size: meta.size(),
            perm: (meta.mode() & 0o7777) as u16,
            nlink: meta.nlink() as u32,
            uid: meta.uid(),
            gid: meta.gid(),
            atime: unix_time(meta.atime(), meta.atime_nsec()),
            mtime: unix_time(meta.mtime(), meta.mtime_nsec()),
            ctime: unix_time(meta.ctime(), meta.ctime_nsec()),
        }
    }
}

fn unix_time(secs: i64, nsecs: i64) -> SystemTime {
    let nsecs = nsecs.clamp(0, 999_999_999) as u32;
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs as u64, nsecs)
    } else {
        UNIX_EPOCH - Duration::new(secs.unsigned_abs(), 0) + Duration::new(0, nsecs)
    }
}

/// One share file of a content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    /// Name of the share file inside the farm
    pub file_name: String,
    pub index: u8,
    /// Whether the file could be stat'ed when the farm was scanned
    pub present: bool,
}

/// A logical document: every share sharing one stem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub stem: String,
    /// Shares in discovery order
    pub shares: Vec<Share>,
    pub attr: Attributes,
}

impl Content {
    pub fn share_count(&self) -> usize {
        self.shares.len()
    }

    pub fn present_shares(&self) -> impl Iterator<Item = &Share> {
        self.shares.iter().filter(|s| s.present)
    }

    pub fn is_complete(&self) -> bool {
        self.shares.iter().all(|s| s.present)
    }
}

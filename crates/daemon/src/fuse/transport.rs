//! `fuser` binding for [`SecretFs`]
//!
//! Translates inode-addressed kernel requests into the path-level operations
//! of the session layer and errors into errno replies.

use std::ffi::OsStr;

use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyData, ReplyDirectory,
    ReplyEmpty, ReplyEntry, ReplyOpen, ReplyStatfs, Request,
};

use common::crypto::Reconstructor;
use common::farm::{Attributes, EntryKind};

use super::inode_table::InodeTable;
use super::secret_fs::SecretFs;

/// Block size reported in file attributes
const BLOCK_SIZE: u32 = 512;

fn file_attr(ino: u64, attr: &Attributes) -> FileAttr {
    let kind = match attr.kind {
        EntryKind::Directory => FileType::Directory,
        EntryKind::RegularFile => FileType::RegularFile,
    };

    FileAttr {
        ino,
        size: attr.size,
        blocks: attr.size.div_ceil(BLOCK_SIZE as u64),
        atime: attr.atime,
        mtime: attr.mtime,
        ctime: attr.ctime,
        crtime: attr.ctime,
        kind,
        perm: attr.perm,
        nlink: attr.nlink,
        uid: attr.uid,
        gid: attr.gid,
        rdev: 0,
        blksize: BLOCK_SIZE,
        flags: 0,
    }
}

impl<R: Reconstructor + 'static> SecretFs<R> {
    fn path_of(&self, ino: u64) -> Option<String> {
        self.inodes.lock().get_path(ino).map(str::to_string)
    }
}

impl<R: Reconstructor + 'static> Filesystem for SecretFs<R> {
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), libc::c_int> {
        tracing::info!("secretfs initialized over {:?}", self.farm().root());
        Ok(())
    }

    fn destroy(&mut self) {
        tracing::info!(
            "secretfs destroyed over {:?} with {} open sessions",
            self.farm().root(),
            self.open_sessions()
        );
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        if parent != InodeTable::ROOT_INODE {
            let errno = if self.path_of(parent).is_some() {
                libc::ENOTDIR
            } else {
                libc::ENOENT
            };
            reply.error(errno);
            return;
        }

        let name = match name.to_str() {
            Some(n) => n,
            None => {
                reply.error(libc::ENOENT);
                return;
            }
        };

        let path = InodeTable::child_path(name);
        match SecretFs::getattr(self, &path) {
            Ok(attr) => {
                let ino = self.inodes.lock().get_or_create(&path);
                reply.entry(&self.attr_ttl(), &file_attr(ino, &attr), 0);
            }
            Err(e) => reply.error(e.errno()),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let Some(path) = self.path_of(ino) else {
            reply.error(libc::ENOENT);
            return;
        };

        match SecretFs::getattr(self, &path) {
            Ok(attr) => reply.attr(&self.attr_ttl(), &file_attr(ino, &attr)),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        let Some(path) = self.path_of(ino) else {
            reply.error(libc::ENOENT);
            return;
        };

        match SecretFs::opendir(self, &path) {
            Ok(()) => reply.opened(0, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let Some(path) = self.path_of(ino) else {
            reply.error(libc::ENOENT);
            return;
        };

        let entries = match SecretFs::readdir(self, &path) {
            Ok(entries) => entries,
            Err(e) => {
                reply.error(e.errno());
                return;
            }
        };

        let skip = usize::try_from(offset).unwrap_or(0);
        let mut inodes = self.inodes.lock();
        for (i, entry) in entries.into_iter().enumerate().skip(skip) {
            let (entry_ino, kind) = match entry.name.as_str() {
                "." | ".." => (InodeTable::ROOT_INODE, FileType::Directory),
                name => (
                    inodes.get_or_create(&InodeTable::child_path(name)),
                    FileType::RegularFile,
                ),
            };
            if reply.add(entry_ino, (i + 1) as i64, kind, &entry.name) {
                break;
            }
        }

        reply.ok();
    }

    fn releasedir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        _flags: i32,
        reply: ReplyEmpty,
    ) {
        let path = self.path_of(ino).unwrap_or_default();
        match SecretFs::releasedir(self, &path) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        let Some(path) = self.path_of(ino) else {
            reply.error(libc::ENOENT);
            return;
        };

        match SecretFs::open(self, &path) {
            Ok(fh) => reply.opened(fh, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Ok(offset) = u64::try_from(offset) else {
            reply.error(libc::EINVAL);
            return;
        };

        // replied from inside the session lock so the plaintext is never
        // copied out of locked memory
        let mut reply = Some(reply);
        let result = self.read_with(fh, offset, size as usize, |data| {
            if let Some(reply) = reply.take() {
                reply.data(data);
            }
        });
        if let (Err(e), Some(reply)) = (result, reply.take()) {
            tracing::debug!("read on fh {}: {}", fh, e);
            reply.error(e.errno());
        }
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        match SecretFs::release(self, fh) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn statfs(&mut self, _req: &Request<'_>, _ino: u64, reply: ReplyStatfs) {
        let st = SecretFs::statfs(self);
        reply.statfs(
            st.blocks, st.bfree, st.bavail, st.files, st.ffree, st.bsize, st.namelen, st.frsize,
        );
    }
}

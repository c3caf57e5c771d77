//! Filesystem surface of SecretFS
//!
//! [`SecretFs`] holds the session layer: path-level operations, the table of
//! open sessions and the inode table. With the `fuse` feature it also
//! implements `fuser::Filesystem`, so it can be mounted directly.

mod error;
mod inode_table;
mod secret_fs;
mod session;
#[cfg(feature = "fuse")]
mod transport;

pub use error::FsError;
pub use inode_table::InodeTable;
pub use secret_fs::{DirEntry, SecretFs, StatFs};
pub use session::{Session, SessionTable};

//! The share farm: a flat directory of `<stem>.<NNN>` share files
//!
//! A scan lists the directory, keeps the entries whose names follow the share
//! convention and groups them by stem into [`Content`] records. Each content
//! carries the attributes the virtual file will present: the stat of its first
//! present share, typed as a regular file, with group and other permissions
//! stripped when any share of the stem is missing.
//!
//! The farm holds no state between queries. Lookups and reads rescan, so the
//! view always matches the directory at the time of the request.

mod content;
#[allow(clippy::module_inception)]
mod farm;
mod share_name;

pub use content::{Attributes, Content, EntryKind, Share, OWNER_PERM_MASK, PERM_MASK};
pub use farm::{aggregate, FarmError, ShareEntry, ShareFarm};
pub use share_name::{ShareName, ShareNameError, MIN_STEM_LEN, SHARE_SUFFIX_LEN};

/**
 * Cryptographic building blocks.
 *  - GF(256) arithmetic and share reconstruction
 *  - Memory-locked buffers for plaintext
 */
pub mod crypto;
/**
 * The share farm model: parsing share names,
 *  grouping shares into contents and
 *  reconstructing their secrets.
 */
pub mod farm;
/**
 * Helpers for tests: splitting secrets and
 *  laying shares out in a temporary farm.
 */
pub mod testkit;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::crypto::{GfShare, Reconstructor, SecureBuffer};
    pub use crate::farm::{Attributes, Content, EntryKind, FarmError, ShareFarm};
    pub use crate::version::build_info;
}

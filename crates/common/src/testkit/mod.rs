//! Helpers for building share farms in tests
//!
//! Share generation is not something SecretFS offers, but tests need real
//! shares to exercise reconstruction. [`split_secret`] is the GF(256)
//! counterpart of [`crate::crypto::GfShare`] and [`TestFarm`] lays the
//! resulting shares out in a temporary directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use common::testkit::TestFarm;
//!
//! let farm = TestFarm::new()?;
//! farm.add_secret("notes", b"attack at dawn", &[1, 2, 3], 2)?;
//! farm.remove_share("notes", 2)?;
//! let contents = farm.open()?.scan()?;
//! ```

mod farm;
mod split;

pub use farm::TestFarm;
pub use split::{split_secret, SplitError};

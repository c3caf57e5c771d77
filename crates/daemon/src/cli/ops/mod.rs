pub mod ls;
#[cfg(feature = "fuse")]
pub mod mount;
pub mod version;

pub use ls::Ls;
#[cfg(feature = "fuse")]
pub use mount::Mount;
pub use version::Version;

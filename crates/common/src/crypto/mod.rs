//! Cryptographic primitives for SecretFS
//!
//! - **GF(256) arithmetic**: the field libgfshare shares live in
//! - **Reconstruction**: the [`Reconstructor`] seam and its stock
//!   [`GfShare`] implementation (Lagrange interpolation at zero)
//! - **Secure buffers**: `mlock`ed memory that is scrubbed and unlocked when
//!   dropped, used for every buffer that holds plaintext
//!
//! # Memory handling
//!
//! A reconstructed secret only ever lives in a [`SecureBuffer`]. The decoder
//! accumulates into one as well, and shares read from disk are staged in one
//! before they are folded in. Dropping any of these scrubs the bytes first.

pub mod gf256;
mod reconstruct;
mod secure_buffer;

pub use reconstruct::{GfShare, GfShareDecoder, ReconstructError, Reconstruction, Reconstructor};
pub use secure_buffer::{page_size, SecureBuffer, SecureBufferError};

//! Secret reconstruction from GF(256) shares
//!
//! [`Reconstructor`] is the seam the share farm reconstructs through. A
//! reconstruction is begun with the ordered list of share indices and the
//! secret length, fed one share per declared position, then finished into a
//! caller-provided buffer. Dropping a [`Reconstruction`] disposes of it, so the
//! working state is released on every exit path.
//!
//! [`GfShare`] is the stock implementation: Lagrange interpolation at x = 0,
//! byte compatible with shares written by libgfshare's `gfsplit`.

use zeroize::Zeroize;

use super::gf256;
use super::secure_buffer::{SecureBuffer, SecureBufferError};

/// Errors raised by a reconstruction
#[derive(Debug, thiserror::Error)]
pub enum ReconstructError {
    #[error("no shares were declared")]
    NoShares,
    #[error("share index 0 is not a valid share index")]
    ZeroIndex,
    #[error("share index {0} declared more than once")]
    DuplicateIndex(u8),
    #[error("position {position} is outside the {count} declared shares")]
    PositionOutOfRange { position: usize, count: usize },
    #[error("position {0} was already supplied")]
    AlreadySupplied(usize),
    #[error("share length {actual} does not match secret length {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("{missing} of {count} declared shares were never supplied")]
    Incomplete { missing: usize, count: usize },
    #[error("resource exhausted: {0}")]
    ResourceExhausted(#[from] SecureBufferError),
}

/// A strategy for combining shares back into a secret
pub trait Reconstructor: Send + Sync {
    type Context: Reconstruction;

    /// Start a reconstruction over `share_indices` (in supply order) for a
    /// secret of `secret_len` bytes.
    fn begin(
        &self,
        share_indices: &[u8],
        secret_len: usize,
    ) -> Result<Self::Context, ReconstructError>;
}

/// An in-progress reconstruction. Dropping it releases its state.
pub trait Reconstruction {
    /// Register the raw bytes of the share declared at `position`.
    fn supply(&mut self, position: usize, share: &[u8]) -> Result<(), ReconstructError>;

    /// Write the secret into `out`; every declared share must have been supplied.
    fn finish(self, out: &mut [u8]) -> Result<(), ReconstructError>;
}

/// libgfshare-compatible GF(256) reconstructor
#[derive(Debug, Clone, Copy, Default)]
pub struct GfShare;

impl Reconstructor for GfShare {
    type Context = GfShareDecoder;

    fn begin(
        &self,
        share_indices: &[u8],
        secret_len: usize,
    ) -> Result<GfShareDecoder, ReconstructError> {
        GfShareDecoder::new(share_indices, secret_len)
    }
}

/// Decoder state: a locked accumulator plus the per-position Lagrange weights.
///
/// Each supplied share is folded into the accumulator right away, so only one
/// secret-sized buffer is held no matter how many shares are declared.
#[derive(Debug)]
pub struct GfShareDecoder {
    /// log of the Lagrange basis polynomial at zero, per position
    weight_logs: Vec<u8>,
    supplied: Vec<bool>,
    accumulator: SecureBuffer,
}

impl GfShareDecoder {
    fn new(share_indices: &[u8], secret_len: usize) -> Result<Self, ReconstructError> {
        if share_indices.is_empty() {
            return Err(ReconstructError::NoShares);
        }
        for (i, x) in share_indices.iter().enumerate() {
            if *x == 0 {
                return Err(ReconstructError::ZeroIndex);
            }
            if share_indices[..i].contains(x) {
                return Err(ReconstructError::DuplicateIndex(*x));
            }
        }

        let weight_logs = share_indices
            .iter()
            .map(|&xi| lagrange_weight_log(xi, share_indices))
            .collect();

        Ok(Self {
            weight_logs,
            supplied: vec![false; share_indices.len()],
            accumulator: SecureBuffer::allocate(secret_len)?,
        })
    }
}

/// log of L_i(0) = prod_{j != i} x_j / (x_i ^ x_j)
fn lagrange_weight_log(xi: u8, xs: &[u8]) -> u8 {
    let (mut top, mut bottom) = (0usize, 0usize);
    for &xj in xs.iter().filter(|&&xj| xj != xi) {
        top = (top + gf256::log(xj) as usize) % 255;
        bottom = (bottom + gf256::log(xi ^ xj) as usize) % 255;
    }
    ((top + 255 - bottom) % 255) as u8
}

impl Reconstruction for GfShareDecoder {
    fn supply(&mut self, position: usize, share: &[u8]) -> Result<(), ReconstructError> {
        let count = self.supplied.len();
        let supplied = self
            .supplied
            .get_mut(position)
            .ok_or(ReconstructError::PositionOutOfRange { position, count })?;
        if *supplied {
            return Err(ReconstructError::AlreadySupplied(position));
        }
        if share.len() != self.accumulator.len() {
            return Err(ReconstructError::LengthMismatch {
                expected: self.accumulator.len(),
                actual: share.len(),
            });
        }

        let weight = self.weight_logs[position] as usize;
        for (acc, &y) in self.accumulator.iter_mut().zip(share) {
            if y != 0 {
                *acc ^= gf256::exp(weight + gf256::log(y) as usize);
            }
        }
        *supplied = true;
        Ok(())
    }

    fn finish(self, out: &mut [u8]) -> Result<(), ReconstructError> {
        let missing = self.supplied.iter().filter(|s| !**s).count();
        if missing > 0 {
            return Err(ReconstructError::Incomplete {
                missing,
                count: self.supplied.len(),
            });
        }
        if out.len() != self.accumulator.len() {
            return Err(ReconstructError::LengthMismatch {
                expected: self.accumulator.len(),
                actual: out.len(),
            });
        }
        out.copy_from_slice(&self.accumulator);
        Ok(())
    }
}

impl Drop for GfShareDecoder {
    fn drop(&mut self) {
        self.weight_logs.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::split_secret;

    fn combine(indices: &[u8], shares: &[&[u8]], len: usize) -> Result<Vec<u8>, ReconstructError> {
        let mut ctx = GfShare.begin(indices, len)?;
        for (pos, share) in shares.iter().enumerate() {
            ctx.supply(pos, share)?;
        }
        let mut out = vec![0u8; len];
        ctx.finish(&mut out)?;
        Ok(out)
    }

    #[test]
    fn test_known_two_of_two_vector() {
        // secret 0x42 with slope 0x07: y(x) = 0x42 ^ 7*x
        let y1 = 0x42 ^ gf256::mul(7, 1);
        let y2 = 0x42 ^ gf256::mul(7, 2);
        let out = combine(&[1, 2], &[&[y1], &[y2]], 1).unwrap();
        assert_eq!(out, vec![0x42]);
    }

    #[test]
    fn test_threshold_subsets_recover_secret() {
        let secret = b"correct horse battery staple";
        let shares = split_secret(secret, &[1, 2, 3, 4, 5], 3).unwrap();

        for subset in [[0usize, 1, 2], [0, 2, 4], [4, 3, 1]] {
            let indices: Vec<u8> = subset.iter().map(|&i| shares[i].0).collect();
            let bytes: Vec<&[u8]> = subset.iter().map(|&i| shares[i].1.as_slice()).collect();
            assert_eq!(combine(&indices, &bytes, secret.len()).unwrap(), secret);
        }
    }

    #[test]
    fn test_supplying_all_shares_also_works() {
        let secret = b"\x00\x01\xfe\xff binary";
        let shares = split_secret(secret, &[7, 200, 33], 2).unwrap();
        let indices: Vec<u8> = shares.iter().map(|s| s.0).collect();
        let bytes: Vec<&[u8]> = shares.iter().map(|s| s.1.as_slice()).collect();
        assert_eq!(combine(&indices, &bytes, secret.len()).unwrap(), secret);
    }

    #[test]
    fn test_begin_rejects_degenerate_indices() {
        assert!(matches!(GfShare.begin(&[], 4), Err(ReconstructError::NoShares)));
        assert!(matches!(GfShare.begin(&[1, 0], 4), Err(ReconstructError::ZeroIndex)));
        assert!(matches!(
            GfShare.begin(&[3, 1, 3], 4),
            Err(ReconstructError::DuplicateIndex(3))
        ));
    }

    #[test]
    fn test_supply_validates_position_and_length() {
        let mut ctx = GfShare.begin(&[1, 2], 3).unwrap();
        assert!(matches!(
            ctx.supply(2, &[0, 0, 0]),
            Err(ReconstructError::PositionOutOfRange { position: 2, count: 2 })
        ));
        assert!(matches!(
            ctx.supply(0, &[0, 0]),
            Err(ReconstructError::LengthMismatch { expected: 3, actual: 2 })
        ));
        ctx.supply(0, &[1, 2, 3]).unwrap();
        assert!(matches!(
            ctx.supply(0, &[1, 2, 3]),
            Err(ReconstructError::AlreadySupplied(0))
        ));
    }

    #[test]
    fn test_finish_requires_every_share() {
        let mut ctx = GfShare.begin(&[1, 2, 3], 2).unwrap();
        ctx.supply(1, &[9, 9]).unwrap();
        let mut out = [0u8; 2];
        assert!(matches!(
            ctx.finish(&mut out),
            Err(ReconstructError::Incomplete { missing: 2, count: 3 })
        ));
    }
}

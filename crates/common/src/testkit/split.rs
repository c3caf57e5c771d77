use rand::Rng;

use crate::crypto::gf256;

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("threshold {threshold} must be between 1 and the {count} share indices")]
    BadThreshold { threshold: usize, count: usize },
    #[error("share index 0 is reserved for the secret")]
    ZeroIndex,
    #[error("share index {0} requested more than once")]
    DuplicateIndex(u8),
}

/// Split `secret` into one share per entry of `indices`, any `threshold` of
/// which reconstruct it. Returns `(index, share bytes)` in input order.
pub fn split_secret(
    secret: &[u8],
    indices: &[u8],
    threshold: usize,
) -> Result<Vec<(u8, Vec<u8>)>, SplitError> {
    if threshold == 0 || threshold > indices.len() {
        return Err(SplitError::BadThreshold {
            threshold,
            count: indices.len(),
        });
    }
    for (i, x) in indices.iter().enumerate() {
        if *x == 0 {
            return Err(SplitError::ZeroIndex);
        }
        if indices[..i].contains(x) {
            return Err(SplitError::DuplicateIndex(*x));
        }
    }

    // coefficients[k] holds the x^k term for every byte; the constant term is the secret
    let mut rng = rand::rng();
    let mut coefficients = vec![secret.to_vec()];
    for _ in 1..threshold {
        let mut row = vec![0u8; secret.len()];
        rng.fill(&mut row[..]);
        coefficients.push(row);
    }

    let shares = indices
        .iter()
        .map(|&x| {
            let mut share = coefficients[threshold - 1].clone();
            for row in coefficients[..threshold - 1].iter().rev() {
                for (y, c) in share.iter_mut().zip(row) {
                    *y = gf256::mul(*y, x) ^ c;
                }
            }
            (x, share)
        })
        .collect();

    Ok(shares)
}

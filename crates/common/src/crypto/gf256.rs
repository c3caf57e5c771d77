//! Arithmetic in GF(2^8) with the reduction polynomial x^8 + x^4 + x^3 + x^2 + 1
//! (0x11d) and generator 2, the field libgfshare works in.
//!
//! Multiplication and division go through log/exp tables built at compile
//! time. The exp table is doubled so a sum of two logs never needs a modulo.

const POLY: u16 = 0x11d;

const fn build_tables() -> ([u8; 510], [u8; 256]) {
    let mut exps = [0u8; 510];
    let mut logs = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exps[i] = x as u8;
        exps[i + 255] = x as u8;
        logs[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= POLY;
        }
        i += 1;
    }
    (exps, logs)
}

const TABLES: ([u8; 510], [u8; 256]) = build_tables();
const EXPS: [u8; 510] = TABLES.0;
const LOGS: [u8; 256] = TABLES.1;

/// Discrete log of a non-zero element
#[inline]
pub fn log(a: u8) -> u8 {
    debug_assert!(a != 0, "log of zero is undefined");
    LOGS[a as usize]
}

/// Generator raised to `e`, for `e < 510`
#[inline]
pub fn exp(e: usize) -> u8 {
    EXPS[e]
}

#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    EXPS[LOGS[a as usize] as usize + LOGS[b as usize] as usize]
}

/// `a / b` for non-zero `b`
#[inline]
pub fn div(a: u8, b: u8) -> u8 {
    debug_assert!(b != 0, "division by zero");
    if a == 0 {
        return 0;
    }
    EXPS[LOGS[a as usize] as usize + 255 - LOGS[b as usize] as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_log_inverse() {
        for a in 1..=255u8 {
            assert_eq!(exp(log(a) as usize), a);
        }
    }

    #[test]
    fn test_generator_cycles_through_every_element() {
        let mut seen = [false; 256];
        for e in 0..255 {
            seen[exp(e) as usize] = true;
        }
        assert!(!seen[0]);
        assert!(seen[1..].iter().all(|s| *s));
    }

    #[test]
    fn test_known_products() {
        assert_eq!(mul(2, 0x80), 0x1d);
        assert_eq!(mul(3, 7), 9);
        assert_eq!(mul(0, 200), 0);
        assert_eq!(mul(1, 200), 200);
    }

    #[test]
    fn test_div_undoes_mul() {
        for a in 0..=255u8 {
            for b in 1..=255u8 {
                assert_eq!(div(mul(a, b), b), a);
            }
        }
    }
}

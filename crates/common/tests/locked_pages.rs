//! Page locking as seen by the kernel.
//!
//! Kept to a single test so no other thread locks or unlocks memory while
//! `VmLck` is sampled.

use std::fs;

use common::crypto::{page_size, SecureBuffer};
use common::testkit::TestFarm;

/// Locked memory of this process in bytes, from `/proc/self/status`
fn locked_bytes() -> anyhow::Result<usize> {
    let status = fs::read_to_string("/proc/self/status")?;
    let line = status
        .lines()
        .find(|l| l.starts_with("VmLck:"))
        .ok_or_else(|| anyhow::anyhow!("no VmLck line"))?;
    let kb: usize = line
        .trim_start_matches("VmLck:")
        .trim()
        .trim_end_matches("kB")
        .trim()
        .parse()?;
    Ok(kb * 1024)
}

#[test]
fn test_dropping_neighbours_keeps_live_buffer_locked() -> anyhow::Result<()> {
    let baseline = locked_bytes()?;

    let mut keep = SecureBuffer::allocate(32)?;
    keep.copy_from_slice(&[0xa5; 32]);
    assert_eq!(locked_bytes()?, baseline + page_size());

    let neighbours = (0..50)
        .map(|_| SecureBuffer::allocate(32))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(locked_bytes()?, baseline + 51 * page_size());
    drop(neighbours);

    assert_eq!(locked_bytes()?, baseline + page_size());
    assert!(keep.iter().all(|b| *b == 0xa5));

    keep.release();
    assert_eq!(locked_bytes()?, baseline);

    // only the returned secret stays locked once reconstruction is done
    let farm = TestFarm::new()?;
    let body = vec![0x5a; 3 * page_size() + 7];
    farm.add_secret("big", &body, &[1, 2, 3], 3)?;
    let secret = farm.open()?.read_secret("big")?;
    assert_eq!(&secret[..], &body[..]);
    assert_eq!(locked_bytes()?, baseline + secret.locked_len());
    assert_eq!(secret.locked_len(), 4 * page_size());

    drop(secret);
    assert_eq!(locked_bytes()?, baseline);
    Ok(())
}

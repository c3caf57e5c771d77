//! Shared setup for session layer tests

use ::common::testkit::TestFarm;
use secretfs::SecretFs;

/// A farm in a temp dir plus a filesystem serving it
pub struct Fixture {
    pub farm: TestFarm,
    pub fs: SecretFs,
}

impl Fixture {
    pub fn new() -> anyhow::Result<Self> {
        let farm = TestFarm::new()?;
        let fs = SecretFs::new(farm.open()?);
        Ok(Self { farm, fs })
    }

    /// Open `path`, read it whole and release the handle
    pub fn read_all(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let fh = self.fs.open(path)?;
        let mut out = Vec::new();
        let mut buf = [0u8; 7];
        loop {
            let n = self.fs.read(fh, out.len() as u64, &mut buf)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        self.fs.release(fh)?;
        Ok(out)
    }
}

use common::farm::FarmError;

/// Failure of a filesystem request, as reported to the kernel
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("no such entry: {0}")]
    NoSuchEntry(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("bad file handle {0}")]
    BadHandle(u64),
    #[error(transparent)]
    ResourceExhausted(FarmError),
    #[error(transparent)]
    Io(FarmError),
}

impl From<FarmError> for FsError {
    fn from(err: FarmError) -> Self {
        match err {
            FarmError::NotFound(stem) => FsError::NoSuchEntry(stem),
            err @ FarmError::ResourceExhausted(_) => FsError::ResourceExhausted(err),
            err => FsError::Io(err),
        }
    }
}

impl FsError {
    /// Positive errno for this failure
    pub fn errno(&self) -> libc::c_int {
        match self {
            FsError::NoSuchEntry(_) => libc::ENOENT,
            FsError::NotADirectory(_) => libc::ENOTDIR,
            FsError::BadHandle(_) => libc::EBADF,
            FsError::ResourceExhausted(_) => libc::ENOMEM,
            FsError::Io(_) => libc::EIO,
        }
    }

    /// Negated errno, the status convention of the C FUSE API
    pub fn status(&self) -> libc::c_int {
        -self.errno()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::PathBuf;

    use common::crypto::SecureBufferError;

    use super::*;

    #[test]
    fn test_farm_errors_map_to_errno() {
        let cases: Vec<(FarmError, libc::c_int)> = vec![
            (FarmError::NotFound("doc".into()), libc::ENOENT),
            (
                FarmError::ResourceExhausted(SecureBufferError::Allocation { len: 8 }),
                libc::ENOMEM,
            ),
            (FarmError::NoSharesAvailable("doc".into()), libc::EIO),
            (
                FarmError::DuplicateShareIndex {
                    stem: "doc".into(),
                    index: 1,
                },
                libc::EIO,
            ),
            (
                FarmError::Io {
                    path: PathBuf::from("/farm/doc.001"),
                    source: io::Error::from(io::ErrorKind::UnexpectedEof),
                },
                libc::EIO,
            ),
            (FarmError::NotADirectory(PathBuf::from("/farm")), libc::EIO),
        ];

        for (farm_err, errno) in cases {
            let err = FsError::from(farm_err);
            assert_eq!(err.errno(), errno, "{err}");
            assert_eq!(err.status(), -errno);
        }
    }

    #[test]
    fn test_not_found_keeps_the_name() {
        let err = FsError::from(FarmError::NotFound("doc".into()));
        assert!(matches!(err, FsError::NoSuchEntry(ref name) if name == "doc"));
    }

    #[test]
    fn test_session_errors() {
        assert_eq!(FsError::BadHandle(7).errno(), libc::EBADF);
        assert_eq!(FsError::NotADirectory("/doc".into()).status(), -libc::ENOTDIR);
    }
}

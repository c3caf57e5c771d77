use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use super::content::{Attributes, Content, Share, OWNER_PERM_MASK};
use super::share_name::ShareName;
use crate::crypto::{
    GfShare, ReconstructError, Reconstruction, Reconstructor, SecureBuffer, SecureBufferError,
};

#[derive(Debug, thiserror::Error)]
pub enum FarmError {
    #[error("share farm {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("no content named {0:?}")]
    NotFound(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("resource exhausted: {0}")]
    ResourceExhausted(#[from] SecureBufferError),
    #[error("no share of {0:?} is present")]
    NoSharesAvailable(String),
    #[error("share index {index} of {stem:?} is present more than once")]
    DuplicateShareIndex { stem: String, index: u8 },
    #[error("reconstruction failed: {0}")]
    Reconstruct(ReconstructError),
}

impl From<ReconstructError> for FarmError {
    fn from(err: ReconstructError) -> Self {
        match err {
            ReconstructError::ResourceExhausted(e) => FarmError::ResourceExhausted(e),
            other => FarmError::Reconstruct(other),
        }
    }
}

/// One share-named directory entry as seen by a scan
#[derive(Debug, Clone)]
pub struct ShareEntry {
    pub file_name: String,
    pub name: ShareName,
    /// Stat snapshot, `None` when the file was not found
    pub attr: Option<Attributes>,
}

/// Group share entries into contents.
///
/// Contents come out in order of first appearance, shares in discovery order.
/// A content takes its attributes from its first present share; its group and
/// other permission bits are cleared if any of its shares is absent.
pub fn aggregate(entries: impl IntoIterator<Item = ShareEntry>) -> Vec<Content> {
    let mut contents: Vec<Content> = Vec::new();
    let mut attributed: Vec<bool> = Vec::new();

    for entry in entries {
        let slot = match contents.iter().position(|c| c.stem == entry.name.stem) {
            Some(slot) => slot,
            None => {
                contents.push(Content {
                    stem: entry.name.stem.clone(),
                    shares: Vec::new(),
                    attr: Attributes::empty_file(),
                });
                attributed.push(false);
                contents.len() - 1
            }
        };

        let content = &mut contents[slot];
        if let Some(attr) = entry.attr {
            if !attributed[slot] {
                content.attr = attr;
                attributed[slot] = true;
            }
        }
        content.shares.push(Share {
            file_name: entry.file_name,
            index: entry.name.index,
            present: entry.attr.is_some(),
        });
    }

    for content in contents.iter_mut() {
        if !content.is_complete() {
            content.attr.perm &= OWNER_PERM_MASK;
        }
    }

    contents
}

/// A directory of share files, viewed as a set of contents
///
/// Nothing is cached: every query lists the directory again.
#[derive(Debug)]
pub struct ShareFarm<R = GfShare> {
    root: PathBuf,
    root_attr: Attributes,
    reconstructor: R,
}

impl ShareFarm<GfShare> {
    /// Open a farm directory using the GF(256) reconstructor
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FarmError> {
        Self::with_reconstructor(root, GfShare)
    }
}

impl<R: Reconstructor> ShareFarm<R> {
    /// Open a farm directory, checking that it is a directory we can list
    pub fn with_reconstructor(root: impl Into<PathBuf>, reconstructor: R) -> Result<Self, FarmError> {
        let root = root.into();
        let meta = fs::metadata(&root).map_err(|source| FarmError::Io {
            path: root.clone(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(FarmError::NotADirectory(root));
        }
        fs::read_dir(&root).map_err(|source| FarmError::Io {
            path: root.clone(),
            source,
        })?;

        Ok(Self {
            root_attr: Attributes::from_dir_metadata(&meta),
            root,
            reconstructor,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The farm directory's attributes, captured when it was opened
    pub fn root_attr(&self) -> &Attributes {
        &self.root_attr
    }

    /// List share-named entries of the farm, skipping dotfiles and anything
    /// that fails to parse or stat.
    pub fn snapshot(&self) -> Result<Vec<ShareEntry>, FarmError> {
        let dir = fs::read_dir(&self.root).map_err(|source| FarmError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        for dirent in dir {
            let dirent = match dirent {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("error reading share farm {:?}: {}", self.root, e);
                    continue;
                }
            };
            let file_name = match dirent.file_name().into_string() {
                Ok(n) => n,
                Err(raw) => {
                    tracing::debug!("skipping non UTF-8 entry {:?}", raw);
                    continue;
                }
            };
            if file_name.starts_with('.') {
                continue;
            }
            let name = match ShareName::parse(&file_name) {
                Ok(n) => n,
                Err(e) => {
                    tracing::trace!("skipping {}: {}", file_name, e);
                    continue;
                }
            };

            let attr = match fs::metadata(dirent.path()) {
                Ok(meta) => Some(Attributes::from_share_metadata(&meta)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                Err(e) => {
                    tracing::warn!("skipping share {}: {}", file_name, e);
                    continue;
                }
            };
            tracing::debug!(share = %file_name, present = attr.is_some(), "stat share");

            entries.push(ShareEntry {
                file_name,
                name,
                attr,
            });
        }

        Ok(entries)
    }

    /// Rebuild the full content list from the directory
    pub fn scan(&self) -> Result<Vec<Content>, FarmError> {
        Ok(aggregate(self.snapshot()?))
    }

    /// Find a content by stem
    pub fn lookup(&self, stem: &str) -> Result<Content, FarmError> {
        self.scan()?
            .into_iter()
            .find(|c| c.stem == stem)
            .ok_or_else(|| FarmError::NotFound(stem.to_string()))
    }

    /// Reconstruct the secret behind `stem` into a locked buffer.
    ///
    /// Every present share is read for exactly the content's size and handed
    /// to the reconstructor in discovery order.
    pub fn read_secret(&self, stem: &str) -> Result<SecureBuffer, FarmError> {
        let content = self.lookup(stem)?;
        let present: Vec<&Share> = content.present_shares().collect();
        if present.is_empty() {
            return Err(FarmError::NoSharesAvailable(content.stem.clone()));
        }
        for (i, share) in present.iter().enumerate() {
            if present[..i].iter().any(|s| s.index == share.index) {
                return Err(FarmError::DuplicateShareIndex {
                    stem: content.stem.clone(),
                    index: share.index,
                });
            }
        }

        let len = usize::try_from(content.attr.size).unwrap_or(usize::MAX);
        let indices: Vec<u8> = present.iter().map(|s| s.index).collect();

        let mut secret = SecureBuffer::allocate(len)?;
        // holds a single share at a time: scrubbed on drop, not locked
        let mut scratch = Zeroizing::new(Vec::new());
        scratch
            .try_reserve_exact(len)
            .map_err(|_| SecureBufferError::Allocation { len })?;
        scratch.resize(len, 0u8);
        let mut ctx = self.reconstructor.begin(&indices, len)?;

        for (position, share) in present.iter().enumerate() {
            let path = self.root.join(&share.file_name);
            File::open(&path)
                .and_then(|mut file| file.read_exact(&mut scratch[..]))
                .map_err(|source| FarmError::Io { path, source })?;
            ctx.supply(position, &scratch)?;
        }
        ctx.finish(&mut secret)?;

        tracing::debug!(
            stem = %content.stem,
            shares = indices.len(),
            len,
            "reconstructed secret"
        );
        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::farm::EntryKind;

    fn entry(file_name: &str, perm: Option<u16>) -> ShareEntry {
        ShareEntry {
            file_name: file_name.to_string(),
            name: ShareName::parse(file_name).unwrap(),
            attr: perm.map(|perm| Attributes {
                perm,
                size: 16,
                mtime: UNIX_EPOCH + Duration::from_secs(perm as u64),
                ..Attributes::empty_file()
            }),
        }
    }

    #[test]
    fn test_aggregate_groups_by_stem() {
        let contents = aggregate(vec![
            entry("doc.001", Some(0o644)),
            entry("other.001", Some(0o600)),
            entry("doc.002", Some(0o644)),
        ]);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].stem, "doc");
        assert_eq!(contents[0].share_count(), 2);
        assert_eq!(contents[1].stem, "other");
        assert_eq!(contents[1].share_count(), 1);
    }

    #[test]
    fn test_aggregate_keeps_discovery_order() {
        let contents = aggregate(vec![
            entry("doc.003", Some(0o644)),
            entry("doc.001", Some(0o644)),
            entry("doc.002", Some(0o644)),
        ]);
        let order: Vec<u8> = contents[0].shares.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn test_attributes_come_from_first_present_share() {
        let contents = aggregate(vec![
            entry("doc.001", None),
            entry("doc.002", Some(0o640)),
            entry("doc.003", Some(0o604)),
        ]);
        let attr = contents[0].attr;
        assert_eq!(attr.mtime, UNIX_EPOCH + Duration::from_secs(0o640));
        assert_eq!(attr.kind, EntryKind::RegularFile);
        assert_eq!(attr.size, 16);
    }

    #[test]
    fn test_missing_share_clears_group_and_other_bits() {
        let contents = aggregate(vec![entry("doc.001", Some(0o755)), entry("doc.002", None)]);
        assert_eq!(contents[0].attr.perm, 0o700);
        assert!(!contents[0].is_complete());
    }

    #[test]
    fn test_complete_content_keeps_permission_bits() {
        let contents = aggregate(vec![entry("doc.001", Some(0o644)), entry("doc.002", Some(0o600))]);
        assert_eq!(contents[0].attr.perm, 0o644);
    }

    #[test]
    fn test_content_without_present_shares_is_empty() {
        let contents = aggregate(vec![entry("ghost.001", None)]);
        assert_eq!(contents[0].attr, Attributes::empty_file());
        assert_eq!(contents[0].present_shares().count(), 0);
    }

    #[test]
    fn test_duplicate_indices_are_kept() {
        let contents = aggregate(vec![entry("doc.001", Some(0o644)), entry("doc. 01", Some(0o644))]);
        assert_eq!(contents[0].share_count(), 2);
        assert!(contents[0].shares.iter().all(|s| s.index == 1));
    }

    #[test]
    fn test_reconstruct_error_maps_resource_exhaustion() {
        let err: FarmError =
            ReconstructError::ResourceExhausted(SecureBufferError::Allocation { len: 1 }).into();
        assert!(matches!(err, FarmError::ResourceExhausted(_)));
        let err: FarmError = ReconstructError::NoShares.into();
        assert!(matches!(err, FarmError::Reconstruct(ReconstructError::NoShares)));
    }
}

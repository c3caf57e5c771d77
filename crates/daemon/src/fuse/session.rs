use std::collections::HashMap;

use common::crypto::SecureBuffer;

/// An open file: the reconstructed secret of one content
#[derive(Debug)]
pub struct Session {
    pub stem: String,
    pub buffer: SecureBuffer,
}

/// Open sessions keyed by file handle
///
/// Handles start at 1 and are never reused while the table lives.
#[derive(Debug)]
pub struct SessionTable {
    sessions: HashMap<u64, Session>,
    next_fh: u64,
}

impl SessionTable {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_fh: 1,
        }
    }

    pub fn insert(&mut self, stem: String, buffer: SecureBuffer) -> u64 {
        let fh = self.next_fh;
        self.next_fh += 1;
        self.sessions.insert(fh, Session { stem, buffer });
        fh
    }

    pub fn get(&self, fh: u64) -> Option<&Session> {
        self.sessions.get(&fh)
    }

    pub fn remove(&mut self, fh: u64) -> Option<Session> {
        self.sessions.remove(&fh)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}

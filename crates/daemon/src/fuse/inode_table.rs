//! Inode to path mapping for the FUSE transport
//!
//! FUSE addresses entries by inode, the session layer by path. The farm is
//! flat, so every path is either the root or `/<stem>`.

use std::collections::HashMap;

/// Bidirectional mapping between inodes and paths
#[derive(Debug)]
pub struct InodeTable {
    path_to_inode: HashMap<String, u64>,
    inode_to_path: HashMap<u64, String>,
    next_inode: u64,
}

impl InodeTable {
    pub const ROOT_INODE: u64 = 1;
    pub const ROOT_PATH: &'static str = "/";

    /// Create a new inode table with the root directory at inode 1
    pub fn new() -> Self {
        let mut table = Self {
            path_to_inode: HashMap::new(),
            inode_to_path: HashMap::new(),
            next_inode: Self::ROOT_INODE + 1,
        };

        table
            .path_to_inode
            .insert(Self::ROOT_PATH.to_string(), Self::ROOT_INODE);
        table
            .inode_to_path
            .insert(Self::ROOT_INODE, Self::ROOT_PATH.to_string());

        table
    }

    /// Path of a root entry
    pub fn child_path(name: &str) -> String {
        format!("{}{}", Self::ROOT_PATH, name)
    }

    /// Get inode for a path, creating one if it doesn't exist
    pub fn get_or_create(&mut self, path: &str) -> u64 {
        if let Some(&ino) = self.path_to_inode.get(path) {
            return ino;
        }

        let ino = self.next_inode;
        self.next_inode += 1;
        self.path_to_inode.insert(path.to_string(), ino);
        self.inode_to_path.insert(ino, path.to_string());
        ino
    }

    pub fn get_inode(&self, path: &str) -> Option<u64> {
        self.path_to_inode.get(path).copied()
    }

    pub fn get_path(&self, inode: u64) -> Option<&str> {
        self.inode_to_path.get(&inode).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inode_to_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inode_to_path.is_empty()
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

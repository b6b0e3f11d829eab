//! Hash-consing of the node graph behind one or more sets
//!
//! Every subtrie is hashed bottom-up with BLAKE3, from its terminal flag and the key and hash of each
//! of its edges.  Subtries with the same hash hold the same paths, so the trie can be rebuilt with each
//! of them stored once.  A [Merkleizer] keeps its table between calls, which lets separately built sets
//! end up sharing their common subtries.
//!
//! ```
//! # use pathset::PathTrieSet;
//! let set = PathTrieSet::from_paths(["axx", "ayy", "bxx", "byy"]);
//! let (shared, result) = set.merkleize();
//! assert_eq!(shared, set);
//! assert_eq!(result.reused, 1);
//! ```

use std::collections::hash_map::{Entry, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::trie_node::{shared_node_id, Edge, EdgeVec, TrieNode, TrieNodeODRc};
use crate::trie_set::PathTrieSet;

/// Statistics from one merkleization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MerkleizeResult {
    /// BLAKE3 digest of the whole set.  Equal sets have equal digests
    pub hash: [u8; 32],
    /// Number of subtries that were replaced by an identical one already in the table
    pub reused: usize,
}

/// A table of subtries keyed by content hash
#[derive(Default)]
pub struct Merkleizer {
    memo: HashMap<[u8; 32], TrieNodeODRc>,
}

/// A node whose children are being merkleized
struct Frame {
    node: TrieNodeODRc,
    next: usize,
    hasher: blake3::Hasher,
    edges: EdgeVec,
    /// Set once any child was replaced by a different allocation
    changed: bool,
}

impl Frame {
    fn new(node: TrieNodeODRc) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[node.is_terminal() as u8]);
        let edges = EdgeVec::with_capacity(node.child_count());
        Self { node, next: 0, hasher, edges, changed: false }
    }

    /// Records the merkleized child below the most recently visited edge
    fn attach(&mut self, hash: &[u8; 32], child: TrieNodeODRc) {
        let edge = &self.node.edges()[self.next - 1];
        self.hasher.update(&(edge.key.len() as u64).to_le_bytes());
        self.hasher.update(&edge.key);
        self.hasher.update(hash);
        if !Arc::ptr_eq(&edge.child, &child) {
            self.changed = true;
        }
        self.edges.push(Edge { key: edge.key.clone(), child });
    }
}

impl Merkleizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct subtries in the table
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// Returns a set equal to `set` in which every subtrie is the table's copy of it
    ///
    /// Subtries not seen before are added to the table.  Nodes are only rebuilt where a descendant
    /// was replaced, and an allocation that appears several times in `set` is only hashed once.
    pub fn merkleize(&mut self, set: &PathTrieSet) -> (PathTrieSet, MerkleizeResult) {
        let mut reused = 0;
        let mut visited: HashMap<usize, ([u8; 32], TrieNodeODRc)> = HashMap::new();
        let mut frame = Frame::new(set.root().clone());
        let mut parents: Vec<Frame> = Vec::new();
        loop {
            if let Some(edge) = frame.node.edges().get(frame.next) {
                let child = edge.child.clone();
                frame.next += 1;
                match visited.get(&shared_node_id(&child)) {
                    Some((hash, canonical)) => frame.attach(hash, canonical.clone()),
                    None => parents.push(core::mem::replace(&mut frame, Frame::new(child))),
                }
                continue;
            }

            let hash = *frame.hasher.finalize().as_bytes();
            let canonical = match self.memo.entry(hash) {
                Entry::Occupied(entry) => {
                    if !Arc::ptr_eq(entry.get(), &frame.node) {
                        reused += 1;
                    }
                    entry.get().clone()
                },
                Entry::Vacant(entry) => {
                    let node = if frame.changed {
                        TrieNode::new(frame.node.is_terminal(), core::mem::take(&mut frame.edges))
                    } else {
                        frame.node.clone()
                    };
                    entry.insert(node).clone()
                },
            };
            visited.insert(shared_node_id(&frame.node), (hash, canonical.clone()));

            match parents.pop() {
                Some(mut parent) => {
                    parent.attach(&hash, canonical);
                    frame = parent;
                },
                None => {
                    debug!(reused, distinct = self.memo.len(), "merkleized path set");
                    return (PathTrieSet::new_with_root(canonical), MerkleizeResult { hash, reused });
                },
            }
        }
    }
}

impl PathTrieSet {
    /// Returns an equal set in which identical subtries are one allocation, using a fresh
    /// [Merkleizer].  Use a shared [Merkleizer] to share subtries between sets
    pub fn merkleize(&self) -> (Self, MerkleizeResult) {
        Merkleizer::new().merkleize(self)
    }
}

//! # Zipper Usage
//!
//! A zipper represents a cursor in a trie, and has a location called the focus.  A zipper can be moved
//! within the trie in order to read the paths around it.  A zipper's focus may not be moved above the
//! zipper's root.
//!
//! Zippers are positioned by path bytes rather than by nodes, so a focus may rest partway along a
//! compressed edge.  All movement is atomic: a method that returns `false` leaves the zipper where it was.
//!
//! ## Move by Absolute Distance or by Trie Features
//!
//! The stepping methods are:
//! - [descend_byte](Zipper::descend_byte)
//! - [descend_indexed_byte](Zipper::descend_indexed_byte)
//! - [ascend](Zipper::ascend)
//! - [to_next_sibling_byte](Zipper::to_next_sibling_byte) and [to_prev_sibling_byte](Zipper::to_prev_sibling_byte)
//!
//! The jumping methods are:
//! - [descend_to](Zipper::descend_to)
//! - [to_next_val](ReadZipper::to_next_val)
//!

use crate::config::Config;
use crate::trie_node::{TrieNode, TrieNodeODRc, Edge};
use crate::trie_set::PathTrieSet;
use crate::utils::ByteMask;

/// An interface common to all zippers, to support moving the zipper and inspecting its focus
pub trait Zipper {
    /// Returns `true` if the zipper cannot ascend further, otherwise returns `false`
    fn at_root(&self) -> bool;

    /// Resets the zipper's focus back to the root
    fn reset(&mut self);

    /// Returns the path from the zipper's root to the current focus
    fn path(&self) -> &[u8];

    /// Returns the number of child branches from the focus
    ///
    /// Returns 0 if the focus is on a leaf.  Returns 1 if the focus is partway along an edge
    fn child_count(&self) -> usize;

    /// Returns a mask with one bit set for the first byte of each child branch from the focus
    fn child_mask(&self) -> ByteMask;

    /// Moves the zipper deeper into the tree, following `k` from the current zipper focus
    ///
    /// Returns `true` if the zipper moved.  If any part of `k` does not exist within the trie, the zipper
    /// doesn't move and the method returns `false`
    fn descend_to<K: AsRef<[u8]>>(&mut self, k: K) -> bool;

    /// Moves the zipper one byte deeper into the tree.  Returns `false` without moving if `byte` does
    /// not continue any path from the focus
    fn descend_byte(&mut self, byte: u8) -> bool;

    /// Descends one byte into the child branch at position `child_idx`, counted in ascending byte order
    ///
    /// `child_idx` must be within the range `0..child_count()` or this method will do nothing and return `false`
    fn descend_indexed_byte(&mut self, child_idx: usize) -> bool;

    /// Ascends the zipper `steps` bytes towards the root.  Returns `true` if the zipper sucessfully moved
    ///
    /// If the root is fewer than `steps` bytes from the focus, then the zipper does not move and this
    /// method returns `false`
    fn ascend(&mut self, steps: usize) -> bool;

    /// Moves the zipper's focus to the sibling branch with the next higher byte.  Returns `true` if the
    /// focus was changed, otherwise returns `false`
    ///
    /// This method is equivalent to calling [Self::ascend] with `1`, followed by [Self::descend_byte] with
    /// the next byte in the parent's [child_mask](Self::child_mask).
    fn to_next_sibling_byte(&mut self) -> bool;

    /// Moves the zipper's focus to the sibling branch with the next lower byte.  See [Self::to_next_sibling_byte]
    fn to_prev_sibling_byte(&mut self) -> bool;

    /// Returns `true` if the path to the zipper's focus is a member of the set, otherwise `false`
    fn is_value(&self) -> bool;

    /// Returns the number of members at or below the zipper's focus
    fn val_count(&self) -> usize;
}

/// Size of node stack to preallocate in the zipper
pub(crate) const EXPECTED_DEPTH: usize = 16;

/// Size in bytes to preallocate path storage in the zipper
pub(crate) const EXPECTED_PATH_LEN: usize = 64;

/// A [Zipper] over an immutable snapshot of a [PathTrieSet]
///
/// A `ReadZipper` holds its own references to the nodes it visits, so it does not borrow the set it was
/// created from and can outlive it.  A `ReadZipper` is not meant to be moved by more than one thread;
/// use [fork_reader](Self::fork_reader) to get an independent zipper.
#[derive(Clone)]
pub struct ReadZipper {
    /// The root of the snapshot
    root: TrieNodeODRc,
    /// The node containing the focus.  The focus is at the start of this node or partway along one of its edges
    focus_node: TrieNodeODRc,
    /// Stores the entire path from the root node
    prefix_buf: Vec<u8>,
    /// Stores the length of the path at which each node on the stack begins
    prefix_idx: Vec<usize>,
    /// Stores a stack of parent nodes and the index of the edge taken out of each.  Does not include the focus_node
    ancestors: Vec<(TrieNodeODRc, usize)>,
}

impl Zipper for ReadZipper {
    fn at_root(&self) -> bool {
        self.prefix_buf.is_empty()
    }

    fn reset(&mut self) {
        self.focus_node = self.root.clone();
        self.prefix_buf.clear();
        self.prefix_idx.clear();
        self.ancestors.clear();
    }

    fn path(&self) -> &[u8] {
        &self.prefix_buf
    }

    fn child_count(&self) -> usize {
        if self.node_key().is_empty() {
            self.focus_node.child_count()
        } else {
            1
        }
    }

    fn child_mask(&self) -> ByteMask {
        let key = self.node_key();
        match self.focus_edge() {
            Some((_, edge)) => ByteMask::from(edge.key[key.len()]),
            None => *self.focus_node.mask(),
        }
    }

    fn descend_to<K: AsRef<[u8]>>(&mut self, k: K) -> bool {
        let k = k.as_ref();
        let start_len = self.prefix_buf.len();
        self.prepare_buffers();
        for &byte in k {
            if !self.descend_byte(byte) {
                self.ascend_to_len(start_len);
                return false;
            }
        }
        true
    }

    fn descend_byte(&mut self, byte: u8) -> bool {
        let key_len = self.node_key().len();
        let (edge_idx, edge_len) = match self.focus_edge() {
            Some((idx, edge)) => {
                if edge.key[key_len] != byte {
                    return false;
                }
                (idx, edge.key.len())
            },
            None => match self.focus_node.edge_idx(byte) {
                Some(idx) => (idx, self.focus_node.edges()[idx].key.len()),
                None => return false,
            },
        };
        self.prefix_buf.push(byte);
        if key_len + 1 == edge_len {
            self.enter_child(edge_idx);
        }
        true
    }

    fn descend_indexed_byte(&mut self, child_idx: usize) -> bool {
        match self.child_mask().nth(child_idx) {
            Some(byte) => self.descend_byte(byte),
            None => false,
        }
    }

    fn ascend(&mut self, steps: usize) -> bool {
        match self.prefix_buf.len().checked_sub(steps) {
            Some(new_len) => {
                self.ascend_to_len(new_len);
                true
            },
            None => false,
        }
    }

    fn to_next_sibling_byte(&mut self) -> bool {
        self.to_sibling(true)
    }

    fn to_prev_sibling_byte(&mut self) -> bool {
        self.to_sibling(false)
    }

    fn is_value(&self) -> bool {
        self.node_key().is_empty() && self.focus_node.is_terminal()
    }

    fn val_count(&self) -> usize {
        match self.focus_edge() {
            Some((_, edge)) => edge.child.val_count(),
            None => self.focus_node.val_count(),
        }
    }
}

impl ReadZipper {
    /// Creates a new zipper focused on the root of a snapshot
    pub(crate) fn new_with_root(root: TrieNodeODRc) -> Self {
        Self {
            focus_node: root.clone(),
            root,
            prefix_buf: vec![],
            prefix_idx: vec![],
            ancestors: vec![],
        }
    }

    /// Returns `true` if the path to the zipper's focus is a member of the set.  Synonym for [Zipper::is_value]
    #[inline]
    pub fn exists(&self) -> bool {
        self.is_value()
    }

    /// Returns the bytes that continue a path from the focus, in ascending order
    pub fn children(&self) -> Vec<u8> {
        self.child_mask().iter().collect()
    }

    /// Returns the smallest path below the focus in lexicographic order, relative to the focus, or `None`
    /// if the zipper is on an empty set.  Does not move the zipper
    pub fn min_path(&self) -> Option<Vec<u8>> {
        let (mut node, mut path) = self.focus_remainder();
        if node.is_empty() {
            return None;
        }
        while !node.is_terminal() {
            let edge = &node.edges()[0];
            path.extend_from_slice(&edge.key);
            node = &*edge.child;
        }
        Some(path)
    }

    /// Returns the largest path below the focus in lexicographic order, relative to the focus, or `None`
    /// if the zipper is on an empty set.  Does not move the zipper
    pub fn max_path(&self) -> Option<Vec<u8>> {
        let (mut node, mut path) = self.focus_remainder();
        if node.is_empty() {
            return None;
        }
        while let Some(edge) = node.edges().last() {
            path.extend_from_slice(&edge.key);
            node = &*edge.child;
        }
        Some(path)
    }

    /// Systematically advances to the next member of the set, traversing in depth-first lexicographic
    /// order.  Returns `true` if the zipper is on a new member
    ///
    /// The traversal covers the whole snapshot, not just the part below the place it started.  When there
    /// are no more members, the zipper is reset to the root and this method returns `false`.  Since the
    /// focus only ever moves forward, the empty path is never visited; check [Zipper::is_value] at the
    /// root for it
    pub fn to_next_val(&mut self) -> bool {
        self.prepare_buffers();
        loop {
            if !self.descend_first() {
                //We're at a leaf, so ascend until we can step into the next edge of an ancestor
                loop {
                    let Some((parent, edge_idx)) = self.ancestors.pop() else {
                        self.reset();
                        return false;
                    };
                    self.prefix_idx.pop();
                    self.focus_node = parent;
                    let node_start = self.node_key_start();
                    self.prefix_buf.truncate(node_start);
                    if edge_idx + 1 < self.focus_node.child_count() {
                        self.enter_edge(edge_idx + 1);
                        break;
                    }
                }
            }
            if self.focus_node.is_terminal() {
                return true;
            }
        }
    }

    /// Returns a new zipper at the same position over the same snapshot
    pub fn fork_reader(&self) -> ReadZipper {
        self.clone()
    }

    /// Returns a new zipper, with its root at this zipper's focus
    pub fn fork_zipper(&self) -> ReadZipper {
        ReadZipper::new_with_root(self.focus_subtrie())
    }

    /// Returns a new set containing the paths below the zipper's focus, relative to the focus
    pub fn make_map(&self) -> PathTrieSet {
        PathTrieSet::new_with_root(self.focus_subtrie())
    }

    /// Returns every path below the focus, relative to the focus and in ascending order
    pub fn read_paths(&self) -> Vec<Vec<u8>> {
        self.path_iter().collect()
    }

    /// Returns paths below the focus in ascending order, stopping as soon as `value_limit` paths or
    /// `byte_limit` total path bytes have been produced
    ///
    /// To resume a bounded traversal, hold onto a [ReadZipperPathIter] and call
    /// [next_batch](ReadZipperPathIter::next_batch) on it repeatedly.
    pub fn traverse_paths(&self, value_limit: usize, byte_limit: usize) -> Vec<Vec<u8>> {
        self.path_iter().next_batch(value_limit, byte_limit)
    }

    /// [Self::traverse_paths] with the limits from a [Config]
    pub fn traverse_default(&self, config: &Config) -> Vec<Vec<u8>> {
        self.traverse_paths(config.traverse_value_limit, config.traverse_byte_limit)
    }

    /// Returns an iterator over the paths below the focus, relative to the focus.  Does not move the zipper
    pub fn path_iter(&self) -> ReadZipperPathIter {
        self.fork_zipper().into_path_iter()
    }

    /// Consumes the zipper and returns an iterator over every path below the focus, relative to the focus
    pub fn into_path_iter(self) -> ReadZipperPathIter {
        let zipper = if self.at_root() { self } else { self.fork_zipper() };
        ReadZipperPathIter { started: false, zipper: Some(zipper) }
    }

    /// Internal method returning the index to the key byte beyond the path to `self.focus_node`
    #[inline]
    fn node_key_start(&self) -> usize {
        self.prefix_idx.last().copied().unwrap_or(0)
    }

    /// Internal method returning the part of the path that lies along an edge of `self.focus_node`
    #[inline]
    fn node_key(&self) -> &[u8] {
        &self.prefix_buf[self.node_key_start()..]
    }

    /// Internal method returning the edge the focus is partway along, if any
    #[inline]
    fn focus_edge(&self) -> Option<(usize, &Edge)> {
        let first = *self.node_key().first()?;
        let idx = self.focus_node.edge_idx(first)?;
        Some((idx, &self.focus_node.edges()[idx]))
    }

    /// Internal method returning the node below the focus, together with the rest of the edge that
    /// leads to it
    fn focus_remainder(&self) -> (&TrieNode, Vec<u8>) {
        let key_len = self.node_key().len();
        match self.focus_edge() {
            Some((_, edge)) => (&*edge.child, edge.key[key_len..].to_vec()),
            None => (&*self.focus_node, vec![]),
        }
    }

    /// Internal method returning the subtrie below the focus as a standalone node
    fn focus_subtrie(&self) -> TrieNodeODRc {
        let key_len = self.node_key().len();
        match self.focus_edge() {
            Some((_, edge)) => TrieNode::stem(&edge.key[key_len..], edge.child.clone()),
            None => self.focus_node.clone(),
        }
    }

    /// Internal method to step into the child at the end of an edge.  The whole edge must already be in
    /// `prefix_buf`
    #[inline]
    fn enter_child(&mut self, edge_idx: usize) {
        let child = self.focus_node.edges()[edge_idx].child.clone();
        let parent = std::mem::replace(&mut self.focus_node, child);
        self.ancestors.push((parent, edge_idx));
        self.prefix_idx.push(self.prefix_buf.len());
    }

    /// Internal method to follow a whole edge from the start of `self.focus_node`
    #[inline]
    fn enter_edge(&mut self, edge_idx: usize) {
        self.prefix_buf.extend_from_slice(&self.focus_node.edges()[edge_idx].key);
        self.enter_child(edge_idx);
    }

    /// Internal method to move down to the start of the next node along the lowest branch.  Returns
    /// `false` if the focus is on a leaf
    fn descend_first(&mut self) -> bool {
        let key_len = self.node_key().len();
        match self.focus_edge() {
            Some((idx, _)) => {
                let edge = &self.focus_node.edges()[idx];
                self.prefix_buf.extend_from_slice(&edge.key[key_len..]);
                self.enter_child(idx);
                true
            },
            None if self.focus_node.child_count() > 0 => {
                self.enter_edge(0);
                true
            },
            None => false,
        }
    }

    /// Internal method to ascend to the given path length, popping every node that starts below it
    fn ascend_to_len(&mut self, new_len: usize) {
        while self.node_key_start() > new_len {
            if let Some((parent, _)) = self.ancestors.pop() {
                self.focus_node = parent;
                self.prefix_idx.pop();
            }
        }
        self.prefix_buf.truncate(new_len);
    }

    /// Internal method implementing both sibling movements
    fn to_sibling(&mut self, next: bool) -> bool {
        let Some(&byte) = self.prefix_buf.last() else {
            return false;
        };
        let parent_len = self.prefix_buf.len() - 1;
        self.ascend_to_len(parent_len);
        let mask = self.child_mask();
        let sibling = if next { mask.next_bit(byte) } else { mask.prev_bit(byte) };
        self.descend_byte(sibling.unwrap_or(byte));
        sibling.is_some()
    }

    /// Internal method to ensure buffers to facilitate movement of zipper are allocated
    #[inline]
    fn prepare_buffers(&mut self) {
        if self.prefix_buf.capacity() == 0 {
            self.prefix_buf = Vec::with_capacity(EXPECTED_PATH_LEN);
            self.prefix_idx = Vec::with_capacity(EXPECTED_DEPTH);
            self.ancestors = Vec::with_capacity(EXPECTED_DEPTH);
        }
    }
}

impl std::fmt::Debug for ReadZipper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadZipper")
            .field("path", &self.prefix_buf)
            .field("is_value", &self.is_value())
            .field("child_mask", &self.child_mask())
            .finish()
    }
}

/// An iterator for depth-first traversal of the paths below a [ReadZipper]'s focus, returned from
/// [ReadZipper::into_path_iter] and [PathTrieSet::iter]
///
/// NOTE: This is a convenience to allow access to syntactic sugar like `for` loops, [collect](std::iter::Iterator::collect),
///  etc.  It will always be faster to use the zipper itself for iteration and traversal.
pub struct ReadZipperPathIter {
    started: bool,
    zipper: Option<ReadZipper>,
}

impl ReadZipperPathIter {
    /// Returns up to the next `value_limit` paths, stopping early once `byte_limit` total path bytes have
    /// been produced.  Subsequent calls continue where the previous one stopped
    pub fn next_batch(&mut self, value_limit: usize, byte_limit: usize) -> Vec<Vec<u8>> {
        let mut batch = vec![];
        let mut bytes = 0;
        while batch.len() < value_limit && bytes < byte_limit {
            match self.next() {
                Some(path) => {
                    bytes += path.len();
                    batch.push(path);
                },
                None => break,
            }
        }
        batch
    }
}

impl Iterator for ReadZipperPathIter {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if !self.started {
            self.started = true;
            if let Some(zipper) = &self.zipper {
                if zipper.is_value() {
                    return Some(zipper.path().to_vec());
                }
            }
        }
        if let Some(zipper) = &mut self.zipper {
            if zipper.to_next_val() {
                return Some(zipper.path().to_vec());
            }
            self.zipper = None;
        }
        None
    }
}

//! Numeric range sets
//!
//! Big-endian ranges of types up to 8 bytes wide are built directly, one block of numbers per node.
//! A block that ends inside the range holds the members `phase, phase+step, ...` of the block for some
//! phase, so blocks at the same depth with the same phase share one subtrie.  The other ranges are
//! generated number by number.

use std::collections::HashMap;

use num_traits::{PrimInt, ToBytes};
use tracing::debug;

use crate::algebra::join_nodes;
use crate::error::ArgumentError;
use crate::trie_node::{build_sorted, make_edge, EdgeVec, TrieNode, TrieNodeODRc};
use crate::trie_set::PathTrieSet;

/// Builds the trie of the `width`-byte big-endian encodings of `lo, lo+step, ...` below `hi`
struct BlockBuilder {
    width: usize,
    step: u128,
    hi: u128,
    /// Subtries of blocks that end inside the range, by depth and the offset of the first member
    interior: HashMap<(usize, u128), TrieNodeODRc>,
}

impl BlockBuilder {
    fn build(width: usize, lo: u128, hi: u128, step: u128) -> TrieNodeODRc {
        if lo >= hi {
            return TrieNode::empty();
        }
        let mut builder = Self { width, step, hi, interior: HashMap::new() };
        builder.block(0, 0, lo)
    }

    /// The subtrie below the first `depth` bytes of `base`, whose first member is `first`
    fn block(&mut self, depth: usize, base: u128, first: u128) -> TrieNodeODRc {
        if depth == self.width {
            return TrieNode::leaf();
        }
        let size = 1u128 << (8 * (self.width - depth));
        let end = base + size;
        let key = (depth, first - base);
        let interior = end <= self.hi;
        if interior {
            if let Some(node) = self.interior.get(&key) {
                return node.clone();
            }
        }

        let child_size = size >> 8;
        let limit = end.min(self.hi);
        let mut edges = EdgeVec::new();
        let mut member = first;
        while member < limit {
            let byte = (member - base) / child_size;
            let child_base = base + byte * child_size;
            let child = self.block(depth + 1, child_base, member);
            edges.extend(make_edge(&[byte as u8], child));

            //Skip to the first member of a later child block
            let next_base = child_base + child_size;
            if next_base >= limit {
                break;
            }
            member += (next_base - member).div_ceil(self.step) * self.step;
        }
        let node = TrieNode::new(false, edges);
        if interior {
            self.interior.insert(key, node.clone());
        }
        node
    }
}

/// Maps a big-endian range onto progressions over the unsigned bit patterns of `R`, as
/// `(first, end, step)` triples.  Returns `None` for types too wide for the block builder
fn bit_ranges<R: PrimInt>(start: R, stop: R, step: R) -> Option<Vec<(u128, u128, u128)>> {
    let width = std::mem::size_of::<R>();
    if width > 8 {
        return None;
    }
    let step = step.to_u128()?;
    if R::min_value() == R::zero() {
        return Some(vec![(start.to_u128()?, stop.to_u128()?, step)]);
    }

    //Negative numbers encode above the non-negative ones, offset by 2^bits
    let (start, stop) = (start.to_i128()?, stop.to_i128()?);
    let offset = 1i128 << (8 * width);
    let mut ranges = vec![];
    if start < 0 {
        ranges.push(((start + offset) as u128, (stop.min(0) + offset) as u128, step));
    }
    if stop > 0 {
        let first = if start >= 0 { start } else { start + ((-start) as u128).div_ceil(step) as i128 * (step as i128) };
        ranges.push((first as u128, stop as u128, step));
    }
    Some(ranges)
}

impl PathTrieSet {
    /// Creates a set containing the fixed-width encodings of `start`, `start+step`, ... up to but not
    /// including `stop`.  `BE` selects big-endian encodings, which keeps the numeric order and the path
    /// order the same for unsigned types
    ///
    /// Generation ends early instead of wrapping if the next value would overflow `R`.
    ///
    /// ```
    /// # use pathset::PathTrieSet;
    /// let set = PathTrieSet::range::<false, u16>(254, 258, 2).unwrap();
    /// assert_eq!(set.paths(), vec![vec![0, 1], vec![254, 0]]);
    /// ```
    pub fn range<const BE: bool, R>(start: R, stop: R, step: R) -> Result<Self, ArgumentError>
        where R: PrimInt + ToBytes
    {
        if step <= R::zero() {
            return Err(ArgumentError::ZeroStep);
        }
        let width = std::mem::size_of::<R>();
        if BE {
            if let Some(ranges) = bit_ranges(start, stop, step) {
                let root = ranges.into_iter()
                    .map(|(lo, hi, step)| BlockBuilder::build(width, lo, hi, step))
                    .fold(TrieNode::empty(), |acc, part| join_nodes(&acc, &part));
                debug!(paths = root.val_count(), width, big_endian = BE, "built range");
                return Ok(Self::new_with_root(root));
            }
        }

        let mut keys = vec![];
        let mut i = start;
        while i < stop {
            keys.push(if BE { i.to_be_bytes() } else { i.to_le_bytes() });
            match i.checked_add(&step) {
                Some(next) => i = next,
                None => break,
            }
        }
        //Little-endian keys, and big-endian keys of negative numbers, are not generated in path order
        keys.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        debug!(paths = keys.len(), width, big_endian = BE, "generated range");
        Ok(Self::new_with_root(build_sorted(&keys, 0)))
    }

    /// Creates the set of 4-byte big-endian encodings of every `n` in `[start, stop)` with stride `step`
    ///
    /// ```
    /// # use pathset::PathTrieSet;
    /// let set = PathTrieSet::range_be_u32(0, 4, 1).unwrap();
    /// assert!(set.contains([0, 0, 0, 3]));
    /// assert_eq!(set.val_count(), 4);
    /// ```
    pub fn range_be_u32(start: u32, stop: u32, step: u32) -> Result<Self, ArgumentError> {
        Self::range::<true, u32>(start, stop, step)
    }
}

//! Canonical binary encoding of a [PathTrieSet]
//!
//! The encoding mirrors the compressed trie directly.  Each node is written as
//!
//! ```text
//! node := terminal_flag:u8 child_count:varint (edge_len:varint edge_bytes node)*
//! ```
//!
//! with children in ascending order of their first edge byte, and varints in unsigned LEB128.  The
//! terminal flag is `0` or `1`.  Because sets are always held in canonical form, two equal sets encode
//! to identical bytes.
//!
//! Decoding is strict.  Anything that would not be produced by [serialize] is rejected with a
//! [DecodeError] rather than being repaired, including non-canonical shapes, unsorted children and
//! trailing bytes.  Nodes shared within a set are written once per occurrence; the encoding does not
//! preserve sharing.

use std::io::Write;

use tracing::debug;

use crate::config::Config;
use crate::error::DecodeError;
use crate::trie_node::{Edge, EdgeVec, TrieNode, TrieNodeODRc};
use crate::trie_set::PathTrieSet;

/// Encodes `set` into a new buffer
pub fn serialize(set: &PathTrieSet) -> Vec<u8> {
    let mut out = Vec::new();
    write_node(set.root(), &mut out);
    debug!(paths = set.val_count(), bytes = out.len(), "serialized path set");
    out
}

/// Encodes `set` into `target`, and returns the number of bytes written
pub fn serialize_into<W: Write>(set: &PathTrieSet, target: &mut W) -> std::io::Result<usize> {
    let bytes = serialize(set);
    target.write_all(&bytes)?;
    Ok(bytes.len())
}

/// Decodes a set from bytes produced by [serialize]
///
/// No nesting limit is applied, so every set [serialize] produces decodes again.  Use
/// [deserialize_with_config] to bound the depth of untrusted input.
pub fn deserialize(bytes: &[u8]) -> Result<PathTrieSet, DecodeError> {
    decode(bytes, usize::MAX)
}

/// Decodes a set from bytes produced by [serialize], rejecting nesting deeper than
/// [Config::max_decode_depth] nodes
pub fn deserialize_with_config(bytes: &[u8], config: &Config) -> Result<PathTrieSet, DecodeError> {
    decode(bytes, config.max_decode_depth)
}

fn decode(bytes: &[u8], max_depth: usize) -> Result<PathTrieSet, DecodeError> {
    let mut decoder = Decoder { src: bytes, pos: 0, max_depth };
    let root = decoder.root()?;
    if decoder.pos != bytes.len() {
        return Err(DecodeError::TrailingBytes { offset: decoder.pos, remaining: bytes.len() - decoder.pos });
    }
    debug!(paths = root.val_count(), bytes = bytes.len(), "deserialized path set");
    Ok(PathTrieSet::new_with_root(root))
}

/// Writes the subtrie in depth-first order, keeping the unfinished nodes on an explicit stack
fn write_node(root: &TrieNode, out: &mut Vec<u8>) {
    write_header(root, out);
    let mut stack = vec![(root, 0usize)];
    while let Some(top) = stack.last_mut() {
        let (node, idx) = *top;
        match node.edges().get(idx) {
            Some(edge) => {
                top.1 += 1;
                write_varint(edge.key.len() as u64, out);
                out.extend_from_slice(&edge.key);
                write_header(&edge.child, out);
                stack.push((&*edge.child, 0));
            },
            None => {
                stack.pop();
            },
        }
    }
}

fn write_header(node: &TrieNode, out: &mut Vec<u8>) {
    out.push(node.is_terminal() as u8);
    write_varint(node.child_count() as u64, out);
}

fn write_varint(mut v: u64, out: &mut Vec<u8>) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

/// A decoded node header whose edges are still being read
struct PendingNode<'a> {
    terminal: bool,
    remaining: u64,
    edges: EdgeVec,
    prev_byte: Option<u8>,
    /// Key of the edge leading here from the parent
    key: &'a [u8],
}

struct Decoder<'a> {
    src: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    fn byte(&mut self) -> Result<u8, DecodeError> {
        let b = *self.src.get(self.pos).ok_or(DecodeError::UnexpectedEof { offset: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.src.len() - self.pos < len {
            return Err(DecodeError::UnexpectedEof { offset: self.src.len() });
        }
        let slice = &self.src[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Reads a minimally-encoded LEB128 value
    fn varint(&mut self) -> Result<u64, DecodeError> {
        let offset = self.pos;
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let b = self.byte()?;
            if shift == 63 && b > 1 {
                return Err(DecodeError::VarintOverflow { offset });
            }
            value |= ((b & 0x7f) as u64) << shift;
            if b & 0x80 == 0 {
                if b == 0 && shift > 0 {
                    return Err(DecodeError::NonCanonical { offset });
                }
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// Decodes the whole tree.  Nodes whose edges are still being read wait on an explicit stack, so
    /// the nesting depth is bounded only by `max_depth`
    fn root(&mut self) -> Result<TrieNodeODRc, DecodeError> {
        let mut parents: Vec<PendingNode<'a>> = Vec::new();
        let mut current = self.header(0, &[])?;
        loop {
            if current.remaining == 0 {
                let node = TrieNode::new(current.terminal, current.edges);
                let Some(mut parent) = parents.pop() else {
                    return Ok(node);
                };
                parent.edges.push(Edge::new(current.key, node));
                current = parent;
                continue;
            }
            current.remaining -= 1;
            let key = self.edge_key(&mut current.prev_byte)?;
            let child = self.header(parents.len() + 1, key)?;
            parents.push(core::mem::replace(&mut current, child));
        }
    }

    fn header(&mut self, depth: usize, key: &'a [u8]) -> Result<PendingNode<'a>, DecodeError> {
        if depth > self.max_depth {
            return Err(DecodeError::DepthLimitExceeded { limit: self.max_depth });
        }
        let offset = self.pos;
        let terminal = match self.byte()? {
            0 => false,
            1 => true,
            flag => return Err(DecodeError::InvalidTerminalFlag { offset, flag }),
        };
        let count = self.varint()?;
        if count > 256 {
            return Err(DecodeError::TooManyChildren { offset, count });
        }
        //Below the root, a node that is neither terminal nor a branch would have been folded or pruned
        if depth > 0 && !terminal && count < 2 {
            return Err(DecodeError::NonCanonical { offset });
        }
        Ok(PendingNode { terminal, remaining: count, edges: EdgeVec::with_capacity(count as usize), prev_byte: None, key })
    }

    /// Reads the length and bytes of an edge key, checking it sorts after the previous sibling
    fn edge_key(&mut self, prev_byte: &mut Option<u8>) -> Result<&'a [u8], DecodeError> {
        let offset = self.pos;
        let len = self.varint()?;
        if len == 0 {
            return Err(DecodeError::EmptyEdge { offset });
        }
        let len = usize::try_from(len).map_err(|_| DecodeError::UnexpectedEof { offset: self.src.len() })?;
        let key = self.bytes(len)?;
        if prev_byte.is_some_and(|prev| key[0] <= prev) {
            return Err(DecodeError::UnsortedChildren { offset });
        }
        *prev_byte = Some(key[0]);
        Ok(key)
    }
}

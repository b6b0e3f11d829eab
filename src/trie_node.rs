use std::sync::{Arc, OnceLock};

use smallvec::SmallVec;

use crate::utils::{ByteMask, find_prefix_overlap};

/// A shared, immutable reference to a node.  Nodes are never mutated after construction, so a single
/// node may be referenced by any number of sets, cursors and threads.
pub(crate) type TrieNodeODRc = Arc<TrieNode>;

/// The label on an edge.  Most edges in practice are short, so they are stored inline
pub(crate) type EdgeKey = SmallVec<[u8; 8]>;

/// The outgoing edges of a node, ordered by ascending first byte
pub(crate) type EdgeVec = SmallVec<[Edge; 2]>;

/// A compressed edge to a child node
///
/// The key is never empty, and its first byte is unique among the edges of the parent node
#[derive(Clone)]
pub(crate) struct Edge {
    pub(crate) key: EdgeKey,
    pub(crate) child: TrieNodeODRc,
}

impl Edge {
    #[inline]
    pub(crate) fn new(key: &[u8], child: TrieNodeODRc) -> Self {
        debug_assert!(!key.is_empty());
        Self { key: EdgeKey::from_slice(key), child }
    }
    #[inline]
    pub(crate) fn first_byte(&self) -> u8 {
        self.key[0]
    }
}

/// A node in the trie
///
/// A node is terminal if the path leading to it is a member of the set.  In canonical form every
/// non-root node is either terminal or has at least two edges; chains of single-child, non-terminal
/// nodes are folded into multi-byte edge keys.
pub(crate) struct TrieNode {
    terminal: bool,
    /// One bit for the first byte of each edge
    mask: ByteMask,
    edges: EdgeVec,
    /// Number of terminal nodes in this subtree, including `self`
    val_count: usize,
}

impl core::fmt::Debug for TrieNode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        if self.terminal {
            map.entry(&"", &"$");
        }
        for edge in self.edges.iter() {
            map.entry(&edge.key.as_slice(), &edge.child);
        }
        map.finish()
    }
}

impl Drop for TrieNode {
    fn drop(&mut self) {
        //Uniquely owned descendants are released from a work list instead of recursively
        let mut pending: Vec<TrieNodeODRc> = self.edges.drain(..).map(|edge| edge.child).collect();
        while let Some(node) = pending.pop() {
            if let Some(mut inner) = Arc::into_inner(node) {
                pending.extend(inner.edges.drain(..).map(|edge| edge.child));
            }
        }
    }
}

impl TrieNode {
    /// Makes a node from its parts.  `edges` must be sorted by first byte, with no duplicates
    pub(crate) fn new(terminal: bool, edges: EdgeVec) -> TrieNodeODRc {
        if edges.is_empty() {
            return if terminal { Self::leaf() } else { Self::empty() };
        }
        Arc::new(Self::new_unshared(terminal, edges))
    }

    fn new_unshared(terminal: bool, edges: EdgeVec) -> Self {
        debug_assert!(edges.windows(2).all(|pair| pair[0].first_byte() < pair[1].first_byte()));
        let mut mask = ByteMask::new();
        let mut val_count = terminal as usize;
        for edge in edges.iter() {
            debug_assert!(!edge.child.is_empty());
            mask.set_bit(edge.first_byte());
            val_count += edge.child.val_count;
        }
        Self { terminal, mask, edges, val_count }
    }

    /// The node with no paths.  All empty nodes are the same allocation
    pub(crate) fn empty() -> TrieNodeODRc {
        static EMPTY: OnceLock<TrieNodeODRc> = OnceLock::new();
        EMPTY.get_or_init(|| Arc::new(Self::new_unshared(false, EdgeVec::new()))).clone()
    }

    /// The node containing only the empty path.  All leaves are the same allocation
    pub(crate) fn leaf() -> TrieNodeODRc {
        static LEAF: OnceLock<TrieNodeODRc> = OnceLock::new();
        LEAF.get_or_init(|| Arc::new(Self::new_unshared(true, EdgeVec::new()))).clone()
    }

    /// Makes a non-terminal node with a single edge, `key` followed by the contents of `child`
    ///
    /// This is the only shape of node that is not canonical below the root, and it is used as an
    /// operand when one trie needs to be viewed from partway along a compressed edge.
    pub(crate) fn stem(key: &[u8], child: TrieNodeODRc) -> TrieNodeODRc {
        if key.is_empty() {
            return child;
        }
        match make_edge(key, child) {
            Some(edge) => Self::new(false, smallvec::smallvec![edge]),
            None => Self::empty(),
        }
    }

    #[inline]
    pub(crate) fn is_terminal(&self) -> bool {
        self.terminal
    }
    #[inline]
    pub(crate) fn mask(&self) -> &ByteMask {
        &self.mask
    }
    #[inline]
    pub(crate) fn edges(&self) -> &[Edge] {
        &self.edges
    }
    #[inline]
    pub(crate) fn child_count(&self) -> usize {
        self.edges.len()
    }
    #[inline]
    pub(crate) fn val_count(&self) -> usize {
        self.val_count
    }
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.val_count == 0
    }

    /// Returns the position of the edge beginning with `byte` within [Self::edges]
    #[inline]
    pub(crate) fn edge_idx(&self, byte: u8) -> Option<usize> {
        if self.mask.test_bit(byte) {
            Some(self.mask.index_of(byte))
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn edge_for_byte(&self, byte: u8) -> Option<&Edge> {
        self.edge_idx(byte).map(|idx| &self.edges[idx])
    }

    /// Follows `key` down from this node.  Returns the node at which the key ends, together with the
    /// number of bytes of the final edge left unconsumed, or `None` if `key` leaves the trie
    pub(crate) fn walk<'a>(&'a self, key: &[u8]) -> Option<(&'a TrieNode, Option<(&'a Edge, usize)>)> {
        let mut node = self;
        let mut key = key;
        loop {
            if key.is_empty() {
                return Some((node, None));
            }
            let edge = node.edge_for_byte(key[0])?;
            let overlap = find_prefix_overlap(&edge.key, key);
            if overlap == edge.key.len() {
                node = &*edge.child;
                key = &key[overlap..];
            } else if overlap == key.len() {
                return Some((node, Some((edge, overlap))));
            } else {
                return None;
            }
        }
    }

    /// Returns `true` if `key` is a member of the subtrie rooted here
    pub(crate) fn contains(&self, key: &[u8]) -> bool {
        match self.walk(key) {
            Some((node, None)) => node.terminal,
            _ => false,
        }
    }

    /// Returns `true` if `key` is a prefix of some member of the subtrie rooted here
    pub(crate) fn contains_path(&self, key: &[u8]) -> bool {
        match self.walk(key) {
            Some((node, None)) => !node.is_empty(),
            Some((_, Some(_))) => true,
            None => false,
        }
    }
}

/// Returns an id that is unique to the allocation behind a node, so sharing can be observed
#[inline]
pub(crate) fn shared_node_id(node: &TrieNodeODRc) -> usize {
    Arc::as_ptr(node) as usize
}

/// Makes the canonical edge for `prefix` followed by the contents of `child`
///
/// Returns `None` if `child` is empty.  If `child` is a non-terminal node with a single edge, it is
/// folded into the new edge's key.
pub(crate) fn make_edge(prefix: &[u8], child: TrieNodeODRc) -> Option<Edge> {
    debug_assert!(!prefix.is_empty());
    if child.is_empty() {
        return None;
    }
    if !child.terminal && child.edges.len() == 1 {
        let grandchild = &child.edges[0];
        let mut key = EdgeKey::with_capacity(prefix.len() + grandchild.key.len());
        key.extend_from_slice(prefix);
        key.extend_from_slice(&grandchild.key);
        Some(Edge { key, child: grandchild.child.clone() })
    } else {
        Some(Edge::new(prefix, child))
    }
}

/// Structural equality between two subtries.  Physically shared subtrees are not descended
pub(crate) fn node_eq(a: &TrieNodeODRc, b: &TrieNodeODRc) -> bool {
    let mut pending = vec![(a, b)];
    while let Some((a, b)) = pending.pop() {
        if Arc::ptr_eq(a, b) {
            continue;
        }
        if a.terminal != b.terminal || a.val_count != b.val_count || a.mask != b.mask {
            return false;
        }
        for (ea, eb) in a.edges.iter().zip(b.edges.iter()) {
            if ea.key != eb.key {
                return false;
            }
            pending.push((&ea.child, &eb.child));
        }
    }
    true
}

/// A node of [build_sorted] whose edges are still being built
struct BuildFrame<'a, P> {
    terminal: bool,
    edges: EdgeVec,
    /// The paths below this node that no edge covers yet
    rest: &'a [P],
    depth: usize,
    /// Key of the edge from the parent frame
    key: &'a [u8],
}

impl<'a, P: AsRef<[u8]>> BuildFrame<'a, P> {
    fn open(paths: &'a [P], depth: usize, key: &'a [u8]) -> Self {
        let terminal = paths.first().is_some_and(|first| first.as_ref().len() == depth);
        Self { terminal, edges: EdgeVec::new(), rest: &paths[terminal as usize..], depth, key }
    }
}

/// Builds a canonical subtrie from `paths`, which must be sorted, free of duplicates, and share their
/// first `depth` bytes
///
/// Nodes are built depth-first on an explicit stack, so the depth of the trie is not limited by the
/// call stack.
pub(crate) fn build_sorted<P: AsRef<[u8]>>(paths: &[P], depth: usize) -> TrieNodeODRc {
    let mut frame = BuildFrame::open(paths, depth, &[]);
    let mut parents = Vec::new();
    loop {
        let rest = frame.rest;
        if let Some(first) = rest.first() {
            let first = first.as_ref();
            let depth = frame.depth;
            let byte = first[depth];
            let group_len = rest.iter().take_while(|p| p.as_ref()[depth] == byte).count();
            let (group, tail) = rest.split_at(group_len);
            frame.rest = tail;

            //Sorted input means the first and last paths in the group bound the group's common prefix
            let last = group[group_len - 1].as_ref();
            let shared = find_prefix_overlap(&first[depth..], &last[depth..]);
            let child = BuildFrame::open(group, depth + shared, &first[depth..depth + shared]);
            parents.push(core::mem::replace(&mut frame, child));
            continue;
        }

        let node = TrieNode::new(frame.terminal, core::mem::take(&mut frame.edges));
        match parents.pop() {
            Some(mut parent) => {
                parent.edges.push(Edge::new(frame.key, node));
                frame = parent;
            },
            None => return node,
        }
    }
}

/// Collects every member of the subtrie in order, appending each one to `prefix`
pub(crate) fn collect_paths(node: &TrieNode, prefix: &mut Vec<u8>, out: &mut Vec<Vec<u8>>) {
    let base = prefix.len();
    if node.terminal {
        out.push(prefix.clone());
    }
    //Each entry is a node, the index of its next edge to visit, and the prefix length at the node
    let mut stack = vec![(node, 0usize, base)];
    while let Some(top) = stack.last_mut() {
        let (node, idx, len) = *top;
        match node.edges.get(idx) {
            Some(edge) => {
                top.1 += 1;
                prefix.truncate(len);
                prefix.extend_from_slice(&edge.key);
                if edge.child.terminal {
                    out.push(prefix.clone());
                }
                stack.push((&*edge.child, 0, prefix.len()));
            },
            None => {
                stack.pop();
            },
        }
    }
    prefix.truncate(base);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(paths: &[&[u8]]) -> TrieNodeODRc {
        let mut paths = paths.to_vec();
        paths.sort();
        paths.dedup();
        build_sorted(&paths, 0)
    }

    #[test]
    fn build_compresses_edges() {
        let root = build(&[b"romane", b"romanus", b"romulus"]);
        assert_eq!(root.child_count(), 1);
        assert_eq!(&root.edges()[0].key[..], b"rom");
        let rom = &root.edges()[0].child;
        assert!(!rom.is_terminal());
        assert_eq!(rom.edges().iter().map(|e| e.key.to_vec()).collect::<Vec<_>>(), vec![b"an".to_vec(), b"ulus".to_vec()]);
        assert_eq!(root.val_count(), 3);
    }

    #[test]
    fn prefix_paths_keep_terminal_markers() {
        let root = build(&[b"ab", b"abcd", b"abce"]);
        let ab = &root.edges()[0].child;
        assert_eq!(&root.edges()[0].key[..], b"ab");
        assert!(ab.is_terminal());
        assert_eq!(ab.child_count(), 1);
        assert!(root.contains(b"ab"));
        assert!(!root.contains(b"abc"));
        assert!(root.contains_path(b"abc"));
        assert!(!root.contains_path(b"abcf"));
        assert!(root.contains(b"abce"));
    }

    #[test]
    fn leaves_and_empties_are_shared() {
        let a = build(&[b"x", b"y"]);
        assert!(Arc::ptr_eq(&a.edges()[0].child, &a.edges()[1].child));
        assert!(Arc::ptr_eq(&build(&[]), &TrieNode::empty()));
        assert!(TrieNode::empty().is_empty());
        assert_eq!(TrieNode::leaf().val_count(), 1);
    }

    #[test]
    fn make_edge_folds_stems() {
        let child = build(&[b"cd"]);
        let edge = make_edge(b"ab", child).unwrap();
        assert_eq!(&edge.key[..], b"abcd");
        assert!(edge.child.is_terminal());
        assert!(make_edge(b"ab", TrieNode::empty()).is_none());

        let stem = TrieNode::stem(b"xy", build(&[b"", b"z"]));
        assert_eq!(stem.child_count(), 1);
        assert_eq!(&stem.edges()[0].key[..], b"xy");
    }

    #[test]
    fn structural_equality() {
        let a = build(&[b"abc", b"abd", b"b"]);
        let b = build(&[b"b", b"abd", b"abc"]);
        let c = build(&[b"abc", b"abd"]);
        assert!(node_eq(&a, &b));
        assert!(!node_eq(&a, &c));
    }

    #[test]
    fn walk_stops_inside_edges() {
        let root = build(&[b"hello"]);
        let (node, partial) = root.walk(b"hel").unwrap();
        assert_eq!(node.child_count(), 1);
        assert_eq!(partial.map(|(_, consumed)| consumed), Some(3));
        assert!(root.walk(b"help").is_none());
        assert!(root.walk(b"hello!").is_none());
    }
}

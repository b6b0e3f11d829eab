//! Node-level set algebra
//!
//! Every binary operation walks both tries jointly, one node pair at a time.  Where two edges share a
//! first byte but their keys diverge or differ in length, the longer edge is viewed from the end of
//! the shared prefix through a [TrieNode::stem], so the traversal only ever compares node positions.
//!
//! Results are reported as [AlgebraicResult]s so that a subtrie identical to one of the operands is
//! reused by reference instead of being rebuilt.

use std::sync::Arc;

use crate::ring::{AlgebraicResult, COUNTER_IDENT, SELF_IDENT};
use crate::trie_node::{make_edge, Edge, EdgeKey, EdgeVec, TrieNode, TrieNodeODRc};
use crate::utils::{find_prefix_overlap, ByteMaskIter};

/// The outcome of an operation along one edge of the result node
enum EdgeResult {
    None,
    /// The operand edges with the given identity bits are reproduced exactly
    Identity(u64),
    Element(Edge),
}

impl EdgeResult {
    /// Wraps the result for the subtries below the shared `prefix` of two edges
    fn below_prefix(prefix: &[u8], result: AlgebraicResult<TrieNodeODRc>) -> Self {
        match result {
            AlgebraicResult::None => EdgeResult::None,
            AlgebraicResult::Identity(mask) => EdgeResult::Identity(mask),
            AlgebraicResult::Element(node) => match make_edge(prefix, node) {
                Some(edge) => EdgeResult::Element(edge),
                None => EdgeResult::None,
            },
        }
    }
}

/// Views `edge` from `at` bytes along its key
#[inline]
fn below(edge: &Edge, at: usize) -> TrieNodeODRc {
    if at == edge.key.len() {
        edge.child.clone()
    } else {
        TrieNode::stem(&edge.key[at..], edge.child.clone())
    }
}

/// Collects the per-edge results of a binary operation, and keeps track of whether the result is
/// still identical to one or both operands
struct NodeAssembly {
    a: TrieNodeODRc,
    b: TrieNodeODRc,
    terminal: bool,
    edges: EdgeVec,
    ident_mask: u64,
}

impl NodeAssembly {
    fn new(a: TrieNodeODRc, b: TrieNodeODRc, terminal: bool, commutative: bool) -> Self {
        let mut ident_mask = 0;
        if terminal == a.is_terminal() {
            ident_mask |= SELF_IDENT;
        }
        if commutative && terminal == b.is_terminal() {
            ident_mask |= COUNTER_IDENT;
        }
        Self { a, b, terminal, edges: EdgeVec::new(), ident_mask }
    }

    /// Records the result for the edge beginning with `byte`.  Must be called in ascending byte order
    fn push(&mut self, byte: u8, result: EdgeResult) {
        match result {
            EdgeResult::None => {},
            EdgeResult::Identity(mask) => {
                let source = if mask & SELF_IDENT != 0 { &self.a } else { &self.b };
                match source.edge_for_byte(byte) {
                    Some(edge) => self.edges.push(edge.clone()),
                    None => unreachable!(),
                }
                self.ident_mask &= mask | !(SELF_IDENT | COUNTER_IDENT);
            },
            EdgeResult::Element(edge) => {
                self.edges.push(edge);
                self.ident_mask = 0;
            },
        }
    }

    fn finish(mut self) -> AlgebraicResult<TrieNodeODRc> {
        if self.edges.is_empty() && !self.terminal {
            return AlgebraicResult::None;
        }
        //Every kept edge was checked against its source, so a matching count means nothing was dropped
        if self.edges.len() != self.a.child_count() {
            self.ident_mask &= !SELF_IDENT;
        }
        if self.edges.len() != self.b.child_count() {
            self.ident_mask &= !COUNTER_IDENT;
        }
        if self.ident_mask != 0 {
            AlgebraicResult::Identity(self.ident_mask)
        } else {
            AlgebraicResult::Element(TrieNode::new(self.terminal, self.edges))
        }
    }
}

/// The binary operations that share the joint traversal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BinaryOp {
    Join,
    Meet,
    Subtract,
    /// Keeps the members of `a` that have a prefix in `b`
    Restrict,
}

impl BinaryOp {
    /// Decides the result for operands that don't need their edges visited
    fn settle(self, a: &TrieNodeODRc, b: &TrieNodeODRc) -> Option<AlgebraicResult<TrieNodeODRc>> {
        let same = Arc::ptr_eq(a, b);
        let result = match self {
            BinaryOp::Join if a.is_empty() && b.is_empty() => AlgebraicResult::None,
            BinaryOp::Join if same => AlgebraicResult::Identity(SELF_IDENT | COUNTER_IDENT),
            BinaryOp::Join if b.is_empty() => AlgebraicResult::Identity(SELF_IDENT),
            BinaryOp::Join if a.is_empty() => AlgebraicResult::Identity(COUNTER_IDENT),
            BinaryOp::Meet if a.is_empty() || b.is_empty() => AlgebraicResult::None,
            BinaryOp::Meet if same => AlgebraicResult::Identity(SELF_IDENT | COUNTER_IDENT),
            BinaryOp::Subtract if a.is_empty() || same => AlgebraicResult::None,
            BinaryOp::Subtract if b.is_empty() => AlgebraicResult::Identity(SELF_IDENT),
            BinaryOp::Restrict if a.is_empty() || b.is_empty() => AlgebraicResult::None,
            BinaryOp::Restrict if b.is_terminal() || same => AlgebraicResult::Identity(SELF_IDENT),
            _ => return None,
        };
        Some(result)
    }

    /// Starts the result node for a pair of operands that [Self::settle] couldn't decide
    fn assemble(self, a: TrieNodeODRc, b: TrieNodeODRc) -> (NodeAssembly, ByteMaskIter) {
        let (terminal, bytes) = match self {
            BinaryOp::Join => (a.is_terminal() || b.is_terminal(), a.mask().or(b.mask())),
            BinaryOp::Meet => (a.is_terminal() && b.is_terminal(), a.mask().and(b.mask())),
            BinaryOp::Subtract => (a.is_terminal() && !b.is_terminal(), *a.mask()),
            BinaryOp::Restrict => (false, a.mask().and(b.mask())),
        };
        let commutative = matches!(self, BinaryOp::Join | BinaryOp::Meet);
        (NodeAssembly::new(a, b, terminal, commutative), bytes.iter())
    }

    /// Applies the operation to two subtries
    ///
    /// The traversal keeps its own stack of partially assembled nodes, so it handles tries of any
    /// depth.  Where two edges share a first byte, the traversal descends into the subtries below
    /// their shared prefix; an edge present in only one operand is kept or dropped whole.
    fn apply(self, a: &TrieNodeODRc, b: &TrieNodeODRc) -> AlgebraicResult<TrieNodeODRc> {
        if let Some(result) = self.settle(a, b) {
            return result;
        }
        let mut frame = self.assemble(a.clone(), b.clone());
        //Each parent waits on the edge pair for one byte, whose shared prefix is kept alongside
        let mut parents: Vec<((NodeAssembly, ByteMaskIter), u8, EdgeKey)> = Vec::new();
        loop {
            let mut descend = None;
            while let Some(byte) = frame.1.next() {
                let (assembly, _) = &frame;
                let result = match (assembly.a.edge_for_byte(byte), assembly.b.edge_for_byte(byte)) {
                    (Some(ea), Some(eb)) => {
                        let shared = find_prefix_overlap(&ea.key, &eb.key);
                        debug_assert!(shared > 0);
                        let (sub_a, sub_b) = (below(ea, shared), below(eb, shared));
                        match self.settle(&sub_a, &sub_b) {
                            Some(result) => EdgeResult::below_prefix(&ea.key[..shared], result),
                            None => {
                                descend = Some((byte, EdgeKey::from_slice(&ea.key[..shared]), sub_a, sub_b));
                                break;
                            },
                        }
                    },
                    (Some(_), None) => EdgeResult::Identity(SELF_IDENT),
                    (None, Some(_)) => EdgeResult::Identity(COUNTER_IDENT),
                    (None, None) => unreachable!(),
                };
                frame.0.push(byte, result);
            }

            match descend {
                Some((byte, prefix, sub_a, sub_b)) => {
                    let child = self.assemble(sub_a, sub_b);
                    parents.push((core::mem::replace(&mut frame, child), byte, prefix));
                },
                None => {
                    let (assembly, _) = frame;
                    let result = assembly.finish();
                    match parents.pop() {
                        Some((mut parent, byte, prefix)) => {
                            parent.0.push(byte, EdgeResult::below_prefix(&prefix, result));
                            frame = parent;
                        },
                        None => return result,
                    }
                },
            }
        }
    }
}

/// Union
pub(crate) fn pjoin(a: &TrieNodeODRc, b: &TrieNodeODRc) -> AlgebraicResult<TrieNodeODRc> {
    BinaryOp::Join.apply(a, b)
}

/// Intersection.  Only edges present in both operands are visited, so divergent branches are pruned
/// without being descended
pub(crate) fn pmeet(a: &TrieNodeODRc, b: &TrieNodeODRc) -> AlgebraicResult<TrieNodeODRc> {
    BinaryOp::Meet.apply(a, b)
}

/// Subtraction, `a` minus `b`
pub(crate) fn psubtract(a: &TrieNodeODRc, b: &TrieNodeODRc) -> AlgebraicResult<TrieNodeODRc> {
    BinaryOp::Subtract.apply(a, b)
}

/// Restriction: the members of `a` that have a prefix which is a member of `b`
///
/// The whole remaining subtrie of `a` is kept as soon as a terminal of `b` is reached.
pub(crate) fn prestrict(a: &TrieNodeODRc, b: &TrieNodeODRc) -> AlgebraicResult<TrieNodeODRc> {
    BinaryOp::Restrict.apply(a, b)
}

/// Unions two subtries into a node, falling back to the empty node
pub(crate) fn join_nodes(a: &TrieNodeODRc, b: &TrieNodeODRc) -> TrieNodeODRc {
    pjoin(a, b)
        .map_into_option(|idx| Some(if idx == 0 { a.clone() } else { b.clone() }))
        .unwrap_or_else(TrieNode::empty)
}

/// Unions any number of subtries, pairing them up so the work stays balanced
pub(crate) fn join_all_nodes(mut nodes: Vec<TrieNodeODRc>) -> TrieNodeODRc {
    while nodes.len() > 1 {
        nodes = nodes.chunks(2).map(|pair| match pair {
            [a, b] => join_nodes(a, b),
            [a] => a.clone(),
            _ => unreachable!(),
        }).collect();
    }
    nodes.pop().unwrap_or_else(TrieNode::empty)
}

/// Drops the first `k` bytes of every member, discarding members shorter than `k`
pub(crate) fn decapitate(node: &TrieNodeODRc, k: usize) -> TrieNodeODRc {
    let mut subtries = Vec::new();
    let mut pending = vec![(node, k)];
    while let Some((node, k)) = pending.pop() {
        if k == 0 {
            if !node.is_empty() {
                subtries.push(node.clone());
            }
            continue;
        }
        for edge in node.edges() {
            if edge.key.len() <= k {
                pending.push((&edge.child, k - edge.key.len()));
            } else {
                subtries.push(TrieNode::stem(&edge.key[k..], edge.child.clone()));
            }
        }
    }
    join_all_nodes(subtries)
}

/// A node whose edges are being rebuilt, with the index of the next edge to visit
struct RebuildFrame {
    node: TrieNodeODRc,
    next: usize,
    edges: EdgeVec,
}

impl RebuildFrame {
    fn new(node: TrieNodeODRc) -> Self {
        let edges = EdgeVec::with_capacity(node.child_count());
        Self { node, next: 0, edges }
    }
}

/// Truncates every member to at most `k` bytes
pub(crate) fn phead(node: &TrieNodeODRc, k: usize) -> AlgebraicResult<TrieNodeODRc> {
    if node.is_empty() {
        return AlgebraicResult::None;
    }
    if k == 0 {
        return if node.child_count() == 0 { AlgebraicResult::Identity(SELF_IDENT) } else { AlgebraicResult::Element(TrieNode::leaf()) };
    }

    //Frames carry the remaining length, which is always positive, and whether anything was cut yet
    let mut frame = (RebuildFrame::new(node.clone()), k, true);
    let mut parents = Vec::new();
    loop {
        let (rebuild, k, unchanged) = &mut frame;
        let mut descend = None;
        while let Some(edge) = rebuild.node.edges().get(rebuild.next) {
            rebuild.next += 1;
            let len = edge.key.len();
            if len > *k || (len == *k && edge.child.child_count() != 0) {
                *unchanged = false;
                rebuild.edges.push(Edge::new(&edge.key[..*k], TrieNode::leaf()));
            } else if len == *k {
                rebuild.edges.push(edge.clone());
            } else {
                descend = Some((edge.child.clone(), *k - len));
                break;
            }
        }

        if let Some((child, remaining)) = descend {
            parents.push(core::mem::replace(&mut frame, (RebuildFrame::new(child), remaining, true)));
            continue;
        }
        let (rebuild, _, unchanged) = frame;
        let result = if unchanged {
            AlgebraicResult::Identity(SELF_IDENT)
        } else {
            AlgebraicResult::Element(TrieNode::new(rebuild.node.is_terminal(), rebuild.edges))
        };
        let Some(mut parent) = parents.pop() else {
            return result;
        };
        let edge = &parent.0.node.edges()[parent.0.next - 1];
        match result {
            AlgebraicResult::Element(child) => {
                parent.2 = false;
                parent.0.edges.extend(make_edge(&edge.key, child));
            },
            _ => parent.0.edges.push(edge.clone()),
        }
        frame = parent;
    }
}

/// Concatenates every member of `y` onto every member of `x`
///
/// `y` is grafted by reference at each terminal of `x`; it is only rebuilt where it overlaps with
/// paths that continue past that terminal.
pub(crate) fn product(x: &TrieNodeODRc, y: &TrieNodeODRc) -> AlgebraicResult<TrieNodeODRc> {
    if x.is_empty() || y.is_empty() {
        return AlgebraicResult::None;
    }
    //y = {""} is the unit of the product
    if y.is_terminal() && y.child_count() == 0 {
        return AlgebraicResult::Identity(SELF_IDENT);
    }
    if x.is_terminal() && x.child_count() == 0 {
        return AlgebraicResult::Identity(COUNTER_IDENT);
    }

    let mut frame = RebuildFrame::new(x.clone());
    let mut parents = Vec::new();
    loop {
        if let Some(edge) = frame.node.edges().get(frame.next) {
            let child = edge.child.clone();
            frame.next += 1;
            parents.push(core::mem::replace(&mut frame, RebuildFrame::new(child)));
            continue;
        }
        let continued = TrieNode::new(false, frame.edges);
        let grafted = if frame.node.is_terminal() { join_nodes(&continued, y) } else { continued };
        let Some(mut parent) = parents.pop() else {
            return AlgebraicResult::Element(grafted);
        };
        let key = &parent.node.edges()[parent.next - 1].key;
        parent.edges.extend(make_edge(key, grafted));
        frame = parent;
    }
}

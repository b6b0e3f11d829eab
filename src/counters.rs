use std::collections::HashSet;

use crate::trie_node::{shared_node_id, TrieNode};
use crate::trie_set::PathTrieSet;

/// Occupancy statistics for the node graph behind a set
///
/// Nodes are counted once per place they appear in the trie, so a subtrie shared between branches is
/// counted each time.  [distinct_nodes](Self::distinct_nodes) counts each allocation once.
///
/// ```
/// # use pathset::{PathTrieSet, counters::Counters};
/// let set = PathTrieSet::from_paths(["romane", "romanus", "romulus"]);
/// let counters = Counters::count_occupancy(&set);
/// assert_eq!(counters.total_nodes(), 6);
/// println!("{counters}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Counters {
    total_nodes_by_depth: Vec<usize>,
    total_child_items_by_depth: Vec<usize>,
    max_child_items_by_depth: Vec<usize>,
    terminal_nodes_by_depth: Vec<usize>,

    /// Counts the edges of each key length.  [edge_len] = count
    edge_length_histogram: Vec<usize>,
    distinct_nodes: usize,
}

impl Counters {
    pub const fn new() -> Self {
        Self {
            total_nodes_by_depth: vec![],
            total_child_items_by_depth: vec![],
            max_child_items_by_depth: vec![],
            terminal_nodes_by_depth: vec![],
            edge_length_histogram: vec![],
            distinct_nodes: 0,
        }
    }
    pub fn total_nodes(&self) -> usize {
        self.total_nodes_by_depth.iter().sum()
    }
    pub fn total_child_items(&self) -> usize {
        self.total_child_items_by_depth.iter().sum()
    }
    pub fn total_terminal_nodes(&self) -> usize {
        self.terminal_nodes_by_depth.iter().sum()
    }
    /// Number of distinct node allocations reachable from the root
    pub fn distinct_nodes(&self) -> usize {
        self.distinct_nodes
    }
    /// Depth, in nodes, of the deepest node below the root
    pub fn max_depth(&self) -> usize {
        self.total_nodes_by_depth.len().saturating_sub(1)
    }
    pub fn edge_length_histogram(&self) -> &[usize] {
        &self.edge_length_histogram
    }
    pub fn count_occupancy(set: &PathTrieSet) -> Self {
        let mut counters = Counters::new();
        let mut seen = HashSet::new();
        let mut pending = vec![(set.root(), 0)];
        while let Some((node, depth)) = pending.pop() {
            seen.insert(shared_node_id(node));
            counters.increment_common_counters(node, depth);
            for edge in node.edges() {
                let len = edge.key.len();
                if counters.edge_length_histogram.len() <= len {
                    counters.edge_length_histogram.resize(len+1, 0);
                }
                counters.edge_length_histogram[len] += 1;
                pending.push((&edge.child, depth+1));
            }
        }
        counters.distinct_nodes = seen.len();
        counters
    }
    fn resize_all_histograms(&mut self, depth: usize) {
        if self.total_nodes_by_depth.len() <= depth {
            self.total_nodes_by_depth.resize(depth+1, 0);
            self.total_child_items_by_depth.resize(depth+1, 0);
            self.max_child_items_by_depth.resize(depth+1, 0);
            self.terminal_nodes_by_depth.resize(depth+1, 0);
        }
    }
    fn increment_common_counters(&mut self, node: &TrieNode, depth: usize) {
        self.resize_all_histograms(depth);
        let child_item_count = node.child_count();
        self.total_nodes_by_depth[depth] += 1;
        self.total_child_items_by_depth[depth] += child_item_count;
        if self.max_child_items_by_depth[depth] < child_item_count {
            self.max_child_items_by_depth[depth] = child_item_count;
        }
        if node.is_terminal() {
            self.terminal_nodes_by_depth[depth] += 1;
        }
    }
}

impl std::fmt::Display for Counters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\ttotal_nodes\ttot_child_cnt\tavg_branch\tmax_child_items\tterminals")?;
        for depth in 0..self.total_nodes_by_depth.len() {
            writeln!(f, "{depth}\t{}\t\t{}\t\t{:1.4}\t\t{}\t\t{}",
                self.total_nodes_by_depth[depth],
                self.total_child_items_by_depth[depth],
                self.total_child_items_by_depth[depth] as f32 / self.total_nodes_by_depth[depth] as f32,
                self.max_child_items_by_depth[depth],
                self.terminal_nodes_by_depth[depth],
            )?;
        }
        writeln!(f, "TOTAL nodes: {}, distinct: {}, items: {}, avg children-per-node: {}",
            self.total_nodes(), self.distinct_nodes, self.total_child_items(), self.total_child_items() as f32 / self.total_nodes() as f32)?;
        writeln!(f, "edge_len\tedge_cnt")?;
        for (len, cnt) in self.edge_length_histogram.iter().enumerate().filter(|(_, cnt)| **cnt > 0) {
            writeln!(f, "{len}\t\t{cnt}")?;
        }
        Ok(())
    }
}

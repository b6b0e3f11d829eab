//! Renderings of a [PathTrieSet] for inspection: byte-level JSON views, and a [mermaid](https://mermaid.js.org)
//! flowchart of the compressed node graph that shows which nodes are shared between sets

use std::collections::HashMap;
use std::fmt::Write;

use serde_json::{json, Map, Value};
use smallvec::{SmallVec, ToSmallVec};

use crate::trie_node::{shared_node_id, TrieNode, TrieNodeODRc};
use crate::trie_set::PathTrieSet;

/// Returns the set as nested JSON objects, one level per path byte
///
/// Keys are the decimal values of the bytes, and a byte that ends the last path along a branch maps to
/// an empty object.  Whether a path that continues further is also a member is not shown.
pub fn object(set: &PathTrieSet) -> Value {
    Value::Object(object_node(set.root()))
}

fn object_node(node: &TrieNode) -> Map<String, Value> {
    let mut map = Map::new();
    for edge in node.edges() {
        map.insert(edge.key[0].to_string(), object_edge(&edge.key[1..], &edge.child));
    }
    map
}

fn object_edge(rest: &[u8], child: &TrieNode) -> Value {
    match rest.split_first() {
        Some((byte, rest)) => {
            let mut map = Map::new();
            map.insert(byte.to_string(), object_edge(rest, child));
            Value::Object(map)
        },
        None => Value::Object(object_node(child)),
    }
}

/// Returns the members of the set as a JSON array of byte arrays, in ascending order
pub fn paths(set: &PathTrieSet) -> Value {
    Value::Array(set.iter().map(|path| json!(path)).collect())
}

/// Returns the set in the shape consumed by `d3.hierarchy`: `{"name": "root", "children": [...]}`, with
/// one entry per path byte.  Entries without further bytes have no `children` field
pub fn d3_hierarchy(set: &PathTrieSet) -> Value {
    json!({ "name": "root", "children": d3_children(set.root()) })
}

fn d3_children(node: &TrieNode) -> Vec<Value> {
    node.edges().iter().map(|edge| d3_edge(&edge.key, &edge.child)).collect()
}

fn d3_edge(key: &[u8], child: &TrieNode) -> Value {
    let name = key[0].to_string();
    if key.len() > 1 {
        json!({ "name": name, "children": [d3_edge(&key[1..], child)] })
    } else if child.child_count() > 0 {
        json!({ "name": name, "children": d3_children(child) })
    } else {
        json!({ "name": name })
    }
}

pub struct DrawConfig {
    /// Print edge labels as text where they are valid UTF-8
    pub ascii: bool,
    /// Omit the small nodes that only mark the end of a path
    pub hide_leaves: bool,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self { ascii: true, hide_leaves: false }
    }
}

struct NodeMeta {
    shared: u64
}

enum DrawCmd {
    Node(usize, bool),
    Edge(usize, usize, SmallVec<[u8; 8]>),
}

struct DrawState {
    root: usize,
    nodes: HashMap<usize, NodeMeta>,
    cmds: Vec<DrawCmd>
}

/// Renders the node graphs of up to 64 sets into one mermaid flowchart
///
/// Each node is drawn once, however many sets or parents reference it.  Nodes reachable from more than
/// one of the sets are coloured by the combination of sets that share them.
pub fn viz_sets(sets: &[PathTrieSet], dc: &DrawConfig) -> String {
    let mut out = String::from("flowchart LR\n");

    let mut ds = DrawState{ root: 0, nodes: HashMap::new(), cmds: vec![] };
    for set in sets.iter().take(64) {
        let address = shared_node_id(set.root());
        writeln!(out, "r{} --> g{address}", ds.root).ok();
        visit(set.root(), dc, &mut ds);
        ds.root += 1;
    }

    for cmd in ds.cmds {
        match cmd {
            DrawCmd::Node(address, terminal) => {
                let label = if terminal { "T" } else { "N" };
                writeln!(out, "g{address}@{{ shape: rect, label: \"{label}\"}}").ok();
                if let Some(meta) = ds.nodes.get(&address) {
                    if meta.shared.count_ones() > 1 {
                        let color = match meta.shared & 0b111 {
                            0b011 => { "#0aa" }
                            0b101 => { "#a0a" }
                            0b110 => { "#aa0" }
                            0b111 => { "gray" }
                            _ => { "orange" }
                        };
                        writeln!(out, "style g{address} fill:{color}").ok();
                    }
                }
            }
            DrawCmd::Edge(src, dst, key_bytes) => {
                let debug_jump = format!("{:?}", &key_bytes[..]);
                let jump = if dc.ascii { std::str::from_utf8(&key_bytes[..]).unwrap_or(debug_jump.as_str()) }
                else { debug_jump.as_str() };

                writeln!(out, "g{src} --{jump:?}--> g{dst}").ok();
            }
        }
    }
    out
}

fn visit(n: &TrieNodeODRc, dc: &DrawConfig, ds: &mut DrawState) {
    let address = shared_node_id(n);
    match ds.nodes.get_mut(&address) {
        Some(meta) => {
            //Already drawn, but remember that this set reaches it too
            if meta.shared & (1 << ds.root) == 0 {
                meta.shared |= 1 << ds.root;
                for edge in n.edges() {
                    if !(dc.hide_leaves && edge.child.child_count() == 0) {
                        visit(&edge.child, dc, ds);
                    }
                }
            }
            return;
        }
        None => { ds.nodes.insert(address, NodeMeta{ shared: 1 << ds.root }); }
    }
    ds.cmds.push(DrawCmd::Node(address, n.is_terminal()));

    for edge in n.edges() {
        if dc.hide_leaves && edge.child.child_count() == 0 {
            continue;
        }
        ds.cmds.push(DrawCmd::Edge(address, shared_node_id(&edge.child), edge.key.to_smallvec()));
        visit(&edge.child, dc, ds);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn object_view() {
        let set = PathTrieSet::from_paths([[1u8, 2], [1, 3], [4, 5]]);
        assert_eq!(object(&set), json!({ "1": { "2": {}, "3": {} }, "4": { "5": {} } }));
        assert_eq!(object(&PathTrieSet::new()), json!({}));
    }

    #[test]
    fn paths_view() {
        let set = PathTrieSet::from_paths(["b", "ab", ""]);
        assert_eq!(paths(&set), json!([[], [97, 98], [98]]));
    }

    #[test]
    fn d3_view() {
        let set = PathTrieSet::from_paths([vec![1u8, 2], vec![1, 3], vec![4]]);
        let expected = json!({
            "name": "root",
            "children": [
                { "name": "1", "children": [{ "name": "2" }, { "name": "3" }] },
                { "name": "4" }
            ]
        });
        assert_eq!(d3_hierarchy(&set), expected);
    }

    #[test]
    fn small_viz() {
        let rs = ["arrow", "bow", "cannon", "roman", "romane", "romanus", "romulus", "rubens", "ruber", "rubicon", "rubicundus", "rom'i"];
        let set = PathTrieSet::from_paths(rs);

        let chart = viz_sets(&[set], &DrawConfig::default());
        assert!(chart.starts_with("flowchart LR\n"));
        assert!(chart.contains("--\"rom\"-->") || chart.contains("--\"om\"-->"));
        assert!(!chart.contains("style"));
    }

    #[test]
    fn joined_viz() {
        let rs = ["Abbotsford", "Abbottabad", "Abcoude", "Abdul Hakim", "Abdulino", "Abdullahnagar", "Abdurahmoni Jomi", "Abejorral", "Abelardo Luz"];
        let a: PathTrieSet = rs.iter().step_by(2).collect();
        let b: PathTrieSet = rs.iter().skip(1).step_by(2).collect();
        let joined = a.union(&b);

        let chart = viz_sets(&[a, b, joined], &DrawConfig{ ascii: true, hide_leaves: false });
        //The union reuses subtries from both operands
        assert!(chart.contains("fill:#0aa") || chart.contains("fill:#a0a") || chart.contains("fill:#aa0") || chart.contains("fill:gray"));
    }
}

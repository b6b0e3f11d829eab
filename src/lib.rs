//! Persistent sets of byte paths, stored as compressed tries that share structure between sets
//!
//! A [PathTrieSet] never changes once built.  Set algebra ([union](PathTrieSet::union),
//! [intersection](PathTrieSet::intersection), [restriction](PathTrieSet::restriction), etc.) builds new
//! sets that reuse every subtrie an operand contributes unchanged, and a [ReadZipper] walks a set
//! byte by byte.
//!
//! ```
//! use pathset::{PathTrieSet, Zipper};
//!
//! let s = PathTrieSet::from_paths([[1u8, 2, 3], [1, 2, 4], [1, 5, 0]]);
//! let mut rz = s.read_zipper();
//! assert!(rz.descend_to([1]));
//! assert_eq!(rz.children(), vec![2, 5]);
//!
//! let tails = s.decapitation(1);
//! assert_eq!(tails, PathTrieSet::from_paths([[2u8, 3], [2, 4], [5, 0]]));
//! ```

pub mod ring;
pub mod utils;
pub mod error;
pub mod config;
pub mod trie_set;
pub mod zipper;
pub mod serialization;
pub mod path_serialization;
pub mod transform;
pub mod viz;
pub mod counters;
pub mod merkleization;
pub mod bytize;

mod trie_node;
mod algebra;
mod range_generator;

pub use trie_set::PathTrieSet;
pub use zipper::{ReadZipper, ReadZipperPathIter, Zipper};
pub use config::Config;
pub use merkleization::{Merkleizer, MerkleizeResult};
pub use error::{Error, Result};

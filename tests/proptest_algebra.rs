//! Property-based tests for the set algebra, the encodings and the cursor.
//!
//! Every operation is checked against a `BTreeSet<Vec<u8>>` model.  Paths are drawn from a small
//! alphabet so that the generated sets overlap and share prefixes often.
//!
//! Run with: `cargo test --test proptest_algebra`

use std::collections::BTreeSet;

use proptest::prelude::*;

use pathset::serialization::{deserialize, serialize};
use pathset::{PathTrieSet, Zipper};

type Model = BTreeSet<Vec<u8>>;

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Generate a short path over a 4-byte alphabet
fn path_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..4, 0..7)
}

fn model_strategy() -> impl Strategy<Value = Model> {
    prop::collection::btree_set(path_strategy(), 0..24)
}

fn set_of(model: &Model) -> PathTrieSet {
    PathTrieSet::from_paths(model)
}

fn model_of(set: &PathTrieSet) -> Model {
    set.iter().collect()
}

fn has_prefix_in(p: &[u8], stems: &Model) -> bool {
    stems.iter().any(|s| p.starts_with(s))
}

// =============================================================================
// Membership laws
// =============================================================================

proptest! {
    #[test]
    fn prop_construction_matches_model(m in model_strategy()) {
        let set = set_of(&m);
        prop_assert_eq!(set.val_count(), m.len());
        prop_assert_eq!(set.is_empty(), m.is_empty());
        prop_assert_eq!(set.paths(), m.iter().cloned().collect::<Vec<_>>());
        for p in &m {
            prop_assert!(set.contains(p));
            for len in 0..=p.len() {
                prop_assert!(set.contains_path(&p[..len]));
            }
        }
    }

    #[test]
    fn prop_union_intersection_subtraction(a in model_strategy(), b in model_strategy()) {
        let (x, y) = (set_of(&a), set_of(&b));
        prop_assert_eq!(model_of(&x.union(&y)), a.union(&b).cloned().collect::<Model>());
        prop_assert_eq!(model_of(&x.intersection(&y)), a.intersection(&b).cloned().collect::<Model>());
        prop_assert_eq!(model_of(&x.subtraction(&y)), a.difference(&b).cloned().collect::<Model>());
    }

    #[test]
    fn prop_restriction_and_raffination(a in model_strategy(), b in model_strategy()) {
        let (x, y) = (set_of(&a), set_of(&b));
        let restricted: Model = a.iter().filter(|p| has_prefix_in(p, &b)).cloned().collect();
        prop_assert_eq!(model_of(&x.restriction(&y)), restricted);
        prop_assert_eq!(x.raffination(&y), y.restriction(&x));
    }

    #[test]
    fn prop_head_and_decapitation(a in model_strategy(), k in 0usize..8) {
        let x = set_of(&a);
        let heads: Model = a.iter().map(|p| p[..k.min(p.len())].to_vec()).collect();
        prop_assert_eq!(model_of(&x.head(k)), heads);
        let tails: Model = a.iter().filter(|p| p.len() >= k).map(|p| p[k..].to_vec()).collect();
        prop_assert_eq!(model_of(&x.decapitation(k)), tails);
    }

    #[test]
    fn prop_product_and_wrap(a in model_strategy(), b in model_strategy(), prefix in path_strategy()) {
        let (x, y) = (set_of(&a), set_of(&b));
        let concatenated: Model = a.iter().flat_map(|p| b.iter().map(move |q| [&p[..], &q[..]].concat())).collect();
        prop_assert_eq!(model_of(&x.product(&y)), concatenated);
        let wrapped: Model = a.iter().map(|p| [&prefix[..], &p[..]].concat()).collect();
        prop_assert_eq!(model_of(&x.wrap(&prefix)), wrapped);
    }

    #[test]
    fn prop_results_are_canonical(a in model_strategy(), b in model_strategy()) {
        //A set built by algebra must be structurally identical to the same set built directly
        let (x, y) = (set_of(&a), set_of(&b));
        for result in [x.union(&y), x.intersection(&y), x.subtraction(&y), x.restriction(&y), x.product(&y), x.decapitation(1), x.head(2)] {
            let rebuilt = PathTrieSet::from_paths(result.paths());
            prop_assert_eq!(serialize(&result), serialize(&rebuilt));
        }
    }
}

// =============================================================================
// Encoding tests
// =============================================================================

proptest! {
    #[test]
    fn prop_tree_encoding_round_trip(m in model_strategy()) {
        let set = set_of(&m);
        let bytes = serialize(&set);
        let restored = deserialize(&bytes).unwrap();
        prop_assert_eq!(&restored, &set);
        prop_assert_eq!(serialize(&restored), bytes);
    }

    #[test]
    fn prop_insertion_order_does_not_matter(m in model_strategy()) {
        let forward = m.iter().fold(PathTrieSet::new(), |set, p| set.insert(p));
        let backward = m.iter().rev().fold(PathTrieSet::new(), |set, p| set.insert(p));
        prop_assert_eq!(serialize(&forward), serialize(&backward));
        prop_assert_eq!(serialize(&forward), serialize(&set_of(&m)));
    }

    /// Decoding arbitrary bytes should never panic, and anything accepted must be canonical
    #[test]
    fn fuzz_decode_random_bytes(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        if let Ok(set) = deserialize(&bytes) {
            prop_assert_eq!(serialize(&set), bytes);
        }
    }
}

// =============================================================================
// Cursor tests
// =============================================================================

proptest! {
    #[test]
    fn prop_to_next_val_visits_members_in_order(m in model_strategy()) {
        let set = set_of(&m);
        let mut rz = set.read_zipper();
        let mut seen = vec![];
        while rz.to_next_val() {
            prop_assert!(rz.is_value());
            seen.push(rz.path().to_vec());
        }
        prop_assert!(rz.at_root());
        //The walk starts at the root, so it never lands on the empty path
        prop_assert_eq!(seen, m.iter().filter(|p| !p.is_empty()).cloned().collect::<Vec<_>>());
        prop_assert_eq!(set.iter().collect::<Vec<_>>(), m.iter().cloned().collect::<Vec<_>>());
    }

    #[test]
    fn prop_failed_moves_are_atomic(m in model_strategy(), start in path_strategy(), probe in path_strategy()) {
        let set = set_of(&m);
        let mut rz = set.read_zipper();
        let start_ok = rz.descend_to(&start);
        prop_assert_eq!(start_ok, start.is_empty() || set.contains_path(&start));
        let here = rz.path().to_vec();

        let full = [&here[..], &probe[..]].concat();
        if rz.descend_to(&probe) {
            prop_assert_eq!(rz.path(), &full[..]);
            prop_assert!(rz.ascend(probe.len()));
        } else {
            prop_assert!(!set.contains_path(&full));
        }
        prop_assert_eq!(rz.path(), &here[..]);

        prop_assert!(!rz.ascend(here.len() + 1));
        prop_assert_eq!(rz.path(), &here[..]);
    }

    #[test]
    fn prop_children_match_model(m in model_strategy(), start in path_strategy()) {
        let set = set_of(&m);
        let mut rz = set.read_zipper();
        if rz.descend_to(&start) {
            let expected: BTreeSet<u8> = m.iter()
                .filter(|p| p.len() > start.len() && p.starts_with(&start))
                .map(|p| p[start.len()])
                .collect();
            prop_assert_eq!(rz.children(), expected.into_iter().collect::<Vec<_>>());
            prop_assert_eq!(rz.is_value(), m.contains(&start));
            prop_assert_eq!(rz.val_count(), m.iter().filter(|p| p.starts_with(&start)).count());
        }
    }
}

// =============================================================================
// Range and sharing tests
// =============================================================================

proptest! {
    #[test]
    fn prop_unsigned_ranges_match_model(start in any::<u16>(), len in 0u16..3000, step in 1u16..700) {
        let stop = start.saturating_add(len);
        let expected: Model = (start..stop).step_by(step as usize).map(|n| n.to_be_bytes().to_vec()).collect();
        let set = PathTrieSet::range::<true, u16>(start, stop, step).unwrap();
        prop_assert_eq!(model_of(&set), expected.clone());
        prop_assert_eq!(serialize(&set), serialize(&set_of(&expected)));
    }

    #[test]
    fn prop_signed_ranges_match_model(start in -1500i16..1500, len in 0i16..3000, step in 1i16..700) {
        let stop = start + len;
        let expected: Model = (start..stop).step_by(step as usize).map(|n| n.to_be_bytes().to_vec()).collect();
        let set = PathTrieSet::range::<true, i16>(start, stop, step).unwrap();
        prop_assert_eq!(model_of(&set), expected.clone());
        prop_assert_eq!(serialize(&set), serialize(&set_of(&expected)));
    }

    #[test]
    fn prop_merkleize_preserves_set(m in model_strategy()) {
        let set = set_of(&m);
        let (shared, result) = set.merkleize();
        prop_assert_eq!(serialize(&shared), serialize(&set));
        prop_assert_eq!(model_of(&shared), m);
        prop_assert_eq!(shared.merkleize().1.hash, result.hash);
    }
}

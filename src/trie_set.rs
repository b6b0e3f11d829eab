use tracing::trace;

use crate::algebra;
use crate::ring::{AlgebraicResult, DistributiveLattice, Lattice, Quantale};
use crate::trie_node::*;
use crate::zipper::*;

/// A persistent set of byte paths
///
/// Every operation returns a new set and leaves its operands untouched.  Results share any subtrie
/// that survives an operation unchanged with the operand it came from, so cloning a set and deriving
/// new sets from it are cheap.  Sets are `Send + Sync` and can be read from any number of threads.
///
/// ```
/// # use pathset::PathTrieSet;
/// let set = PathTrieSet::from_paths(["one", "two"]);
/// assert!(set.contains("one"));
/// assert!(!set.contains("three"));
/// assert!(set.contains_path("tw"));
///
/// let more = set.union(&PathTrieSet::singleton("three"));
/// assert_eq!(more.val_count(), 3);
/// assert_eq!(set.val_count(), 2);
/// ```
#[derive(Clone)]
pub struct PathTrieSet {
    root: TrieNodeODRc,
}

impl PathTrieSet {
    /// Creates a new empty set
    pub fn new() -> Self {
        Self::new_with_root(TrieNode::empty())
    }

    /// Alias for [Self::new]
    #[inline]
    pub fn empty() -> Self {
        Self::new()
    }

    /// Internal Method.  Creates a new set with the supplied root node
    #[inline]
    pub(crate) fn new_with_root(root: TrieNodeODRc) -> Self {
        Self { root }
    }

    #[inline]
    pub(crate) fn root(&self) -> &TrieNodeODRc {
        &self.root
    }

    /// Creates a set containing exactly one path
    pub fn singleton<K: AsRef<[u8]>>(k: K) -> Self {
        let k = k.as_ref();
        if k.is_empty() {
            Self::new_with_root(TrieNode::leaf())
        } else {
            Self::new_with_root(TrieNode::stem(k, TrieNode::leaf()))
        }
    }

    /// Creates a set from any collection of paths.  Duplicates are ignored
    pub fn from_paths<I, K>(paths: I) -> Self
        where I: IntoIterator<Item=K>, K: AsRef<[u8]>
    {
        let mut paths: Vec<K> = paths.into_iter().collect();
        paths.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        paths.dedup_by(|a, b| a.as_ref() == b.as_ref());
        Self::new_with_root(build_sorted(&paths, 0))
    }

    /// Creates a new [ReadZipper] starting at the root of the set
    pub fn read_zipper(&self) -> ReadZipper {
        ReadZipper::new_with_root(self.root.clone())
    }

    /// Creates a new [ReadZipper] focused on `path`, or returns `None` if `path` does not exist in the set
    pub fn read_zipper_at_path<K: AsRef<[u8]>>(&self, path: K) -> Option<ReadZipper> {
        let mut zipper = self.read_zipper();
        if zipper.descend_to(path) {
            Some(zipper)
        } else {
            None
        }
    }

    /// Returns an iterator over every path in the set, in ascending lexicographic order
    ///
    /// NOTE: This allocates a new `Vec` for each path.  Walking a [ReadZipper] directly avoids that
    pub fn iter(&self) -> ReadZipperPathIter {
        self.read_zipper().into_path_iter()
    }

    /// Returns every path in the set, in ascending lexicographic order
    pub fn paths(&self) -> Vec<Vec<u8>> {
        let mut out = Vec::with_capacity(self.val_count());
        collect_paths(&self.root, &mut Vec::new(), &mut out);
        out
    }

    /// Returns `true` if `k` is a member of the set
    pub fn contains<K: AsRef<[u8]>>(&self, k: K) -> bool {
        self.root.contains(k.as_ref())
    }

    /// Returns `true` if `k` is a prefix of some member of the set, including a member itself
    pub fn contains_path<K: AsRef<[u8]>>(&self, k: K) -> bool {
        self.root.contains_path(k.as_ref())
    }

    /// Returns `true` if the set contains no paths
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Returns the number of paths in the set.  This is a constant-time operation
    pub fn val_count(&self) -> usize {
        self.root.val_count()
    }

    /// Returns `true` if both sets are backed by the same allocation, which implies they are equal
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::sync::Arc::ptr_eq(&self.root, &other.root)
    }

    /// Returns a new set with `k` added
    pub fn insert<K: AsRef<[u8]>>(&self, k: K) -> Self {
        self.union(&Self::singleton(k))
    }

    /// Returns a new set with `k` removed
    pub fn remove<K: AsRef<[u8]>>(&self, k: K) -> Self {
        self.subtraction(&Self::singleton(k))
    }

    /// Builds a set from a result that may be an identity of `self` or `other`
    fn from_result(&self, other: &Self, result: AlgebraicResult<TrieNodeODRc>) -> Self {
        match result.map_into_option(|idx| Some(if idx == 0 { self.root.clone() } else { other.root.clone() })) {
            Some(root) => Self::new_with_root(root),
            None => Self::new(),
        }
    }

    /// Returns the paths in either `self` or `other`
    pub fn union(&self, other: &Self) -> Self {
        trace!(left = self.val_count(), right = other.val_count(), "union");
        self.from_result(other, algebra::pjoin(&self.root, &other.root))
    }

    /// Returns the paths in both `self` and `other`
    pub fn intersection(&self, other: &Self) -> Self {
        trace!(left = self.val_count(), right = other.val_count(), "intersection");
        self.from_result(other, algebra::pmeet(&self.root, &other.root))
    }

    /// Returns the paths in `self` that are not in `other`
    pub fn subtraction(&self, other: &Self) -> Self {
        trace!(left = self.val_count(), right = other.val_count(), "subtraction");
        self.from_result(other, algebra::psubtract(&self.root, &other.root))
    }

    /// Returns the paths in `self` that have some member of `other` as a prefix.  A path counts as a
    /// prefix of itself
    ///
    /// ```
    /// # use pathset::PathTrieSet;
    /// let fruit = PathTrieSet::from_paths(["apple", "apricot", "banana"]);
    /// let stems = PathTrieSet::from_paths(["ap"]);
    /// assert_eq!(fruit.restriction(&stems), PathTrieSet::from_paths(["apple", "apricot"]));
    /// ```
    pub fn restriction(&self, other: &Self) -> Self {
        trace!(left = self.val_count(), right = other.val_count(), "restriction");
        self.from_result(other, algebra::prestrict(&self.root, &other.root))
    }

    /// The mirror of [Self::restriction]: returns the paths in `other` that have some member of `self`
    /// as a prefix
    pub fn raffination(&self, other: &Self) -> Self {
        trace!(left = self.val_count(), right = other.val_count(), "raffination");
        self.from_result(other, algebra::prestrict(&other.root, &self.root).invert_identity())
    }

    /// Removes the first `k` bytes from every path.  Paths shorter than `k` are dropped, and paths that
    /// collapse onto the same suffix are merged
    pub fn decapitation(&self, k: usize) -> Self {
        trace!(paths = self.val_count(), k, "decapitation");
        Self::new_with_root(algebra::decapitate(&self.root, k))
    }

    /// Truncates every path to at most its first `k` bytes
    pub fn head(&self, k: usize) -> Self {
        trace!(paths = self.val_count(), k, "head");
        self.from_result(self, algebra::phead(&self.root, k))
    }

    /// Returns every concatenation of a path in `self` followed by a path in `other`
    pub fn product(&self, other: &Self) -> Self {
        trace!(left = self.val_count(), right = other.val_count(), "product");
        self.from_result(other, algebra::product(&self.root, &other.root))
    }

    /// Prepends `prefix` to every path
    pub fn wrap<K: AsRef<[u8]>>(&self, prefix: K) -> Self {
        Self::new_with_root(TrieNode::stem(prefix.as_ref(), self.root.clone()))
    }
}

impl Default for PathTrieSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PathTrieSet {
    fn eq(&self, other: &Self) -> bool {
        node_eq(&self.root, &other.root)
    }
}

impl Eq for PathTrieSet {}

impl core::fmt::Debug for PathTrieSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: AsRef<[u8]>> FromIterator<K> for PathTrieSet {
    fn from_iter<I: IntoIterator<Item=K>>(iter: I) -> Self {
        Self::from_paths(iter)
    }
}

impl<'a> IntoIterator for &'a PathTrieSet {
    type Item = Vec<u8>;
    type IntoIter = ReadZipperPathIter;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Lattice for PathTrieSet {
    fn join(&self, other: &Self) -> Self {
        self.union(other)
    }

    fn meet(&self, other: &Self) -> Self {
        self.intersection(other)
    }

    fn bottom() -> Self {
        PathTrieSet::new()
    }

    fn join_all(xs: &[&Self]) -> Self {
        let roots = xs.iter().map(|x| x.root.clone()).collect();
        Self::new_with_root(algebra::join_all_nodes(roots))
    }
}

impl DistributiveLattice for PathTrieSet {
    fn subtract(&self, other: &Self) -> Self {
        self.subtraction(other)
    }
}

impl Quantale for PathTrieSet {
    fn restrict(&self, other: &Self) -> Self {
        self.restriction(other)
    }

    fn raffinate(&self, other: &Self) -> Self {
        self.raffination(other)
    }
}

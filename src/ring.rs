
/// The outcome of combining two subtries
///
/// Operations report when their output is one of their inputs unchanged, so the caller can keep the
/// input's allocation instead of building a copy.  When both `None` and `Identity` would be correct,
/// as for the meet of two empty subtries, the operation returns `None`.
///
/// The identity mask follows these rules:
/// - it is never zero, and only has bits for the operation's arguments
/// - setting both bits asserts that the two arguments hold the same paths
/// - subtraction and restriction only ever set [SELF_IDENT]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum AlgebraicResult<V> {
    /// The output is empty
    #[default]
    None,
    /// The output holds the same paths as each argument whose bit is set
    Identity(u64),
    /// A newly built output
    Element(V),
}

/// Identity bit for the left-hand argument
pub const SELF_IDENT: u64 = 0x1;

/// Identity bit for the right-hand argument
pub const COUNTER_IDENT: u64 = 0x2;

impl<V> AlgebraicResult<V> {
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, AlgebraicResult::None)
    }

    /// Swaps the [SELF_IDENT] and [COUNTER_IDENT] bits, for an operation evaluated with its arguments
    /// reversed
    #[inline]
    pub fn invert_identity(self) -> Self {
        match self {
            Self::Identity(mask) => Self::Identity(((mask & SELF_IDENT) << 1) | ((mask & COUNTER_IDENT) >> 1)),
            other => other,
        }
    }

    /// Resolves the result to a value.  For an identity, `ident_f` is given the index of the lowest
    /// argument it names, `0` for the left-hand side
    #[inline]
    pub fn map_into_option<IdentF>(self, ident_f: IdentF) -> Option<V>
        where IdentF: FnOnce(usize) -> Option<V>
    {
        match self {
            Self::Element(v) => Some(v),
            Self::None => None,
            Self::Identity(mask) => ident_f(mask.trailing_zeros() as usize),
        }
    }
}

/// Implements basic algebraic behavior (union & intersection) for a type
pub trait Lattice {
    /// Implements the union operation between two instances of a type, resulting in the creation of
    /// a third result instance
    fn join(&self, other: &Self) -> Self;

    /// Implements the intersection operation between two instances of a type
    fn meet(&self, other: &Self) -> Self;

    /// Returns the "least" value for the type in the lattice
    ///
    /// See [Boolean Algebra](https://en.wikipedia.org/wiki/Boolean_algebra_(structure)#Definition).
    fn bottom() -> Self;

    /// Joins every element of `xs` together
    fn join_all(xs: &[&Self]) -> Self where Self: Sized {
        xs.iter().rfold(Self::bottom(), |x, y| x.join(y))
    }
}

/// Implements subtract behavior for a type
pub trait DistributiveLattice {
    /// Returns the elements of `self` that are absent from `other`
    fn subtract(&self, other: &Self) -> Self;
}

/// Implements the prefix-restriction behavior for a type
///
/// Elements of `self` survive a restriction by `other` if some element of `other` is a prefix of them.
/// The operation distributes over [Lattice::join] in its first argument, but it is not commutative.
pub trait Quantale {
    /// Restricts `self` to the elements prefixed by an element of `other`
    fn restrict(&self, other: &Self) -> Self;

    /// The mirror of [Quantale::restrict]; `self` supplies the stems and `other` the elements that
    /// may extend them
    fn raffinate(&self, other: &Self) -> Self where Self: Sized {
        other.restrict(self)
    }
}

use core::fmt::Debug;
use core::ops::{Deref, DerefMut};

use fixedbitset::FixedBitSet;
use im::OrdSet;

/////////////////////////
// Traits for domains. //
/////////////////////////

/// A meet semi-lattice is a partially ordered set where the greatest lower
/// bound exists for every pair of elements. Dataflow facts flowing into a
/// node from several predecessors are combined with the meet operation.
/// Top is the greatest element, it stands for "no information yet" and is
/// the state every node starts from.
pub trait MeetSemiLattice: Eq + Clone + Debug {
    /// A type to hold some information about the lattice on the side.
    ///
    /// For some lattices, like the bit set lattice, we need to
    /// store somewhere the size of the universe. When we need
    /// no such values, set this to unit.
    type LatticeContext;

    /// The unit element of the meet operation.
    ///
    /// Required to be the largest element according to the ordering.
    fn top(ctx: &Self::LatticeContext) -> Self;

    /// Computes the greatest lower bound of two elements.
    ///
    /// Requirements:
    /// * Idempotent: a.meet(a, ctx) == a
    /// * Commutative: a.meet(b, ctx) == b.meet(a, ctx)
    /// * Associative: a.meet(b.meet(c, ctx), ctx) == a.meet(b, ctx).meet(c, ctx)
    /// * Top is unit: top.meet(b, ctx) == b
    fn meet(&self, other: &Self, ctx: &Self::LatticeContext) -> Self;

    /// The partial order induced by meet.
    fn less_or_equal(&self, other: &Self, ctx: &Self::LatticeContext) -> bool {
        self.meet(other, ctx) == *self
    }
}

pub trait MeetSemiLatticeNoContext: MeetSemiLattice {
    /// See [MeetSemiLattice::top] for details. This version does not
    /// require a context.
    fn top_() -> Self;

    /// See [MeetSemiLattice::meet] for details. This version does not
    /// require a context.
    fn meet_(&self, other: &Self) -> Self;
}

impl<L: MeetSemiLattice<LatticeContext = ()>> MeetSemiLatticeNoContext for L {
    fn top_() -> Self {
        <L as MeetSemiLattice>::top(&())
    }

    fn meet_(&self, other: &Self) -> Self {
        self.meet(other, &())
    }
}

/// Meet of an arbitrary number of elements, top for an empty sequence.
pub fn meet_all<'a, L, I>(elements: I, ctx: &L::LatticeContext) -> L
where
    L: MeetSemiLattice + 'a,
    I: IntoIterator<Item = &'a L>,
{
    elements
        .into_iter()
        .fold(L::top(ctx), |acc, element| acc.meet(element, ctx))
}

/////////////////////////////////////
// Concrete domain implementations //
/////////////////////////////////////

/// The unit lattice is useful for testing or as a placeholder
/// for analyses that only care about the traversal.
impl MeetSemiLattice for () {
    type LatticeContext = ();

    fn top(&(): &Self::LatticeContext) -> Self {}

    fn meet(&self, &(): &Self, &(): &Self::LatticeContext) -> Self {}
}

/// Bool is a lattice, where true is top and meet is and.
impl MeetSemiLattice for bool {
    type LatticeContext = ();

    fn top(_ctx: &Self::LatticeContext) -> Self {
        true
    }

    fn meet(&self, other: &Self, _ctx: &Self::LatticeContext) -> Self {
        *self && *other
    }
}

/// Sets ordered by reverse inclusion: the empty set is top and meet is
/// union. This is the domain of "may" problems, where a fact holds
/// when it holds along any of the incoming paths. Backed by a persistent
/// set, so copying the state between nodes is cheap.
#[derive(PartialEq, Eq, Clone)]
pub struct UnionSet<T: Ord + Clone>(pub OrdSet<T>);

impl<T: Ord + Clone> Deref for UnionSet<T> {
    type Target = OrdSet<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Ord + Clone> DerefMut for UnionSet<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Ord + Clone> FromIterator<T> for UnionSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Ord + Clone + Debug> Debug for UnionSet<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let elements: Vec<String> = self.iter().map(|x| format!("{x:?}")).collect();
        write!(f, "{{{}}}", elements.join(", "))
    }
}

impl<T: Ord + Clone + Debug> MeetSemiLattice for UnionSet<T> {
    type LatticeContext = ();

    fn top(_ctx: &Self::LatticeContext) -> Self {
        Self(OrdSet::new())
    }

    fn meet(&self, other: &Self, _ctx: &Self::LatticeContext) -> Self {
        Self(self.0.clone().union(other.0.clone()))
    }
}

/// A dense set of small integers ordered by inclusion: the full set is top
/// and meet is intersection. This is the domain of "must" problems like
/// dominator sets.
#[derive(PartialEq, Eq, Clone)]
pub struct BitSet(pub FixedBitSet);

impl Deref for BitSet {
    type Target = FixedBitSet;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for BitSet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// The size of the universe for [`BitSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitSetTop(pub usize);

impl BitSet {
    pub fn from(ctx: &BitSetTop, values: &[usize]) -> Self {
        let mut inner = FixedBitSet::with_capacity(ctx.0);
        for &v in values {
            inner.insert(v);
        }
        Self(inner)
    }
}

impl Debug for BitSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let elements: Vec<String> = self.ones().map(|x| x.to_string()).collect();
        write!(f, "{{{}}}", elements.join(", "))
    }
}

impl MeetSemiLattice for BitSet {
    type LatticeContext = BitSetTop;

    fn top(ctx: &Self::LatticeContext) -> Self {
        let mut result = FixedBitSet::with_capacity(ctx.0);
        result.insert_range(..);
        Self(result)
    }

    fn meet(&self, other: &Self, _ctx: &Self::LatticeContext) -> Self {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }
}

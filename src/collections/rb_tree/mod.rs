//! [`RbTree`], a red-black tree: the ordered engine behind maps, sets and their multi variants.
//!
//! Elements are stored whole (a set stores keys, a map stores pairs); a [`KeyOf`] policy picks
//! the ordering key out of each element and a [`Compare`] policy orders the keys. The same tree
//! supports unique insertion ([`RbTree::insert_unique`]) and duplicate-allowing insertion
//! ([`RbTree::insert_equal`]).
//!
//! Elements are addressed by [`Position`], a small copyable handle much like a C++ iterator.
//! [`RbTree::end`] is the position one past the last element. A position stays valid until the
//! element it refers to is erased; erasing other elements never invalidates it. Positions carry
//! the identity of their tree and a slot generation, so erased or foreign positions are detected.
//!
//! # Example
//!
//! ```
//!     use rbtree_core::collections::rb_tree::{RbTree, First};
//!     let mut capitals: RbTree<(&str, &str), First> = RbTree::default();
//!     capitals.insert_unique(("England", "London"));
//!     capitals.insert_unique(("France", "Paris"));
//!     let pos = capitals.find(&"France");
//!     assert_eq!(capitals.get(pos), Some(&("France", "Paris")));
//!     assert_eq!(capitals.find(&"Spain"), capitals.end());
//! ```
//!
//!# Features
//!
//! - `unsafe-optim` : skip internal bounds checks on node links in release builds.

use std::{
    cmp::Ordering,
    fmt,
    fmt::Debug,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    marker::PhantomData,
    mem,
};

use crate::alloc::{Allocator, Global};
use crate::collections::TryReserveError;

mod balance;
mod nodes;
mod policy;

use nodes::{NodeId, NodePool, Side, HEADER};
pub use policy::{Compare, First, Greater, Identity, KeyOf, Less};

/// StkVec is used for the clone work list, length is above the maximum tree depth.
type StkVec<T> = arrayvec::ArrayVec<T, 130>;

/// Red-black tree holding values of type `V`, ordered by the key `KO` extracts using `C`.
///
/// General guide to implementation:
///
/// Nodes live in a pool indexed by [`NodeId`]s; links are indices, not pointers. The pool's
/// index 0 is the header: its parent link is the root, its left and right links cache the
/// minimum and maximum. Storage for nodes comes from the allocator `A`, and released nodes are
/// recycled by the pool.
///
/// The structural algorithms (rotation, rebalancing, stepping) are in the `balance` module and
/// never compare keys; this module does the searching.
pub struct RbTree<V, KO = Identity, C = Less, A: Allocator = Global> {
    len: usize,
    pool: NodePool<V, A>,
    cmp: C,
    _ko: PhantomData<fn() -> KO>,
}

/// Handle to an element of an [`RbTree`], or to the end of it.
///
/// Positions do not borrow the tree. Using a position whose element has been erased, or one
/// obtained from another tree, is a logic error that is always detected: lookups through it
/// return `None`, while erasing or stepping through it panics. This holds even after the
/// element's storage has been reused for a new element.
///
/// Positions move with their elements when trees are swapped. A clone of a tree has its own
/// identity, so positions of the original are foreign to the clone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    id: NodeId,
    generation: u32,
    tree: u64,
}

impl<V> RbTree<V> {
    /// Returns a new, empty tree ordered by [`Ord`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_compare_in(Less, Global)
    }

    /// Returns a new, empty tree ordered by [`Ord`] with node storage from the specified allocator.
    ///
    /// # Example
    ///
    /// ```
    /// use rbtree_core::{ alloc::Global, collections::RbTree };
    /// let mut tree = RbTree::new_in(Global);
    /// tree.insert_equal(3);
    /// tree.insert_equal(3);
    /// assert_eq!(tree.len(), 2);
    /// ```
    #[must_use]
    pub fn new_in<AL: Allocator>(a: AL) -> RbTree<V, Identity, Less, AL> {
        RbTree::with_compare_in(Less, a)
    }
}

impl<V, KO, C> RbTree<V, KO, C, Global> {
    /// Returns a new, empty tree using the specified ordering.
    ///
    /// # Example
    ///
    /// ```
    /// use rbtree_core::collections::rb_tree::{RbTree, Identity};
    /// let mut tree: RbTree<i32, Identity, _> = RbTree::with_compare(|a: &i32, b: &i32| b < a);
    /// for x in [1, 3, 2] {
    ///     tree.insert_unique(x);
    /// }
    /// assert!(tree.iter().eq(&[3, 2, 1]));
    /// ```
    #[must_use]
    pub fn with_compare(cmp: C) -> Self {
        Self::with_compare_in(cmp, Global)
    }
}

impl<V, KO, C, A: Allocator> RbTree<V, KO, C, A> {
    /// Returns a new, empty tree with the specified ordering and allocator.
    ///
    /// No storage is allocated until the first insertion.
    #[must_use]
    pub fn with_compare_in(cmp: C, alloc: A) -> Self {
        Self {
            len: 0,
            pool: NodePool::new_in(alloc),
            cmp,
            _ko: PhantomData,
        }
    }

    /// Get number of elements in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the tree empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a reference to the allocator node storage comes from.
    pub fn allocator(&self) -> &A {
        self.pool.allocator()
    }

    /// Number of elements the tree can hold without allocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Reserve node storage for at least `additional` more elements.
    ///
    /// Afterwards the next `additional` insertions cannot fail.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.pool.try_reserve(additional)
    }

    /// Remove every element. Node storage is kept for reuse.
    pub fn clear(&mut self) {
        let released = self.pool.release_all();
        log::trace!("cleared tree, released {released} nodes");
        self.len = 0;
    }

    /// Exchange the contents of two trees. Positions move with their elements.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Position of the first element, or [`end`](Self::end) if the tree is empty.
    #[must_use]
    pub fn begin(&self) -> Position {
        self.position(self.pool.extreme(Side::Left))
    }

    /// Position one past the last element.
    #[must_use]
    pub fn end(&self) -> Position {
        self.position(HEADER)
    }

    /// Position following `pos` in order. The element after the last one is `end()`,
    /// and the one after `end()` is `begin()`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` does not refer to an element of this tree or to `end()`.
    #[must_use]
    pub fn next(&self, pos: Position) -> Position {
        let id = self.assert_valid(pos);
        self.position(self.pool.step(id, Side::Right))
    }

    /// Position preceding `pos` in order. The one before `end()` is the last element,
    /// and the one before `begin()` is `end()`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` does not refer to an element of this tree or to `end()`.
    #[must_use]
    pub fn prev(&self, pos: Position) -> Position {
        let id = self.assert_valid(pos);
        self.position(self.pool.step(id, Side::Left))
    }

    #[inline]
    fn position(&self, id: NodeId) -> Position {
        Position {
            id,
            generation: self.pool.generation(id),
            tree: self.pool.tag(),
        }
    }

    /// The node `pos` refers to, if it is a live element of this tree.
    fn live(&self, pos: Position) -> Option<NodeId> {
        (pos.tree == self.pool.tag()
            && self.pool.is_live(pos.id)
            && self.pool.generation(pos.id) == pos.generation)
            .then_some(pos.id)
    }

    /// Node of `pos`, which must be `end()` or a live element of this tree.
    fn assert_valid(&self, pos: Position) -> NodeId {
        if pos == self.end() {
            return HEADER;
        }
        match self.live(pos) {
            Some(id) => id,
            None => panic!("position does not refer to an element of this tree"),
        }
    }

    /// Get reference to the element at `pos`, `None` for `end()` or a position that does not
    /// refer to an element of this tree.
    #[must_use]
    pub fn get(&self, pos: Position) -> Option<&V> {
        self.live(pos).map(|id| self.pool.value(id))
    }

    /// Get mutable reference to the element at `pos`, `None` for `end()`.
    ///
    /// The element's key must not be changed in a way that alters its ordering.
    /// The tree remains memory safe if it is, but lookups may then miss elements.
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut V> {
        let id = self.live(pos)?;
        Some(self.pool.value_mut(id))
    }

    /// Get reference to the first element.
    #[must_use]
    pub fn first(&self) -> Option<&V> {
        self.get(self.begin())
    }

    /// Get reference to the last element.
    #[must_use]
    pub fn last(&self) -> Option<&V> {
        self.get(self.position(self.pool.extreme(Side::Right)))
    }

    /// Remove the element at `pos` and return it.
    ///
    /// Positions of other elements remain valid.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is `end()` or does not refer to a live element.
    pub fn erase(&mut self, pos: Position) -> V {
        let Some(id) = self.live(pos) else {
            panic!(
                "erase requires the position of an element of this tree, \
                 not end() or an erased position"
            );
        };
        let splice = self.pool.unlink(id);
        self.pool.erase_fixup(&splice);
        let value = self.pool.destroy(splice.removed);
        self.pool.deallocate(splice.removed);
        self.len -= 1;
        value
    }

    /// Remove the elements in `[first, last)`.
    ///
    /// `last` must be reachable from `first` by repeated [`next`](Self::next).
    pub fn erase_range(&mut self, first: Position, last: Position) {
        if first == self.begin() && last == self.end() {
            self.clear();
            return;
        }
        let mut pos = first;
        while pos != last {
            let next = self.next(pos);
            self.erase(pos);
            pos = next;
        }
    }

    /// Remove first element from tree.
    pub fn pop_first(&mut self) -> Option<V> {
        if self.is_empty() {
            None
        } else {
            Some(self.erase(self.begin()))
        }
    }

    /// Remove last element from tree.
    pub fn pop_last(&mut self) -> Option<V> {
        if self.is_empty() {
            None
        } else {
            let last = self.prev(self.end());
            Some(self.erase(last))
        }
    }

    /// Get iterator of references to the elements, in order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, V, A> {
        Iter {
            len: self.len,
            inner: Range {
                pool: &self.pool,
                front: self.pool.extreme(Side::Left),
                back: HEADER,
            },
        }
    }

    /// Get iterator over the elements in `[first, last)`.
    ///
    /// `last` must be reachable from `first` by repeated [`next`](Self::next).
    ///
    /// # Example
    ///
    /// ```
    /// use rbtree_core::collections::RbTree;
    /// let mut tree = RbTree::new();
    /// for x in [5, 1, 4, 2, 3] {
    ///     tree.insert_unique(x);
    /// }
    /// let r = tree.range(tree.lower_bound(&2), tree.upper_bound(&4));
    /// assert!(r.eq(&[2, 3, 4]));
    /// ```
    #[must_use]
    pub fn range(&self, first: Position, last: Position) -> Range<'_, V, A> {
        Range {
            pool: &self.pool,
            front: self.assert_valid(first),
            back: self.assert_valid(last),
        }
    }
}

impl<V, KO, C, A> RbTree<V, KO, C, A>
where
    KO: KeyOf<V>,
    C: Compare<KO::Key>,
    A: Allocator,
{
    #[inline]
    fn less(&self, a: &KO::Key, b: &KO::Key) -> bool {
        self.cmp.less(a, b)
    }

    #[inline]
    fn key(&self, id: NodeId) -> &KO::Key {
        KO::key_of(self.pool.value(id))
    }

    /// The null link where an element with key `k` goes, after any equivalent elements.
    fn insert_slot(&self, k: &KO::Key) -> (NodeId, Side) {
        let mut parent = HEADER;
        let mut side = Side::Left;
        let mut cur = self.pool.root();
        while let Some(n) = cur {
            parent = n;
            side = if self.less(k, self.key(n)) {
                Side::Left
            } else {
                Side::Right
            };
            cur = self.pool.child(n, side);
        }
        (parent, side)
    }

    /// Allocate a node for `value` and link it at the null link `side` of `parent`.
    fn attach(
        &mut self,
        value: V,
        parent: NodeId,
        side: Side,
    ) -> Result<Position, TryReserveError> {
        let id = self.pool.allocate()?;
        self.pool.construct(id, value, parent);
        self.pool.link(id, parent, side);
        self.len += 1;
        Ok(self.position(id))
    }

    /// Insert `value` unless an element with an equivalent key is present.
    ///
    /// Returns the position of the inserted element and `true`, or the position of the
    /// existing equivalent element and `false` (in which case `value` is dropped).
    /// If node storage cannot be allocated the tree is unchanged.
    pub fn try_insert_unique(&mut self, value: V) -> Result<(Position, bool), TryReserveError> {
        let (parent, side) = self.insert_slot(KO::key_of(&value));
        // The last element not ordered after `value`; equivalent to it unless strictly before.
        let candidate = if side == Side::Left {
            self.pool.step(parent, Side::Left)
        } else {
            parent
        };
        if candidate != HEADER && !self.less(self.key(candidate), KO::key_of(&value)) {
            return Ok((self.position(candidate), false));
        }
        Ok((self.attach(value, parent, side)?, true))
    }

    /// Insert `value` unless an element with an equivalent key is present.
    ///
    /// Returns the position of the inserted element and `true`, or the position of the
    /// existing equivalent element and `false` (in which case `value` is dropped).
    ///
    /// # Example
    ///
    /// ```
    /// use rbtree_core::collections::RbTree;
    /// let mut tree = RbTree::new();
    /// let (first, inserted) = tree.insert_unique(5);
    /// assert!(inserted);
    /// assert_eq!(tree.insert_unique(5), (first, false));
    /// assert_eq!(tree.len(), 1);
    /// ```
    pub fn insert_unique(&mut self, value: V) -> (Position, bool) {
        self.try_insert_unique(value).unwrap_or_else(|e| e.handle())
    }

    /// Insert `value`, after any elements with an equivalent key.
    ///
    /// If node storage cannot be allocated the tree is unchanged.
    pub fn try_insert_equal(&mut self, value: V) -> Result<Position, TryReserveError> {
        let (parent, side) = self.insert_slot(KO::key_of(&value));
        self.attach(value, parent, side)
    }

    /// Insert `value`, after any elements with an equivalent key.
    pub fn insert_equal(&mut self, value: V) -> Position {
        self.try_insert_equal(value).unwrap_or_else(|e| e.handle())
    }

    /// Position of the first element whose key is not ordered before `k`, or `end()`.
    #[must_use]
    pub fn lower_bound(&self, k: &KO::Key) -> Position {
        self.position(self.lower_bound_id(k))
    }

    fn lower_bound_id(&self, k: &KO::Key) -> NodeId {
        let mut found = HEADER;
        let mut cur = self.pool.root();
        while let Some(n) = cur {
            if self.less(self.key(n), k) {
                cur = self.pool.child(n, Side::Right);
            } else {
                found = n;
                cur = self.pool.child(n, Side::Left);
            }
        }
        found
    }

    /// Position of the first element whose key is ordered after `k`, or `end()`.
    #[must_use]
    pub fn upper_bound(&self, k: &KO::Key) -> Position {
        let mut found = HEADER;
        let mut cur = self.pool.root();
        while let Some(n) = cur {
            if self.less(k, self.key(n)) {
                found = n;
                cur = self.pool.child(n, Side::Left);
            } else {
                cur = self.pool.child(n, Side::Right);
            }
        }
        self.position(found)
    }

    /// The range of elements with keys equivalent to `k`, as `(lower_bound(k), upper_bound(k))`.
    #[must_use]
    pub fn equal_range(&self, k: &KO::Key) -> (Position, Position) {
        (self.lower_bound(k), self.upper_bound(k))
    }

    /// Position of the first element with key equivalent to `k`, or `end()`.
    #[must_use]
    pub fn find(&self, k: &KO::Key) -> Position {
        let id = self.lower_bound_id(k);
        if id == HEADER || self.less(k, self.key(id)) {
            self.end()
        } else {
            self.position(id)
        }
    }

    /// Does the tree have an element with key equivalent to `k`?
    #[must_use]
    pub fn contains(&self, k: &KO::Key) -> bool {
        self.find(k) != self.end()
    }

    /// Number of elements with key equivalent to `k`.
    #[must_use]
    pub fn count(&self, k: &KO::Key) -> usize {
        let (first, last) = self.equal_range(k);
        self.range(first, last).count()
    }

    /// Remove every element with key equivalent to `k`, returning how many were removed.
    pub fn erase_key(&mut self, k: &KO::Key) -> usize {
        let (mut pos, last) = self.equal_range(k);
        let mut removed = 0;
        while pos != last {
            let next = self.next(pos);
            self.erase(pos);
            pos = next;
            removed += 1;
        }
        removed
    }

    /// Checks the red-black invariants, cached extremes, parent links, ordering and length.
    /// Returns the black-height of the tree.
    #[cfg(test)]
    pub(crate) fn check(&self) -> usize {
        let pool = &self.pool;
        let Some(root) = pool.root() else {
            assert_eq!(self.len, 0);
            assert_eq!(pool.extreme(Side::Left), HEADER);
            assert_eq!(pool.extreme(Side::Right), HEADER);
            return 0;
        };
        assert_eq!(pool.parent(root), HEADER);
        assert_eq!(pool.color(root), nodes::Color::Black, "root must be black");
        assert_eq!(pool.extreme(Side::Left), pool.descend(root, Side::Left));
        assert_eq!(pool.extreme(Side::Right), pool.descend(root, Side::Right));
        let (count, black_height) = self.check_subtree(root);
        assert_eq!(count, self.len);

        let mut prev: Option<NodeId> = None;
        let mut id = pool.extreme(Side::Left);
        while id != HEADER {
            if let Some(p) = prev {
                assert!(!self.less(self.key(id), self.key(p)), "elements out of order");
            }
            prev = Some(id);
            id = pool.step(id, Side::Right);
        }
        black_height
    }

    #[cfg(test)]
    fn check_subtree(&self, id: NodeId) -> (usize, usize) {
        use nodes::Color;
        let pool = &self.pool;
        let mut count = 1;
        let mut heights = [0; 2];
        for side in [Side::Left, Side::Right] {
            if let Some(c) = pool.child(id, side) {
                assert_eq!(pool.parent(c), id, "parent link mismatch");
                assert!(
                    pool.color(id) == Color::Black || pool.color(c) == Color::Black,
                    "red node has a red child"
                );
                let (n, h) = self.check_subtree(c);
                count += n;
                heights[side as usize] = h;
            }
        }
        assert_eq!(heights[0], heights[1], "black-height is not uniform");
        (count, heights[0] + usize::from(pool.color(id) == Color::Black))
    }

    /// Height of the tree, counting nodes on the longest root-to-leaf path.
    #[cfg(test)]
    pub(crate) fn height(&self) -> usize {
        fn go<V, A: Allocator>(pool: &NodePool<V, A>, link: Option<NodeId>) -> usize {
            match link {
                None => 0,
                Some(id) => {
                    let left = go(pool, pool.child(id, Side::Left));
                    1 + left.max(go(pool, pool.child(id, Side::Right)))
                }
            }
        }
        go(&self.pool, self.pool.root())
    }
}

impl<V: Clone, KO, C: Clone, A: Allocator + Clone> RbTree<V, KO, C, A> {
    /// Deep copy, preserving the shape and colours of the tree.
    ///
    /// If node storage cannot be allocated, everything allocated for the copy is released
    /// and the error is returned. The same happens if cloning an element panics.
    pub fn try_clone(&self) -> Result<Self, TryReserveError> {
        let mut pool = NodePool::new_in(self.pool.allocator().clone());
        if let Err(e) = pool.try_reserve(self.len) {
            log::debug!("clone of {} elements abandoned: {e}", self.len);
            return Err(e);
        }
        if let Some(root) = self.pool.root() {
            // (source node, parent in the copy, side under that parent)
            let mut work: StkVec<(NodeId, NodeId, Side)> = StkVec::new();
            work.push((root, HEADER, Side::Left));
            while let Some((src, parent, side)) = work.pop() {
                let value = self.pool.value(src).clone();
                let id = pool.allocate()?;
                pool.construct(id, value, parent);
                pool.set_color(id, self.pool.color(src));
                if parent == HEADER {
                    pool.set_root(Some(id));
                } else {
                    pool.set_child(parent, side, Some(id));
                }
                for end in [Side::Left, Side::Right] {
                    if src == self.pool.extreme(end) {
                        pool.set_extreme(end, id);
                    }
                }
                // Right first, so the left subtree is copied first.
                for child_side in [Side::Right, Side::Left] {
                    if let Some(c) = self.pool.child(src, child_side) {
                        work.push((c, id, child_side));
                    }
                }
            }
        }
        Ok(Self {
            len: self.len,
            pool,
            cmp: self.cmp.clone(),
            _ko: PhantomData,
        })
    }
}

impl<V: Clone, KO, C: Clone, A: Allocator + Clone> Clone for RbTree<V, KO, C, A> {
    fn clone(&self) -> Self {
        self.try_clone().unwrap_or_else(|e| e.handle())
    }
}

impl<V, KO, C: Default, A: Allocator + Default> Default for RbTree<V, KO, C, A> {
    /// Creates an empty tree.
    fn default() -> Self {
        Self::with_compare_in(C::default(), A::default())
    }
}

impl<V: Debug, KO, C, A: Allocator> Debug for RbTree<V, KO, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<V: PartialEq, KO, C, A: Allocator> PartialEq for RbTree<V, KO, C, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}
impl<V: Eq, KO, C, A: Allocator> Eq for RbTree<V, KO, C, A> {}

impl<V: PartialOrd, KO, C, A: Allocator> PartialOrd for RbTree<V, KO, C, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<V: Hash, KO, C, A: Allocator> Hash for RbTree<V, KO, C, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        for elt in self {
            elt.hash(state);
        }
    }
}

impl<'a, V, KO, C, A: Allocator> IntoIterator for &'a RbTree<V, KO, C, A> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V, A>;
    fn into_iter(self) -> Iter<'a, V, A> {
        self.iter()
    }
}

impl<V, KO, C, A: Allocator> IntoIterator for RbTree<V, KO, C, A> {
    type Item = V;
    type IntoIter = IntoIter<V, KO, C, A>;

    /// Convert `RbTree` to [`IntoIter`].
    fn into_iter(self) -> IntoIter<V, KO, C, A> {
        IntoIter { tree: self }
    }
}

/// Iterator over references to elements in `[first, last)`, returned by [`RbTree::range`].
///
/// Steps along parent and child links, no stack is kept.
pub struct Range<'a, V, A: Allocator = Global> {
    pool: &'a NodePool<V, A>,
    front: NodeId,
    back: NodeId,
}

impl<V, A: Allocator> Clone for Range<'_, V, A> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, V, A: Allocator> Iterator for Range<'a, V, A> {
    type Item = &'a V;
    fn next(&mut self) -> Option<&'a V> {
        if self.front == self.back {
            return None;
        }
        let id = self.front;
        self.front = self.pool.step(id, Side::Right);
        Some(self.pool.value(id))
    }
}

impl<'a, V, A: Allocator> DoubleEndedIterator for Range<'a, V, A> {
    fn next_back(&mut self) -> Option<&'a V> {
        if self.front == self.back {
            return None;
        }
        self.back = self.pool.step(self.back, Side::Left);
        Some(self.pool.value(self.back))
    }
}

impl<V, A: Allocator> FusedIterator for Range<'_, V, A> {}

/// Iterator returned by [`RbTree::iter`].
pub struct Iter<'a, V, A: Allocator = Global> {
    len: usize,
    inner: Range<'a, V, A>,
}

impl<V, A: Allocator> Clone for Iter<'_, V, A> {
    fn clone(&self) -> Self {
        Self {
            len: self.len,
            inner: self.inner.clone(),
        }
    }
}

impl<'a, V, A: Allocator> Iterator for Iter<'a, V, A> {
    type Item = &'a V;
    fn next(&mut self) -> Option<&'a V> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            self.inner.next()
        }
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<V, A: Allocator> ExactSizeIterator for Iter<'_, V, A> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<'a, V, A: Allocator> DoubleEndedIterator for Iter<'a, V, A> {
    fn next_back(&mut self) -> Option<&'a V> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            self.inner.next_back()
        }
    }
}

impl<V, A: Allocator> FusedIterator for Iter<'_, V, A> {}

/// Consuming iterator returned by [`RbTree::into_iter`], yields elements in order.
pub struct IntoIter<V, KO = Identity, C = Less, A: Allocator = Global> {
    tree: RbTree<V, KO, C, A>,
}

impl<V, KO, C, A: Allocator> Iterator for IntoIter<V, KO, C, A> {
    type Item = V;
    fn next(&mut self) -> Option<V> {
        self.tree.pop_first()
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<V, KO, C, A: Allocator> DoubleEndedIterator for IntoIter<V, KO, C, A> {
    fn next_back(&mut self) -> Option<V> {
        self.tree.pop_last()
    }
}

impl<V, KO, C, A: Allocator> ExactSizeIterator for IntoIter<V, KO, C, A> {
    fn len(&self) -> usize {
        self.tree.len()
    }
}

impl<V, KO, C, A: Allocator> FusedIterator for IntoIter<V, KO, C, A> {}

// Tests.

#[cfg(all(test, not(miri), feature = "cap"))]
#[global_allocator]
static ALLOCATOR: cap::Cap<std::alloc::System> = cap::Cap::new(std::alloc::System, usize::MAX);

#[cfg(test)]
fn print_memory() {
    #[cfg(all(test, not(miri), feature = "cap"))]
    println!("Memory allocated: {} bytes", ALLOCATOR.allocated());
}

/* mimalloc cannot be used with miri */
#[cfg(all(test, not(miri), not(feature = "cap")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(test)]
mod mytests;

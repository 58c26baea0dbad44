use std::ops::Not;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::alloc::Allocator;
use crate::collections::TryReserveError;
use crate::vec::Vec;

/// Index of a node in a [`NodePool`]. Stable for the lifetime of the node.
pub(crate) type NodeId = usize;

/// The header (sentinel) node, never holds a value.
pub(crate) const HEADER: NodeId = 0;

/// Source of pool tags, each pool gets a distinct one.
static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

/// In debug mode or feature unsafe-optim not enabled, same as assert! otherwise does nothing.
#[cfg(any(debug_assertions, not(feature = "unsafe-optim")))]
macro_rules! safe_assert {
    ( $cond: expr ) => {
        assert!($cond)
    };
}

/// In debug mode or feature unsafe-optim not enabled, same as assert! otherwise does nothing.
#[cfg(all(not(debug_assertions), feature = "unsafe-optim"))]
macro_rules! safe_assert {
    ( $cond: expr ) => {
        if !$cond {
            unsafe { std::hint::unreachable_unchecked() }
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

/// Which child of a node. Every left/right case is written once and parameterised by `Side`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left = 0,
    Right = 1,
}

impl Not for Side {
    type Output = Side;
    fn not(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Node<V> {
    pub color: Color,
    /// For a live node, its parent (`HEADER` for the root).
    /// For the header, the root (`HEADER` when empty).
    /// For a vacant slot, the next vacant slot (`HEADER` ends the list).
    pub parent: NodeId,
    /// For the header, `[leftmost, rightmost]`, both `HEADER` when empty.
    pub child: [Option<NodeId>; 2],
    /// `None` for the header and for vacant slots.
    pub value: Option<V>,
    /// Bumped each time the slot is released, so handles to an earlier occupant can be told apart.
    pub generation: u32,
}

impl<V> Node<V> {
    fn vacant(next: NodeId, generation: u32) -> Self {
        Self {
            color: Color::Black,
            parent: next,
            child: [None, None],
            value: None,
            generation,
        }
    }
}

/// Arena of tree nodes.
///
/// The header lives inline so an empty pool owns no storage. Node `id` (for `id > 0`) is kept
/// in `slots[id - 1]`. Released slots are chained through their `parent` field and reused
/// before the storage grows. Every pool carries a process-unique `tag`.
pub(crate) struct NodePool<V, A: Allocator> {
    tag: u64,
    header: Node<V>,
    slots: Vec<Node<V>, A>,
    free: NodeId,
    vacant: usize,
}

impl<V, A: Allocator> NodePool<V, A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            tag: NEXT_TAG.fetch_add(1, Ordering::Relaxed),
            header: Node {
                // The header's colour is a fixed marker, distinguishing it from the root.
                color: Color::Red,
                parent: HEADER,
                child: [Some(HEADER), Some(HEADER)],
                value: None,
                generation: 0,
            },
            slots: Vec::new_in(alloc),
            free: HEADER,
            vacant: 0,
        }
    }

    pub fn tag(&self) -> u64 {
        self.tag
    }

    pub fn allocator(&self) -> &A {
        self.slots.allocator()
    }

    /// Number of nodes that can be live without growing the storage.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Make room for `additional` more live nodes.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let needed = additional.saturating_sub(self.vacant);
        if needed > 0 {
            self.slots.try_reserve(needed)?;
        }
        Ok(())
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<V> {
        if id == HEADER {
            &self.header
        } else {
            safe_assert!(id - 1 < self.slots.len());
            &self.slots[id - 1]
        }
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<V> {
        if id == HEADER {
            &mut self.header
        } else {
            safe_assert!(id - 1 < self.slots.len());
            &mut self.slots[id - 1]
        }
    }

    /// Is `id` a node currently holding a value? Used to validate caller-supplied positions.
    pub fn is_live(&self, id: NodeId) -> bool {
        id != HEADER && self.slots.get(id - 1).is_some_and(|n| n.value.is_some())
    }

    /// Generation of a slot, 0 for the header. `id` must be the header or an allocated slot.
    #[inline]
    pub fn generation(&self, id: NodeId) -> u32 {
        self.node(id).generation
    }

    #[inline]
    pub fn color(&self, id: NodeId) -> Color {
        self.node(id).color
    }

    #[inline]
    pub fn set_color(&mut self, id: NodeId, color: Color) {
        self.node_mut(id).color = color;
    }

    /// Null links count as black.
    #[inline]
    pub fn is_red(&self, link: Option<NodeId>) -> bool {
        link.is_some_and(|id| self.color(id) == Color::Red)
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> NodeId {
        self.node(id).parent
    }

    #[inline]
    pub fn set_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(id).parent = parent;
    }

    #[inline]
    pub fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        self.node(id).child[side as usize]
    }

    #[inline]
    pub fn set_child(&mut self, id: NodeId, side: Side, child: Option<NodeId>) {
        self.node_mut(id).child[side as usize] = child;
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        match self.header.parent {
            HEADER => None,
            root => Some(root),
        }
    }

    #[inline]
    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.header.parent = root.unwrap_or(HEADER);
    }

    /// Leftmost (`Side::Left`) or rightmost node, `HEADER` when empty.
    #[inline]
    pub fn extreme(&self, side: Side) -> NodeId {
        self.header.child[side as usize].unwrap_or(HEADER)
    }

    #[inline]
    pub fn set_extreme(&mut self, side: Side, id: NodeId) {
        self.header.child[side as usize] = Some(id);
    }

    /// The value of a live node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is the header or a released slot.
    #[inline]
    pub fn value(&self, id: NodeId) -> &V {
        match &self.node(id).value {
            Some(v) => v,
            None => panic!("position does not refer to a live element"),
        }
    }

    pub fn value_mut(&mut self, id: NodeId) -> &mut V {
        match &mut self.node_mut(id).value {
            Some(v) => v,
            None => panic!("position does not refer to a live element"),
        }
    }

    /// Obtain an unlinked node slot, reusing a released one when possible.
    ///
    /// This is the only operation that can fail; nothing is modified on failure.
    pub fn allocate(&mut self) -> Result<NodeId, TryReserveError> {
        if self.free != HEADER {
            let id = self.free;
            self.free = self.parent(id);
            self.vacant -= 1;
            return Ok(id);
        }
        self.slots.try_push(Node::vacant(HEADER, 0))?;
        Ok(self.slots.len())
    }

    /// Store `value` in an allocated slot as a red leaf under `parent`.
    pub fn construct(&mut self, id: NodeId, value: V, parent: NodeId) {
        let node = self.node_mut(id);
        debug_assert!(node.value.is_none());
        node.color = Color::Red;
        node.parent = parent;
        node.child = [None, None];
        node.value = Some(value);
    }

    /// Move the value out of a node that is no longer linked into the tree.
    pub fn destroy(&mut self, id: NodeId) -> V {
        match self.node_mut(id).value.take() {
            Some(v) => v,
            None => panic!("position does not refer to a live element"),
        }
    }

    /// Return a destroyed slot to the free list.
    pub fn deallocate(&mut self, id: NodeId) {
        debug_assert!(id != HEADER);
        let next = self.free;
        let node = self.node_mut(id);
        *node = Node::vacant(next, node.generation.wrapping_add(1));
        self.free = id;
        self.vacant += 1;
    }

    /// Destroy and release every node, children before parents. Returns the number released.
    ///
    /// The walk only reads links of nodes that are still live, using parent links instead of
    /// a stack.
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        if let Some(root) = self.root() {
            let mut cur = root;
            loop {
                if let Some(c) = self.child(cur, Side::Left).or(self.child(cur, Side::Right)) {
                    cur = c;
                    continue;
                }
                let parent = self.parent(cur);
                if parent != HEADER {
                    let side = if self.child(parent, Side::Left) == Some(cur) {
                        Side::Left
                    } else {
                        Side::Right
                    };
                    self.set_child(parent, side, None);
                }
                drop(self.destroy(cur));
                self.deallocate(cur);
                released += 1;
                if parent == HEADER {
                    break;
                }
                cur = parent;
            }
        }
        self.set_root(None);
        self.set_extreme(Side::Left, HEADER);
        self.set_extreme(Side::Right, HEADER);
        released
    }
}

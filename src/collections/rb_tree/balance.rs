//! Structural operations on a [`NodePool`]: rotation, linking with insert rebalancing,
//! unlinking with erase rebalancing, and in-order stepping.
//!
//! None of these compare keys; ordering decisions are made by the caller.

use super::nodes::{Color, NodeId, NodePool, Side, HEADER};
use crate::alloc::Allocator;

/// The outcome of unlinking a node, before rebalancing.
///
/// `removed` is the node whose value is being erased; it is fully detached. When it had two
/// children its in-order successor was moved into its place, so structurally the node that
/// vanished from the successor's old position had colour `removed_color`. `replacement` is the
/// child that took that vanished position (possibly null) and `replacement_parent` its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Splice {
    pub removed: NodeId,
    pub replacement: Option<NodeId>,
    pub replacement_parent: NodeId,
    pub removed_color: Color,
}

impl<V, A: Allocator> NodePool<V, A> {
    /// Which child of `parent` is `child`. `parent` must not be the header.
    #[inline]
    pub fn side_in_parent(&self, parent: NodeId, child: NodeId) -> Side {
        if self.child(parent, Side::Left) == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Make `new` take the place of `old` under `parent` (or as root when `parent` is the header).
    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: Option<NodeId>) {
        if parent == HEADER {
            self.set_root(new);
        } else {
            let side = self.side_in_parent(parent, old);
            self.set_child(parent, side, new);
        }
    }

    /// Rotate at `x`, moving `x` down on `side`.
    ///
    /// `Side::Left` is the classic left rotation: the right child `y` of `x` takes `x`'s place,
    /// `y`'s left subtree becomes `x`'s right subtree and `x` becomes `y`'s left child.
    /// The child of `x` opposite `side` must exist. Colours and in-order sequence are unchanged.
    pub fn rotate(&mut self, x: NodeId, side: Side) {
        let Some(y) = self.child(x, !side) else {
            unreachable!("rotation requires a child to rotate up");
        };
        let inner = self.child(y, side);
        self.set_child(x, !side, inner);
        if let Some(inner) = inner {
            self.set_parent(inner, x);
        }
        let parent = self.parent(x);
        self.set_parent(y, parent);
        self.replace_child(parent, x, Some(y));
        self.set_child(y, side, Some(x));
        self.set_parent(x, y);
    }

    /// Follow `side` links from `id` as far as possible.
    #[inline]
    pub fn descend(&self, mut id: NodeId, side: Side) -> NodeId {
        while let Some(c) = self.child(id, side) {
            id = c;
        }
        id
    }

    /// The in-order neighbour of `id` in direction `dir` (`Side::Right` for the successor).
    ///
    /// From the last element the step reaches the header; from the header it reaches the
    /// first element in direction `dir` (so the predecessor of the header is the maximum).
    pub fn step(&self, id: NodeId, dir: Side) -> NodeId {
        if id == HEADER {
            return self.extreme(!dir);
        }
        if let Some(c) = self.child(id, dir) {
            return self.descend(c, !dir);
        }
        let mut x = id;
        let mut p = self.parent(x);
        while p != HEADER && self.child(p, dir) == Some(x) {
            x = p;
            p = self.parent(p);
        }
        p
    }

    /// Attach the constructed node `z` as the `side` child of `parent` (as root when `parent`
    /// is the header), maintain the cached extremes and restore the red-black invariants.
    pub fn link(&mut self, z: NodeId, parent: NodeId, side: Side) {
        self.set_parent(z, parent);
        if parent == HEADER {
            self.set_root(Some(z));
            self.set_extreme(Side::Left, z);
            self.set_extreme(Side::Right, z);
        } else {
            self.set_child(parent, side, Some(z));
            if self.extreme(side) == parent {
                self.set_extreme(side, z);
            }
        }
        self.insert_fixup(z);
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while Some(z) != self.root() && self.color(self.parent(z)) == Color::Red {
            let p = self.parent(z);
            // A red parent is never the root, so the grandparent is a real node.
            let g = self.parent(p);
            let side = self.side_in_parent(g, p);
            let uncle = self.child(g, !side);
            if self.is_red(uncle) {
                self.set_color(p, Color::Black);
                if let Some(u) = uncle {
                    self.set_color(u, Color::Black);
                }
                self.set_color(g, Color::Red);
                z = g;
            } else {
                if self.child(p, !side) == Some(z) {
                    z = p;
                    self.rotate(z, side);
                }
                let p = self.parent(z);
                let g = self.parent(p);
                self.set_color(p, Color::Black);
                self.set_color(g, Color::Red);
                self.rotate(g, !side);
                break;
            }
        }
        if let Some(root) = self.root() {
            self.set_color(root, Color::Black);
        }
    }

    /// Replace the subtree rooted at `u` with the one rooted at `v` in `u`'s parent.
    fn transplant(&mut self, u: NodeId, v: Option<NodeId>) {
        let parent = self.parent(u);
        self.replace_child(parent, u, v);
        if let Some(v) = v {
            self.set_parent(v, parent);
        }
    }

    /// Detach `z` from the tree without rebalancing. The cached extremes are updated.
    pub fn unlink(&mut self, z: NodeId) -> Splice {
        if self.extreme(Side::Left) == z {
            let next = self.step(z, Side::Right);
            self.set_extreme(Side::Left, next);
        }
        if self.extreme(Side::Right) == z {
            let prev = self.step(z, Side::Left);
            self.set_extreme(Side::Right, prev);
        }

        match (self.child(z, Side::Left), self.child(z, Side::Right)) {
            (None, only) | (only, None) => {
                let replacement_parent = self.parent(z);
                self.transplant(z, only);
                Splice {
                    removed: z,
                    replacement: only,
                    replacement_parent,
                    removed_color: self.color(z),
                }
            }
            (Some(left), Some(right)) => {
                let y = self.descend(right, Side::Left);
                let removed_color = self.color(y);
                let x = self.child(y, Side::Right);
                let replacement_parent = if y == right {
                    y
                } else {
                    let yp = self.parent(y);
                    self.transplant(y, x);
                    self.set_child(y, Side::Right, Some(right));
                    self.set_parent(right, y);
                    yp
                };
                self.transplant(z, Some(y));
                self.set_child(y, Side::Left, Some(left));
                self.set_parent(left, y);
                self.set_color(y, self.color(z));
                Splice {
                    removed: z,
                    replacement: x,
                    replacement_parent,
                    removed_color,
                }
            }
        }
    }

    /// Restore the red-black invariants after `unlink`.
    pub fn erase_fixup(&mut self, splice: &Splice) {
        if splice.removed_color == Color::Red {
            return;
        }
        let mut x = splice.replacement;
        let mut xp = splice.replacement_parent;
        while x != self.root() && !self.is_red(x) {
            let side = match x {
                Some(x) => self.side_in_parent(xp, x),
                None if self.child(xp, Side::Left).is_none() => Side::Left,
                None => Side::Right,
            };
            let mut w = self.sibling(xp, side);
            if self.color(w) == Color::Red {
                self.set_color(w, Color::Black);
                self.set_color(xp, Color::Red);
                self.rotate(xp, side);
                w = self.sibling(xp, side);
            }
            let near = self.child(w, side);
            let far = self.child(w, !side);
            if !self.is_red(near) && !self.is_red(far) {
                self.set_color(w, Color::Red);
                x = Some(xp);
                xp = self.parent(xp);
                continue;
            }
            if !self.is_red(far) {
                if let Some(near) = near {
                    self.set_color(near, Color::Black);
                }
                self.set_color(w, Color::Red);
                self.rotate(w, !side);
                w = self.sibling(xp, side);
            }
            self.set_color(w, self.color(xp));
            self.set_color(xp, Color::Black);
            if let Some(far) = self.child(w, !side) {
                self.set_color(far, Color::Black);
            }
            self.rotate(xp, side);
            x = self.root();
            break;
        }
        if let Some(x) = x {
            self.set_color(x, Color::Black);
        }
    }

    /// The child of `xp` opposite `side`. It exists whenever the subtree on `side` is short
    /// one black node.
    fn sibling(&self, xp: NodeId, side: Side) -> NodeId {
        match self.child(xp, !side) {
            Some(w) => w,
            None => unreachable!("red-black tree black-height is not uniform"),
        }
    }
}

use std::ops::Range;

use crate::geometry::{FloatType, Triangle, WorldBox, WorldPoint};

use super::NodeIdx;

/// Node of the BVH arena.
///
/// `count > 0` marks a leaf, with `first_or_child` being the offset of its `count` triangle
/// indices in the shared permutation array.
/// `count == 0` marks an inner node, with `first_or_child` being the index of the left child;
/// the right child always directly follows it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BvhNode {
    pub bounds: WorldBox,
    first_or_child: u32,
    count: u32,
}

impl Default for BvhNode {
    fn default() -> Self {
        BvhNode {
            bounds: WorldBox::empty(),
            first_or_child: 0,
            count: 0,
        }
    }
}

impl BvhNode {
    /// Leaf covering `count` triangle indices starting at `first`, with an empty box.
    pub(super) fn new_leaf(first: u32, count: u32) -> Self {
        assert!(count > 0, "Leaf nodes must reference at least one triangle");
        BvhNode {
            bounds: WorldBox::empty(),
            first_or_child: first,
            count,
        }
    }

    /// Turns the node into an inner node with children at `left_child` and `left_child + 1`.
    pub(super) fn make_inner(&mut self, left_child: NodeIdx) {
        self.first_or_child = left_child.raw();
        self.count = 0;
    }

    pub fn is_leaf(&self) -> bool {
        self.count > 0
    }

    /// Number of triangles directly referenced by this node (zero for inner nodes).
    pub fn triangle_count(&self) -> u32 {
        self.count
    }

    /// Range in the permutation array. Panics for inner nodes.
    pub fn triangle_range(&self) -> Range<usize> {
        assert!(self.is_leaf(), "Inner nodes don't have triangles");
        let first = self.first_or_child as usize;
        first..(first + self.count as usize)
    }

    /// Panics for leaves.
    pub fn left_child(&self) -> NodeIdx {
        assert!(!self.is_leaf(), "Leaf nodes don't have children");
        NodeIdx::from_raw(self.first_or_child)
    }

    /// Panics for leaves.
    pub fn right_child(&self) -> NodeIdx {
        self.left_child() + 1
    }

    pub fn children(&self) -> [NodeIdx; 2] {
        [self.left_child(), self.right_child()]
    }

    pub fn grow(&mut self, triangle: &Triangle<WorldPoint>) {
        self.bounds.grow(triangle);
    }

    pub fn grow_all(&mut self, triangles: impl IntoIterator<Item = Triangle<WorldPoint>>) {
        for triangle in triangles {
            self.grow(&triangle);
        }
    }

    /// Surface area of the node's box, a relative cost proxy.
    pub fn surface_area(&self) -> FloatType {
        self.bounds.surface_area()
    }

    /// Surface area heuristic cost of intersecting everything in this node.
    pub fn cost(&self) -> FloatType {
        self.surface_area() * self.count as FloatType
    }

    /// Axis with the longest box span, ties go to the later axis.
    pub fn split_axis(&self) -> usize {
        self.bounds.longest_axis()
    }
}

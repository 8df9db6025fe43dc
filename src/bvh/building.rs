use assert2::debug_assert;
use index_vec::IndexVec;
use log::{debug, warn};

use crate::{
    geometry::{FloatType, Triangle, WorldBox, WorldPoint},
    triangulation::Triangulation,
};

use super::{Bvh, BvhError, BvhNode, NodeIdx};

/// Upper bound on `BuildSettings::sah_eval_points`.
pub const MAX_SAH_EVAL_POINTS: u32 = 1024;

#[derive(Copy, Clone, Debug, PartialEq, bon::Builder)]
pub struct BuildSettings {
    /// Nodes with at most this many triangles are never split.
    #[builder(default = 2)]
    pub min_leaf_triangles: u32,

    /// Number of candidate split planes evaluated per node.
    #[builder(default = 8)]
    pub sah_eval_points: u32,

    /// Nodes at this depth become leaves regardless of their size.
    /// Guards against runaway recursion on many coincident centroids.
    #[builder(default = 64)]
    pub max_depth: u32,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BuildSettings {
    pub fn validate(&self) -> Result<(), BvhError> {
        if self.min_leaf_triangles == 0 {
            return Err(BvhError::InvalidSettings(
                "min_leaf_triangles must be at least 1",
            ));
        }
        if self.sah_eval_points == 0 {
            return Err(BvhError::InvalidSettings(
                "sah_eval_points must be at least 1",
            ));
        }
        if self.sah_eval_points > MAX_SAH_EVAL_POINTS {
            return Err(BvhError::InvalidSettings(
                "sah_eval_points must be at most 1024",
            ));
        }
        if self.max_depth == 0 {
            return Err(BvhError::InvalidSettings("max_depth must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug)]
struct SplitCandidate {
    position: FloatType,
    cost: FloatType,
}

impl Bvh<'_> {
    /// Builds the tree over the linked triangulation.
    pub fn construct(&mut self, settings: &BuildSettings) -> Result<(), BvhError> {
        let mesh = self.mesh.ok_or(BvhError::NotLinked)?;
        settings.validate()?;

        let triangle_count = mesh.len();
        let too_many = || BvhError::TooManyTriangles(triangle_count);
        let raw_count = u32::try_from(triangle_count).map_err(|_| too_many())?;
        let node_capacity = raw_count
            .checked_mul(2)
            .ok_or_else(too_many)?
            .saturating_sub(1);

        self.triangle_indices = (0..raw_count).collect();
        self.nodes = IndexVec::from_vec(vec![BvhNode::default(); node_capacity as usize]);
        self.nodes_used = 0;

        if raw_count == 0 {
            warn!("Building BVH over an empty triangulation");
            self.constructed = true;
            return Ok(());
        }

        let root = NodeIdx::root();
        self.nodes[root] = BvhNode::new_leaf(0, raw_count);
        self.update_bounds(root, mesh);
        self.nodes_used = 1;

        self.subdivide(root, mesh, settings, 0);
        self.constructed = true;

        debug!(
            "Built BVH over {} triangles: {} of {} nodes used",
            triangle_count, self.nodes_used, node_capacity
        );

        Ok(())
    }

    fn update_bounds(&mut self, index: NodeIdx, mesh: &Triangulation) {
        let mut node = self.nodes[index];
        node.grow_all(
            self.leaf_triangles(&node)
                .iter()
                .map(|&i| mesh.triangle(i as usize)),
        );
        self.nodes[index] = node;
    }

    fn subdivide(&mut self, index: NodeIdx, mesh: &Triangulation, settings: &BuildSettings, depth: u32) {
        let node = self.nodes[index];
        debug_assert!(node.is_leaf());

        if node.triangle_count() <= settings.min_leaf_triangles {
            return;
        }
        if depth >= settings.max_depth {
            debug!(
                "Depth limit reached, leaving {} triangles in a single leaf",
                node.triangle_count()
            );
            return;
        }

        let axis = node.split_axis();
        let Some(split) = self.find_best_split(&node, axis, mesh, settings.sah_eval_points) else {
            return;
        };
        if node.cost() <= split.cost {
            // Splitting would not make intersection any cheaper
            return;
        }

        let range = node.triangle_range();
        let centroids = mesh.centroids();
        let left_count = partition_in_place(&mut self.triangle_indices[range.clone()], |i| {
            centroids[i as usize][axis] < split.position
        });
        // Rounding can still put everything on one side
        if left_count == 0 || left_count == range.len() {
            return;
        }
        let split_index = range.start + left_count;

        let left = NodeIdx::from_raw(self.nodes_used);
        let right = left + 1;
        self.nodes_used += 2;

        self.nodes[left] = BvhNode::new_leaf(range.start as u32, left_count as u32);
        self.nodes[right] = BvhNode::new_leaf(split_index as u32, (range.end - split_index) as u32);
        self.update_bounds(left, mesh);
        self.update_bounds(right, mesh);
        self.nodes[index].make_inner(left);

        self.subdivide(left, mesh, settings, depth + 1);
        self.subdivide(right, mesh, settings, depth + 1);
    }

    /// Evaluates evenly spaced split planes strictly inside the node box along `axis`,
    /// returns the cheapest one, or None if none of them has a finite cost.
    fn find_best_split(
        &self,
        node: &BvhNode,
        axis: usize,
        mesh: &Triangulation,
        eval_points: u32,
    ) -> Option<SplitCandidate> {
        let min = node.bounds.min[axis];
        let span = node.bounds.size()[axis];
        let denominator = eval_points as FloatType + 1.0;

        let mut best: Option<SplitCandidate> = None;
        for i in 1..=eval_points {
            let position = min + span * (i as FloatType) / denominator;
            let cost = self.evaluate_sah(node, axis, position, mesh);
            // NaN never compares less, so it never gets selected
            if cost < best.map_or(FloatType::INFINITY, |b| b.cost) {
                best = Some(SplitCandidate { position, cost });
            }
        }
        best
    }

    /// Cost of splitting the node's triangles by centroid at `position` along `axis`.
    /// Empty sides cost nothing, a split where both sides cost nothing is infinitely expensive.
    fn evaluate_sah(
        &self,
        node: &BvhNode,
        axis: usize,
        position: FloatType,
        mesh: &Triangulation,
    ) -> FloatType {
        let mut left = ScratchBox::default();
        let mut right = ScratchBox::default();

        for &i in self.leaf_triangles(node) {
            let i = i as usize;
            let side = if mesh.centroids()[i][axis] < position {
                &mut left
            } else {
                &mut right
            };
            side.add(&mesh.triangle(i));
        }

        let cost = left.cost() + right.cost();
        if cost == 0.0 { FloatType::INFINITY } else { cost }
    }
}

/// Box and triangle count of one side of a candidate split.
#[derive(Default)]
struct ScratchBox {
    bounds: WorldBox,
    count: u32,
}

impl ScratchBox {
    fn add(&mut self, triangle: &Triangle<WorldPoint>) {
        self.bounds.grow(triangle);
        self.count += 1;
    }

    fn cost(&self) -> FloatType {
        if self.count == 0 {
            0.0
        } else {
            self.bounds.surface_area() * self.count as FloatType
        }
    }
}

/// Reorders `indices` so that all items for which `goes_left` holds come first.
/// Two pointer scheme: items failing the predicate are swapped to the shrinking end.
/// Returns the number of items on the left side.
fn partition_in_place(indices: &mut [u32], goes_left: impl Fn(u32) -> bool) -> usize {
    let mut i = 0;
    let mut end = indices.len();
    while i < end {
        if goes_left(indices[i]) {
            i += 1;
        } else {
            end -= 1;
            indices.swap(i, end);
        }
    }
    i
}

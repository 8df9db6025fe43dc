use crate::geometry::{BarycentricCoordinates, FloatType, Ray, WorldPoint};

use super::{Bvh, NodeIdx};

/// Traversal stack, kept between queries to avoid reallocating.
/// One per worker thread.
#[derive(Clone, Debug, Default)]
#[repr(transparent)]
pub struct StackCache {
    /// Nodes still to visit, with the distance where the ray enters their box.
    stack: Vec<(NodeIdx, FloatType)>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BvhHit {
    /// Distance along the ray.
    pub t: FloatType,
    /// Element index in the linked triangulation.
    pub triangle_index: usize,
    pub uv: BarycentricCoordinates<FloatType>,
}

impl Bvh<'_> {
    /// Finds the nearest intersection in `(0, ray.t_max)`.
    /// `ray.t_max` is tightened to the hit distance.
    pub fn intersect(&self, ray: &mut Ray, stack: &mut StackCache) -> Option<BvhHit> {
        self.traverse(ray, stack, false)
    }

    /// Checks whether any triangle lies on the segment from `origin` toward `target`,
    /// closer than `max_distance`. Stops at the first blocker found.
    pub fn is_blocked(
        &self,
        origin: WorldPoint,
        target: WorldPoint,
        max_distance: FloatType,
        stack: &mut StackCache,
    ) -> bool {
        let mut ray = Ray::new(origin, target - origin).with_t_max(max_distance);
        self.traverse(&mut ray, stack, true).is_some()
    }

    /// [`Self::is_blocked`] with a temporary traversal stack.
    pub fn is_blocked_uncached(
        &self,
        origin: WorldPoint,
        target: WorldPoint,
        max_distance: FloatType,
    ) -> bool {
        self.is_blocked(origin, target, max_distance, &mut StackCache::default())
    }

    /// Walks the tree front to back.
    /// Every triangle hit tightens `ray.t_max`, so a hit is always closer than anything
    /// found before; with `any_hit` the first one ends the walk.
    fn traverse(&self, ray: &mut Ray, stack: &mut StackCache, any_hit: bool) -> Option<BvhHit> {
        assert!(self.constructed, "BVH must be constructed before it is queried");
        if self.nodes_used == 0 {
            return None;
        }

        let mesh = self.mesh();
        let stack = &mut stack.stack;
        stack.clear();

        let root = NodeIdx::root();
        let mut current = self.nodes[root].bounds.intersect(ray).map(|t| (root, t));
        let mut best = None;

        while let Some((index, entry_t)) = current.take().or_else(|| stack.pop()) {
            if entry_t >= ray.t_max {
                // Something closer than this whole box was found since it was pushed
                continue;
            }

            let node = &self.nodes[index];
            if node.is_leaf() {
                for &i in self.leaf_triangles(node) {
                    let triangle_index = i as usize;
                    if let Some((t, uv)) = mesh.triangle(triangle_index).intersect(ray) {
                        ray.t_max = t;
                        best = Some(BvhHit {
                            t,
                            triangle_index,
                            uv,
                        });
                        if any_hit {
                            return best;
                        }
                    }
                }
                continue;
            }

            let [a, b] = node
                .children()
                .map(|child| (child, self.nodes[child].bounds.intersect(ray)));
            let (near, far) = match (a, b) {
                ((a, Some(ta)), (b, Some(tb))) if tb < ta => ((b, tb), Some((a, ta))),
                ((a, Some(ta)), (b, Some(tb))) => ((a, ta), Some((b, tb))),
                ((a, Some(ta)), (_, None)) => ((a, ta), None),
                ((_, None), (b, Some(tb))) => ((b, tb), None),
                ((_, None), (_, None)) => continue,
            };

            if let Some(far) = far {
                stack.push(far);
            }
            current = Some(near);
        }

        best
    }
}

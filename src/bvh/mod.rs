//! Bounding volume hierarchy over the elements of a triangulation.
//!
//! Nodes live in a flat arena owned by the [`Bvh`], children are referenced by index.
//! Leaves reference contiguous ranges of a permutation of the mesh's element indices,
//! which is reordered in place during construction.

mod building;
mod node;
mod printing;
mod ray_bvh_intersection;

use index_vec::IndexVec;
use thiserror::Error;

use crate::triangulation::Triangulation;

pub use building::{BuildSettings, MAX_SAH_EVAL_POINTS};
pub use node::BvhNode;
pub use printing::{BvhStatistics, ExportRecord};
pub use ray_bvh_intersection::{BvhHit, StackCache};

index_vec::define_index_type! {
    pub struct NodeIdx = u32;
    IMPL_RAW_CONVERSIONS = true;
}

impl NodeIdx {
    fn root() -> Self {
        Self::from_raw(0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Bvh<'m> {
    mesh: Option<&'m Triangulation>,

    /// Pre-sized to `2N - 1`, only the first `nodes_used` are part of the tree.
    nodes: IndexVec<NodeIdx, BvhNode>,
    /// Permutation of `0..N`, leaves own contiguous ranges of it.
    triangle_indices: Vec<u32>,
    nodes_used: u32,
    constructed: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum BvhError {
    #[error("BVH is not linked to a triangulation")]
    NotLinked,

    #[error("Triangulation has {0} elements, more than a BVH can index")]
    TooManyTriangles(usize),

    #[error("Invalid build settings: {0}")]
    InvalidSettings(&'static str),
}

impl<'m> Bvh<'m> {
    /// Creates an unlinked, empty BVH.
    pub fn new() -> Self {
        Self::default()
    }

    /// Links and constructs in one go.
    pub fn build(mesh: &'m Triangulation, settings: &BuildSettings) -> Result<Self, BvhError> {
        let mut bvh = Self::new();
        bvh.link(mesh);
        bvh.construct(settings)?;
        Ok(bvh)
    }

    /// Attaches the BVH to a triangulation.
    /// Any previously built tree is discarded.
    pub fn link(&mut self, mesh: &'m Triangulation) -> &mut Self {
        self.mesh = Some(mesh);
        self.nodes.clear();
        self.triangle_indices.clear();
        self.nodes_used = 0;
        self.constructed = false;
        self
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// The linked triangulation. Panics if the BVH is not linked.
    pub fn mesh(&self) -> &'m Triangulation {
        self.mesh.expect("BVH must be linked to a triangulation")
    }

    /// Number of nodes that are part of the tree.
    pub fn nodes_used(&self) -> u32 {
        self.nodes_used
    }

    /// Nodes of the tree, the root first.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes.as_raw_slice()[..self.nodes_used as usize]
    }

    pub fn node(&self, index: NodeIdx) -> &BvhNode {
        assert!(index.raw() < self.nodes_used, "Node {index:?} is not part of the tree");
        &self.nodes[index]
    }

    /// Root node, `None` if the tree is empty or was not constructed yet.
    pub fn root_node(&self) -> Option<&BvhNode> {
        self.nodes().first()
    }

    /// Element indices of the linked triangulation, in the order the leaves reference them.
    pub fn triangle_indices(&self) -> &[u32] {
        &self.triangle_indices
    }

    /// Element indices referenced by a leaf node.
    pub fn leaf_triangles(&self, node: &BvhNode) -> &[u32] {
        &self.triangle_indices[node.triangle_range()]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::triangulation::test::unit_square;
    use assert2::{assert, let_assert};

    #[test]
    fn constructing_unlinked_fails() {
        let mut bvh = Bvh::new();
        let_assert!(Err(BvhError::NotLinked) = bvh.construct(&BuildSettings::default()));
        assert!(!bvh.is_constructed());
        assert!(bvh.nodes_used() == 0);
    }

    #[test]
    fn relinking_resets_tree() {
        let square = unit_square();
        let other = Triangulation::merged(&[&square, &square]);

        let mut bvh = Bvh::build(&other, &BuildSettings::default()).unwrap();
        assert!(bvh.nodes_used() > 0);

        bvh.link(&square);
        assert!(bvh.nodes_used() == 0);
        assert!(bvh.triangle_indices().is_empty());
        assert!(bvh.root_node() == None);
        assert!(!bvh.is_constructed());

        bvh.construct(&BuildSettings::default()).unwrap();
        assert!(bvh.triangle_indices().len() == 2);
    }

    #[test]
    #[should_panic]
    fn accessing_unused_node_panics() {
        let square = unit_square();
        let bvh = Bvh::build(&square, &BuildSettings::default()).unwrap();
        bvh.node(NodeIdx::from_raw(1));
    }
}

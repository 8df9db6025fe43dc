use std::{fmt::Display, io};

use log::info;

use crate::{geometry::WorldPoint, util::Stats};

use super::{Bvh, NodeIdx};

/// Shape summary of a constructed tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BvhStatistics {
    pub node_count: usize,
    pub leaf_count: usize,
    /// Depth of each leaf, root being depth 1.
    pub depth: Stats,
    /// Triangles per leaf.
    pub leaf_triangles: Stats,
}

impl Display for BvhStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Nodes: {} ({} leaves)", self.node_count, self.leaf_count)?;
        writeln!(f, "Depth: {}", self.depth)?;
        write!(f, "Leaf nodes fill: {}", self.leaf_triangles)
    }
}

/// One line of the leaf box debug export.
///
/// Each leaf contributes its 8 box corners followed by 12 faces indexing them,
/// face indices are global over all points exported so far.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ExportRecord {
    Point(WorldPoint),
    Face([usize; 3]),
}

impl Display for ExportRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportRecord::Point(p) => write!(f, "point {} {} {}", p.x, p.y, p.z),
            ExportRecord::Face([a, b, c]) => write!(f, "face {a} {b} {c}"),
        }
    }
}

/// Box faces as corner quads, counter-clockwise seen from outside.
/// Bit `i` of a corner index selects the max coordinate on axis `i`.
const BOX_QUADS: [[usize; 4]; 6] = [
    [0, 2, 3, 1],
    [4, 5, 7, 6],
    [0, 4, 6, 2],
    [1, 3, 7, 5],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
];

impl Bvh<'_> {
    pub fn statistics(&self) -> BvhStatistics {
        let mut ret = BvhStatistics {
            node_count: self.nodes_used as usize,
            ..Default::default()
        };
        if self.nodes_used == 0 {
            return ret;
        }

        let mut stack = vec![(NodeIdx::root(), 1)];
        while let Some((index, depth)) = stack.pop() {
            let node = self.node(index);
            if node.is_leaf() {
                ret.leaf_count += 1;
                ret.depth.add_sample(depth);
                ret.leaf_triangles.add_sample(node.triangle_count() as usize);
            } else {
                stack.extend(node.children().map(|child| (child, depth + 1)));
            }
        }

        ret
    }

    pub fn log_statistics(&self) {
        let stats = self.statistics();
        info!(
            "BVH: {} nodes, {} leaves; depth {}; leaf triangles {}",
            stats.node_count, stats.leaf_count, stats.depth, stats.leaf_triangles
        );
    }

    /// Leaf boxes as a flat point / face list, in node order.
    pub fn leaf_box_records(&self) -> Vec<ExportRecord> {
        let mut ret = Vec::new();
        let mut point_count = 0;

        for node in self.nodes().iter().filter(|node| node.is_leaf()) {
            ret.extend(node.bounds.corners().map(ExportRecord::Point));
            for [a, b, c, d] in BOX_QUADS.map(|quad| quad.map(|i| i + point_count)) {
                ret.push(ExportRecord::Face([a, b, c]));
                ret.push(ExportRecord::Face([a, c, d]));
            }
            point_count += 8;
        }

        ret
    }

    /// Writes [`Self::leaf_box_records`], one per line.
    pub fn write_leaf_boxes(&self, mut writer: impl io::Write) -> io::Result<()> {
        for record in self.leaf_box_records() {
            writeln!(writer, "{record}")?;
        }
        Ok(())
    }
}

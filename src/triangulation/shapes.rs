//! Procedurally generated triangulations.

use itertools::iproduct;

use super::{MeshError, Triangulation};
use crate::geometry::{FloatType, WorldPoint, WorldVector};

impl Triangulation {
    /// Parallelogram spanned by `edge_u` and `edge_v` from `origin`, split into
    /// `cells_u` x `cells_v` cells of two triangles each.
    /// Normals point along `edge_u x edge_v`.
    pub fn rectangle(
        origin: WorldPoint,
        edge_u: WorldVector,
        edge_v: WorldVector,
        cells_u: usize,
        cells_v: usize,
    ) -> Result<Triangulation, MeshError> {
        if cells_u == 0 || cells_v == 0 {
            return Err(MeshError::InvalidShape("cell counts must be at least 1"));
        }

        let row = cells_u + 1;
        let points = iproduct!(0..=cells_v, 0..=cells_u)
            .map(|(j, i)| {
                origin
                    + edge_u * (i as FloatType / cells_u as FloatType)
                    + edge_v * (j as FloatType / cells_v as FloatType)
            })
            .collect();

        let connectivity = iproduct!(0..cells_v, 0..cells_u)
            .flat_map(|(j, i)| {
                let p00 = j * row + i;
                let p10 = p00 + 1;
                let p01 = p00 + row;
                let p11 = p01 + 1;
                [[p00, p10, p11], [p00, p11, p01]]
            })
            .collect();

        Triangulation::new(points, connectivity)
    }

    /// Closed axis aligned box surface with outward normals.
    /// Every face is split into cells of approximately `cell_size` edge length.
    pub fn cuboid(
        min: WorldPoint,
        max: WorldPoint,
        cell_size: FloatType,
    ) -> Result<Triangulation, MeshError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(MeshError::InvalidShape("cell size must be finite and positive"));
        }

        let size = max - min;
        let cells = size.map(|x| ((x / cell_size).round() as usize).max(1));
        let x = WorldVector::x() * size.x;
        let y = WorldVector::y() * size.y;
        let z = WorldVector::z() * size.z;

        let faces = [
            Triangulation::rectangle(min, y, x, cells.y, cells.x)?,
            Triangulation::rectangle(min + z, x, y, cells.x, cells.y)?,
            Triangulation::rectangle(min, x, z, cells.x, cells.z)?,
            Triangulation::rectangle(min + y, z, x, cells.z, cells.x)?,
            Triangulation::rectangle(min, z, y, cells.z, cells.y)?,
            Triangulation::rectangle(min + x, y, z, cells.y, cells.z)?,
        ];

        Ok(Triangulation::merged(&faces.each_ref()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::WorldBox;
    use assert2::{assert, let_assert};
    use test_case::test_case;

    #[test]
    fn rectangle_grid() {
        let mesh = Triangulation::rectangle(
            WorldPoint::new(0.0, 0.0, 10.0),
            WorldVector::new(2.0, 0.0, 0.0),
            WorldVector::new(0.0, 1.0, 0.0),
            4,
            2,
        )
        .unwrap();

        assert!(mesh.len() == 16);
        assert!(mesh.points().len() == 15);
        assert!((mesh.total_area() - 2.0).abs() < 1e-12);
        assert!(mesh.normals().iter().all(|n| (n - WorldVector::z()).norm() < 1e-12));
        assert!(
            mesh.bounding_box()
                == WorldBox::new(WorldPoint::new(0.0, 0.0, 10.0), WorldPoint::new(2.0, 1.0, 10.0))
        );
    }

    #[test]
    fn parallel_edges_are_degenerate() {
        let result = Triangulation::rectangle(
            WorldPoint::origin(),
            WorldVector::x(),
            WorldVector::x() * 2.0,
            1,
            1,
        );
        let_assert!(Err(MeshError::DegenerateElement { .. }) = result);
    }

    #[test_case(0, 2)]
    #[test_case(3, 0)]
    fn zero_cells_are_rejected(cells_u: usize, cells_v: usize) {
        let result = Triangulation::rectangle(
            WorldPoint::origin(),
            WorldVector::x(),
            WorldVector::y(),
            cells_u,
            cells_v,
        );
        let_assert!(Err(MeshError::InvalidShape(_)) = result);
    }

    #[test_case(0.0)]
    #[test_case(-1.0)]
    #[test_case(FloatType::NAN)]
    #[test_case(FloatType::INFINITY)]
    fn bad_cell_size_is_rejected(cell_size: FloatType) {
        let result =
            Triangulation::cuboid(WorldPoint::origin(), WorldPoint::new(1.0, 1.0, 1.0), cell_size);
        let_assert!(Err(MeshError::InvalidShape(_)) = result);
    }

    #[test]
    fn elongated_cuboid() {
        let mesh =
            Triangulation::cuboid(WorldPoint::origin(), WorldPoint::new(1.0, 1.0, 3.0), 1.0).unwrap();

        assert!(mesh.len() == 28);
        assert!((mesh.total_area() - 14.0).abs() < 1e-12);
        assert!(
            mesh.bounding_box() == WorldBox::new(WorldPoint::origin(), WorldPoint::new(1.0, 1.0, 3.0))
        );
    }

    #[test]
    fn cuboid_normals_point_outward() {
        let min = WorldPoint::new(-1.0, 2.0, 0.5);
        let max = WorldPoint::new(3.0, 4.0, 1.5);
        let mesh = Triangulation::cuboid(min, max, 0.5).unwrap();
        let center = nalgebra::center(&min, &max);

        for (centroid, normal) in mesh.centroids().iter().zip(mesh.normals()) {
            assert!((centroid - center).dot(normal) > 0.0);
        }
    }
}

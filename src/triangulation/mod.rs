mod shapes;

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use crate::geometry::{FloatType, Triangle, WorldBox, WorldPoint, WorldVector};

/// Indexed triangle mesh with per-element derived data.
///
/// Centroids, unit normals and areas are computed once at construction.
/// Elements are guaranteed to be non-degenerate and to reference existing points.
#[derive(Clone, Debug, Default)]
pub struct Triangulation {
    points: Vec<WorldPoint>,
    connectivity: Vec<[usize; 3]>,

    centroids: Vec<WorldPoint>,
    normals: Vec<WorldVector>,
    areas: Vec<FloatType>,
}

#[derive(Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("Element {element} references point {point}, but there are only {point_count} points")]
    IndexOutOfRange {
        element: usize,
        point: usize,
        point_count: usize,
    },

    #[error("Element {element} is degenerate (area {area})")]
    DegenerateElement { element: usize, area: FloatType },

    #[error("Invalid shape parameters: {0}")]
    InvalidShape(&'static str),
}

impl Triangulation {
    /// Creates a triangulation from points and 3-index connectivity, validating both.
    pub fn new(
        points: Vec<WorldPoint>,
        connectivity: Vec<[usize; 3]>,
    ) -> Result<Triangulation, MeshError> {
        for (element, indices) in connectivity.iter().enumerate() {
            if let Some(&point) = indices.iter().find(|&&i| i >= points.len()) {
                return Err(MeshError::IndexOutOfRange {
                    element,
                    point,
                    point_count: points.len(),
                });
            }
            let triangle = Triangle::from(indices.map(|i| points[i]));
            if triangle.is_degenerate() {
                return Err(MeshError::DegenerateElement {
                    element,
                    area: triangle.area(),
                });
            }
        }

        Ok(Self::new_unchecked(points, connectivity))
    }

    fn new_unchecked(points: Vec<WorldPoint>, connectivity: Vec<[usize; 3]>) -> Triangulation {
        let mut ret = Triangulation {
            points,
            connectivity,
            ..Default::default()
        };

        let (centroids, (normals, areas)): (Vec<_>, (Vec<_>, Vec<_>)) = ret
            .triangles()
            .map(|t| (t.centroid(), (t.unit_normal(), t.area())))
            .unzip();
        ret.centroids = centroids;
        ret.normals = normals;
        ret.areas = areas;

        ret
    }

    /// Builds a triangulation from free-standing triangles.
    /// Bit-identical vertices are merged into a single point, degenerate triangles are skipped.
    pub fn from_triangles(triangles: impl IntoIterator<Item = Triangle<WorldPoint>>) -> Triangulation {
        let mut points = IndexMap::new();
        let mut connectivity = Vec::new();

        for (i, triangle) in triangles.into_iter().enumerate() {
            if triangle.is_degenerate() {
                debug!("Skipping degenerate triangle {i}: {triangle:?}");
                continue;
            }

            let indices = [0, 1, 2].map(|j| {
                let p = triangle[j];
                let key = p.coords.map(|x| x.to_bits());
                let entry = points.entry((key.x, key.y, key.z));
                let index = entry.index();
                entry.or_insert(p);
                index
            });
            connectivity.push(indices);
        }

        Self::new_unchecked(points.into_values().collect(), connectivity)
    }

    /// Concatenates several triangulations, keeping the element order.
    /// Element `i` of the second mesh becomes element `meshes[0].len() + i`, and so on.
    pub fn merged(meshes: &[&Triangulation]) -> Triangulation {
        let mut ret = Triangulation::default();
        for mesh in meshes {
            let offset = ret.points.len();
            ret.points.extend_from_slice(&mesh.points);
            ret.connectivity.extend(
                mesh.connectivity
                    .iter()
                    .map(|indices| indices.map(|i| i + offset)),
            );
            ret.centroids.extend_from_slice(&mesh.centroids);
            ret.normals.extend_from_slice(&mesh.normals);
            ret.areas.extend_from_slice(&mesh.areas);
        }
        ret
    }

    /// Same surface with all normals pointing the other way.
    pub fn flipped(&self) -> Triangulation {
        Self::new_unchecked(
            self.points.clone(),
            self.connectivity.iter().map(|[a, b, c]| [*a, *c, *b]).collect(),
        )
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.connectivity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectivity.is_empty()
    }

    /// Geometry of the element at `index`. Panics if the index is out of range.
    pub fn triangle(&self, index: usize) -> Triangle<WorldPoint> {
        Triangle::from(self.connectivity[index].map(|i| self.points[i]))
    }

    pub fn triangles(&self) -> impl ExactSizeIterator<Item = Triangle<WorldPoint>> + '_ {
        (0..self.len()).map(|i| self.triangle(i))
    }

    pub fn points(&self) -> &[WorldPoint] {
        &self.points
    }

    pub fn connectivity(&self) -> &[[usize; 3]] {
        &self.connectivity
    }

    pub fn centroids(&self) -> &[WorldPoint] {
        &self.centroids
    }

    pub fn normals(&self) -> &[WorldVector] {
        &self.normals
    }

    pub fn areas(&self) -> &[FloatType] {
        &self.areas
    }

    pub fn total_area(&self) -> FloatType {
        self.areas.iter().sum()
    }

    pub fn bounding_box(&self) -> WorldBox {
        WorldBox::from_points(self.points.iter())
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use assert2::{assert, let_assert};

    /// Unit square in the z=0 plane, split along the diagonal, facing +z.
    pub fn unit_square() -> Triangulation {
        Triangulation::new(
            vec![
                WorldPoint::new(0.0, 0.0, 0.0),
                WorldPoint::new(1.0, 0.0, 0.0),
                WorldPoint::new(1.0, 1.0, 0.0),
                WorldPoint::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn derived_vectors() {
        let mesh = unit_square();
        assert!(mesh.len() == 2);
        assert!(mesh.areas() == [0.5, 0.5]);
        assert!(mesh.total_area() == 1.0);
        assert!(mesh.normals().iter().all(|n| *n == WorldVector::z()));
        assert!(mesh.centroids().len() == 2);
        assert!(mesh.bounding_box() == WorldBox::new(WorldPoint::origin(), WorldPoint::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn triangle_reconstruction() {
        let mesh = unit_square();
        let t = mesh.triangle(1);
        assert!(t[0] == WorldPoint::new(0.0, 0.0, 0.0));
        assert!(t[1] == WorldPoint::new(1.0, 1.0, 0.0));
        assert!(t[2] == WorldPoint::new(0.0, 1.0, 0.0));
        assert!(mesh.centroids()[1] == t.centroid());
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let result = Triangulation::new(vec![WorldPoint::origin(); 3], vec![[0, 1, 3]]);
        let_assert!(Err(MeshError::IndexOutOfRange { element: 0, point: 3, point_count: 3 }) = result);
    }

    #[test]
    fn degenerate_element_is_rejected() {
        let result = Triangulation::new(
            vec![
                WorldPoint::new(0.0, 0.0, 0.0),
                WorldPoint::new(1.0, 0.0, 0.0),
                WorldPoint::new(2.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let_assert!(Err(MeshError::DegenerateElement { element: 0, .. }) = result);
    }

    #[test]
    fn from_triangles_deduplicates_and_filters() {
        let a = WorldPoint::new(0.0, 0.0, 0.0);
        let b = WorldPoint::new(1.0, 0.0, 0.0);
        let c = WorldPoint::new(1.0, 1.0, 0.0);
        let d = WorldPoint::new(0.0, 1.0, 0.0);
        let mesh = Triangulation::from_triangles([
            Triangle::new(a, b, c),
            Triangle::new(a, a, c),
            Triangle::new(a, c, d),
        ]);

        assert!(mesh.len() == 2);
        assert!(mesh.points().len() == 4);
        assert!(mesh.connectivity() == [[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn merging_offsets_indices() {
        let square = unit_square();
        let merged = Triangulation::merged(&[&square, &square.flipped()]);

        assert!(merged.len() == 4);
        assert!(merged.points().len() == 8);
        assert!(merged.connectivity()[2] == [4, 6, 5]);
        assert!(merged.triangle(2) == square.triangle(0).flipped());
        assert!(merged.normals()[3] == -WorldVector::z());
    }

    #[test]
    fn empty_triangulation() {
        let mesh = Triangulation::from_triangles([]);
        assert!(mesh.is_empty());
        assert!(mesh.bounding_box().is_empty());
        assert!(mesh.total_area() == 0.0);
    }
}

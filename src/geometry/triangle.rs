use std::ops::Index;

use num_traits::{One, Zero};

use super::{FloatType, WorldPoint, WorldVector};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle<Point>([Point; 3]);

impl<Point> Triangle<Point> {
    pub fn new(a: Point, b: Point, c: Point) -> Triangle<Point> {
        Triangle([a, b, c])
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item = &'a Point> {
        self.0.iter()
    }

    /// Same vertices, opposite winding.
    pub fn flipped(&self) -> Triangle<Point>
    where
        Point: Clone,
    {
        Triangle([self[0].clone(), self[2].clone(), self[1].clone()])
    }
}

impl<Point> Index<usize> for Triangle<Point> {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<Point> From<[Point; 3]> for Triangle<Point> {
    fn from(value: [Point; 3]) -> Self {
        Triangle(value)
    }
}

impl Triangle<WorldPoint> {
    /// Returns edge vectors, coming from self[0]
    pub fn edges(&self) -> [WorldVector; 2] {
        [self[1] - self[0], self[2] - self[0]]
    }

    /// Returns a normal vector of the triangle, not normalized.
    /// Its length is twice the triangle area.
    pub fn normal(&self) -> WorldVector {
        let [e1, e2] = self.edges();
        e1.cross(&e2)
    }

    /// Normal of unit length, following the counter-clockwise winding.
    /// NaN for degenerate triangles.
    pub fn unit_normal(&self) -> WorldVector {
        let normal = self.normal();
        normal / normal.norm()
    }

    pub fn area(&self) -> FloatType {
        self.normal().norm() / 2.0
    }

    pub fn centroid(&self) -> WorldPoint {
        WorldPoint::from((self[0].coords + self[1].coords + self[2].coords) / 3.0)
    }

    /// Zero-area or non-finite triangles can't produce a usable normal.
    pub fn is_degenerate(&self) -> bool {
        let area = self.area();
        !(area.is_finite() && area > 0.0)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BarycentricCoordinates<T> {
    pub u: T,
    pub v: T,
}

impl<T> BarycentricCoordinates<T>
where
    T: Copy + One + Zero + PartialOrd + std::ops::Sub<Output = T>,
{
    /// Weight of the first vertex.
    pub fn w(&self) -> T {
        T::one() - self.u - self.v
    }

    /// Checks that the coordinates describe a point inside the triangle, with `tolerance` slack
    /// on every edge.
    pub fn is_inside(&self, tolerance: T) -> bool {
        let low = T::zero() - tolerance;
        let high = T::one() + tolerance;
        let in_range = |x: T| x >= low && x <= high;
        in_range(self.u) && in_range(self.v) && in_range(self.u + self.v)
    }
}

impl BarycentricCoordinates<FloatType> {
    pub fn interpolate(&self, triangle: &Triangle<WorldPoint>) -> WorldPoint {
        let [e1, e2] = triangle.edges();
        triangle[0] + e1 * self.u + e2 * self.v
    }
}

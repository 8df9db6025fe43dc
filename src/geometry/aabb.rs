use super::{FloatType, Triangle, WorldPoint, WorldVector};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AABB<Point> {
    pub min: Point,
    pub max: Point,
}

impl<Point> AABB<Point> {
    pub fn new(min: Point, max: Point) -> AABB<Point> {
        AABB { min, max }
    }
}

impl AABB<WorldPoint> {
    /// Box that contains nothing.
    /// Min is at +infinity and max at -infinity, so that growing it by a point
    /// produces a box containing exactly that point and no ray ever hits it.
    pub fn empty() -> Self {
        AABB {
            min: WorldPoint::from(WorldVector::repeat(FloatType::INFINITY)),
            max: WorldPoint::from(WorldVector::repeat(FloatType::NEG_INFINITY)),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a WorldPoint>) -> Self {
        let mut ret = Self::empty();
        for p in points {
            ret.grow_point(p);
        }
        ret
    }

    pub fn is_empty(&self) -> bool {
        self.min.iter().zip(self.max.iter()).any(|(min, max)| min > max)
    }

    pub fn grow_point(&mut self, p: &WorldPoint) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn grow(&mut self, triangle: &Triangle<WorldPoint>) {
        for p in triangle.iter() {
            self.grow_point(p);
        }
    }

    pub fn size(&self) -> WorldVector {
        self.max - self.min
    }

    pub fn center(&self) -> WorldPoint {
        nalgebra::center(&self.min, &self.max)
    }

    /// Total area of the box's six faces.
    /// Empty boxes have zero surface area.
    pub fn surface_area(&self) -> FloatType {
        if self.is_empty() {
            return 0.0;
        }
        let s = self.size();
        2.0 * ((s.x * s.y).abs() + (s.x * s.z).abs() + (s.y * s.z).abs())
    }

    /// Index of the axis with the largest span.
    /// Ties go to the later axis.
    pub fn longest_axis(&self) -> usize {
        let s = self.size();
        let mut axis = 0;
        for i in 1..3 {
            if s[i] >= s[axis] {
                axis = i;
            }
        }
        axis
    }

    pub fn contains_point(&self, p: &WorldPoint) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }

    /// All eight corners, bit `i` of the corner index selecting max along axis `i`.
    pub fn corners(&self) -> [WorldPoint; 8] {
        std::array::from_fn(|corner| {
            WorldPoint::new(
                if corner & 1 == 0 { self.min.x } else { self.max.x },
                if corner & 2 == 0 { self.min.y } else { self.max.y },
                if corner & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }
}

impl Default for AABB<WorldPoint> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::{WorldBox, test::NondegenerateTriangleWrapper};
    use assert2::assert;
    use test_case::test_case;
    use test_strategy::proptest;

    #[test]
    fn empty_box_sentinel() {
        let b = WorldBox::empty();
        assert!(b.is_empty());
        assert!((0..3).all(|i| b.min[i] > b.max[i]));
        assert!(b.surface_area() == 0.0);
        assert!(!b.contains_point(&WorldPoint::origin()));
    }

    #[test]
    fn growing_empty_box_by_point() {
        let mut b = WorldBox::empty();
        let p = WorldPoint::new(1.0, -2.0, 3.0);
        b.grow_point(&p);
        assert!(b.min == p);
        assert!(b.max == p);
        assert!(!b.is_empty());
    }

    #[proptest]
    fn grown_box_contains_triangles(triangles: [NondegenerateTriangleWrapper; 4]) {
        let mut b = WorldBox::empty();
        for t in triangles.iter() {
            b.grow(t);
        }
        for t in triangles.iter() {
            for p in t.iter() {
                assert!(b.contains_point(p));
            }
        }
    }

    #[test]
    fn unit_square_surface_area() {
        let b = WorldBox::new(WorldPoint::new(0.0, 0.0, 0.0), WorldPoint::new(1.0, 1.0, 0.0));
        assert!(b.surface_area() == 2.0);
    }

    #[test]
    fn elongated_box_surface_area() {
        let b = WorldBox::new(WorldPoint::new(0.0, 0.0, 0.0), WorldPoint::new(1.0, 1.0, 3.0));
        assert!(b.surface_area() == 14.0);
    }

    #[test_case(1.0, 1.0, 0.0, 1 ; "square ties to y")]
    #[test_case(1.0, 1.0, 3.0, 2 ; "z longest")]
    #[test_case(2.0, 1.0, 1.0, 0 ; "x longest")]
    #[test_case(1.0, 1.0, 1.0, 2 ; "cube ties to z")]
    #[test_case(2.0, 1.0, 2.0, 2 ; "x z tie")]
    fn longest_axis(sx: FloatType, sy: FloatType, sz: FloatType, expected: usize) {
        let b = WorldBox::new(WorldPoint::origin(), WorldPoint::new(sx, sy, sz));
        assert!(b.longest_axis() == expected);
    }

    #[test]
    fn corners_are_distinct_and_on_box() {
        let b = WorldBox::new(WorldPoint::new(0.0, 0.0, 0.0), WorldPoint::new(1.0, 2.0, 3.0));
        let corners = b.corners();
        for (i, c) in corners.iter().enumerate() {
            assert!(b.contains_point(c));
            for other in &corners[i + 1..] {
                assert!(c != other);
            }
        }
        assert!(corners[0] == b.min);
        assert!(corners[7] == b.max);
    }
}

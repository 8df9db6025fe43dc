use super::{BARYCENTRIC_EPSILON, BarycentricCoordinates, FloatType, Ray, Triangle, WorldPoint};

impl Triangle<WorldPoint> {
    /// Calculates ray intersection with the (two sided) triangle.
    /// Returns distance along the ray and barycentric uv coordinates of hits in `(0, ray.t_max)`.
    /// Barycentric bounds are checked with `BARYCENTRIC_EPSILON` slack, so rays through
    /// edges and vertices are not lost to rounding.
    /// Adapted from https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm#Rust_implementation
    pub fn intersect(&self, ray: &Ray) -> Option<(FloatType, BarycentricCoordinates<FloatType>)> {
        let [e1, e2] = self.edges();

        let ray_cross_e2 = ray.direction.cross(&e2);
        let det = e1.dot(&ray_cross_e2);

        // No explicit parallel check: a zero determinant makes the coordinates NaN or infinite
        // and the range checks below reject them.
        let inv_det = 1.0 / det;
        let s = ray.origin - self[0];
        let u = inv_det * s.dot(&ray_cross_e2);

        let s_cross_e1 = s.cross(&e1);
        let v = inv_det * ray.direction.dot(&s_cross_e1);

        let uv = BarycentricCoordinates { u, v };
        if !uv.is_inside(BARYCENTRIC_EPSILON) {
            return None;
        }

        let t = inv_det * e2.dot(&s_cross_e1);
        if t > 0.0 && t < ray.t_max {
            Some((t, uv))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::{
        WorldVector,
        test::{NondegenerateTriangleWrapper, WorldPointWrapper},
    };
    use assert2::{assert, let_assert};
    use test_case::test_case;
    use test_strategy::proptest;

    fn unit_triangle_at(z: FloatType) -> Triangle<WorldPoint> {
        Triangle::new(
            WorldPoint::new(0.0, 0.0, z),
            WorldPoint::new(1.0, 0.0, z),
            WorldPoint::new(0.0, 1.0, z),
        )
    }

    fn vertical_ray(x: FloatType, y: FloatType) -> Ray {
        Ray::new(WorldPoint::new(x, y, 0.0), WorldVector::new(0.0, 0.0, 1.0))
    }

    #[test]
    fn direct_hit() {
        let_assert!(Some((t, uv)) = unit_triangle_at(5.0).intersect(&vertical_ray(0.25, 0.25)));
        assert!((t - 5.0).abs() < 1e-12);
        assert!((uv.u - 0.25).abs() < 1e-12);
        assert!((uv.v - 0.25).abs() < 1e-12);
    }

    #[test]
    fn hit_from_behind() {
        let ray = Ray::new(WorldPoint::new(0.25, 0.25, 10.0), WorldVector::new(0.0, 0.0, -1.0));
        let_assert!(Some((t, _)) = unit_triangle_at(5.0).intersect(&ray));
        assert!((t - 5.0).abs() < 1e-12);
    }

    #[test_case(0.0, 0.5 ; "u zero edge")]
    #[test_case(0.5, 0.0 ; "v zero edge")]
    #[test_case(0.5, 0.5 ; "hypotenuse")]
    #[test_case(0.0, 0.0 ; "vertex")]
    #[test_case(1.0, 0.0 ; "far vertex")]
    fn edge_hits_are_accepted(x: FloatType, y: FloatType) {
        assert!(unit_triangle_at(5.0).intersect(&vertical_ray(x, y)).is_some());
    }

    #[test_case(2.0, 2.0 ; "far outside")]
    #[test_case(-0.5, 0.5 ; "negative u")]
    #[test_case(0.5, -0.5 ; "negative v")]
    #[test_case(0.6, 0.6 ; "beyond hypotenuse")]
    fn misses_outside_footprint(x: FloatType, y: FloatType) {
        assert!(unit_triangle_at(5.0).intersect(&vertical_ray(x, y)) == None);
    }

    #[test]
    fn triangle_behind_origin_misses() {
        assert!(unit_triangle_at(-5.0).intersect(&vertical_ray(0.25, 0.25)) == None);
    }

    #[test]
    fn triangle_beyond_t_max_misses() {
        let ray = vertical_ray(0.25, 0.25);
        assert!(unit_triangle_at(5.0).intersect(&ray.with_t_max(4.0)) == None);
        assert!(unit_triangle_at(5.0).intersect(&ray.with_t_max(6.0)).is_some());
    }

    #[test]
    fn parallel_ray_misses() {
        let ray = Ray::new(WorldPoint::new(-1.0, 0.25, 5.0), WorldVector::new(1.0, 0.0, 0.0));
        assert!(unit_triangle_at(5.0).intersect(&ray) == None);
    }

    #[proptest]
    fn ray_toward_interior_point_hits(
        triangle: NondegenerateTriangleWrapper,
        origin: WorldPointWrapper,
        #[strategy(0.05f64..0.9f64)] u: f64,
        #[strategy(0.05f64..0.9f64)] v_fraction: f64,
    ) {
        let v = (1.0 - u) * v_fraction;
        let target = BarycentricCoordinates { u, v }.interpolate(&triangle);
        let distance = (target - *origin).norm();
        proptest::prop_assume!(distance > 1e-3);
        // Rays nearly parallel to the triangle plane are numerically fragile
        let direction = (target - *origin) / distance;
        proptest::prop_assume!(direction.dot(&triangle.unit_normal()).abs() > 0.1);

        let ray = Ray::new(*origin, target - *origin);
        let_assert!(Some((t, uv)) = triangle.intersect(&ray));
        assert!((t - distance).abs() < 1e-6 * distance.max(1.0));
        assert!((uv.u - u).abs() < 1e-3);
        assert!((uv.v - v).abs() < 1e-3);
    }
}

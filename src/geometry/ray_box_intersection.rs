use super::{FloatType, Ray, WorldBox};

impl WorldBox {
    /// Calculates entry and exit distances of the ray's line through the box slabs.
    /// The box is crossed if entry <= exit, distances are not limited by the ray extent.
    pub fn slab_distances(&self, ray: &Ray) -> (FloatType, FloatType) {
        let mut t_min = FloatType::NEG_INFINITY;
        let mut t_max = FloatType::INFINITY;

        for axis in 0..3 {
            let inv_direction = ray.inv_direction[axis];
            // Near and far planes are picked by the direction sign, not by comparing distances.
            // For an empty box (min > max) this yields an inverted interval on every axis.
            let (near_plane, far_plane) = if inv_direction.is_sign_negative() {
                (self.max[axis], self.min[axis])
            } else {
                (self.min[axis], self.max[axis])
            };

            // The product is NaN if the ray starts on a slab bounding plane and is parallel to it.
            // Such ray stays inside the slab for its whole length, so the slab range becomes infinite.
            let mut near = (near_plane - ray.origin[axis]) * inv_direction;
            let mut far = (far_plane - ray.origin[axis]) * inv_direction;
            if near.is_nan() {
                near = FloatType::NEG_INFINITY;
            }
            if far.is_nan() {
                far = FloatType::INFINITY;
            }

            t_min = t_min.max(near);
            t_max = t_max.min(far);
        }

        (t_min, t_max)
    }

    /// Slab test against the ray, limited to `(0, ray.t_max)`.
    /// Returns the distance where the ray enters the box (negative if the origin is inside).
    pub fn intersect(&self, ray: &Ray) -> Option<FloatType> {
        let (t_min, t_max) = self.slab_distances(ray);
        if t_max >= t_min && t_min < ray.t_max && t_max > 0.0 {
            Some(t_min)
        } else {
            None
        }
    }
}

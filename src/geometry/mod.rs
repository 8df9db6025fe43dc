mod aabb;
mod ray_box_intersection;
mod ray_triangle_intersection;
mod triangle;

pub use aabb::AABB;
pub use triangle::{BarycentricCoordinates, Triangle};

pub type FloatType = f64;
pub type WorldPoint = nalgebra::Point3<FloatType>;
pub type WorldVector = nalgebra::Vector3<FloatType>;
pub type WorldBox = AABB<WorldPoint>;

/// Tolerance on barycentric coordinates in ray-triangle intersection.
/// Rays grazing an edge or a vertex still count as hits.
pub const BARYCENTRIC_EPSILON: FloatType = 1e-3;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Normalized direction of the ray
    pub direction: WorldVector,

    /// Componentwise inverse of the ray direction.
    /// Zero components become infinities with the sign of the zero.
    pub inv_direction: WorldVector,

    /// Maximum distance along the ray that is still of interest.
    /// Intersections tighten this value.
    pub t_max: FloatType,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        let direction = direction.normalize();
        let inv_direction = direction.map(|x| 1.0 / x);

        Ray {
            origin,
            direction,
            inv_direction,
            t_max: FloatType::INFINITY,
        }
    }

    /// Ray from `origin` pointing at `target`, limited to their distance.
    pub fn segment(origin: WorldPoint, target: WorldPoint) -> Ray {
        let offset = target - origin;
        Ray::new(origin, offset).with_t_max(offset.norm())
    }

    pub fn with_t_max(self, t_max: FloatType) -> Ray {
        Ray { t_max, ..self }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction * distance
    }
}

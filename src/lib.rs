pub mod bvh;
pub mod geometry;
pub mod triangulation;
mod util;
pub mod visibility;

pub use bvh::{BuildSettings, Bvh, BvhError};
pub use triangulation::{MeshError, Triangulation};
pub use util::Stats;
pub use visibility::{
    Progress, SelfIntersection, Visibility, VisibilityConfig, VisibilityError, WorkerCount,
    compute_visibility,
};

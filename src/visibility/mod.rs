//! Pairwise element visibility between an emitter and a receiver surface.
//!
//! Every emitter/receiver element pair is first filtered by back-face culling and then by a
//! shadow ray between the element centroids, cast against a BVH over the blocking geometry.

mod machinery;
mod worker;

use std::num::NonZeroUsize;

use thiserror::Error;

use crate::{
    bvh::{BuildSettings, BvhError},
    geometry::{FloatType, WorldPoint, WorldVector},
};

pub use machinery::{Progress, compute_visibility};

/// Which of the two surfaces take part in blocking, in addition to any extra blocker mesh.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SelfIntersection {
    #[default]
    None,
    Emitter,
    Receiver,
    Both,
}

impl SelfIntersection {
    pub fn includes_emitter(self) -> bool {
        matches!(self, SelfIntersection::Emitter | SelfIntersection::Both)
    }

    pub fn includes_receiver(self) -> bool {
        matches!(self, SelfIntersection::Receiver | SelfIntersection::Both)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WorkerCount {
    /// One worker per logical CPU.
    #[default]
    Auto,
    Fixed(NonZeroUsize),
}

impl WorkerCount {
    pub fn get(self) -> usize {
        match self {
            WorkerCount::Auto => num_cpus::get().max(1),
            WorkerCount::Fixed(n) => n.get(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, bon::Builder)]
pub struct VisibilityConfig {
    #[builder(default)]
    pub bvh: BuildSettings,

    #[builder(default)]
    pub self_intersection: SelfIntersection,

    /// Skip pairs whose elements don't face each other.
    #[builder(default = true)]
    pub back_face_culling: bool,

    /// Fraction of the centroid distance cut off at both ends of a shadow ray,
    /// so that the emitting and receiving elements never block themselves.
    #[builder(default = 1e-6)]
    pub shadow_ray_tolerance: FloatType,

    #[builder(default)]
    pub worker_count: WorkerCount,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl VisibilityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bvh.validate()?;
        if !(0.0..0.5).contains(&self.shadow_ray_tolerance) {
            return Err(ConfigError::ShadowRayTolerance(self.shadow_ray_tolerance));
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error(transparent)]
    BuildSettings(#[from] BvhError),

    #[error("Shadow ray tolerance must be in [0, 0.5), got {0}")]
    ShadowRayTolerance(FloatType),
}

#[derive(Debug, Error)]
pub enum VisibilityError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build BVH over the blocking geometry: {0}")]
    Bvh(#[from] BvhError),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Back-face culling predicate.
/// True if each element lies strictly in front of the other one.
pub fn faces_each_other(
    emitter_centroid: &WorldPoint,
    emitter_normal: &WorldVector,
    receiver_centroid: &WorldPoint,
    receiver_normal: &WorldVector,
) -> bool {
    let d = receiver_centroid - emitter_centroid;
    emitter_normal.dot(&d) > 0.0 && receiver_normal.dot(&d) < 0.0
}

/// Outcome of [`compute_visibility`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Visibility {
    /// Sorted indices of the receiver elements visible from each emitter element.
    pub visible_receivers: Vec<Vec<usize>>,
    /// Pairs with identical centroids, never visible.
    pub coincident: usize,
    /// Pairs rejected by back-face culling.
    pub culled: usize,
    /// Pairs with an obstructed shadow ray.
    pub blocked: usize,
    /// Surviving pairs.
    pub visible: usize,
}

impl Visibility {
    pub fn is_visible(&self, emitter: usize, receiver: usize) -> bool {
        self.visible_receivers[emitter].binary_search(&receiver).is_ok()
    }

    /// Number of emitter/receiver pairs looked at.
    pub fn pair_count(&self) -> usize {
        self.coincident + self.culled + self.blocked + self.visible
    }
}

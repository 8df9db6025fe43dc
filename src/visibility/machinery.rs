use std::{
    panic,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use log::{debug, info, warn};

use crate::{
    bvh::{Bvh, StackCache},
    geometry::WorldPoint,
    triangulation::Triangulation,
    visibility::{Visibility, VisibilityConfig, VisibilityError, worker::Worker},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Emitter elements processed so far.
    pub finished: usize,
    pub total: usize,
}

/// Determines which receiver elements each emitter element sees.
///
/// Blocking geometry is the optional `blockers` mesh, plus the emitter and receiver surfaces
/// as selected by `config.self_intersection`.
/// Emitter elements are distributed over worker threads, `progress_callback` is called from
/// the workers after each finished emitter element.
pub fn compute_visibility<F: Fn(Progress) + Sync>(
    emitter: &Triangulation,
    receiver: &Triangulation,
    blockers: Option<&Triangulation>,
    config: &VisibilityConfig,
    progress_callback: F,
) -> Result<Visibility, VisibilityError> {
    config.validate()?;

    let mut blocking_parts = Vec::new();
    if config.self_intersection.includes_emitter() {
        blocking_parts.push(emitter);
    }
    if config.self_intersection.includes_receiver() {
        blocking_parts.push(receiver);
    }
    if let Some(blockers) = blockers {
        if blockers.is_empty() {
            warn!("Blocking triangulation is empty");
        }
        blocking_parts.push(blockers);
    }
    let blocking = Triangulation::merged(&blocking_parts);

    let bvh = if blocking.is_empty() {
        debug!("No blocking geometry, shadow rays are skipped");
        None
    } else {
        let bvh = Bvh::build(&blocking, &config.bvh)?;
        bvh.log_statistics();
        Some(bvh)
    };

    let state = VisibilityState {
        emitter,
        receiver,
        bvh: bvh.as_ref(),
        config,
        next_emitter_index: AtomicUsize::new(0),
        finished_count: AtomicUsize::new(0),
    };

    let worker_count = config.worker_count.get().min(emitter.len()).max(1);
    let cores = core_affinity::get_core_ids().unwrap_or_default();
    if cores.is_empty() {
        debug!("CPU list not available, worker threads will not be pinned");
    }
    info!(
        "Computing visibility of {} x {} elements on {} workers",
        emitter.len(),
        receiver.len(),
        worker_count
    );

    let outputs = thread::scope(|scope| -> Result<Vec<_>, VisibilityError> {
        let threads = (0..worker_count)
            .map(|worker_id| {
                let state = &state;
                let progress_callback = &progress_callback;
                let core = (!cores.is_empty()).then(|| cores[worker_id % cores.len()]);

                thread::Builder::new()
                    .name(format!("worker{worker_id}"))
                    .spawn_scoped(scope, move || {
                        if let Some(core) = core {
                            core_affinity::set_for_current(core);
                        }

                        let mut worker = Worker::new(worker_id);
                        while let Some(emitter_index) = state.get_next_emitter() {
                            worker.process_emitter(state, emitter_index);

                            let finished = state.finished_count.fetch_add(1, Ordering::AcqRel) + 1;
                            (progress_callback)(Progress {
                                finished,
                                total: state.emitter.len(),
                            });
                        }
                        worker.into_output()
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(threads
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect())
    })?;

    let mut ret = Visibility {
        visible_receivers: vec![Vec::new(); emitter.len()],
        ..Default::default()
    };
    for output in outputs {
        ret.coincident += output.coincident;
        ret.culled += output.culled;
        ret.blocked += output.blocked;
        ret.visible += output.visible;
        for (emitter_index, visible) in output.rows {
            ret.visible_receivers[emitter_index] = visible;
        }
    }

    debug!(
        "Visibility done: {} visible, {} blocked, {} culled",
        ret.visible, ret.blocked, ret.culled
    );

    Ok(ret)
}

/// Everything the workers share.
pub(super) struct VisibilityState<'a> {
    pub emitter: &'a Triangulation,
    pub receiver: &'a Triangulation,
    pub bvh: Option<&'a Bvh<'a>>,
    pub config: &'a VisibilityConfig,

    next_emitter_index: AtomicUsize,
    finished_count: AtomicUsize,
}

impl VisibilityState<'_> {
    fn get_next_emitter(&self) -> Option<usize> {
        let id = self.next_emitter_index.fetch_add(1, Ordering::AcqRel);
        (id < self.emitter.len()).then_some(id)
    }

    /// Casts a shadow ray between two centroids, trimmed at both ends by the configured tolerance.
    pub fn is_blocked(&self, from: &WorldPoint, to: &WorldPoint, stack: &mut StackCache) -> bool {
        let Some(bvh) = self.bvh else {
            return false;
        };

        let d = to - from;
        let distance = d.norm();
        if distance == 0.0 {
            return false;
        }

        let tolerance = self.config.shadow_ray_tolerance;
        bvh.is_blocked(
            from + d * tolerance,
            *to,
            distance * (1.0 - 2.0 * tolerance),
            stack,
        )
    }
}

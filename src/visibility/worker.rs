use crate::{bvh::StackCache, visibility::faces_each_other};

use super::machinery::VisibilityState;

/// Per-thread state of the visibility computation.
pub(super) struct Worker {
    bvh_stack_cache: StackCache,
    output: WorkerOutput,
}

/// Results collected by a single worker.
#[derive(Debug, Default)]
pub(super) struct WorkerOutput {
    /// Emitter index and its visible receivers, in processing order.
    pub rows: Vec<(usize, Vec<usize>)>,
    pub coincident: usize,
    pub culled: usize,
    pub blocked: usize,
    pub visible: usize,
}

impl Worker {
    pub fn new(_worker_id: usize) -> Self {
        Self {
            bvh_stack_cache: Default::default(),
            output: Default::default(),
        }
    }

    pub fn process_emitter(&mut self, state: &VisibilityState, emitter_index: usize) {
        let emitter_centroid = &state.emitter.centroids()[emitter_index];
        let emitter_normal = &state.emitter.normals()[emitter_index];

        let mut visible = Vec::new();
        for (receiver_index, (receiver_centroid, receiver_normal)) in state
            .receiver
            .centroids()
            .iter()
            .zip(state.receiver.normals())
            .enumerate()
        {
            if receiver_centroid == emitter_centroid {
                self.output.coincident += 1;
                continue;
            }

            if state.config.back_face_culling
                && !faces_each_other(
                    emitter_centroid,
                    emitter_normal,
                    receiver_centroid,
                    receiver_normal,
                )
            {
                self.output.culled += 1;
                continue;
            }

            if state.is_blocked(emitter_centroid, receiver_centroid, &mut self.bvh_stack_cache) {
                self.output.blocked += 1;
                continue;
            }

            visible.push(receiver_index);
        }

        self.output.visible += visible.len();
        self.output.rows.push((emitter_index, visible));
    }

    pub fn into_output(self) -> WorkerOutput {
        self.output
    }
}

//! Open stream handle

use crate::state_machine::Generation;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One open producer-to-consumer channel. Dropping the handle cancels the
/// task driving it.
pub(crate) struct StreamHandle {
    generation: Generation,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl StreamHandle {
    pub(crate) fn new(generation: Generation, cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            generation,
            cancel,
            task,
        }
    }

    pub(crate) fn generation(&self) -> Generation {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the stream task. Deliveries it already queued are left for the
    /// generation check to discard.
    pub(crate) fn close(self) {
        tracing::debug!(
            generation = %self.generation,
            finished = self.task.is_finished(),
            "Closing reply stream"
        );
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

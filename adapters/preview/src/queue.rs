use std::{
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread::{self, JoinHandle},
};

use sector_atlas_core::{Footprint, SectorId};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{PreviewImage, PreviewRenderer, PreviewStore};

/// Failures raised by the preview worker.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// The worker thread could not be started.
    #[error("failed to spawn the preview worker: {reason}")]
    ThreadSpawnFailed {
        /// Reason reported by the operating system.
        reason: String,
    },
    /// The worker thread stopped while renders were still pending.
    #[error("the preview worker stopped with {pending} render(s) pending")]
    WorkerStopped {
        /// Renders that will never complete.
        pending: usize,
    },
}

struct RenderJob {
    sector: SectorId,
    footprint: Footprint,
    generation: u64,
}

struct Rendered {
    sector: SectorId,
    generation: u64,
    image: PreviewImage,
}

/// Renders previews on a dedicated worker thread.
///
/// Finished images are handed back to the caller's thread through
/// [`GraphicsQueue::drain`] or [`GraphicsQueue::wait_idle`]. Images requested
/// before the store's last clear, or for a sector the store has retired, are
/// discarded on arrival.
pub struct GraphicsQueue {
    jobs: Option<Sender<RenderJob>>,
    finished: Receiver<Rendered>,
    worker: Option<JoinHandle<()>>,
    pending: usize,
}

impl GraphicsQueue {
    /// Starts the worker thread owning `renderer`.
    pub fn new(renderer: PreviewRenderer) -> Result<Self, PreviewError> {
        let (jobs_tx, jobs_rx) = mpsc::channel::<RenderJob>();
        let (finished_tx, finished_rx) = mpsc::channel::<Rendered>();

        let worker = thread::Builder::new()
            .name("sector-atlas-preview".to_owned())
            .spawn(move || {
                for job in jobs_rx {
                    let image = renderer.render(job.footprint);
                    trace!(sector = job.sector.get(), "preview rendered");
                    let rendered = Rendered {
                        sector: job.sector,
                        generation: job.generation,
                        image,
                    };
                    if finished_tx.send(rendered).is_err() {
                        break;
                    }
                }
            })
            .map_err(|err| PreviewError::ThreadSpawnFailed {
                reason: err.to_string(),
            })?;

        Ok(Self {
            jobs: Some(jobs_tx),
            finished: finished_rx,
            worker: Some(worker),
            pending: 0,
        })
    }

    /// Queues a render of `footprint` tagged with the store generation.
    pub fn submit(&mut self, sector: SectorId, footprint: Footprint, generation: u64) {
        let Some(jobs) = &self.jobs else {
            return;
        };
        let job = RenderJob {
            sector,
            footprint,
            generation,
        };
        if jobs.send(job).is_ok() {
            self.pending += 1;
        }
    }

    /// Renders that have been submitted but not yet collected.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }

    /// Moves every finished image into `store` without blocking.
    ///
    /// Returns the number of images stored.
    pub fn drain(&mut self, store: &mut PreviewStore) -> usize {
        let mut stored = 0;
        loop {
            match self.finished.try_recv() {
                Ok(rendered) => {
                    self.pending = self.pending.saturating_sub(1);
                    if self.accept(store, rendered) {
                        stored += 1;
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return stored,
            }
        }
    }

    /// Blocks until every submitted render has been collected into `store`.
    ///
    /// Returns the number of images stored.
    pub fn wait_idle(&mut self, store: &mut PreviewStore) -> Result<usize, PreviewError> {
        let mut stored = 0;
        while self.pending > 0 {
            let rendered = self
                .finished
                .recv()
                .map_err(|_| PreviewError::WorkerStopped {
                    pending: self.pending,
                })?;
            self.pending -= 1;
            if self.accept(store, rendered) {
                stored += 1;
            }
        }
        Ok(stored)
    }

    fn accept(&self, store: &mut PreviewStore, rendered: Rendered) -> bool {
        if rendered.generation != store.generation() {
            debug!(sector = rendered.sector.get(), "discarding stale preview");
            return false;
        }
        if store.is_retired(rendered.sector) {
            debug!(sector = rendered.sector.get(), "discarding preview of a retired sector");
            return false;
        }
        let _ = store.insert(rendered.sector, rendered.image);
        true
    }
}

impl Drop for GraphicsQueue {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

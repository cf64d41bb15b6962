//! Worker side of the shadow pipeline.
//!
//! Every submitted job runs on the tokio blocking pool and posts its bitmap
//! to a crossbeam channel owned by the display thread. Jobs are independent:
//! a new submission neither waits for nor cancels the ones in flight, so
//! completions arrive in whatever order the renders finish.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crossbeam_channel::Sender;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::events::{BlurJob, ShadowRendered};
use crate::processing::shadow::ShadowRenderer;

pub struct BlurWorker {
    runtime: Handle,
    renderer: Arc<dyn ShadowRenderer>,
    completions: Sender<ShadowRendered>,
    in_flight: Arc<AtomicUsize>,
}

impl BlurWorker {
    pub fn new(
        runtime: Handle,
        renderer: Arc<dyn ShadowRenderer>,
        completions: Sender<ShadowRendered>,
    ) -> Self {
        Self {
            runtime,
            renderer,
            completions,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Starts rendering `job` and returns immediately.
    ///
    /// `alive` is the owner's validity flag: once cancelled, the job skips
    /// its work or its delivery, whichever comes next.
    pub fn submit(&self, job: BlurJob, alive: CancellationToken) {
        let renderer = Arc::clone(&self.renderer);
        let completions = self.completions.clone();
        let guard = InFlight::enter(Arc::clone(&self.in_flight));
        self.runtime.spawn_blocking(move || {
            let _guard = guard;
            run_job(renderer.as_ref(), job, &alive, &completions);
        });
    }

    /// Jobs submitted but not yet finished or abandoned.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

fn run_job(
    renderer: &dyn ShadowRenderer,
    job: BlurJob,
    alive: &CancellationToken,
    completions: &Sender<ShadowRendered>,
) {
    let generation = job.generation;
    if alive.is_cancelled() {
        trace!(generation, "owner gone before shadow render started");
        return;
    }

    let started = Instant::now();
    let image = match renderer.render(&job) {
        Ok(image) => image,
        Err(err) => {
            debug!(generation, error = %err, "shadow render aborted");
            return;
        }
    };

    if alive.is_cancelled() {
        trace!(generation, "owner gone; dropping rendered shadow");
        return;
    }
    debug!(
        generation,
        width = image.width(),
        height = image.height(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "shadow rendered"
    );
    if completions
        .send(ShadowRendered {
            generation,
            image: Arc::new(image),
        })
        .is_err()
    {
        trace!(generation, "display side closed");
    }
}

/// Counts a job as in flight until dropped, panics included.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

//! Background execution on a Rayon worker pool.
//!
//! Every operation blocks its caller for the full run. [`Executor`] moves
//! that work off the calling (UI) thread: a submitted buffer and pipeline
//! travel into the pool by value, and the caller gets a [`Job`] handle it
//! can cancel or wait on. Row-parallel operations running inside a job use
//! the executor's own pool, so several executors do not compete for one
//! global pool.
//!
//! # Example
//!
//! ```rust
//! use xray_core::PixelBuffer;
//! use xray_ops::{Executor, Operation, Pipeline};
//!
//! let exec = Executor::new(2).unwrap();
//! let pipeline = Pipeline::new().then(Operation::Invert);
//!
//! let job = exec.submit(PixelBuffer::filled(32, 32, [10, 20, 30, 255]), pipeline);
//! let out = job.wait().unwrap();
//! assert_eq!(out.pixel(0, 0).unwrap(), [245, 235, 225, 255]);
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace, warn};
use xray_core::PixelBuffer;

use crate::{CancelToken, OpsError, OpsResult, Pipeline};

/// Worker pool that runs pipelines in the background.
pub struct Executor {
    pool: ThreadPool,
}

impl Executor {
    /// Creates a pool with `threads` workers; `0` lets Rayon choose.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::ThreadPool`] if the threads cannot be spawned.
    pub fn new(threads: usize) -> OpsResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("xray-worker-{i}"))
            .build()
            .map_err(|e| OpsError::ThreadPool(e.to_string()))?;
        debug!(threads = pool.current_num_threads(), "Created executor");
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queues `pipeline` on `buffer` and returns immediately.
    pub fn submit(&self, buffer: PixelBuffer, pipeline: Pipeline) -> Job {
        trace!(
            width = buffer.width(),
            height = buffer.height(),
            steps = pipeline.len(),
            "submit"
        );
        self.submit_fn(move |token| pipeline.run_cancellable(&buffer, token))
    }

    /// Queues an arbitrary buffer-producing closure.
    ///
    /// The closure receives the job's cancellation token. A panic inside it
    /// is caught on the worker and reported as [`OpsError::WorkerPanicked`]
    /// instead of tearing down the pool.
    pub fn submit_fn<F>(&self, work: F) -> Job
    where
        F: FnOnce(&CancelToken) -> OpsResult<PixelBuffer> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let token = cancel.clone();

        self.pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| work(&token)))
                .unwrap_or_else(|payload| {
                    let msg = panic_message(payload.as_ref());
                    warn!(%msg, "job panicked");
                    Err(OpsError::WorkerPanicked(msg))
                });
            if let Err(OpsError::Cancelled) = &result {
                debug!("job cancelled");
            }
            // receiver may have been dropped; nobody is waiting then
            let _ = tx.send(result);
        });

        Job { cancel, rx }
    }

    /// Runs `pipeline` on this pool and blocks until it finishes.
    pub fn run(&self, buffer: &PixelBuffer, pipeline: &Pipeline) -> OpsResult<PixelBuffer> {
        self.pool.install(|| pipeline.run(buffer))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("threads", &self.threads())
            .finish()
    }
}

/// Handle to a submitted pipeline run.
///
/// Dropping the handle does not stop the job; call [`Job::cancel`] first.
#[derive(Debug)]
pub struct Job {
    cancel: CancelToken,
    rx: Receiver<OpsResult<PixelBuffer>>,
}

impl Job {
    /// Requests cancellation. The job stops at its next row or step boundary
    /// and [`wait`](Self::wait) returns [`OpsError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token shared with the running job.
    pub fn token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Blocks until the job finishes.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's error, [`OpsError::WorkerPanicked`] if the
    /// job panicked, or [`OpsError::WorkerDisconnected`] if the worker went
    /// away without sending anything.
    pub fn wait(self) -> OpsResult<PixelBuffer> {
        self.rx.recv().map_err(|_| OpsError::WorkerDisconnected)?
    }

    /// Returns the result if the job has finished, without blocking.
    pub fn try_result(&self) -> Option<OpsResult<PixelBuffer>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(OpsError::WorkerDisconnected)),
        }
    }
}

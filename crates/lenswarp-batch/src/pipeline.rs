//! Bounded-parallel batch pipeline.
//!
//! A fixed number of worker threads share one FIFO queue. Each worker takes
//! one item through decode, reprojection, colour and encode, and only then
//! takes the next; items never share buffers. Errors and panics are caught
//! at the item boundary, so one bad frame never stops the batch.
//!
//! ```text
//! submit(path) --> [ FIFO queue ] --> worker 1 --+
//!                                 --> worker 2 --+--> mpsc --> shutdown() --> BatchSummary
//!                                 --> worker N --+
//! ```
//!
//! Workers are plain threads, not rayon workers. Reprojection still splits
//! rows over the rayon pool, and a non-rayon thread blocks while it waits
//! for those rows instead of stealing queued work, so at most N items are
//! ever in flight.

use crate::codec::Codec;
use crate::inputs::output_path;
use crate::state::{ItemReport, ItemState, Outcome, Tracker};
use crate::{BatchError, BatchResult};
use lenswarp_core::LensModel;
use lenswarp_io::Format;
use lenswarp_ops::{ColorProcessor, Reprojector};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, trace};

/// Settings shared by every item of a batch.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Lens the input images were captured with.
    pub input_lens: LensModel,
    /// Target lens, scale and sampling quality.
    pub reprojector: Reprojector,
    /// Exposure and tonemapping.
    pub color: ColorProcessor,
    /// Directory the outputs are written to.
    pub output_dir: PathBuf,
    /// Output formats; one file per format and item.
    pub formats: Vec<Format>,
    /// Skip items whose outputs all exist already.
    pub skip_if_exists: bool,
    /// Number of worker threads (0 is treated as 1).
    pub parallelism: usize,
}

impl BatchConfig {
    /// Config writing EXR files to `output_dir` with pass-through
    /// reprojection, no colour processing and one worker per CPU.
    pub fn new(input_lens: LensModel, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_lens,
            reprojector: Reprojector::default(),
            color: ColorProcessor::default(),
            output_dir: output_dir.into(),
            formats: vec![Format::Exr],
            skip_if_exists: false,
            parallelism: std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }

    /// Output paths for `input`, one per requested format.
    pub fn outputs_for(&self, input: &Path) -> Vec<PathBuf> {
        self.formats
            .iter()
            .map(|&f| output_path(&self.output_dir, input, f))
            .collect()
    }
}

/// Aggregated result of a batch.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Items submitted.
    pub submitted: usize,
    /// Items processed to completion (excluding skipped).
    pub done: usize,
    /// Items skipped because their outputs existed.
    pub skipped: usize,
    /// Items that failed.
    pub failed: usize,
    /// Final value of the shared progress counter (`done + skipped`).
    pub completed: usize,
    /// One report per item, in completion order.
    pub reports: Vec<ItemReport>,
}

impl BatchSummary {
    /// Returns `true` if no item failed.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Reports of failed items.
    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.reports.iter().filter(|r| !r.is_done())
    }
}

/// Per-batch state shared with the workers.
struct Worker<C> {
    config: BatchConfig,
    codec: C,
    /// Incremented once per finished or skipped item.
    completed: AtomicUsize,
}

/// Fixed set of worker threads, each processing one image at a time.
///
/// # Example
///
/// ```rust,no_run
/// use lenswarp_batch::{BatchConfig, BatchPipeline, FileCodec};
/// use lenswarp_core::LensModel;
///
/// let lens = LensModel::fisheye_equidistant(36.0, 36.0, std::f64::consts::PI).unwrap();
/// let mut config = BatchConfig::new(lens, "out");
/// config.parallelism = 4;
///
/// let mut pipeline = BatchPipeline::new(config, FileCodec).unwrap();
/// pipeline.submit("frames/0001.exr");
/// pipeline.submit("frames/0002.exr");
/// let summary = pipeline.shutdown();
/// assert_eq!(summary.submitted, 2);
/// ```
pub struct BatchPipeline<C: Codec + 'static> {
    worker: Arc<Worker<C>>,
    queue: Sender<PathBuf>,
    reports: Receiver<ItemReport>,
    threads: Vec<JoinHandle<()>>,
    submitted: usize,
}

impl<C: Codec + 'static> BatchPipeline<C> {
    /// Starts `config.parallelism` worker threads (at least one).
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Io`] if a thread cannot be spawned.
    pub fn new(config: BatchConfig, codec: C) -> BatchResult<Self> {
        let width = config.parallelism.max(1);
        let worker = Arc::new(Worker {
            config,
            codec,
            completed: AtomicUsize::new(0),
        });

        let (queue, queue_rx) = channel::<PathBuf>();
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let (report_tx, reports) = channel();

        let mut threads = Vec::with_capacity(width);
        for i in 0..width {
            let worker = Arc::clone(&worker);
            let queue_rx = Arc::clone(&queue_rx);
            let report_tx = report_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("lenswarp-worker-{i}"))
                .spawn(move || worker.drain(&queue_rx, &report_tx))?;
            threads.push(handle);
        }
        debug!(workers = width, formats = ?worker.config.formats, "batch workers started");

        Ok(Self {
            worker,
            queue,
            reports,
            threads,
            submitted: 0,
        })
    }

    /// Number of worker threads.
    #[inline]
    pub fn width(&self) -> usize {
        self.threads.len()
    }

    /// Number of items submitted so far.
    #[inline]
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Items finished or skipped so far.
    #[inline]
    pub fn completed(&self) -> usize {
        self.worker.completed.load(Ordering::Relaxed)
    }

    /// Queues one input file. Returns immediately.
    pub fn submit(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        trace!(path = %path.display(), "submit");
        self.submitted += 1;
        if self.queue.send(path).is_err() {
            // Only reachable if every worker thread died
            error!("batch workers are gone, item dropped");
        }
    }

    /// Waits for every submitted item to reach a terminal state and joins
    /// the workers.
    pub fn shutdown(self) -> BatchSummary {
        let Self {
            worker,
            queue,
            reports,
            threads,
            submitted,
        } = self;
        // Workers exit once the queue is closed and drained
        drop(queue);

        let mut summary = BatchSummary {
            submitted,
            reports: Vec::with_capacity(submitted),
            ..Default::default()
        };
        for report in reports.iter().take(submitted) {
            match &report.outcome {
                Outcome::Done { skipped: true } => summary.skipped += 1,
                Outcome::Done { skipped: false } => summary.done += 1,
                Outcome::Failed { .. } => summary.failed += 1,
            }
            summary.reports.push(report);
        }
        for handle in threads {
            if handle.join().is_err() {
                error!("batch worker thread panicked");
            }
        }

        summary.completed = worker.completed.load(Ordering::SeqCst);
        info!(
            completed = summary.completed,
            submitted,
            skipped = summary.skipped,
            failed = summary.failed,
            "batch finished"
        );
        summary
    }
}

impl<C: Codec> Worker<C> {
    /// Worker thread body: runs queued items one at a time until the queue
    /// is closed.
    fn drain(&self, queue: &Mutex<Receiver<PathBuf>>, reports: &Sender<ItemReport>) {
        loop {
            // The lock is held only while waiting for the next path
            let next = queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv();
            let Ok(path) = next else {
                return;
            };
            if reports.send(self.run(path)).is_err() {
                return;
            }
        }
    }

    /// Runs one item to a terminal state.
    fn run(&self, path: PathBuf) -> ItemReport {
        let mut tracker = Tracker::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.process(&path, &mut tracker)));

        let outcome = match result {
            Ok(Ok(skipped)) => {
                let n = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
                if skipped {
                    info!("[{n}] skipped {}", path.display());
                } else {
                    info!("[{n}] done {}", path.display());
                }
                Outcome::Done { skipped }
            }
            Ok(Err(err)) => self.fail(&path, &mut tracker, err),
            Err(payload) => {
                let err = BatchError::Panicked(panic_message(payload.as_ref()));
                self.fail(&path, &mut tracker, err)
            }
        };

        ItemReport {
            path,
            outcome,
            trace: tracker.into_trace(),
        }
    }

    fn fail(&self, path: &Path, tracker: &mut Tracker, err: BatchError) -> Outcome {
        let stage = tracker.state();
        error!(file = %path.display(), ?stage, "{err}");
        tracker.advance(ItemState::Failed);
        Outcome::Failed { stage, error: err }
    }

    /// Returns `Ok(true)` when the item was skipped.
    fn process(&self, path: &Path, tracker: &mut Tracker) -> BatchResult<bool> {
        let config = &self.config;
        let outputs = config.outputs_for(path);

        if config.skip_if_exists && !outputs.is_empty() && outputs.iter().all(|p| p.exists()) {
            tracker.advance(ItemState::Done);
            return Ok(true);
        }

        tracker.advance(ItemState::Decoding);
        let image = self
            .codec
            .decode(path, config.input_lens)
            .map_err(BatchError::Decode)?;
        debug!(file = %path.display(), width = image.width(), height = image.height(), "decoded");

        tracker.advance(ItemState::Reprojecting);
        let image = config.reprojector.apply(image)?;

        tracker.advance(ItemState::ColorProcessing);
        let image = config.color.process(image);

        tracker.advance(ItemState::Encoding);
        for out in &outputs {
            self.codec.encode(&image, out).map_err(BatchError::Encode)?;
            debug!(file = %out.display(), "written");
        }

        tracker.advance(ItemState::Done);
        Ok(false)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// THEORY:
// The `processing_loop` is the recommended way to run a `BlinkPipeline` next to a
// capture thread. The pipeline carries state between frames (the previous frame and
// the debounce timer), so it must see frames one at a time and in order. That rules
// out a pool of workers and leaves a single consumer:
//
// 1.  **Bounded queue**: the capture side pushes into a small bounded channel with
//     `try_send`. When the consumer falls behind, new frames are dropped instead of
//     blocking capture. A dropped frame only means the next analysed pair spans a
//     slightly longer interval.
// 2.  **Capture timestamps**: every frame is stamped when it is submitted, and that
//     stamp drives the debouncer. The cooldown is measured in wall-clock time from the
//     moment the frames were taken, not from when they happened to be processed.
// 3.  **In-band reconfiguration**: a settings swap travels through the same queue as
//     the frames, so it always lands between two `process` calls.
// 4.  **Blocking consumer**: frame analysis is plain CPU work, so the consumer runs on
//     tokio's blocking pool rather than occupying an async worker.
// 5.  **Bounded results**: detections go out through a bounded channel as well. A
//     host that stops reading loses detections, which are counted, and memory stays
//     flat. Only dropping the result receiver stops the loop.

use crate::core_modules::error::BlinkError;
use crate::core_modules::frame::Frame;
use crate::core_modules::settings::Settings;
use crate::pipeline::{BlinkPipeline, PipelineResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A frame stamped with its sequence number and capture time.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub frame: Frame,
    pub frame_id: u64,
    pub timestamp: Instant,
}

enum LoopMessage {
    Frame(FrameBuffer),
    Configure(Settings),
}

/// The result of processing one queued frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub frame_id: u64,
    pub timestamp: Instant,
    pub outcome: Result<PipelineResult, BlinkError>,
}

/// What happened to a submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Queued(u64),
    Dropped(u64),
    Closed,
}

/// Capture-side handle of the frame queue.
pub struct FrameSender {
    tx: mpsc::Sender<LoopMessage>,
    next_id: u64,
    dropped: u64,
}

/// Consumer-side handle of the frame queue.
pub struct FrameReceiver {
    rx: mpsc::Receiver<LoopMessage>,
}

/// Creates a frame queue holding at most `capacity` pending frames.
pub fn frame_channel(capacity: usize) -> (FrameSender, FrameReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        FrameSender {
            tx,
            next_id: 0,
            dropped: 0,
        },
        FrameReceiver { rx },
    )
}

impl FrameSender {
    /// Queues a frame stamped with the current time. Never blocks.
    pub fn submit(&mut self, frame: Frame) -> Submission {
        self.submit_at(frame, Instant::now())
    }

    /// Queues a frame with an explicit capture time. Never blocks.
    pub fn submit_at(&mut self, frame: Frame, timestamp: Instant) -> Submission {
        let frame_id = self.next_id;
        self.next_id += 1;

        let buffer = FrameBuffer {
            frame,
            frame_id,
            timestamp,
        };
        match self.tx.try_send(LoopMessage::Frame(buffer)) {
            Ok(()) => Submission::Queued(frame_id),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped += 1;
                tracing::warn!(frame_id, dropped = self.dropped, "processing loop behind, frame dropped");
                Submission::Dropped(frame_id)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Submission::Closed,
        }
    }

    /// Queues a settings swap behind any pending frames.
    pub async fn configure(&self, settings: Settings) -> Result<(), BlinkError> {
        settings.validate()?;
        self.tx
            .send(LoopMessage::Configure(settings))
            .await
            .map_err(|_| BlinkError::WorkerClosed)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }
}

/// Loop-side handle of the result queue.
pub struct ResultSender {
    tx: mpsc::Sender<Detection>,
    dropped: Arc<AtomicU64>,
}

/// Creates a result queue holding at most `capacity` unread detections.
pub fn result_channel(capacity: usize) -> (ResultSender, mpsc::Receiver<Detection>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ResultSender {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}

impl ResultSender {
    /// Hands a detection to the host without blocking. Returns `false` once the
    /// receiver is gone.
    fn deliver(&self, detection: Detection) -> bool {
        match self.tx.try_send(detection) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(detection)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(frame_id = detection.frame_id, dropped, "result queue full, detection dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn dropped_results(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Drains the queue through `pipeline` until every sender is gone, then hands the
/// pipeline back. Blocks the calling thread; run it on a dedicated or blocking thread.
pub fn run_processing_loop(
    mut pipeline: BlinkPipeline,
    mut frames: FrameReceiver,
    results: ResultSender,
) -> BlinkPipeline {
    while let Some(message) = frames.rx.blocking_recv() {
        match message {
            LoopMessage::Frame(buffer) => {
                let outcome = pipeline.process(buffer.frame, buffer.timestamp);
                let detection = Detection {
                    frame_id: buffer.frame_id,
                    timestamp: buffer.timestamp,
                    outcome,
                };
                if !results.deliver(detection) {
                    tracing::debug!("result receiver dropped, stopping processing loop");
                    break;
                }
            }
            LoopMessage::Configure(settings) => {
                if let Err(err) = pipeline.configure(settings) {
                    tracing::warn!(error = %err, "settings rejected by processing loop");
                }
            }
        }
    }
    pipeline
}

/// A `BlinkPipeline` running on tokio's blocking pool.
pub struct BlinkWorker {
    sender: FrameSender,
    dropped_results: Arc<AtomicU64>,
    handle: JoinHandle<BlinkPipeline>,
}

impl BlinkWorker {
    /// Moves `pipeline` onto a blocking task. Must be called inside a tokio runtime.
    ///
    /// Both the frame queue and the result queue hold at most `capacity` entries.
    pub fn spawn(pipeline: BlinkPipeline, capacity: usize) -> (Self, mpsc::Receiver<Detection>) {
        let (sender, frames) = frame_channel(capacity);
        let (results_tx, results_rx) = result_channel(capacity);
        let dropped_results = results_tx.dropped.clone();
        let handle = tokio::task::spawn_blocking(move || run_processing_loop(pipeline, frames, results_tx));
        (
            Self {
                sender,
                dropped_results,
                handle,
            },
            results_rx,
        )
    }

    pub fn submit(&mut self, frame: Frame) -> Submission {
        self.sender.submit(frame)
    }

    pub fn submit_at(&mut self, frame: Frame, timestamp: Instant) -> Submission {
        self.sender.submit_at(frame, timestamp)
    }

    pub async fn configure(&self, settings: Settings) -> Result<(), BlinkError> {
        self.sender.configure(settings).await
    }

    pub fn dropped_frames(&self) -> u64 {
        self.sender.dropped_frames()
    }

    /// Detections discarded because the result receiver was not keeping up.
    pub fn dropped_results(&self) -> u64 {
        self.dropped_results.load(Ordering::Relaxed)
    }

    /// Closes the queue, lets pending frames finish and returns the pipeline.
    pub async fn shutdown(self) -> Result<BlinkPipeline, BlinkError> {
        let Self { sender, handle, .. } = self;
        drop(sender);
        handle.await.map_err(|_| BlinkError::WorkerClosed)
    }
}

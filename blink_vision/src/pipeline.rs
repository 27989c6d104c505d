// THEORY:
// The `pipeline` module is the top-level API of the engine. It wires the stages into
// one synchronous call per incoming frame:
//
//   frame pair -> MotionMask -> BlobTracer -> count gate -> EyePairSelector -> Debouncer
//
// The pipeline owns exactly two pieces of state between calls: the previous frame and
// the debouncer. Everything else is rebuilt per call. It is not internally
// synchronised; a host that shares one instance across threads must serialise calls,
// or better, hand it to the single-consumer loop in `processing_loop`.

use crate::core_modules::blob_filter::check_blob_count;
use crate::core_modules::blob_tracer::blob_tracer;
use crate::core_modules::debouncer::{BlinkDebouncer, Debounced};
use crate::core_modules::eye_pair::select_eye_pair;
use crate::core_modules::error::SearchError;
use crate::core_modules::motion_mask::MotionMask;
use std::time::Instant;

// Re-export key data structures for the public API.
pub use crate::core_modules::blob::{EyePair, Rect};
pub use crate::core_modules::debouncer::DebounceState;
pub use crate::core_modules::error::{BlinkError, ErrorKind};
pub use crate::core_modules::frame::{Frame, PixelLayout};
pub use crate::core_modules::settings::Settings;

/// The outcome of one `process` call.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResult {
    /// No previous frame yet; the frame was cached and nothing was analysed.
    Skipped,
    /// A blink fired.
    Found { left_eye: Rect, right_eye: Rect },
    /// An eye pair was found while the debouncer was disarmed.
    Suppressed,
    /// No eye pair in this frame pair.
    NotFound { kind: ErrorKind, detail: String },
}

impl PipelineResult {
    pub fn is_blink(&self) -> bool {
        matches!(self, PipelineResult::Found { .. })
    }

    fn not_found(err: SearchError) -> Self {
        PipelineResult::NotFound {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}

/// The motion-based blink detector.
#[derive(Debug)]
pub struct BlinkPipeline {
    settings: Settings,
    last_frame: Option<Frame>,
    debouncer: BlinkDebouncer,
    last_mask: Option<MotionMask>,
}

impl BlinkPipeline {
    pub fn new(settings: Settings) -> Result<Self, BlinkError> {
        settings.validate()?;
        Ok(Self {
            debouncer: BlinkDebouncer::new(settings.rearm_cooldown()),
            settings,
            last_frame: None,
            last_mask: None,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces the active settings. Retained frame and debounce state are kept.
    pub fn configure(&mut self, settings: Settings) -> Result<(), BlinkError> {
        settings.validate()?;
        self.debouncer.set_cooldown(settings.rearm_cooldown());
        if !settings.keep_motion_mask {
            self.last_mask = None;
        }
        self.settings = settings;
        tracing::debug!(settings = ?self.settings, "pipeline reconfigured");
        Ok(())
    }

    pub fn has_previous_frame(&self) -> bool {
        self.last_frame.is_some()
    }

    /// Drops the cached frame so the next call is `Skipped`, e.g. after the camera
    /// restarts. Unlike `reset`, a running cooldown is kept.
    pub fn clear_previous_frame(&mut self) {
        self.last_frame = None;
    }

    /// Processes `frame` against the previous one using the wall clock.
    pub fn process_now(&mut self, frame: Frame) -> Result<PipelineResult, BlinkError> {
        self.process(frame, Instant::now())
    }

    /// Processes `frame` against the previous one, with `now` driving the debouncer.
    ///
    /// A frame whose dimensions differ from the cached one is rejected with
    /// `DimensionMismatch`, and it replaces the cache so that a deliberate change of
    /// resolution recovers on the following call.
    pub fn process(&mut self, frame: Frame, now: Instant) -> Result<PipelineResult, BlinkError> {
        self.debouncer.tick(now);

        let Some(previous) = self.last_frame.take() else {
            tracing::trace!(width = frame.width(), height = frame.height(), "first frame cached");
            self.last_mask = None;
            self.last_frame = Some(frame);
            return Ok(PipelineResult::Skipped);
        };

        let mask = match MotionMask::from_frames(&frame, &previous, self.settings.threshold) {
            Ok(mask) => mask,
            Err(err) => {
                tracing::warn!(error = %err, "frame rejected");
                self.last_mask = None;
                self.last_frame = Some(frame);
                return Err(err);
            }
        };
        self.last_frame = Some(frame);

        let result = self.search(&mask, now);

        if self.settings.keep_motion_mask {
            self.last_mask = Some(mask);
        }
        Ok(result)
    }

    fn search(&mut self, mask: &MotionMask, now: Instant) -> PipelineResult {
        let blobs = blob_tracer::find_blobs(mask, &self.settings);
        tracing::debug!(blobs = blobs.len(), motion_pixels = mask.motion_pixels(), "blob scan");

        let eyes = match check_blob_count(blobs, &self.settings).and_then(|blobs| select_eye_pair(blobs, &self.settings)) {
            Ok(eyes) => eyes,
            Err(err) => return PipelineResult::not_found(err),
        };

        match self.debouncer.offer(eyes, now) {
            Debounced::Fired(eyes) => {
                tracing::info!(left = ?eyes.left, right = ?eyes.right, "blink detected");
                PipelineResult::Found {
                    left_eye: eyes.left,
                    right_eye: eyes.right,
                }
            }
            Debounced::Suppressed => {
                tracing::debug!("eye pair inside cooldown, suppressed");
                PipelineResult::Suppressed
            }
        }
    }

    /// The mask computed by the last analysed call, if masks are being kept.
    pub fn last_motion_mask(&self) -> Option<&MotionMask> {
        self.last_mask.as_ref()
    }

    /// The eyes of the last blink while its cooldown is still running.
    pub fn active_eyes(&self) -> Option<&EyePair> {
        self.debouncer.active_eyes()
    }

    pub fn debounce_state(&self) -> DebounceState {
        self.debouncer.state()
    }

    /// Forgets the cached frame and rearms the debouncer.
    pub fn reset(&mut self) {
        self.last_frame = None;
        self.last_mask = None;
        self.debouncer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const BACKGROUND: [u8; 3] = [200, 200, 200];
    const LID: [u8; 3] = [40, 40, 40];

    fn open_eyes() -> Frame {
        Frame::filled(100, 100, PixelLayout::Rgba, BACKGROUND)
    }

    fn closed_eyes() -> Frame {
        let mut frame = open_eyes();
        frame.fill_rect(20, 40, 30, 46, LID);
        frame.fill_rect(60, 40, 70, 46, LID);
        frame
    }

    #[test]
    fn first_call_is_skipped() {
        let mut pipeline = BlinkPipeline::new(Settings::default()).unwrap();
        assert!(!pipeline.has_previous_frame());
        assert_eq!(pipeline.process_now(closed_eyes()).unwrap(), PipelineResult::Skipped);
        assert!(pipeline.has_previous_frame());
        assert!(pipeline.last_motion_mask().is_none());
    }

    #[test]
    fn a_blink_is_reported_with_margins() {
        let mut pipeline = BlinkPipeline::new(Settings::default()).unwrap();
        let t0 = Instant::now();
        pipeline.process(open_eyes(), t0).unwrap();
        let result = pipeline.process(closed_eyes(), t0).unwrap();
        assert_eq!(
            result,
            PipelineResult::Found {
                left_eye: Rect { x1: 17, y1: 37, x2: 33, y2: 49 },
                right_eye: Rect { x1: 57, y1: 37, x2: 73, y2: 49 },
            }
        );
        assert!(pipeline.active_eyes().is_some());
    }

    #[test]
    fn mismatch_is_rejected_then_recovers() {
        let mut pipeline = BlinkPipeline::new(Settings::default()).unwrap();
        pipeline.process_now(open_eyes()).unwrap();
        let small = Frame::filled(50, 50, PixelLayout::Rgba, BACKGROUND);
        assert_eq!(
            pipeline.process_now(small.clone()),
            Err(BlinkError::DimensionMismatch {
                expected: (100, 100),
                found: (50, 50)
            })
        );
        assert!(matches!(pipeline.process_now(small).unwrap(), PipelineResult::NotFound { kind: ErrorKind::NoBlobs, .. }));
    }

    #[test]
    fn a_rejected_frame_drops_the_stale_mask() {
        let mut pipeline = BlinkPipeline::new(Settings::default()).unwrap();
        pipeline.process_now(open_eyes()).unwrap();
        pipeline.process_now(closed_eyes()).unwrap();
        assert_eq!(pipeline.last_motion_mask().map(|m| m.width()), Some(100));

        let small = Frame::filled(50, 50, PixelLayout::Rgba, BACKGROUND);
        assert!(pipeline.process_now(small.clone()).is_err());
        assert!(pipeline.last_motion_mask().is_none());

        pipeline.process_now(small).unwrap();
        let mask = pipeline.last_motion_mask().unwrap();
        assert_eq!((mask.width(), mask.height()), (50, 50));
    }

    #[test]
    fn a_skipped_frame_drops_the_stale_mask() {
        let mut pipeline = BlinkPipeline::new(Settings::default()).unwrap();
        pipeline.process_now(open_eyes()).unwrap();
        pipeline.process_now(closed_eyes()).unwrap();
        assert!(pipeline.last_motion_mask().is_some());

        pipeline.clear_previous_frame();
        assert_eq!(pipeline.process_now(open_eyes()).unwrap(), PipelineResult::Skipped);
        assert!(pipeline.last_motion_mask().is_none());
    }

    #[test]
    fn failures_leave_the_debouncer_alone() {
        let mut pipeline = BlinkPipeline::new(Settings::default()).unwrap();
        let t0 = Instant::now();
        pipeline.process(open_eyes(), t0).unwrap();
        pipeline.process(open_eyes(), t0).unwrap();
        assert_eq!(pipeline.debounce_state(), DebounceState::Armed);
    }

    #[test]
    fn masks_are_optional() {
        let settings = Settings {
            keep_motion_mask: false,
            ..Settings::default()
        };
        let mut pipeline = BlinkPipeline::new(settings).unwrap();
        let t0 = Instant::now();
        pipeline.process(open_eyes(), t0).unwrap();
        assert!(pipeline.process(closed_eyes(), t0).unwrap().is_blink());
        assert!(pipeline.last_motion_mask().is_none());
    }

    #[test]
    fn configure_validates_and_swaps_cooldown() {
        let mut pipeline = BlinkPipeline::new(Settings::default()).unwrap();
        let bad = Settings {
            max_blobs_found: 1,
            ..Settings::default()
        };
        assert!(pipeline.configure(bad).is_err());
        assert_eq!(pipeline.settings(), &Settings::default());

        let fast = Settings {
            rearm_cooldown_ms: 10,
            ..Settings::default()
        };
        pipeline.configure(fast).unwrap();
        let t0 = Instant::now();
        pipeline.process(open_eyes(), t0).unwrap();
        assert!(pipeline.process(closed_eyes(), t0).unwrap().is_blink());
        assert!(pipeline.process(open_eyes(), t0 + Duration::from_millis(10)).unwrap().is_blink());
    }

    #[test]
    fn reset_forgets_the_previous_frame() {
        let mut pipeline = BlinkPipeline::new(Settings::default()).unwrap();
        pipeline.process_now(open_eyes()).unwrap();
        pipeline.reset();
        assert_eq!(pipeline.process_now(closed_eyes()).unwrap(), PipelineResult::Skipped);
    }
}

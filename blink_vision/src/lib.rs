// THEORY:
// This file is the main entry point for the `blink_vision` library crate.
//
// The engine answers one question per pair of consecutive video frames: did the
// person in front of the camera just blink? It does so with nothing but frame
// differencing and a little geometry, no trained model and no vision library, which
// keeps it cheap enough for accessibility switches, liveness checks and gesture UIs.
//
// The public surface is the `BlinkPipeline` in `pipeline` (one synchronous call per
// frame) and the `processing_loop` that runs it beside a capture thread. The stages
// themselves live in `core_modules` and are public for hosts that want to drive them
// individually, e.g. to visualise the motion mask or the raw blobs.

pub mod core_modules;
pub mod pipeline;
pub mod processing_loop;

pub use pipeline::{BlinkError, BlinkPipeline, ErrorKind, EyePair, Frame, PipelineResult, PixelLayout, Rect, Settings};

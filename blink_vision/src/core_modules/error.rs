// THEORY:
// Two families of failure flow out of the engine and they are kept apart on purpose.
//
// 1.  `BlinkError` is a contract violation by the caller (frames of the wrong size,
//     a malformed buffer, settings that contradict themselves) or a dead worker. The
//     caller has to fix something before the next call can succeed.
// 2.  `SearchError` is the everyday "no blink in this frame pair" outcome. It is
//     expected on most frames, is never propagated with `?` out of `process`, and is
//     folded into `PipelineResult::NotFound` together with its `ErrorKind` tag.

use thiserror::Error;

/// Errors returned by the pipeline and its processing loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlinkError {
    #[error("frame is {found:?} but the previous frame was {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("frame buffer holds {actual} bytes, expected {expected} for {width}x{height}x{channels}")]
    InvalidFrame {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported channel count {0}, expected 3 (RGB) or 4 (RGBA)")]
    UnsupportedChannels(u8),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("processing loop has shut down")]
    WorkerClosed,
}

/// The reason a frame pair did not produce an eye pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorKind {
    NoBlobs,
    TooManyBlobs,
    WrongGeometry { x_sep: f64, y_sep: f64 },
}

/// A non-fatal search failure; `Display` gives the detail string reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SearchError {
    #[error("No blobs")]
    NoBlobs,
    #[error("Too many blobs")]
    TooManyBlobs,
    #[error("Geometry off, xSep:{x_sep}, ySep:{y_sep}")]
    WrongGeometry { x_sep: f64, y_sep: f64 },
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match *self {
            SearchError::NoBlobs => ErrorKind::NoBlobs,
            SearchError::TooManyBlobs => ErrorKind::TooManyBlobs,
            SearchError::WrongGeometry { x_sep, y_sep } => ErrorKind::WrongGeometry { x_sep, y_sep },
        }
    }
}

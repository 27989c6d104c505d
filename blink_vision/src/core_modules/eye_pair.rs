// THEORY:
// The eye-pair selector applies the only piece of prior knowledge the engine has
// about faces: a blink moves two eyelids at once, those two regions are the largest
// coherent motion in the frame, and they sit side by side at a bounded distance and
// roughly on the same row.
//
// 1.  Blobs are ranked by box area, largest first. The sort is stable, so equal
//     areas keep their scan order and the result is deterministic.
// 2.  The two largest are checked against the separation bounds. Separations are
//     measured between box centres.
// 3.  The box with the smaller `xmax` is labelled `left` (image coordinates, not the
//     subject's anatomy), and both boxes are grown by the configured margin.

use crate::core_modules::blob::{Blob, EyePair};
use crate::core_modules::error::SearchError;
use crate::core_modules::settings::Settings;

/// Centre-to-centre separation of two blobs as `(x_sep, y_sep)`.
pub fn separation(a: &Blob, b: &Blob) -> (f64, f64) {
    let x_sep = (a.x_span_sum() - b.x_span_sum()).abs() as f64 / 2.0;
    let y_sep = (a.y_span_sum() - b.y_span_sum()).abs() as f64 / 2.0;
    (x_sep, y_sep)
}

/// Picks and validates the eye pair from a blob set that already passed the count gate.
pub fn select_eye_pair(mut blobs: Vec<Blob>, settings: &Settings) -> Result<EyePair, SearchError> {
    if blobs.len() < 2 {
        return Err(SearchError::NoBlobs);
    }
    blobs.sort_by(|a, b| b.area().cmp(&a.area()));
    let (first, second) = (blobs[0], blobs[1]);

    let (x_sep, y_sep) = separation(&first, &second);
    tracing::debug!(x_sep, y_sep, candidates = blobs.len(), "eye pair geometry");

    if x_sep < settings.min_eye_x_sep || x_sep > settings.max_eye_x_sep || y_sep > settings.max_eye_y_sep {
        return Err(SearchError::WrongGeometry { x_sep, y_sep });
    }

    let (left, right) = if first.xmax < second.xmax {
        (first, second)
    } else {
        (second, first)
    };

    Ok(EyePair {
        left: left.expand(settings.eye_margin),
        right: right.expand(settings.eye_margin),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::blob::Rect;

    fn blob(xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Blob {
        Blob { xmin, ymin, xmax, ymax }
    }

    #[test]
    fn labels_by_smaller_xmax_and_adds_margin() {
        let pair = select_eye_pair(vec![blob(60, 40, 70, 46), blob(20, 40, 30, 46)], &Settings::default()).unwrap();
        assert_eq!(pair.left, Rect { x1: 17, y1: 37, x2: 33, y2: 49 });
        assert_eq!(pair.right, Rect { x1: 57, y1: 37, x2: 73, y2: 49 });
    }

    #[test]
    fn only_the_two_largest_blobs_compete() {
        let blobs = vec![
            blob(22, 60, 25, 64),
            blob(20, 40, 30, 46),
            blob(90, 10, 93, 14),
            blob(65, 42, 75, 48),
        ];
        let pair = select_eye_pair(blobs, &Settings::default()).unwrap();
        assert_eq!(pair.left, blob(20, 40, 30, 46).expand(3));
        assert_eq!(pair.right, blob(65, 42, 75, 48).expand(3));
    }

    #[test]
    fn separation_bounds_are_inclusive() {
        let settings = Settings::default();
        // x_sep exactly 40 and exactly 60
        assert!(select_eye_pair(vec![blob(20, 40, 30, 46), blob(60, 40, 70, 46)], &settings).is_ok());
        assert!(select_eye_pair(vec![blob(20, 40, 30, 46), blob(80, 40, 90, 46)], &settings).is_ok());
    }

    #[test]
    fn eyes_too_far_apart_are_rejected() {
        let err = select_eye_pair(vec![blob(20, 40, 30, 46), blob(81, 40, 91, 46)], &Settings::default()).unwrap_err();
        assert_eq!(err, SearchError::WrongGeometry { x_sep: 61.0, y_sep: 0.0 });
    }

    #[test]
    fn eyes_too_close_are_rejected() {
        let err = select_eye_pair(vec![blob(20, 40, 30, 46), blob(35, 40, 45, 46)], &Settings::default()).unwrap_err();
        assert!(matches!(err, SearchError::WrongGeometry { x_sep, .. } if x_sep == 15.0));
    }

    #[test]
    fn uneven_rows_are_rejected() {
        let err = select_eye_pair(vec![blob(20, 10, 30, 16), blob(70, 60, 80, 66)], &Settings::default()).unwrap_err();
        assert_eq!(err, SearchError::WrongGeometry { x_sep: 50.0, y_sep: 50.0 });
        assert!(select_eye_pair(vec![blob(20, 10, 30, 16), blob(70, 60, 80, 66)], &Settings::relaxed()).is_ok());
    }

    #[test]
    fn half_pixel_separations_are_kept() {
        assert_eq!(separation(&blob(0, 0, 11, 4), &blob(50, 1, 60, 4)), (49.5, 0.5));
    }
}

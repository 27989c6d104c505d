// THEORY:
// A count gate between the tracer and the geometry stage. Fewer than two blobs can
// never be a pair, and a frame full of blobs is camera shake or a lighting change,
// not a blink. Both are rejected before any sorting or geometry work is done.

use crate::core_modules::blob::Blob;
use crate::core_modules::error::SearchError;
use crate::core_modules::settings::Settings;

/// Passes the blob set through unchanged when its size is within bounds.
pub fn check_blob_count(blobs: Vec<Blob>, settings: &Settings) -> Result<Vec<Blob>, SearchError> {
    if blobs.len() < settings.min_blobs_found {
        Err(SearchError::NoBlobs)
    } else if blobs.len() > settings.max_blobs_found {
        Err(SearchError::TooManyBlobs)
    } else {
        Ok(blobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs(n: usize) -> Vec<Blob> {
        (0..n as i64)
            .map(|i| Blob { xmin: i * 10, ymin: 0, xmax: i * 10 + 5, ymax: 5 })
            .collect()
    }

    #[test]
    fn too_few_blobs() {
        let settings = Settings::default();
        assert_eq!(check_blob_count(blobs(0), &settings), Err(SearchError::NoBlobs));
        assert_eq!(check_blob_count(blobs(1), &settings), Err(SearchError::NoBlobs));
    }

    #[test]
    fn too_many_blobs() {
        let settings = Settings::default();
        assert_eq!(check_blob_count(blobs(26), &settings), Err(SearchError::TooManyBlobs));
    }

    #[test]
    fn bounds_are_inclusive() {
        let settings = Settings::default();
        assert_eq!(check_blob_count(blobs(2), &settings).unwrap().len(), 2);
        assert_eq!(check_blob_count(blobs(25), &settings).unwrap().len(), 25);
    }
}

// THEORY:
// The `BlobTracer` is the spatial grouping stage. It turns a motion mask into a short
// list of bounding boxes without ever labelling every pixel.
//
// Algorithm:
// 1.  **Seeding**: rows are scanned top to bottom inside a border. A pixel is a seed
//     when it is motion and the pixel directly above it is not, i.e. it sits on the
//     top edge of a region. Every pixel a walk steps on is marked, and marked seeds
//     are skipped, so a region with a long flat top is traced once, not once per
//     top-edge pixel. A separate region sitting inside another region's box is never
//     stepped on by that walk and still gets its own trace.
// 2.  **Boundary walk**: from each seed a walker steps between 4-connected motion
//     pixels. Its current heading picks a fixed order in which to try the four moves
//     (a "keep the wall on one side" rule); the first move landing on motion is taken
//     and becomes the new heading. The order lives in `PREFERENCE` below and the tie
//     break it encodes decides the shape of every box, so it must not be reordered.
// 3.  **Bounds**: the walk stops when it returns to the seed or after
//     `trace_repeat_max` steps. The running min/max of visited coordinates is the box.
//     The cap makes the cost per blob O(steps) and guarantees termination on masks
//     where the heuristic walk would otherwise circle forever.
// 4.  **Acceptance**: a box is a blob only if its area is strictly above
//     `min_blob_area`; the scan ends once `max_blobs_to_find` blobs are accepted.
//
// This is deliberately not connected-component labelling. The boxes are coarse, but
// coarse boxes are all the eye-pair stage needs.

use crate::core_modules::blob::Blob;
use crate::core_modules::motion_mask::MotionMask;
use crate::core_modules::settings::Settings;

pub mod blob_tracer {
    use super::*;

    /// Heading of the boundary walker.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Direction {
        Down,
        Left,
        Up,
        Right,
    }

    use Direction::*;

    /// Move order tried for each current heading, indexed by `Direction::index`.
    const PREFERENCE: [[Direction; 4]; 4] = [
        /* Down  */ [Left, Down, Right, Up],
        /* Left  */ [Up, Left, Down, Right],
        /* Up    */ [Right, Up, Left, Down],
        /* Right */ [Down, Right, Up, Left],
    ];

    impl Direction {
        fn index(self) -> usize {
            match self {
                Down => 0,
                Left => 1,
                Up => 2,
                Right => 3,
            }
        }

        pub fn offset(self) -> (i64, i64) {
            match self {
                Down => (0, 1),
                Left => (-1, 0),
                Up => (0, -1),
                Right => (1, 0),
            }
        }

        pub fn preference(self) -> &'static [Direction; 4] {
            &PREFERENCE[self.index()]
        }
    }

    /// Walks the boundary of the region seeded at `(seed_x, seed_y)` and returns the
    /// box it covered. The walker starts one row below the seed, heading down.
    pub fn trace_perimeter(mask: &MotionMask, seed_x: i64, seed_y: i64, max_steps: u32) -> Blob {
        walk(mask, seed_x, seed_y, max_steps, |_, _| {})
    }

    /// The boundary walk, reporting the seed and every pixel stepped on to `visit`.
    fn walk(mask: &MotionMask, seed_x: i64, seed_y: i64, max_steps: u32, mut visit: impl FnMut(i64, i64)) -> Blob {
        let (mut x, mut y) = (seed_x, seed_y + 1);
        let mut heading = Down;
        let mut blob = Blob {
            xmin: seed_x,
            ymin: seed_y,
            xmax: seed_x,
            ymax: seed_y,
        };
        visit(seed_x, seed_y);

        for _ in 0..max_steps {
            if x == seed_x && y == seed_y {
                break;
            }

            let step = heading.preference().iter().copied().find(|d| {
                let (dx, dy) = d.offset();
                mask.is_motion(x + dx, y + dy)
            });

            if let Some(d) = step {
                let (dx, dy) = d.offset();
                x += dx;
                y += dy;
                heading = d;
                visit(x, y);
            }

            blob.xmin = blob.xmin.min(x);
            blob.ymin = blob.ymin.min(y);
            blob.xmax = blob.xmax.max(x);
            blob.ymax = blob.ymax.max(y);
        }

        blob
    }

    /// Scans the mask inside the search border and returns accepted blobs in scan order.
    pub fn find_blobs(mask: &MotionMask, settings: &Settings) -> Vec<Blob> {
        let border = settings.search_border as i64;
        let y_end = mask.height() as i64 - border;
        let x_end = mask.width() as i64 - border;
        let min_area = settings.min_blob_area as i64;

        let mut blobs: Vec<Blob> = Vec::new();
        if settings.max_blobs_to_find == 0 {
            return blobs;
        }

        let width = mask.width() as usize;
        let mut walked = vec![false; width * mask.height() as usize];
        let index = |x: i64, y: i64| y as usize * width + x as usize;

        for y in border..y_end {
            for x in border..x_end {
                if !mask.is_motion(x, y) || mask.is_motion(x, y - 1) {
                    continue;
                }
                if walked[index(x, y)] {
                    continue;
                }

                // Walks only step onto motion pixels, which are always inside the mask.
                let blob = walk(mask, x, y, settings.trace_repeat_max, |vx, vy| walked[index(vx, vy)] = true);
                if blob.area() > min_area {
                    blobs.push(blob);
                    if blobs.len() >= settings.max_blobs_to_find {
                        return blobs;
                    }
                }
            }
        }

        blobs
    }
}

// THEORY:
// A `Blob` is the spatial summary of one region of motion in a single mask: just its
// axis-aligned bounding box. It carries no pixel list and no area beyond the box,
// because the tracer that produces it never visits every pixel.
//
// `Rect` is the same box after it leaves the engine. It is signed because the eye
// margin may push a box a few pixels past the image edge, and the host is expected to
// clip when it draws.

/// Inclusive bounding box of a traced motion region, in mask coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blob {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

impl Blob {
    /// Box area as `(xmax - xmin) * (ymax - ymin)`; a one-pixel-wide box has area zero.
    pub fn area(&self) -> i64 {
        (self.xmax - self.xmin) * (self.ymax - self.ymin)
    }

    /// Twice the horizontal centre, kept integral.
    pub fn x_span_sum(&self) -> i64 {
        self.xmin + self.xmax
    }

    pub fn y_span_sum(&self) -> i64 {
        self.ymin + self.ymax
    }

    /// Grows the box by `margin` on every side. Corners outside the `i32` range
    /// saturate instead of wrapping.
    pub fn expand(&self, margin: i32) -> Rect {
        let m = i64::from(margin);
        Rect {
            x1: saturate(self.xmin.saturating_sub(m)),
            y1: saturate(self.ymin.saturating_sub(m)),
            x2: saturate(self.xmax.saturating_add(m)),
            y2: saturate(self.ymax.saturating_add(m)),
        }
    }
}

fn saturate(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX })
}

/// A reported eye box, corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub fn origin(&self) -> (i32, i32) {
        (self.x1, self.y1)
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}

/// Two blobs accepted as eyes, labelled by their on-screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyePair {
    /// The box further left in the image, which is the subject's right eye.
    pub left: Rect,
    pub right: Rect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expanding_adds_margin_on_each_side() {
        let blob = Blob { xmin: 20, ymin: 40, xmax: 30, ymax: 46 };
        let rect = blob.expand(3);
        assert_eq!(rect, Rect { x1: 17, y1: 37, x2: 33, y2: 49 });
        assert_eq!((rect.width(), rect.height()), (16, 12));
        assert_eq!(rect.origin(), (17, 37));
    }

    #[test]
    fn margin_may_leave_the_image() {
        let rect = Blob { xmin: 1, ymin: 0, xmax: 5, ymax: 5 }.expand(3);
        assert_eq!(rect.origin(), (-2, -3));
    }

    #[test]
    fn corners_past_the_i32_range_saturate() {
        let blob = Blob {
            xmin: i64::MIN / 2,
            ymin: -5,
            xmax: i64::MAX / 2,
            ymax: i64::from(i32::MAX) - 1,
        };
        let rect = blob.expand(3);
        assert_eq!(rect, Rect { x1: i32::MIN, y1: -8, x2: i32::MAX, y2: i32::MAX });
        assert!(rect.x1 <= rect.x2);
    }

    #[test]
    fn thin_boxes_have_no_area() {
        assert_eq!(Blob { xmin: 4, ymin: 0, xmax: 4, ymax: 9 }.area(), 0);
        assert_eq!(Blob { xmin: 0, ymin: 0, xmax: 10, ymax: 6 }.area(), 60);
    }
}

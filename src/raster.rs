//! Pixel rasterization for every shape the drawing surface knows about.
//!
//! All functions here are pure and deterministic: the live preview and the committed stroke are
//! produced by the same calls, so what the user sees while dragging is exactly what lands on the
//! canvas. Any `i32` coordinates are accepted. Intermediate math is done in `i64`, and the
//! `_within` variants restrict the work to a [`Clip`] so far off-surface shapes cost nothing.

use crate::math::{vec2, Vec2i};

/// The pixel rectangle `0..width` x `0..height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clip {
    pub width: u32,
    pub height: u32,
}

impl Clip {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(self, p: Vec2i) -> bool {
        u32::try_from(p.x()).is_ok_and(|x| x < self.width)
            && u32::try_from(p.y()).is_ok_and(|y| y < self.height)
    }

    /// Largest contained coordinates, as floats.
    fn max(self) -> (f64, f64) {
        (f64::from(self.width) - 1.0, f64::from(self.height) - 1.0)
    }
}

/// A straight, 1 pixel wide segment between two points (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: Vec2i,
    pub end: Vec2i,
}

impl Segment {
    pub fn new(start: Vec2i, end: Vec2i) -> Self {
        Self { start, end }
    }

    pub fn pixels(self) -> Vec<Vec2i> {
        line(self.start, self.end)
    }

    /// The pixels of this segment that lie inside `clip`.
    pub fn pixels_within(self, clip: Clip) -> Vec<Vec2i> {
        match clip_line(self.start, self.end, clip) {
            Some((start, end)) => line(start, end),
            None => Vec::new(),
        }
    }
}

/// Rasterizes a line from `from` to `to` with Bresenham's algorithm.
///
/// The pixel set does not depend on the direction the line is drawn in: the endpoints are put in a
/// canonical order first and the result is reversed if needed, so the output always starts at
/// `from`. A zero-length line yields the single point.
pub fn line(from: Vec2i, to: Vec2i) -> Vec<Vec2i> {
    let swapped = <[i32; 2]>::from(to) < <[i32; 2]>::from(from);
    let (a, b) = if swapped { (to, from) } else { (from, to) };

    // i64 so that `2 * err` can't overflow for far out-of-surface endpoints.
    let (x1, y1) = (i64::from(b.x()), i64::from(b.y()));
    let (mut x, mut y) = (i64::from(a.x()), i64::from(a.y()));
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut out = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    loop {
        out.push(vec2(x as i32, y as i32));
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }

    if swapped {
        out.reverse();
    }
    out
}

/// Cuts the segment `from`-`to` down to the part inside `clip` (Liang-Barsky).
///
/// Endpoints already inside are returned unchanged, so a segment fully inside `clip` rasterizes to
/// exactly the same pixels as the unclipped one. Returns `None` if nothing of the segment is
/// visible.
pub fn clip_line(from: Vec2i, to: Vec2i, clip: Clip) -> Option<(Vec2i, Vec2i)> {
    if clip.contains(from) && clip.contains(to) {
        return Some((from, to));
    }

    let (x0, y0) = (f64::from(from.x()), f64::from(from.y()));
    let (dx, dy) = (f64::from(to.x()) - x0, f64::from(to.y()) - y0);
    let (xmax, ymax) = clip.max();

    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, x0), (dx, xmax - x0), (-dy, y0), (dy, ymax - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    let at = |t: f64| vec2((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
    let start = if t0 == 0.0 { from } else { at(t0) };
    let end = if t1 == 1.0 { to } else { at(t1) };
    Some((start, end))
}

/// Runs the midpoint algorithm, calling `emit` with every point of the eight reflections.
fn midpoint_circle(center: Vec2i, radius: i32, mut emit: impl FnMut(i64, i64)) {
    let (cx, cy) = (i64::from(center.x()), i64::from(center.y()));
    let mut x = i64::from(radius.max(0));
    let mut y = 0i64;
    let mut decision = 1 - x;

    while x >= y {
        for (ox, oy) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            emit(cx + ox, cy + oy);
        }

        y += 1;
        if decision <= 0 {
            decision += 2 * y + 1;
        } else {
            x -= 1;
            decision += 2 * (y - x) + 1;
        }
    }
}

fn sorted_set(mut px: Vec<Vec2i>) -> Vec<Vec2i> {
    px.sort_unstable_by_key(|p| <[i32; 2]>::from(*p));
    px.dedup();
    px
}

/// Rasterizes a circle outline with the midpoint algorithm.
///
/// Each step emits the eight reflections of the current octant point. The result is the sorted,
/// deduplicated pixel set, so radius 0 produces just `center`. Negative radii are treated as 0, and
/// points that don't fit in `i32` are dropped.
pub fn circle(center: Vec2i, radius: i32) -> Vec<Vec2i> {
    let mut out = Vec::new();
    midpoint_circle(center, radius, |x, y| {
        if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
            out.push(vec2(x, y));
        }
    });
    sorted_set(out)
}

/// The pixels of [`circle`] that lie inside `clip`.
///
/// Circles that can't touch `clip` (bounding box outside it, or `clip` entirely inside the ring)
/// are skipped without stepping through them.
pub fn circle_within(center: Vec2i, radius: i32, clip: Clip) -> Vec<Vec2i> {
    let r = i64::from(radius.max(0));
    let (cx, cy) = (i64::from(center.x()), i64::from(center.y()));
    let (w, h) = (i64::from(clip.width), i64::from(clip.height));
    if cx + r < 0 || cy + r < 0 || cx - r >= w || cy - r >= h {
        return Vec::new();
    }

    let (xmax, ymax) = clip.max();
    let (fx, fy) = (cx as f64, cy as f64);
    let far = (fx.abs().max((xmax - fx).abs())).hypot(fy.abs().max((ymax - fy).abs()));
    if far < r as f64 - 1.0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    midpoint_circle(center, radius, |x, y| {
        if (0..w).contains(&x) && (0..h).contains(&y) {
            out.push(vec2(x as i32, y as i32));
        }
    });
    sorted_set(out)
}

/// Returns the corner diagonally opposite `anchor` of the square spanned by a drag to `drag`.
///
/// The side length is the larger of the two drag extents, and the corner is placed along the sign
/// of each drag axis independently. A drag of 0 along an axis counts as positive. Corners beyond
/// the `i32` range are saturated.
pub fn square_corner(anchor: Vec2i, drag: Vec2i) -> Vec2i {
    let (ax, ay) = (i64::from(anchor.x()), i64::from(anchor.y()));
    let (dx, dy) = (i64::from(drag.x()) - ax, i64::from(drag.y()) - ay);
    let side = dx.abs().max(dy.abs());
    let sx = if dx >= 0 { side } else { -side };
    let sy = if dy >= 0 { side } else { -side };
    let sat = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    vec2(sat(ax + sx), sat(ay + sy))
}

/// Rasterizes the outline of an axis-aligned square with one fixed corner at `anchor`.
///
/// Returns the top, right, bottom and left edges (relative to the anchor row/column), in that
/// order.
pub fn square(anchor: Vec2i, drag: Vec2i) -> [Segment; 4] {
    let far = square_corner(anchor, drag);
    let (x1, y1) = (anchor.x(), anchor.y());
    let (x2, y2) = (far.x(), far.y());
    [
        Segment::new(vec2(x1, y1), vec2(x2, y1)),
        Segment::new(vec2(x2, y1), vec2(x2, y2)),
        Segment::new(vec2(x2, y2), vec2(x1, y2)),
        Segment::new(vec2(x1, y2), vec2(x1, y1)),
    ]
}

/// Flattens a set of segments into the pixels they cover.
pub fn segment_pixels(segments: &[Segment]) -> Vec<Vec2i> {
    segments.iter().flat_map(|seg| seg.pixels()).collect()
}

/// Flattens a set of segments into the pixels they cover inside `clip`.
pub fn segment_pixels_within(segments: &[Segment], clip: Clip) -> Vec<Vec2i> {
    segments
        .iter()
        .flat_map(|seg| seg.pixels_within(clip))
        .collect()
}

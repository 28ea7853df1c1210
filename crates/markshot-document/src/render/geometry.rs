// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Annotation geometry — arrow direction, barb endpoints, and label box
// placement, all in display-space pixels.

use std::f32::consts::FRAC_PI_6;

/// Connecting line and barb stroke width in pixels.
pub const STROKE_WIDTH: u32 = 3;
/// Length of each arrowhead barb in pixels.
pub const BARB_LENGTH: f32 = 12.0;
/// Angle between the shaft and each barb (30 degrees).
pub const BARB_ANGLE: f32 = FRAC_PI_6;
/// Radius of the filled marker at the pointer target.
pub const MARKER_RADIUS: i32 = 4;
/// Horizontal padding between label text and its box edge.
pub const LABEL_PAD_X: i32 = 2;

pub type PointF = (f32, f32);

/// Direction of the anchor→pointer vector in radians.
///
/// A zero-length vector has no direction; it is taken as 0 so the barbs of a
/// degenerate arrow always point the same way.
pub fn direction(anchor: PointF, pointer: PointF) -> f32 {
    let dx = pointer.0 - anchor.0;
    let dy = pointer.1 - anchor.1;
    if dx == 0.0 && dy == 0.0 {
        0.0
    } else {
        dy.atan2(dx)
    }
}

/// A fully resolved arrow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    pub tail: PointF,
    pub tip: PointF,
    /// Far ends of the two barbs; both barbs start at `tip`.
    pub barbs: [PointF; 2],
}

impl Arrow {
    pub fn new(anchor: PointF, pointer: PointF) -> Self {
        let theta = direction(anchor, pointer);
        let barb = |offset: f32| {
            (
                pointer.0 - BARB_LENGTH * (theta + offset).cos(),
                pointer.1 - BARB_LENGTH * (theta + offset).sin(),
            )
        };
        Self {
            tail: anchor,
            tip: pointer,
            barbs: [barb(-BARB_ANGLE), barb(BARB_ANGLE)],
        }
    }
}

/// Drawable region: the canvas grown by `margin` pixels on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ClipBounds {
    pub fn around(width: u32, height: u32, margin: f64) -> Self {
        Self {
            min_x: -margin,
            min_y: -margin,
            max_x: f64::from(width) - 1.0 + margin,
            max_y: f64::from(height) - 1.0 + margin,
        }
    }

    pub fn contains(&self, point: PointF) -> bool {
        let (x, y) = (f64::from(point.0), f64::from(point.1));
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Cut the segment down to the part inside the bounds (Liang-Barsky).
    /// `None` when the segment misses them entirely.
    pub fn clip_segment(&self, start: PointF, end: PointF) -> Option<(PointF, PointF)> {
        let (x0, y0) = (f64::from(start.0), f64::from(start.1));
        let (dx, dy) = (f64::from(end.0) - x0, f64::from(end.1) - y0);
        let mut t0 = 0.0f64;
        let mut t1 = 1.0f64;
        let edges = [
            (-dx, x0 - self.min_x),
            (dx, self.max_x - x0),
            (-dy, y0 - self.min_y),
            (dy, self.max_y - y0),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }
        let at = |t: f64| ((x0 + t * dx) as f32, (y0 + t * dy) as f32);
        Some((at(t0), at(t1)))
    }
}

/// Background box and text origin for a label, placed above and to the right
/// of the anchor. Edges are inclusive pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub text_x: i32,
    pub text_y: i32,
}

impl LabelBox {
    /// Lay out a label of `text_width` x `text_height` pixels at `anchor`.
    ///
    /// The box bottom sits 2 px above the anchor, with 2 px horizontal and
    /// 4 px vertical clearance around the text.
    ///
    /// Edges saturate at the `i32` range, so far-away anchors give a box that
    /// simply lies off the canvas.
    pub fn at(anchor: PointF, text_width: u32, text_height: u32) -> Self {
        // Float to int casts saturate.
        let x = anchor.0.round() as i32;
        let y = anchor.1.round() as i32;
        let w = i32::try_from(text_width).unwrap_or(i32::MAX);
        let h = i32::try_from(text_height).unwrap_or(i32::MAX);
        Self {
            left: x.saturating_sub(LABEL_PAD_X),
            top: y.saturating_sub(h).saturating_sub(6),
            right: x.saturating_add(w).saturating_add(LABEL_PAD_X),
            bottom: y.saturating_sub(2),
            text_x: x,
            text_y: y.saturating_sub(h).saturating_sub(4),
        }
    }

    pub fn width(&self) -> u32 {
        (i64::from(self.right) - i64::from(self.left) + 1) as u32
    }

    pub fn height(&self) -> u32 {
        (i64::from(self.bottom) - i64::from(self.top) + 1) as u32
    }

    /// True when any part of the box lands on a `width` x `height` canvas.
    pub fn overlaps(&self, width: u32, height: u32) -> bool {
        i64::from(self.right) >= 0
            && i64::from(self.bottom) >= 0
            && i64::from(self.left) < i64::from(width)
            && i64::from(self.top) < i64::from(height)
    }
}

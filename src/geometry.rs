//! Axis-aligned bounding boxes, circular sectors, and the predicates over
//! them. Everything here is a pure function of its arguments; callers are
//! responsible for rejecting non-finite input before it gets this far.

/// Distance below which a point counts as sitting on a sector's center.
/// The center is always inside its own sector regardless of angle.
const SECTOR_CENTER_EPS: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn from_center(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self {
            x_min: center_x - half_w,
            y_min: center_y - half_h,
            x_max: center_x + half_w,
            y_max: center_y + half_h,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Grow the box outward on all four sides.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            x_min: self.x_min - margin,
            y_min: self.y_min - margin,
            x_max: self.x_max + margin,
            y_max: self.y_max + margin,
        }
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.x_min <= x && x <= self.x_max && self.y_min <= y && y <= self.y_max
    }

    /// True when the boxes overlap, or sit closer than `margin` apart.
    /// Symmetric in x and y; touching edges at exactly `margin` do not count.
    pub fn overlaps(&self, other: &BoundingBox, margin: f64) -> bool {
        !(self.x_max + margin <= other.x_min
            || other.x_max + margin <= self.x_min
            || self.y_max + margin <= other.y_min
            || other.y_max + margin <= self.y_min)
    }

    pub fn overlap_area(&self, other: &BoundingBox) -> f64 {
        let w = self.x_max.min(other.x_max) - self.x_min.max(other.x_min);
        let h = self.y_max.min(other.y_max) - self.y_min.max(other.y_min);
        if w <= 0.0 || h <= 0.0 {
            return 0.0;
        }
        w * h
    }

    /// Shortest gap between two boxes. Overlapping boxes return the negated
    /// penetration depth, so the sign distinguishes clearance from overlap.
    pub fn distance_to(&self, other: &BoundingBox) -> f64 {
        let dx = if self.x_max < other.x_min {
            other.x_min - self.x_max
        } else if other.x_max < self.x_min {
            self.x_min - other.x_max
        } else {
            0.0
        };
        let dy = if self.y_max < other.y_min {
            other.y_min - self.y_max
        } else if other.y_max < self.y_min {
            self.y_min - other.y_max
        } else {
            0.0
        };
        if dx == 0.0 && dy == 0.0 {
            let overlap_x = self.x_max.min(other.x_max) - self.x_min.max(other.x_min);
            let overlap_y = self.y_max.min(other.y_max) - self.y_min.max(other.y_min);
            return -overlap_x.min(overlap_y);
        }
        (dx * dx + dy * dy).sqrt()
    }
}

/// True when all four edges of `bbox` lie inside `bounds` shrunk by `margin`.
pub fn within_bounds(bbox: &BoundingBox, bounds: &BoundingBox, margin: f64) -> bool {
    bbox.x_min >= bounds.x_min + margin
        && bbox.x_max <= bounds.x_max - margin
        && bbox.y_min >= bounds.y_min + margin
        && bbox.y_max <= bounds.y_max - margin
}

/// Map an angle in degrees onto `[0, 360)`.
pub fn normalize_angle_deg(angle: f64) -> f64 {
    let wrapped = angle % 360.0;
    if wrapped < 0.0 { wrapped + 360.0 } else { wrapped }
}

/// True when `angle` (already normalized) falls inside the sector's angular
/// range. A range with `start > end` wraps across 0° and is treated as the
/// union `[start, 360) ∪ [0, end]`.
fn angle_in_range(angle: f64, start: f64, end: f64) -> bool {
    if start <= end {
        start <= angle && angle <= end
    } else {
        angle >= start || angle <= end
    }
}

/// Point-in-circular-sector predicate. Angles are degrees measured
/// counter-clockwise from the positive x axis.
pub fn point_in_sector(
    x: f64,
    y: f64,
    center_x: f64,
    center_y: f64,
    radius: f64,
    start_angle_deg: f64,
    end_angle_deg: f64,
) -> bool {
    let dx = x - center_x;
    let dy = y - center_y;
    let distance = (dx * dx + dy * dy).sqrt();

    if distance > radius {
        return false;
    }
    if distance < SECTOR_CENTER_EPS {
        return true;
    }

    let angle = normalize_angle_deg(dy.atan2(dx).to_degrees());
    let start = normalize_angle_deg(start_angle_deg);
    let end = normalize_angle_deg(end_angle_deg);
    angle_in_range(angle, start, end)
}

/// Conservative box-vs-sector test: samples the box center, the four
/// corners, and the four edge midpoints against `point_in_sector`. This is
/// an approximation, not polygon clipping — a sector tip can slip between
/// sample points. Good enough for label avoidance and fully deterministic.
pub fn box_intersects_sector(
    bbox: &BoundingBox,
    center_x: f64,
    center_y: f64,
    radius: f64,
    start_angle_deg: f64,
    end_angle_deg: f64,
) -> bool {
    let (cx, cy) = bbox.center();
    let samples = [
        (cx, cy),
        (bbox.x_min, bbox.y_min),
        (bbox.x_max, bbox.y_min),
        (bbox.x_min, bbox.y_max),
        (bbox.x_max, bbox.y_max),
        (cx, bbox.y_min),
        (cx, bbox.y_max),
        (bbox.x_min, cy),
        (bbox.x_max, cy),
    ];
    samples.iter().any(|&(px, py)| {
        point_in_sector(
            px,
            py,
            center_x,
            center_y,
            radius,
            start_angle_deg,
            end_angle_deg,
        )
    })
}

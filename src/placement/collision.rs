//! Collision checks used by both placement strategies.
//!
//! Each check is a pure predicate over the slices passed in; nothing here
//! holds state between calls.

use crate::geometry::{BoundingBox, box_intersects_sector, within_bounds};
use crate::scene::{CanvasBounds, SectorObstacle};

/// True when the candidate box fits inside the canvas with `border_margin`
/// clearance on every side.
pub fn is_within_canvas(bbox: &BoundingBox, bounds: &CanvasBounds, border_margin: f64) -> bool {
    within_bounds(bbox, &bounds.to_box(), border_margin)
}

/// True when the candidate box touches any sector's sampled region.
pub fn collides_with_obstacles(bbox: &BoundingBox, sectors: &[SectorObstacle]) -> bool {
    sectors.iter().any(|sector| {
        box_intersects_sector(
            bbox,
            sector.center_x,
            sector.center_y,
            sector.radius,
            sector.start_angle_deg,
            sector.end_angle_deg,
        )
    })
}

/// True when the candidate box overlaps any already-placed box, or sits
/// closer to one than `margin`.
pub fn collides_with_placed(bbox: &BoundingBox, placed: &[BoundingBox], margin: f64) -> bool {
    placed.iter().any(|other| bbox.overlaps(other, margin))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sector(radius: f64, start: f64, end: f64) -> SectorObstacle {
        SectorObstacle {
            center_x: 0.0,
            center_y: 0.0,
            radius,
            start_angle_deg: start,
            end_angle_deg: end,
        }
    }

    #[test]
    fn canvas_check_rejects_box_on_edge() {
        let bounds = CanvasBounds::new(5.0, 5.0);
        let inside = BoundingBox::from_center(0.0, 0.0, 2.0, 1.0);
        assert!(is_within_canvas(&inside, &bounds, 0.3));
        let hugging = BoundingBox::from_center(4.5, 0.0, 2.0, 1.0);
        assert!(!is_within_canvas(&hugging, &bounds, 0.3));
    }

    #[test]
    fn obstacle_check_hits_covering_sector() {
        let bbox = BoundingBox::from_center(2.0, 2.0, 1.0, 1.0);
        assert!(collides_with_obstacles(&bbox, &[sector(5.0, 0.0, 90.0)]));
        assert!(!collides_with_obstacles(&bbox, &[sector(5.0, 180.0, 270.0)]));
        assert!(!collides_with_obstacles(&bbox, &[]));
    }

    #[test]
    fn placed_check_honors_margin() {
        let bbox = BoundingBox::from_center(0.0, 0.0, 2.0, 1.0);
        let neighbor = BoundingBox::from_center(2.05, 0.0, 2.0, 1.0);
        assert!(!collides_with_placed(&bbox, &[neighbor], 0.0));
        assert!(collides_with_placed(&bbox, &[neighbor], 0.1));
    }
}

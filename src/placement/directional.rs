//! Deterministic directional search for a single label.
//!
//! The candidate rings below are the tie-break priority: the first offset
//! whose box clears the canvas margin, every sector, and every placed box
//! wins. List order is fixed — it never depends on iteration order of any
//! unordered collection.

use crate::config::EngineConfig;
use crate::geometry::BoundingBox;
use crate::placement::collision;
use crate::scene::{CanvasBounds, SectorObstacle};

/// One candidate offset relative to the anchor.
#[derive(Debug, Clone, Copy)]
pub struct Direction {
    pub dx: f64,
    pub dy: f64,
    pub tag: &'static str,
}

/// Primary ring, diagonals first. The upper-right entry doubles as the
/// fallback position when nothing fits.
pub const DIRECTIONS: [Direction; 8] = [
    Direction {
        dx: 1.2,
        dy: 0.8,
        tag: "upper-right",
    },
    Direction {
        dx: -1.2,
        dy: 0.8,
        tag: "upper-left",
    },
    Direction {
        dx: 1.2,
        dy: -0.8,
        tag: "lower-right",
    },
    Direction {
        dx: -1.2,
        dy: -0.8,
        tag: "lower-left",
    },
    Direction {
        dx: 1.6,
        dy: 0.0,
        tag: "right",
    },
    Direction {
        dx: -1.6,
        dy: 0.0,
        tag: "left",
    },
    Direction {
        dx: 0.0,
        dy: 1.2,
        tag: "above",
    },
    Direction {
        dx: 0.0,
        dy: -1.2,
        tag: "below",
    },
];

/// Wider ring tried only after every primary candidate collided.
pub const EXTENDED_DIRECTIONS: [Direction; 8] = [
    Direction {
        dx: 2.0,
        dy: 1.2,
        tag: "far-upper-right",
    },
    Direction {
        dx: -2.0,
        dy: 1.2,
        tag: "far-upper-left",
    },
    Direction {
        dx: 2.0,
        dy: -1.2,
        tag: "far-lower-right",
    },
    Direction {
        dx: -2.0,
        dy: -1.2,
        tag: "far-lower-left",
    },
    Direction {
        dx: 2.2,
        dy: 0.4,
        tag: "far-right",
    },
    Direction {
        dx: -2.2,
        dy: 0.4,
        tag: "far-left",
    },
    Direction {
        dx: 0.8,
        dy: 1.8,
        tag: "far-above",
    },
    Direction {
        dx: 0.8,
        dy: -1.8,
        tag: "far-below",
    },
];

/// Outcome of a directional search for one anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub direction: &'static str,
    /// False only for the collide-anyway fallback.
    pub resolved: bool,
}

/// Find a position for one label of `size` around `(anchor_x, anchor_y)`.
///
/// Tries the primary ring, then the extended ring. If every candidate
/// collides, returns the first primary candidate flagged unresolved — the
/// search always terminates within the two fixed rings.
pub fn place_label(
    anchor_x: f64,
    anchor_y: f64,
    size: (f64, f64),
    sectors: &[SectorObstacle],
    placed: &[BoundingBox],
    bounds: &CanvasBounds,
    config: &EngineConfig,
) -> Placement {
    let (width, height) = size;

    for ring in [&DIRECTIONS[..], &EXTENDED_DIRECTIONS[..]] {
        for direction in ring {
            let x = anchor_x + direction.dx;
            let y = anchor_y + direction.dy;
            let candidate = BoundingBox::from_center(x, y, width, height);

            if !collision::is_within_canvas(&candidate, bounds, config.border_margin) {
                continue;
            }
            if collision::collides_with_obstacles(&candidate, sectors) {
                continue;
            }
            if collision::collides_with_placed(&candidate, placed, config.collision_margin) {
                continue;
            }
            return Placement {
                x,
                y,
                direction: direction.tag,
                resolved: true,
            };
        }
    }

    // Every candidate collides. Fall back to the first-priority offset so
    // the pass still terminates with a committed position.
    let fallback = DIRECTIONS[0];
    crate::log::debug!(
        anchor_x,
        anchor_y,
        "no collision-free candidate, falling back to {}",
        fallback.tag
    );
    Placement {
        x: anchor_x + fallback.dx,
        y: anchor_y + fallback.dy,
        direction: fallback.tag,
        resolved: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SectorObstacle;

    fn open_bounds() -> CanvasBounds {
        CanvasBounds::new(10.0, 10.0)
    }

    #[test]
    fn empty_scene_takes_first_direction() {
        let config = EngineConfig::default();
        let result = place_label(0.0, 0.0, (2.0, 0.8), &[], &[], &open_bounds(), &config);
        assert_eq!(result.direction, "upper-right");
        assert_eq!((result.x, result.y), (1.2, 0.8));
        assert!(result.resolved);
    }

    #[test]
    fn blocked_first_direction_falls_through_in_order() {
        let config = EngineConfig::default();
        // A box already occupying the upper-right candidate region.
        let blocker = BoundingBox::from_center(1.2, 0.8, 2.0, 0.8);
        let result = place_label(
            0.0,
            0.0,
            (2.0, 0.8),
            &[],
            &[blocker],
            &open_bounds(),
            &config,
        );
        assert_eq!(result.direction, "upper-left");
        assert!(result.resolved);
    }

    #[test]
    fn sector_over_first_candidate_shifts_direction() {
        let config = EngineConfig::default();
        // Sector covering the first quadrant, where the first candidate sits.
        let sector = SectorObstacle {
            center_x: 0.0,
            center_y: 0.0,
            radius: 4.0,
            start_angle_deg: 0.0,
            end_angle_deg: 90.0,
        };
        let result = place_label(0.0, 0.0, (2.0, 0.8), &[sector], &[], &open_bounds(), &config);
        assert_ne!(result.direction, "upper-right");
        assert!(result.resolved);
    }

    #[test]
    fn near_corner_anchor_stays_in_bounds() {
        let config = EngineConfig::default();
        let bounds = CanvasBounds::new(5.0, 5.0);
        let result = place_label(4.0, 4.0, (2.0, 0.8), &[], &[], &bounds, &config);
        assert!(result.resolved);
        let bbox = BoundingBox::from_center(result.x, result.y, 2.0, 0.8);
        assert!(collision::is_within_canvas(
            &bbox,
            &bounds,
            config.border_margin
        ));
    }

    #[test]
    fn fully_blocked_anchor_falls_back_unresolved() {
        let config = EngineConfig::default();
        // Two half-plane sectors cover every candidate in both rings.
        let upper = SectorObstacle {
            center_x: 0.0,
            center_y: 0.0,
            radius: 8.0,
            start_angle_deg: 0.0,
            end_angle_deg: 180.0,
        };
        let lower = SectorObstacle {
            center_x: 0.0,
            center_y: 0.0,
            radius: 8.0,
            start_angle_deg: 180.0,
            end_angle_deg: 360.0,
        };
        let result = place_label(
            0.0,
            0.0,
            (2.0, 0.8),
            &[upper, lower],
            &[],
            &open_bounds(),
            &config,
        );
        assert!(!result.resolved);
        assert_eq!(result.direction, "upper-right");
        assert_eq!((result.x, result.y), (1.2, 0.8));
    }

    #[test]
    fn extended_ring_rescues_crowded_primary_ring() {
        let config = EngineConfig::default();
        // Pin a small marker onto each primary candidate center. Every
        // primary candidate box contains its marker; of the extended ring,
        // only far-above clears all eight.
        let placed: Vec<BoundingBox> = DIRECTIONS
            .iter()
            .map(|d| BoundingBox::from_center(d.dx, d.dy, 0.1, 0.1))
            .collect();
        let result = place_label(0.0, 0.0, (2.0, 0.8), &[], &placed, &open_bounds(), &config);
        assert!(result.resolved, "extended ring should still find room");
        assert_eq!(result.direction, "far-above");
    }
}

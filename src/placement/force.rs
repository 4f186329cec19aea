//! Force-directed refinement for dense scenes.
//!
//! Relaxes movable label bodies against each other and against static
//! obstacles (pinned labels, anchor markers, sector fields) over a fixed
//! iteration budget. Everything is deterministic: bodies are visited in
//! slice order, the only early exit is the convergence predicate, and the
//! degenerate coincident-position case resolves through a hash of the
//! element identity instead of a random direction.

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;

use crate::config::RefinerConfig;
use crate::geometry::{BoundingBox, point_in_sector};
use crate::placement::fnv1a;
use crate::scene::{CanvasBounds, SectorObstacle};

/// Number of fixed angular push directions for the degenerate tie-break.
const PUSH_DIRECTION_COUNT: usize = 16;

/// Below this separation two centers count as coincident and the push
/// direction comes from the identity hash.
const DEGENERATE_DISTANCE: f64 = 1e-9;

/// Overlapping bodies repel this much harder than merely-near ones.
const OVERLAP_REPULSION_FACTOR: f64 = 3.0;
const NEAR_REPULSION_FACTOR: f64 = 0.5;

static PUSH_DIRECTIONS: Lazy<[(f64, f64); PUSH_DIRECTION_COUNT]> = Lazy::new(|| {
    let mut directions = [(0.0, 0.0); PUSH_DIRECTION_COUNT];
    for (i, slot) in directions.iter_mut().enumerate() {
        let angle = (i as f64) * std::f64::consts::TAU / PUSH_DIRECTION_COUNT as f64;
        *slot = (angle.cos(), angle.sin());
    }
    directions
});

/// Unit push direction for an element sitting exactly on a repulsion
/// source. Stable across runs and processes for a given id.
fn degenerate_push_direction(id: &str) -> (f64, f64) {
    let index = (fnv1a(id.as_bytes()) % PUSH_DIRECTION_COUNT as u64) as usize;
    PUSH_DIRECTIONS[index]
}

/// One simulated element. Static bodies repel others but never move.
#[derive(Debug, Clone)]
pub struct Body {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub movable: bool,
    /// Heavier bodies move less under the same force.
    pub weight: f64,
}

impl Body {
    pub fn movable_label(
        id: impl Into<String>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        anchor_x: f64,
        anchor_y: f64,
    ) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            anchor_x,
            anchor_y,
            movable: true,
            weight: 1.0,
        }
    }

    pub fn static_obstacle(id: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            anchor_x: x,
            anchor_y: y,
            movable: false,
            weight: 1.0,
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_center(self.x, self.y, self.width, self.height)
    }
}

/// How a refinement run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefineOutcome {
    /// Full passes actually executed.
    pub iterations: u32,
    /// The convergence predicate fired before the iteration budget ran out.
    pub converged: bool,
    /// The cooperative cancellation flag was observed; positions hold the
    /// best result found so far.
    pub cancelled: bool,
}

/// Relax `bodies` in place. Bodies are visited in slice order and each sees
/// the already-updated positions of earlier bodies within the same pass,
/// so caller-supplied order is part of the deterministic contract.
pub fn refine(
    bodies: &mut [Body],
    sectors: &[SectorObstacle],
    bounds: &CanvasBounds,
    config: &RefinerConfig,
    cancel: Option<&AtomicBool>,
) -> RefineOutcome {
    // A canvas narrower than the margin still yields a valid clamp range.
    let x_limit = (bounds.x_range - config.boundary_margin).max(0.0);
    let y_limit = (bounds.y_range - config.boundary_margin).max(0.0);

    let mut outcome = RefineOutcome {
        iterations: 0,
        converged: false,
        cancelled: false,
    };

    for _ in 0..config.iterations {
        if let Some(flag) = cancel
            && flag.load(Ordering::Relaxed)
        {
            outcome.cancelled = true;
            return outcome;
        }

        let mut max_movement: f64 = 0.0;

        for i in 0..bodies.len() {
            if !bodies[i].movable {
                continue;
            }

            let mut force_x = 0.0;
            let mut force_y = 0.0;
            let body_box = bodies[i].bbox();

            // Pairwise repulsion from every other body.
            for j in 0..bodies.len() {
                if i == j {
                    continue;
                }
                let dx = bodies[i].x - bodies[j].x;
                let dy = bodies[i].y - bodies[j].y;
                let raw_dist = (dx * dx + dy * dy).sqrt();
                let (unit_x, unit_y, dist) = if raw_dist < DEGENERATE_DISTANCE {
                    let (ux, uy) = degenerate_push_direction(&bodies[i].id);
                    (ux, uy, config.min_distance)
                } else {
                    let dist = raw_dist.max(config.min_distance);
                    (dx / dist, dy / dist, dist)
                };

                let repulsion = if body_box.overlaps(&bodies[j].bbox(), 0.0) {
                    config.repulsion_strength * OVERLAP_REPULSION_FACTOR / dist.max(0.1)
                } else if dist < config.near_distance {
                    config.repulsion_strength * NEAR_REPULSION_FACTOR / dist
                } else {
                    0.0
                };
                force_x += repulsion * unit_x;
                force_y += repulsion * unit_y;
            }

            // Attraction back toward the anchor once the label drifts past
            // the slack radius.
            let anchor_dx = bodies[i].anchor_x - bodies[i].x;
            let anchor_dy = bodies[i].anchor_y - bodies[i].y;
            let anchor_dist = (anchor_dx * anchor_dx + anchor_dy * anchor_dy).sqrt();
            if anchor_dist > config.anchor_slack {
                force_x += config.anchor_attraction * anchor_dx;
                force_y += config.anchor_attraction * anchor_dy;
            }

            // Radial push out of any sector whose interior holds the center.
            for sector in sectors {
                if !point_in_sector(
                    bodies[i].x,
                    bodies[i].y,
                    sector.center_x,
                    sector.center_y,
                    sector.radius,
                    sector.start_angle_deg,
                    sector.end_angle_deg,
                ) {
                    continue;
                }
                let dx = bodies[i].x - sector.center_x;
                let dy = bodies[i].y - sector.center_y;
                let raw_dist = (dx * dx + dy * dy).sqrt();
                let (unit_x, unit_y) = if raw_dist < DEGENERATE_DISTANCE {
                    degenerate_push_direction(&bodies[i].id)
                } else {
                    (dx / raw_dist, dy / raw_dist)
                };
                let push = config.sector_repulsion / raw_dist.max(0.1);
                force_x += push * unit_x;
                force_y += push * unit_y;
            }

            // Soft push-back as the body nears the clamped canvas edge.
            let falloff = config.boundary_falloff.max(f64::EPSILON);
            let over_x = bodies[i].x - (x_limit - falloff);
            if over_x > 0.0 {
                force_x -= config.repulsion_strength * over_x / falloff;
            }
            let under_x = (-x_limit + falloff) - bodies[i].x;
            if under_x > 0.0 {
                force_x += config.repulsion_strength * under_x / falloff;
            }
            let over_y = bodies[i].y - (y_limit - falloff);
            if over_y > 0.0 {
                force_y -= config.repulsion_strength * over_y / falloff;
            }
            let under_y = (-y_limit + falloff) - bodies[i].y;
            if under_y > 0.0 {
                force_y += config.repulsion_strength * under_y / falloff;
            }

            // Damped step, capped, then hard-clamped into bounds.
            let weight = bodies[i].weight.max(f64::EPSILON);
            let mut move_x = force_x * config.damping / weight;
            let mut move_y = force_y * config.damping / weight;
            let move_dist = (move_x * move_x + move_y * move_y).sqrt();
            if move_dist > config.max_step {
                move_x = move_x / move_dist * config.max_step;
                move_y = move_y / move_dist * config.max_step;
            }

            let new_x = (bodies[i].x + move_x).clamp(-x_limit, x_limit);
            let new_y = (bodies[i].y + move_y).clamp(-y_limit, y_limit);

            let step_x = new_x - bodies[i].x;
            let step_y = new_y - bodies[i].y;
            let movement = (step_x * step_x + step_y * step_y).sqrt();
            max_movement = max_movement.max(movement);

            bodies[i].x = new_x;
            bodies[i].y = new_y;
        }

        outcome.iterations += 1;

        if max_movement < config.convergence_epsilon {
            outcome.converged = true;
            break;
        }
    }

    crate::log::debug!(
        iterations = outcome.iterations,
        converged = outcome.converged,
        "refinement pass done"
    );
    outcome
}

//! Session orchestration.
//!
//! One layout pass walks the caller's scene snapshot: partition anchors
//! into "already resolved" (manual, or auto with an unchanged input
//! fingerprint) and "needs placement", place the latter in ascending id
//! order with the configured strategy, and commit everything to the store.
//! A bad element is skipped and reported; it never aborts the pass.

pub mod collision;
pub mod directional;
pub mod force;
pub mod store;

pub use directional::{DIRECTIONS, EXTENDED_DIRECTIONS, Direction, Placement};
pub use force::{Body, RefineOutcome};
pub use store::{Label, PlacementMode, PlacementStore, StoreStats};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::AtomicBool;

use crate::config::{Config, PlacementStrategy};
use crate::errors::GeometryError;
use crate::geometry::BoundingBox;
use crate::scene::{AnchorSpec, CanvasBounds, LabelCategory, Scene, SectorObstacle};

/// Direction tag reported for positions pinned by the user.
pub const MANUAL_TAG: &str = "manual";
/// Direction tag reported for positions produced by the force refiner.
pub const REFINED_TAG: &str = "refined";

/// Final position report for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelResult {
    pub x: f64,
    pub y: f64,
    pub direction: String,
    /// True when the committed box cleared bounds, sectors, and the other
    /// committed boxes. False flags a fallback or residual collision.
    pub resolved: bool,
}

/// An element dropped from the pass, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedElement {
    pub id: String,
    pub reason: GeometryError,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutOutcome {
    pub labels: BTreeMap<String, LabelResult>,
    pub skipped: Vec<SkippedElement>,
}

/// FNV-1a over a byte stream. Used for input fingerprints and for the
/// refiner's degenerate-direction tie-break; must stay stable across runs
/// and platforms.
pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Host-side helper: would a manual drop at `(x, y)` keep the label inside
/// the canvas? Advisory only — `record_manual_move` preserves whatever the
/// caller commits.
pub fn validate_manual_position(
    x: f64,
    y: f64,
    category: LabelCategory,
    bounds: &CanvasBounds,
    config: &Config,
) -> bool {
    let (width, height) = config.engine.sizes.size_for(category);
    let bbox = BoundingBox::from_center(x, y, width, height);
    collision::is_within_canvas(&bbox, bounds, config.engine.manual_bounds_margin)
}

/// One-shot stateless entry point: a fresh engine, one pass.
pub fn compute_layout(scene: &Scene, config: &Config) -> LayoutOutcome {
    Engine::new(config.clone()).compute_layout(scene)
}

/// One-shot entry for hosts that persist manual pins themselves: the map
/// is replayed as pins before the pass, so those elements keep their
/// positions verbatim.
pub fn compute_layout_with_manual(
    scene: &Scene,
    config: &Config,
    existing_manual: &BTreeMap<String, (f64, f64)>,
) -> LayoutOutcome {
    let mut engine = Engine::new(config.clone());
    for (element_id, (x, y)) in existing_manual {
        engine.record_manual_move(element_id, *x, *y);
    }
    engine.compute_layout(scene)
}

/// The placement engine: configuration plus the authoritative store.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: Config,
    store: PlacementStore,
}

/// An anchor admitted to the pass, with its resolved size and fingerprint.
struct Admitted<'a> {
    anchor: &'a AnchorSpec,
    width: f64,
    height: f64,
    context: u64,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: PlacementStore::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read access for rendering and persistence collaborators.
    pub fn store(&self) -> &PlacementStore {
        &self.store
    }

    /// Pin an element to an explicit position. The position is preserved
    /// verbatim — even outside the current bounds — until `reset_to_auto`.
    pub fn record_manual_move(&mut self, element_id: &str, x: f64, y: f64) {
        match self.store.remove(element_id) {
            Some(mut label) => {
                label.x = x;
                label.y = y;
                label.mode = PlacementMode::Manual;
                label.direction = MANUAL_TAG.to_string();
                label.context = 0;
                self.store.set(label);
            }
            None => {
                // Unknown element: remember the pin; size is filled in on
                // the next pass once the anchor's category is visible.
                self.store.set(Label {
                    element_id: element_id.to_string(),
                    anchor_id: element_id.to_string(),
                    x,
                    y,
                    width: 0.0,
                    height: 0.0,
                    mode: PlacementMode::Manual,
                    direction: MANUAL_TAG.to_string(),
                    resolved: true,
                    context: 0,
                });
            }
        }
    }

    /// Clear a pin so the next pass recomputes the element.
    pub fn reset_to_auto(&mut self, element_id: &str) -> bool {
        self.store.reset_to_auto(element_id)
    }

    pub fn compute_layout(&mut self, scene: &Scene) -> LayoutOutcome {
        self.compute_layout_with_cancel(scene, None)
    }

    /// Full pass with a cooperative cancellation flag, checked between
    /// refiner iterations. A cancelled pass still commits the best result
    /// found so far.
    pub fn compute_layout_with_cancel(
        &mut self,
        scene: &Scene,
        cancel: Option<&AtomicBool>,
    ) -> LayoutOutcome {
        let mut outcome = LayoutOutcome::default();

        // Labels whose anchors left the scene die with them.
        let present: BTreeSet<&str> = scene.anchors.iter().map(|a| a.id.as_str()).collect();
        self.store.retain(|id| present.contains(id));

        let sectors = admit_sectors(&scene.sectors, &mut outcome.skipped);
        let global = global_context_bytes(&sectors, &scene.bounds, &self.config);
        let mut admitted = self.admit_anchors(scene, &global, &mut outcome.skipped);
        admitted.sort_by(|a, b| a.anchor.id.cmp(&b.anchor.id));

        // Collect: reserve boxes for manual pins and for auto entries whose
        // fingerprint still matches; everything else needs placement.
        let mut reserved: Vec<BoundingBox> = Vec::new();
        let mut needing: Vec<&Admitted> = Vec::new();
        for entry in &admitted {
            let id = entry.anchor.id.as_str();
            match self.store.get(id) {
                Some(label) if label.is_manual() => {
                    reserved.push(BoundingBox::from_center(
                        label.x,
                        label.y,
                        entry.width,
                        entry.height,
                    ));
                }
                Some(label) if label.context == entry.context => {
                    reserved.push(label.bbox());
                }
                _ => needing.push(entry),
            }
        }

        // Place: the reserved boxes participate in collision checks but are
        // never recomputed.
        match self.config.engine.strategy {
            PlacementStrategy::Directional => {
                self.place_directional(&needing, &sectors, &scene.bounds, reserved);
            }
            PlacementStrategy::ForceDirected => {
                self.place_force_directed(
                    &admitted,
                    &needing,
                    &sectors,
                    &scene.bounds,
                    &reserved,
                    cancel,
                );
            }
        }

        // Commit phase already wrote the store; report every admitted
        // element, refreshing the honest resolved flag for manual pins.
        let committed: Vec<(String, BoundingBox)> = admitted
            .iter()
            .filter_map(|entry| {
                self.store.get(&entry.anchor.id).map(|label| {
                    // Sizes come from this pass's table, not the stored
                    // label: a pin recorded before the anchor was ever laid
                    // out has no size yet.
                    (
                        label.element_id.clone(),
                        BoundingBox::from_center(label.x, label.y, entry.width, entry.height),
                    )
                })
            })
            .collect();
        for entry in &admitted {
            let id = entry.anchor.id.as_str();
            let Some(label) = self.store.get(id) else {
                continue;
            };
            let result = if label.is_manual() {
                let others: Vec<BoundingBox> = committed
                    .iter()
                    .filter(|(other_id, _)| other_id != id)
                    .map(|(_, bbox)| *bbox)
                    .collect();
                let own_box =
                    BoundingBox::from_center(label.x, label.y, entry.width, entry.height);
                let resolved =
                    clear_of_everything(&own_box, &sectors, &others, &scene.bounds, &self.config);
                let refreshed = Label {
                    width: entry.width,
                    height: entry.height,
                    anchor_id: entry.anchor.id.clone(),
                    resolved,
                    ..label.clone()
                };
                let result = LabelResult {
                    x: refreshed.x,
                    y: refreshed.y,
                    direction: refreshed.direction.clone(),
                    resolved,
                };
                self.store.set(refreshed);
                result
            } else {
                LabelResult {
                    x: label.x,
                    y: label.y,
                    direction: label.direction.clone(),
                    resolved: label.resolved,
                }
            };
            outcome.labels.insert(id.to_string(), result);
        }

        outcome
    }

    /// Per-element validation; reports offenders, keeps the rest.
    fn admit_anchors<'a>(
        &self,
        scene: &'a Scene,
        global: &[u8],
        skipped: &mut Vec<SkippedElement>,
    ) -> Vec<Admitted<'a>> {
        let mut admitted = Vec::with_capacity(scene.anchors.len());
        for anchor in &scene.anchors {
            if let Err(reason) = anchor.validate() {
                skipped.push(SkippedElement {
                    id: anchor.id.clone(),
                    reason,
                });
                continue;
            }
            let (width, height) = self.config.engine.sizes.size_for(anchor.category);
            if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
                skipped.push(SkippedElement {
                    id: anchor.id.clone(),
                    reason: GeometryError::DegenerateLabelSize { width, height },
                });
                continue;
            }
            let context = element_fingerprint(global, anchor, width, height);
            admitted.push(Admitted {
                anchor,
                width,
                height,
                context,
            });
        }
        admitted
    }

    fn place_directional(
        &mut self,
        needing: &[&Admitted],
        sectors: &[SectorObstacle],
        bounds: &CanvasBounds,
        mut placed: Vec<BoundingBox>,
    ) {
        for entry in needing {
            let placement = directional::place_label(
                entry.anchor.x,
                entry.anchor.y,
                (entry.width, entry.height),
                sectors,
                &placed,
                bounds,
                &self.config.engine,
            );
            placed.push(BoundingBox::from_center(
                placement.x,
                placement.y,
                entry.width,
                entry.height,
            ));
            self.store.set(Label {
                element_id: entry.anchor.id.clone(),
                anchor_id: entry.anchor.id.clone(),
                x: placement.x,
                y: placement.y,
                width: entry.width,
                height: entry.height,
                mode: PlacementMode::Auto,
                direction: placement.direction.to_string(),
                resolved: placement.resolved,
                context: entry.context,
            });
        }
    }

    fn place_force_directed(
        &mut self,
        admitted: &[Admitted],
        needing: &[&Admitted],
        sectors: &[SectorObstacle],
        bounds: &CanvasBounds,
        reserved: &[BoundingBox],
        cancel: Option<&AtomicBool>,
    ) {
        // Movable bodies first in id order, seeded at the first-priority
        // directional offset, then static bodies for reserved labels and
        // anchor markers. Slice order is the refiner's visiting order.
        let seed = DIRECTIONS[0];
        let mut bodies: Vec<Body> = needing
            .iter()
            .map(|entry| {
                Body::movable_label(
                    entry.anchor.id.clone(),
                    entry.anchor.x + seed.dx,
                    entry.anchor.y + seed.dy,
                    entry.width,
                    entry.height,
                    entry.anchor.x,
                    entry.anchor.y,
                )
            })
            .collect();
        let movable_count = bodies.len();
        for (idx, bbox) in reserved.iter().enumerate() {
            let (cx, cy) = bbox.center();
            bodies.push(Body::static_obstacle(
                format!("reserved_{idx}"),
                cx,
                cy,
                bbox.width(),
                bbox.height(),
            ));
        }
        let marker = self.config.refiner.anchor_marker_size;
        for entry in admitted {
            bodies.push(Body::static_obstacle(
                format!("anchor_{}", entry.anchor.id),
                entry.anchor.x,
                entry.anchor.y,
                marker,
                marker,
            ));
        }

        force::refine(&mut bodies, sectors, bounds, &self.config.refiner, cancel);

        // Accept refined positions, recording residual collisions honestly.
        let final_boxes: Vec<BoundingBox> = bodies[..movable_count]
            .iter()
            .map(Body::bbox)
            .collect();
        for (idx, entry) in needing.iter().enumerate() {
            let body = &bodies[idx];
            let bbox = body.bbox();
            let mut others: Vec<BoundingBox> = reserved.to_vec();
            others.extend(
                final_boxes
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != idx)
                    .map(|(_, b)| *b),
            );
            let resolved =
                clear_of_everything(&bbox, sectors, &others, bounds, &self.config);
            self.store.set(Label {
                element_id: entry.anchor.id.clone(),
                anchor_id: entry.anchor.id.clone(),
                x: body.x,
                y: body.y,
                width: entry.width,
                height: entry.height,
                mode: PlacementMode::Auto,
                direction: REFINED_TAG.to_string(),
                resolved,
                context: entry.context,
            });
        }
    }
}

fn clear_of_everything(
    bbox: &BoundingBox,
    sectors: &[SectorObstacle],
    others: &[BoundingBox],
    bounds: &CanvasBounds,
    config: &Config,
) -> bool {
    collision::is_within_canvas(bbox, bounds, config.engine.border_margin)
        && !collision::collides_with_obstacles(bbox, sectors)
        && !collision::collides_with_placed(bbox, others, config.engine.collision_margin)
}

fn admit_sectors(
    sectors: &[SectorObstacle],
    skipped: &mut Vec<SkippedElement>,
) -> Vec<SectorObstacle> {
    let mut admitted = Vec::with_capacity(sectors.len());
    for (idx, sector) in sectors.iter().enumerate() {
        match sector.validate() {
            Ok(()) => admitted.push(sector.normalized()),
            Err(reason) => skipped.push(SkippedElement {
                id: format!("sector_{idx}"),
                reason,
            }),
        }
    }
    admitted
}

fn push_f64(bytes: &mut Vec<u8>, value: f64) {
    bytes.extend_from_slice(&value.to_bits().to_le_bytes());
}

/// Bytes shared by every element fingerprint in a pass: the obstacle set,
/// the bounds, and every config knob that can move a computed position.
fn global_context_bytes(
    sectors: &[SectorObstacle],
    bounds: &CanvasBounds,
    config: &Config,
) -> Vec<u8> {
    let mut bytes = Vec::new();
    for sector in sectors {
        push_f64(&mut bytes, sector.center_x);
        push_f64(&mut bytes, sector.center_y);
        push_f64(&mut bytes, sector.radius);
        push_f64(&mut bytes, sector.start_angle_deg);
        push_f64(&mut bytes, sector.end_angle_deg);
    }
    push_f64(&mut bytes, bounds.x_range);
    push_f64(&mut bytes, bounds.y_range);
    push_f64(&mut bytes, config.engine.border_margin);
    push_f64(&mut bytes, config.engine.collision_margin);
    bytes.push(match config.engine.strategy {
        PlacementStrategy::Directional => 0,
        PlacementStrategy::ForceDirected => 1,
    });
    if config.engine.strategy == PlacementStrategy::ForceDirected {
        let refiner = &config.refiner;
        bytes.extend_from_slice(&refiner.iterations.to_le_bytes());
        push_f64(&mut bytes, refiner.repulsion_strength);
        push_f64(&mut bytes, refiner.anchor_attraction);
        push_f64(&mut bytes, refiner.anchor_slack);
        push_f64(&mut bytes, refiner.sector_repulsion);
        push_f64(&mut bytes, refiner.damping);
        push_f64(&mut bytes, refiner.max_step);
        push_f64(&mut bytes, refiner.min_distance);
        push_f64(&mut bytes, refiner.near_distance);
        push_f64(&mut bytes, refiner.convergence_epsilon);
        push_f64(&mut bytes, refiner.boundary_margin);
        push_f64(&mut bytes, refiner.boundary_falloff);
        push_f64(&mut bytes, refiner.anchor_marker_size);
    }
    bytes
}

/// Fingerprint of everything one element's committed position depends on.
/// Never zero — zero is the store's "must recompute" sentinel.
fn element_fingerprint(global: &[u8], anchor: &AnchorSpec, width: f64, height: f64) -> u64 {
    let mut bytes = global.to_vec();
    bytes.extend_from_slice(anchor.id.as_bytes());
    bytes.push(0);
    push_f64(&mut bytes, anchor.x);
    push_f64(&mut bytes, anchor.y);
    push_f64(&mut bytes, width);
    push_f64(&mut bytes, height);
    let hash = fnv1a(&bytes);
    if hash == 0 { 1 } else { hash }
}

use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::placement::{LayoutOutcome, PlacementStore};
use crate::scene::Scene;

/// Serializable snapshot of a computed placement, for debugging and for
/// diffing two runs of the same scene.
#[derive(Debug, Serialize)]
pub struct PlacementDump {
    pub bounds: BoundsDump,
    pub sectors: Vec<SectorDump>,
    pub labels: Vec<LabelDump>,
    pub skipped: Vec<SkippedDump>,
}

#[derive(Debug, Serialize)]
pub struct BoundsDump {
    pub x_range: f64,
    pub y_range: f64,
}

#[derive(Debug, Serialize)]
pub struct SectorDump {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub start_angle_deg: f64,
    pub end_angle_deg: f64,
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub element_id: String,
    pub anchor_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub mode: String,
    pub direction: String,
    pub resolved: bool,
}

#[derive(Debug, Serialize)]
pub struct SkippedDump {
    pub id: String,
    pub reason: String,
}

pub fn build_placement_dump(
    scene: &Scene,
    outcome: &LayoutOutcome,
    store: &PlacementStore,
) -> PlacementDump {
    PlacementDump {
        bounds: BoundsDump {
            x_range: scene.bounds.x_range,
            y_range: scene.bounds.y_range,
        },
        sectors: scene
            .sectors
            .iter()
            .map(|sector| SectorDump {
                center_x: sector.center_x,
                center_y: sector.center_y,
                radius: sector.radius,
                start_angle_deg: sector.start_angle_deg,
                end_angle_deg: sector.end_angle_deg,
            })
            .collect(),
        labels: store
            .iter()
            .map(|label| LabelDump {
                element_id: label.element_id.clone(),
                anchor_id: label.anchor_id.clone(),
                x: label.x,
                y: label.y,
                width: label.width,
                height: label.height,
                mode: if label.is_manual() {
                    "manual".to_string()
                } else {
                    "auto".to_string()
                },
                direction: label.direction.clone(),
                resolved: label.resolved,
            })
            .collect(),
        skipped: outcome
            .skipped
            .iter()
            .map(|skip| SkippedDump {
                id: skip.id.clone(),
                reason: skip.reason.to_string(),
            })
            .collect(),
    }
}

pub fn write_placement_dump(
    path: &Path,
    scene: &Scene,
    outcome: &LayoutOutcome,
    store: &PlacementStore,
) -> anyhow::Result<()> {
    let dump = build_placement_dump(scene, outcome, store);
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::placement::Engine;
    use crate::scene::{AnchorSpec, CanvasBounds, LabelCategory};

    #[test]
    fn dump_reflects_store_and_skips() {
        let mut engine = Engine::new(Config::default());
        let scene = Scene {
            anchors: vec![
                AnchorSpec {
                    id: "a".to_string(),
                    x: 0.0,
                    y: 0.0,
                    category: LabelCategory::Device,
                },
                AnchorSpec {
                    id: "bad".to_string(),
                    x: f64::NAN,
                    y: 0.0,
                    category: LabelCategory::Device,
                },
            ],
            sectors: Vec::new(),
            bounds: CanvasBounds::new(10.0, 10.0),
        };
        let outcome = engine.compute_layout(&scene);
        let dump = build_placement_dump(&scene, &outcome, engine.store());
        assert_eq!(dump.labels.len(), 1);
        assert_eq!(dump.labels[0].mode, "auto");
        assert_eq!(dump.skipped.len(), 1);
        let json = serde_json::to_string(&dump).expect("dump should serialize");
        assert!(json.contains("\"element_id\": \"a\"") || json.contains("\"element_id\":\"a\""));
    }
}

//! Input snapshot model.
//!
//! A `Scene` is a value snapshot handed to the engine per layout call: the
//! engine never queries a live mutable model and never mutates caller-owned
//! input. Validation happens here, per element, before any geometry runs.

use serde::{Deserialize, Serialize};

use crate::errors::GeometryError;
use crate::geometry::{BoundingBox, normalize_angle_deg};

/// Semantic label category, keyed into the configured size table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LabelCategory {
    #[default]
    Device,
    Measurement,
    User,
}

impl LabelCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelCategory::Device => "device",
            LabelCategory::Measurement => "measurement",
            LabelCategory::User => "user",
        }
    }
}

/// An anchor point to annotate. The id is the caller's stable identity and
/// drives every deterministic ordering in the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorSpec {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub category: LabelCategory,
}

impl AnchorSpec {
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.id.is_empty() {
            return Err(GeometryError::EmptyElementId);
        }
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate {
                context: format!("anchor {}", self.id),
            });
        }
        Ok(())
    }
}

/// A circular-sector keep-out region. Angles are degrees counter-clockwise
/// from the positive x axis; the range may wrap across 0°.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorObstacle {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub start_angle_deg: f64,
    pub end_angle_deg: f64,
}

impl SectorObstacle {
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.center_x.is_finite()
            || !self.center_y.is_finite()
            || !self.radius.is_finite()
            || !self.start_angle_deg.is_finite()
            || !self.end_angle_deg.is_finite()
        {
            return Err(GeometryError::NonFiniteCoordinate {
                context: "sector".to_string(),
            });
        }
        if self.radius < 0.0 {
            return Err(GeometryError::NegativeRadius {
                radius: self.radius,
            });
        }
        Ok(())
    }

    /// Copy with both angles mapped onto `[0, 360)`.
    pub fn normalized(&self) -> SectorObstacle {
        SectorObstacle {
            start_angle_deg: normalize_angle_deg(self.start_angle_deg),
            end_angle_deg: normalize_angle_deg(self.end_angle_deg),
            ..*self
        }
    }
}

/// Symmetric canvas `[-x_range, x_range] × [-y_range, y_range]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    pub x_range: f64,
    pub y_range: f64,
}

impl CanvasBounds {
    pub fn new(x_range: f64, y_range: f64) -> Self {
        Self { x_range, y_range }
    }

    pub fn to_box(&self) -> BoundingBox {
        BoundingBox::new(-self.x_range, -self.y_range, self.x_range, self.y_range)
    }
}

impl Default for CanvasBounds {
    fn default() -> Self {
        Self {
            x_range: 10.0,
            y_range: 10.0,
        }
    }
}

/// One layout request: everything the engine reads in a single pass.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Scene {
    pub anchors: Vec<AnchorSpec>,
    #[serde(default)]
    pub sectors: Vec<SectorObstacle>,
    #[serde(default)]
    pub bounds: CanvasBounds,
}

/// Parse a scene from JSON. Strict JSON is tried first; JSON5 is accepted
/// as a fallback so hand-written scene files may carry comments and
/// trailing commas.
pub fn parse_scene(input: &str) -> anyhow::Result<Scene> {
    match serde_json::from_str::<Scene>(input) {
        Ok(scene) => Ok(scene),
        Err(strict_err) => match json5::from_str::<Scene>(input) {
            Ok(scene) => Ok(scene),
            Err(_) => Err(strict_err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_rejects_empty_id() {
        let anchor = AnchorSpec {
            id: String::new(),
            x: 0.0,
            y: 0.0,
            category: LabelCategory::Device,
        };
        assert_eq!(anchor.validate(), Err(GeometryError::EmptyElementId));
    }

    #[test]
    fn anchor_rejects_nan() {
        let anchor = AnchorSpec {
            id: "a".to_string(),
            x: f64::NAN,
            y: 0.0,
            category: LabelCategory::Device,
        };
        assert!(anchor.validate().is_err());
    }

    #[test]
    fn sector_rejects_negative_radius() {
        let sector = SectorObstacle {
            center_x: 0.0,
            center_y: 0.0,
            radius: -1.0,
            start_angle_deg: 0.0,
            end_angle_deg: 90.0,
        };
        assert_eq!(
            sector.validate(),
            Err(GeometryError::NegativeRadius { radius: -1.0 })
        );
    }

    #[test]
    fn sector_normalization_wraps_angles() {
        let sector = SectorObstacle {
            center_x: 0.0,
            center_y: 0.0,
            radius: 1.0,
            start_angle_deg: -45.0,
            end_angle_deg: 405.0,
        };
        let normalized = sector.normalized();
        assert_eq!(normalized.start_angle_deg, 315.0);
        assert_eq!(normalized.end_angle_deg, 45.0);
    }

    #[test]
    fn bounds_box_is_symmetric() {
        let bounds = CanvasBounds::new(10.0, 8.0);
        let bbox = bounds.to_box();
        assert_eq!(bbox.x_min, -10.0);
        assert_eq!(bbox.y_max, 8.0);
    }

    #[test]
    fn parse_scene_strict_json() {
        let input = r#"{"anchors": [{"id": "a", "x": 1.0, "y": 2.0}], "bounds": {"x_range": 5.0, "y_range": 5.0}}"#;
        let scene = parse_scene(input).expect("strict JSON should parse");
        assert_eq!(scene.anchors.len(), 1);
        assert_eq!(scene.anchors[0].category, LabelCategory::Device);
    }

    #[test]
    fn parse_scene_json5_fallback() {
        let input = r#"{
            // two anchors, default bounds
            anchors: [
                {id: "a", x: 0, y: 0, category: "measurement"},
                {id: "b", x: 1, y: 1},
            ],
        }"#;
        let scene = parse_scene(input).expect("JSON5 should parse");
        assert_eq!(scene.anchors[0].category, LabelCategory::Measurement);
        assert_eq!(scene.bounds.x_range, 10.0);
    }
}

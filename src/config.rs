use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::scene::LabelCategory;

/// Which placement strategy a pass runs. This is a configuration-time
/// choice: the engine never switches strategies based on scene density,
/// so identical input always takes the identical code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementStrategy {
    #[default]
    Directional,
    ForceDirected,
}

/// Label dimensions per semantic category, `[width, height]` in scene units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSizeTable {
    pub device: [f64; 2],
    pub measurement: [f64; 2],
    pub user: [f64; 2],
}

impl LabelSizeTable {
    pub fn size_for(&self, category: LabelCategory) -> (f64, f64) {
        let [w, h] = match category {
            LabelCategory::Device => self.device,
            LabelCategory::Measurement => self.measurement,
            LabelCategory::User => self.user,
        };
        (w, h)
    }
}

impl Default for LabelSizeTable {
    fn default() -> Self {
        Self {
            device: [2.0, 0.8],
            measurement: [2.5, 1.2],
            user: [1.8, 0.6],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum clearance between a label box and the canvas edge.
    pub border_margin: f64,
    /// Minimum clearance between two label boxes.
    pub collision_margin: f64,
    /// Looser margin used when validating a manual drop position.
    pub manual_bounds_margin: f64,
    pub sizes: LabelSizeTable,
    pub strategy: PlacementStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            border_margin: 0.3,
            collision_margin: 0.1,
            manual_bounds_margin: 0.1,
            sizes: LabelSizeTable::default(),
            strategy: PlacementStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinerConfig {
    /// Hard iteration ceiling. The loop may exit earlier on convergence,
    /// never on wall-clock time.
    pub iterations: u32,
    pub repulsion_strength: f64,
    pub anchor_attraction: f64,
    /// Pull toward the anchor only engages beyond this distance.
    pub anchor_slack: f64,
    pub sector_repulsion: f64,
    pub damping: f64,
    /// Cap on per-iteration displacement of one element.
    pub max_step: f64,
    /// Elements closer than this still repel at the clamped distance.
    pub min_distance: f64,
    /// Weak repulsion engages below this separation.
    pub near_distance: f64,
    /// Early exit once no element moved further than this in a full pass.
    pub convergence_epsilon: f64,
    /// Clamp distance from the canvas edge.
    pub boundary_margin: f64,
    /// Soft push-back starts this far inside the clamped edge.
    pub boundary_falloff: f64,
    /// Side length of the static box kept around each anchor marker.
    pub anchor_marker_size: f64,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            repulsion_strength: 0.3,
            anchor_attraction: 0.2,
            anchor_slack: 0.5,
            sector_repulsion: 0.9,
            damping: 0.85,
            max_step: 0.5,
            min_distance: 0.01,
            near_distance: 2.0,
            convergence_epsilon: 0.01,
            boundary_margin: 0.5,
            boundary_falloff: 1.0,
            anchor_marker_size: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub refiner: RefinerConfig,
}

/// Load a config from a JSON file. A missing path yields the defaults;
/// absent sections fall back per-field.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&contents)?;
    Ok(config)
}

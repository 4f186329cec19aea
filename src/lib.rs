#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod geometry;
pub mod layout_dump;
pub mod log;
pub mod placement;
pub mod scene;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, EngineConfig, PlacementStrategy, RefinerConfig, load_config};
pub use placement::{
    Engine, LabelResult, LayoutOutcome, PlacementStore, SkippedElement, compute_layout,
    compute_layout_with_manual, validate_manual_position,
};
pub use scene::{AnchorSpec, CanvasBounds, LabelCategory, Scene, SectorObstacle, parse_scene};

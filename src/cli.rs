use crate::config::{PlacementStrategy, load_config};
use crate::layout_dump::write_placement_dump;
use crate::placement::{Engine, LayoutOutcome};
use crate::scene::parse_scene;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "labelplace",
    version,
    about = "Deterministic label placement for annotated 2D scenes"
)]
pub struct Args {
    /// Scene file (JSON/JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for placement JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (engine and refiner sections)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Placement strategy, overriding the config file
    #[arg(short = 's', long = "strategy", value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Write a full placement dump (labels, modes, skips) to this path
    #[arg(long = "dump")]
    pub dump: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum StrategyArg {
    Directional,
    Force,
}

impl StrategyArg {
    fn to_strategy(self) -> PlacementStrategy {
        match self {
            StrategyArg::Directional => PlacementStrategy::Directional,
            StrategyArg::Force => PlacementStrategy::ForceDirected,
        }
    }
}

#[derive(Debug, Serialize)]
struct ResultOutput {
    element_id: String,
    x: f64,
    y: f64,
    direction: String,
    resolved: bool,
}

#[derive(Debug, Serialize)]
struct SkipOutput {
    id: String,
    reason: String,
}

#[derive(Debug, Serialize)]
struct PlacementOutput {
    labels: Vec<ResultOutput>,
    skipped: Vec<SkipOutput>,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(strategy) = args.strategy {
        config.engine.strategy = strategy.to_strategy();
    }

    let input = read_input(args.input.as_deref())?;
    let scene = parse_scene(&input)?;

    let mut engine = Engine::new(config);
    let outcome = engine.compute_layout(&scene);

    let rendered = render_output(&outcome)?;
    write_output(&rendered, args.output.as_deref())?;

    if let Some(dump_path) = args.dump.as_deref() {
        write_placement_dump(dump_path, &scene, &outcome, engine.store())?;
    }
    Ok(())
}

fn render_output(outcome: &LayoutOutcome) -> Result<String> {
    let output = PlacementOutput {
        labels: outcome
            .labels
            .iter()
            .map(|(id, result)| ResultOutput {
                element_id: id.clone(),
                x: result.x,
                y: result.y,
                direction: result.direction.clone(),
                resolved: result.resolved,
            })
            .collect(),
        skipped: outcome
            .skipped
            .iter()
            .map(|skip| SkipOutput {
                id: skip.id.clone(),
                reason: skip.reason.to_string(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output(rendered: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, rendered)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn rendered_output_lists_labels_and_skips() {
        let scene = parse_scene(
            r#"{
                "anchors": [{"id": "a", "x": 0.0, "y": 0.0}],
                "bounds": {"x_range": 10.0, "y_range": 10.0}
            }"#,
        )
        .expect("scene should parse");
        let mut engine = Engine::new(Config::default());
        let outcome = engine.compute_layout(&scene);
        let rendered = render_output(&outcome).expect("render");
        assert!(rendered.contains("\"element_id\": \"a\""));
        assert!(rendered.contains("\"direction\": \"upper-right\""));
        let parsed: serde_json::Value = serde_json::from_str(&rendered).expect("valid JSON");
        assert!(parsed["skipped"].as_array().expect("skipped array").is_empty());
    }

    #[test]
    fn strategy_arg_maps_to_config_strategy() {
        assert_eq!(
            StrategyArg::Force.to_strategy(),
            PlacementStrategy::ForceDirected
        );
        assert_eq!(
            StrategyArg::Directional.to_strategy(),
            PlacementStrategy::Directional
        );
    }
}

mod app;
mod util;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use skill_radar::config::EngineConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Skill snapshot JSON (`{ "tags": [...], "nodes": [...] }`); the bundled demo when omitted.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Engine tuning JSON; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for layout jitter, for reproducible layouts.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    log::debug!("engine config: {config:?}");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };

    eframe::run_native(
        "skill-radar",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::SkillRadarApp::new(
                cc,
                args.snapshot.clone(),
                config.clone(),
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}

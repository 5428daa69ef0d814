use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2};
use skill_radar::config::EngineConfig;
use skill_radar::engine::RadialEngine;
use skill_radar::model::{Focus, NodeId, Visibility};
use skill_radar::snapshot::SkillSnapshot;

mod graph;
mod render_utils;
mod ui;

pub struct SkillRadarApp {
    snapshot_path: Option<PathBuf>,
    config: EngineConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<SkillSnapshot, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<SkillSnapshot, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    snapshot: SkillSnapshot,
    engine: RadialEngine,
    focus: Focus,
    show_difficulty: bool,
    visibility: Visibility,
    layout_dirty: bool,
    live_physics: bool,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    selected: Option<NodeId>,
    touches: BTreeMap<u64, Pos2>,
    mouse_down: bool,
    ignore_pointer_until: f64,
    last_tap: Option<String>,
}

struct SearchMatchCache {
    query: String,
    matches: Arc<HashSet<NodeId>>,
}

impl SkillRadarApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        snapshot_path: Option<PathBuf>,
        config: EngineConfig,
    ) -> Self {
        let state = Self::start_load(snapshot_path.clone());
        Self {
            snapshot_path,
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(snapshot_path: Option<PathBuf>) -> Receiver<Result<SkillSnapshot, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = match &snapshot_path {
                Some(path) => SkillSnapshot::load(path),
                None => SkillSnapshot::demo(),
            }
            .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(snapshot_path: Option<PathBuf>) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(snapshot_path),
        }
    }

    fn source_label(&self) -> String {
        self.snapshot_path
            .as_ref()
            .map_or_else(|| "bundled demo".to_owned(), |path| path.display().to_string())
    }

    fn ready(&self, snapshot: SkillSnapshot) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(snapshot, self.config.clone())))
    }
}

impl eframe::App for SkillRadarApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut restart = false;
        let source = self.source_label();

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading skills...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load skill snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        restart = true;
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.snapshot_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if restart {
            self.state = Self::start_load(self.snapshot_path.clone());
            return;
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(snapshot) => {
                    log::info!(
                        "loaded {} skills and {} tags from {source}",
                        snapshot.nodes.len(),
                        snapshot.tags.len()
                    );
                    self.ready(snapshot)
                }
                Err(error) => {
                    log::error!("failed to load skills from {source}: {error}");
                    AppState::Error(error)
                }
            };
        }
    }
}

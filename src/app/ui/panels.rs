use std::collections::BTreeMap;

use eframe::egui::{self, Align, Context, Layout};
use skill_radar::config::EngineConfig;
use skill_radar::engine::RadialEngine;
use skill_radar::model::{Focus, NodeId, Visibility};
use skill_radar::snapshot::SkillSnapshot;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(snapshot: SkillSnapshot, config: EngineConfig) -> Self {
        Self {
            snapshot,
            engine: RadialEngine::new(config),
            focus: Focus::Overview,
            show_difficulty: true,
            visibility: Visibility::new(),
            layout_dirty: true,
            live_physics: true,
            search: String::new(),
            search_match_cache: None,
            selected: None,
            touches: BTreeMap::new(),
            mouse_down: false,
            ignore_pointer_until: 0.0,
            last_tap: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("skill-radar");
                    ui.separator();
                    ui.label(format!("source: {source}"));
                    ui.label(format!("skills: {}", self.snapshot.nodes.len()));
                    ui.label(format!("tags: {}", self.snapshot.tags.len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload skills"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.status_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading skills...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    fn status_text(&self) -> String {
        let snapshot = self.engine.latest_snapshot();
        let state = if self.engine.is_running() {
            format!("settling (alpha {:.3})", self.engine.alpha())
        } else {
            "idle".to_owned()
        };
        format!(
            "{} visible  |  zoom {:.2}x  |  {state}",
            snapshot.len(),
            self.engine.transform().scale
        )
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<NodeId>) {
        self.selected = selected;
    }

    pub(in crate::app) fn set_focus(&mut self, focus: Focus) {
        if self.focus == focus {
            return;
        }
        log::debug!("focus {:?} -> {focus:?}", self.focus);
        self.focus = focus;
        self.layout_dirty = true;
    }

    pub(in crate::app) fn set_visible(&mut self, key: &str, shown: bool) {
        if self.visibility.is_shown(key) == shown {
            return;
        }
        self.visibility.set(key, shown);
        if !shown && self.focus_key() == Some(key) {
            self.focus = Focus::Overview;
        }
        self.layout_dirty = true;
    }

    fn focus_key(&self) -> Option<&str> {
        match &self.focus {
            Focus::Overview => None,
            Focus::Category(tag) => Some(tag),
            Focus::Unassigned => Some(skill_radar::model::UNASSIGNED_KEY),
        }
    }
}

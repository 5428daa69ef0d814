use eframe::egui::{self, RichText, Ui};
use skill_radar::model::{Focus, UNASSIGNED_KEY};
use skill_radar::transform::ViewTransform;

use super::super::ViewModel;

fn focus_label(focus: &Focus) -> &str {
    match focus {
        Focus::Overview => "All sectors",
        Focus::Category(tag) => tag,
        Focus::Unassigned => "Unassigned",
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Layout");
        ui.add_space(4.0);

        let mut focus = self.focus.clone();
        egui::ComboBox::from_label("Focus")
            .selected_text(focus_label(&focus).to_owned())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut focus, Focus::Overview, "All sectors");
                for tag in &self.snapshot.tags {
                    if self.visibility.is_shown(&tag.name) {
                        let option = Focus::Category(tag.name.clone());
                        ui.selectable_value(&mut focus, option, tag.name.as_str());
                    }
                }
                if self.visibility.is_shown(UNASSIGNED_KEY) {
                    ui.selectable_value(&mut focus, Focus::Unassigned, "Unassigned");
                }
            });
        self.set_focus(focus);

        let mut show_difficulty = self.show_difficulty;
        if ui
            .checkbox(&mut show_difficulty, "Difficulty rings")
            .on_hover_text("Place skills on per-difficulty rings instead of one shared ring")
            .changed()
        {
            self.show_difficulty = show_difficulty;
            self.layout_dirty = true;
        }

        ui.separator();
        ui.label(RichText::new("Visible sectors").strong());
        let entries = self
            .snapshot
            .tags
            .iter()
            .map(|tag| (tag.name.clone(), self.tag_color(&tag.name)))
            .collect::<Vec<_>>();
        for (name, color) in entries {
            let mut shown = self.visibility.is_shown(&name);
            ui.horizontal(|ui| {
                ui.label(RichText::new("●").color(color));
                if ui.checkbox(&mut shown, name.as_str()).changed() {
                    self.set_visible(&name, shown);
                }
            });
        }
        let mut unassigned_shown = self.visibility.is_shown(UNASSIGNED_KEY);
        if ui
            .checkbox(&mut unassigned_shown, "Unassigned ring")
            .changed()
        {
            self.set_visible(UNASSIGNED_KEY, unassigned_shown);
        }

        ui.separator();
        ui.label(RichText::new("Search").strong());
        ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("fuzzy match on titles")
                .desired_width(f32::INFINITY),
        );
        if let Some(matches) = self.cached_search_matches() {
            ui.small(format!("{} matching skills", matches.len()));
        }

        ui.separator();
        ui.label(RichText::new("Simulation").strong());
        ui.checkbox(&mut self.live_physics, "Live physics");
        ui.horizontal(|ui| {
            if ui.button("Reheat").clicked() {
                self.engine.reheat();
            }
            if ui.button("Relayout").clicked() {
                self.engine.reset();
                self.layout_dirty = true;
            }
            if ui.button("Stop").clicked() {
                self.engine.stop();
            }
        });
        if ui.button("Reset view").clicked() {
            self.engine.set_transform(ViewTransform::IDENTITY);
        }

        ui.separator();
        let transform = self.engine.transform();
        ui.small(format!(
            "pan ({:.0}, {:.0})  zoom {:.2}x",
            transform.offset.x, transform.offset.y, transform.scale
        ));
        if let Some(tap) = &self.last_tap {
            ui.small(format!("last tap: {tap}"));
        }
        ui.small("Drag a skill to pin it while the rest of the graph reacts. Tap a sector to focus it; tap outside to zoom back out.");
    }
}

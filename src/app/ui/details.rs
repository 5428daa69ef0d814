use eframe::egui::{self, RichText, Ui};
use skill_radar::model::Focus;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Skill Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Tap a skill in the graph to see its details.");
            return;
        };

        let Some(node) = self.snapshot.node(&selected_id).cloned() else {
            ui.label("Selected skill no longer exists in the snapshot.");
            return;
        };

        ui.label(RichText::new(node.title.as_str()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);
        ui.label(format!("Difficulty: {}", node.difficulty.label()));

        let in_layout = self.engine.latest_snapshot().index_of(&node.id).is_some();
        if !in_layout {
            ui.label(RichText::new("Hidden by the current focus or visibility").weak());
        }

        ui.separator();
        ui.label(RichText::new("Tags").strong());
        let mut pending_focus = None;
        match node.primary_tag() {
            None => {
                ui.label("Unassigned (outer ring)");
            }
            Some(primary) => {
                ui.horizontal_wrapped(|ui| {
                    for (position, tag) in node.tags.iter().enumerate() {
                        let color = self.tag_color(tag);
                        let text = if position == 0 {
                            RichText::new(format!("{tag} (primary)")).color(color).strong()
                        } else {
                            RichText::new(tag.as_str()).color(color)
                        };
                        ui.label(text);
                    }
                });
                if self.snapshot.tag(primary).is_some()
                    && ui.button(format!("Focus {primary}")).clicked()
                {
                    pending_focus = Some(Focus::Category(primary.to_owned()));
                }
            }
        }

        ui.separator();
        ui.label(RichText::new("Links").strong());
        let mut pending_selection = None;
        if node.links.is_empty() {
            ui.label("No outgoing links.");
        }
        for link in &node.links {
            match self.snapshot.node(link) {
                Some(target) => {
                    if ui.link(target.title.as_str()).on_hover_text(link.as_str()).clicked() {
                        pending_selection = Some(link.clone());
                    }
                }
                None => {
                    ui.label(RichText::new(format!("{link} (missing)")).weak());
                }
            }
        }

        let referrers = self
            .snapshot
            .nodes
            .iter()
            .filter(|other| other.links.iter().any(|link| *link == node.id))
            .map(|other| (other.id.clone(), other.title.clone()))
            .collect::<Vec<_>>();
        ui.separator();
        ui.label(RichText::new("Linked from").strong());
        if referrers.is_empty() {
            ui.label("Nothing links here.");
        }
        egui::ScrollArea::vertical()
            .id_salt("referrers_scroll")
            .max_height(240.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for (id, title) in &referrers {
                    if ui.link(title.as_str()).on_hover_text(id.as_str()).clicked() {
                        pending_selection = Some(id.clone());
                    }
                }
            });

        ui.add_space(8.0);
        if ui.button("Clear selection").clicked() {
            self.set_selected(None);
        }
        if let Some(focus) = pending_focus {
            self.set_focus(focus);
        }
        if let Some(id) = pending_selection {
            self.set_selected(Some(id));
        }
    }
}

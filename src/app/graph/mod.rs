use eframe::egui::Vec2;
use skill_radar::engine::LayoutRequest;

use super::ViewModel;

mod interaction;
mod view;

impl ViewModel {
    fn layout_request(&self, viewport: Vec2) -> LayoutRequest {
        LayoutRequest {
            nodes: self.snapshot.nodes.clone(),
            tags: self.snapshot.tags.clone(),
            viewport,
            focus: self.focus.clone(),
            show_difficulty: self.show_difficulty,
            visibility: self.visibility.clone(),
        }
    }

    /// Hands the engine a new request when inputs or the viewport changed.
    pub(in crate::app) fn sync_layout(&mut self, viewport: Vec2) {
        if viewport.x < 1.0 || viewport.y < 1.0 {
            return;
        }
        if !self.layout_dirty && self.engine.viewport() == viewport {
            return;
        }

        let request = self.layout_request(viewport);
        if self.engine.configure(request) {
            log::debug!("layout refreshed for viewport {viewport:?}");
        }
        self.layout_dirty = false;
    }
}

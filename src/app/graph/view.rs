use std::collections::{HashMap, HashSet};
use std::f32::consts::PI;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Painter, Rect, Sense, Shape, Stroke, Ui, Vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use skill_radar::model::{Category, Difficulty, Focus, NodeId};
use skill_radar::scale::polar_to_graph;
use skill_radar::transform::ViewTransform;

use crate::util::short_title;

use super::super::render_utils::{
    UNASSIGNED_COLOR, blend_color, circle_visible, dim_color, draw_background, graph_to_screen,
    parse_hex_color, ring_stroke,
};
use super::super::{SearchMatchCache, ViewModel};

const WEDGE_STEPS: usize = 32;
const LABEL_CHARS: usize = 22;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl ViewModel {
    pub(in crate::app) fn tag_color(&self, name: &str) -> Color32 {
        self.snapshot
            .tag(name)
            .and_then(|tag| parse_hex_color(&tag.color))
            .unwrap_or(UNASSIGNED_COLOR)
    }

    fn category_color(&self, category: &Category) -> Color32 {
        match category {
            Category::Tag(name) => self.tag_color(name),
            Category::Unassigned => UNASSIGNED_COLOR,
        }
    }

    pub(in crate::app) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<NodeId>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .snapshot
            .nodes
            .iter()
            .filter(|node| fuzzy_match_score(&matcher, &node.title, query).is_some())
            .map(|node| node.id.clone())
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    fn draw_guides(&self, painter: &Painter, rect: Rect, transform: ViewTransform, has_unassigned: bool) {
        let scale = self.engine.scale();
        let zoom = transform.safe_scale();
        let center = graph_to_screen(rect, transform, Vec2::ZERO);
        let to_screen = |angle: f32, radius: f32| graph_to_screen(rect, transform, polar_to_graph(angle, radius));

        if let Focus::Category(tag) = &self.focus
            && let Some(band) = scale.angular.band(tag)
        {
            let tint = self.tag_color(tag).gamma_multiply(0.12);
            if band.width >= PI {
                painter.circle_filled(center, scale.outer_radius * zoom, tint);
            } else {
                let mut points = Vec::with_capacity(WEDGE_STEPS + 2);
                points.push(center);
                points.extend((0..=WEDGE_STEPS).map(|step| {
                    let angle = band.start + band.width * step as f32 / WEDGE_STEPS as f32;
                    to_screen(angle, scale.outer_radius)
                }));
                painter.add(Shape::convex_polygon(points, tint, Stroke::NONE));
            }
        }

        painter.circle_stroke(center, scale.outer_radius * zoom, ring_stroke(150));
        painter.circle_stroke(center, scale.inner_radius * zoom, ring_stroke(90));

        if self.show_difficulty {
            for (level, difficulty) in Difficulty::ALL.iter().enumerate() {
                let Some(band) = scale.radial.band(level) else {
                    continue;
                };
                painter.circle_stroke(center, band.outer * zoom, ring_stroke(55));
                painter.text(
                    to_screen(0.0, band.mid()),
                    Align2::CENTER_CENTER,
                    difficulty.label(),
                    FontId::proportional(10.0),
                    Color32::from_gray(120),
                );
            }
        }

        if scale.angular.len() > 1 {
            for (_, band) in scale.angular.bands() {
                painter.line_segment(
                    [
                        to_screen(band.start, scale.inner_radius),
                        to_screen(band.start, scale.outer_radius),
                    ],
                    ring_stroke(110),
                );
            }
        }

        for (name, band) in scale.angular.bands() {
            painter.text(
                to_screen(band.mid(), scale.outer_radius + 16.0 / zoom),
                Align2::CENTER_CENTER,
                name,
                FontId::proportional(13.0),
                self.tag_color(name),
            );
        }

        if has_unassigned {
            let ring = scale.unassigned_radius(self.engine.config().layout.unassigned_ring_offset);
            painter.circle_stroke(center, ring * zoom, ring_stroke(45));
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        self.sync_layout(rect.size());
        self.handle_graph_zoom(ui, rect, &response);

        let pointer_events = self.collect_pointer_events(ui, rect, &response);
        let mut graph_events = Vec::new();
        for event in &pointer_events {
            self.engine.handle_pointer(event, &mut graph_events);
        }
        self.apply_graph_events(graph_events);
        // A sector tap changes focus; relayout before drawing this frame.
        self.sync_layout(rect.size());

        let dragging = self.engine.dragged_node().is_some();
        let moving = (self.live_physics || dragging) && self.engine.tick().is_some();
        if moving || dragging || !pointer_events.is_empty() {
            ui.ctx().request_repaint();
        }

        let snapshot = self.engine.latest_snapshot();
        let transform = self.engine.transform();
        let zoom = transform.safe_scale();
        let has_unassigned = snapshot
            .categories
            .iter()
            .any(|category| *category == Category::Unassigned);
        self.draw_guides(&painter, rect, transform, has_unassigned);

        if snapshot.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No visible skills",
                FontId::proportional(15.0),
                Color32::from_gray(170),
            );
            return;
        }

        let search_matches = self.cached_search_matches();
        let hovered = self.hovered_index(ui, rect);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let titles = self
            .snapshot
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node.title.as_str()))
            .collect::<HashMap<_, _>>();
        let selected_index = self
            .selected
            .as_deref()
            .and_then(|id| snapshot.index_of(id));
        let screen_positions = snapshot
            .positions
            .iter()
            .map(|position| graph_to_screen(rect, transform, *position))
            .collect::<Vec<_>>();

        for &(source, target) in snapshot.edges.iter() {
            let touches_selection =
                selected_index.is_some_and(|index| index == source || index == target);
            let stroke = if touches_selection {
                Stroke::new(2.0, Color32::from_rgb(241, 146, 94))
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(110, 110, 110, 120))
            };
            painter.line_segment([screen_positions[source], screen_positions[target]], stroke);
        }

        let radius = (self.engine.config().node_radius * zoom).clamp(3.0, 26.0);
        let selected_color = Color32::from_rgb(245, 206, 93);
        for (index, position) in screen_positions.iter().copied().enumerate() {
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let id = snapshot.ids[index].as_str();
            let is_selected = selected_index == Some(index);
            let is_hovered = hovered == Some(index);
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(id));

            let base = self.category_color(&snapshot.categories[index]);
            let color = if is_hovered {
                blend_color(base, Color32::WHITE, 0.35)
            } else if search_matches.is_some() && !is_match {
                dim_color(base, 0.35)
            } else {
                base
            };

            painter.circle_filled(position, radius, color);
            let outline = if is_selected {
                Stroke::new(2.5, selected_color)
            } else if snapshot.fixed[index] {
                Stroke::new(2.0, Color32::WHITE)
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(position, radius, outline);

            let show_label = is_selected
                || is_hovered
                || is_match
                || zoom > 1.4
                || self.focus.is_zoomed();
            if show_label {
                let title = titles.get(id).copied().unwrap_or(id);
                painter.text(
                    position + egui::vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    short_title(title, LABEL_CHARS),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if let Some(index) = hovered
            && let Some(node) = self.snapshot.node(&snapshot.ids[index])
        {
            let tags = if node.tags.is_empty() {
                "unassigned".to_owned()
            } else {
                node.tags.join(", ")
            };
            painter.text(
                rect.left_top() + egui::vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {}  |  {tags}", node.title, node.difficulty.label()),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}

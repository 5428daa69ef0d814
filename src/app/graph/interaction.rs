use eframe::egui::{self, Event, PointerButton, Pos2, Rect, TouchPhase, Ui};
use skill_radar::engine::GraphEvent;
use skill_radar::gesture::PointerEvent;
use skill_radar::hit_test::node_at;
use skill_radar::model::Focus;

use super::super::ViewModel;
use super::super::render_utils::to_viewport;

/// Emulated mouse events trail real touches; ignore them for this long.
const TOUCH_POINTER_GRACE_SECS: f64 = 0.5;

impl ViewModel {
    fn active_touches(&self) -> Vec<Pos2> {
        self.touches.values().copied().collect()
    }

    /// Turns this frame's raw egui input into engine pointer events.
    pub(in crate::app) fn collect_pointer_events(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) -> Vec<PointerEvent> {
        let (events, now) = ui.input(|input| (input.events.clone(), input.time));
        let mut pointer_events = Vec::new();

        for event in events {
            match event {
                Event::Touch { id, phase, pos, .. } => {
                    self.ignore_pointer_until = now + TOUCH_POINTER_GRACE_SECS;
                    let local = to_viewport(rect, pos);
                    match phase {
                        TouchPhase::Start => {
                            if self.touches.is_empty() && !rect.contains(pos) {
                                continue;
                            }
                            self.touches.insert(id.0, local);
                            pointer_events.push(PointerEvent::Down {
                                touches: self.active_touches(),
                            });
                        }
                        TouchPhase::Move => {
                            if let Some(entry) = self.touches.get_mut(&id.0) {
                                *entry = local;
                                pointer_events.push(PointerEvent::Move {
                                    touches: self.active_touches(),
                                });
                            }
                        }
                        TouchPhase::End => {
                            if self.touches.remove(&id.0).is_some() {
                                pointer_events.push(PointerEvent::Up {
                                    touches: self.active_touches(),
                                });
                            }
                        }
                        TouchPhase::Cancel => {
                            if !self.touches.is_empty() {
                                self.touches.clear();
                                pointer_events.push(PointerEvent::Cancel);
                            }
                        }
                    }
                }
                _ if now < self.ignore_pointer_until || !self.touches.is_empty() => {}
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed,
                    ..
                } => {
                    if pressed && !self.mouse_down && response.hovered() && rect.contains(pos) {
                        self.mouse_down = true;
                        pointer_events.push(PointerEvent::down(to_viewport(rect, pos)));
                    } else if !pressed && self.mouse_down {
                        self.mouse_down = false;
                        pointer_events.push(PointerEvent::up());
                    }
                }
                Event::PointerMoved(pos) if self.mouse_down => {
                    pointer_events.push(PointerEvent::moved(to_viewport(rect, pos)));
                }
                Event::PointerGone if self.mouse_down => {
                    self.mouse_down = false;
                    pointer_events.push(PointerEvent::Cancel);
                }
                _ => {}
            }
        }

        pointer_events
    }

    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let sensitivity = self.engine.config().gesture.wheel_zoom_sensitivity;
        let factor = (1.0 + (scroll * sensitivity)).clamp(0.85, 1.15);
        self.engine.zoom_at(to_viewport(rect, pointer), factor);
    }

    pub(in crate::app) fn hovered_index(&self, ui: &Ui, rect: Rect) -> Option<usize> {
        if self.mouse_down || !self.touches.is_empty() {
            return None;
        }
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        if !rect.contains(pointer) {
            return None;
        }
        let snapshot = self.engine.latest_snapshot();
        node_at(
            self.engine.transform(),
            rect.size(),
            &snapshot.positions,
            to_viewport(rect, pointer),
            self.engine.config().hit_radius(),
        )
    }

    pub(in crate::app) fn apply_graph_events(&mut self, events: Vec<GraphEvent>) {
        for event in events {
            log::debug!("graph event: {event:?}");
            match event {
                GraphEvent::NodeClick(id) => {
                    self.last_tap = Some(format!("node {id}"));
                    self.set_selected(Some(id));
                }
                GraphEvent::SectorClick(tag) => {
                    self.last_tap = Some(format!("sector {tag}"));
                    self.set_focus(Focus::Category(tag));
                }
                GraphEvent::BackgroundClick => {
                    self.last_tap = Some("background".to_owned());
                    if self.focus.is_zoomed() {
                        self.set_focus(Focus::Overview);
                    } else {
                        self.set_selected(None);
                    }
                }
            }
        }
    }
}

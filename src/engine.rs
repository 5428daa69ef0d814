use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui::{Pos2, Vec2};
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::EngineConfig;
use crate::gesture::{GestureController, GestureEffect, PointerEvent, Scene};
use crate::layout::{LayoutInput, LayoutMode, seed_layout};
use crate::model::{Difficulty, Focus, NodeId, SkillNode, Tag, Visibility};
use crate::physics::{PositionSnapshot, Simulation};
use crate::scale::PolarScale;
use crate::transform::ViewTransform;

/// Receives the semantic outcome of taps.
pub trait InteractionHandler {
    fn on_node_click(&mut self, id: &str);
    fn on_sector_click(&mut self, tag: &str);
    fn on_background_click(&mut self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    NodeClick(NodeId),
    SectorClick(String),
    BackgroundClick,
}

impl InteractionHandler for Vec<GraphEvent> {
    fn on_node_click(&mut self, id: &str) {
        self.push(GraphEvent::NodeClick(id.to_owned()));
    }

    fn on_sector_click(&mut self, tag: &str) {
        self.push(GraphEvent::SectorClick(tag.to_owned()));
    }

    fn on_background_click(&mut self) {
        self.push(GraphEvent::BackgroundClick);
    }
}

/// Everything a layout pass depends on. A pass only runs when this changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutRequest {
    pub nodes: Vec<SkillNode>,
    pub tags: Vec<Tag>,
    pub viewport: Vec2,
    pub focus: Focus,
    pub show_difficulty: bool,
    pub visibility: Visibility,
}

impl LayoutRequest {
    pub fn input(&self) -> LayoutInput<'_> {
        LayoutInput {
            nodes: &self.nodes,
            tags: &self.tags,
            viewport: self.viewport,
            focus: &self.focus,
            show_difficulty: self.show_difficulty,
            visibility: &self.visibility,
        }
    }

    fn mode(&self) -> LayoutMode {
        if self.focus.is_zoomed() {
            LayoutMode::Zoomed
        } else {
            LayoutMode::Overview
        }
    }
}

fn empty_scale(config: &EngineConfig) -> PolarScale {
    PolarScale::for_viewport(
        Vec2::ZERO,
        config.layout.margin,
        Vec::<String>::new(),
        Difficulty::ALL.len(),
    )
}

/// Owns one graph view: the layout inputs, simulation, gesture state and transform.
pub struct RadialEngine {
    config: EngineConfig,
    request: Option<LayoutRequest>,
    scale: PolarScale,
    simulation: Simulation,
    gesture: GestureController,
    rng: StdRng,
    fallback_focus: Focus,
}

impl RadialEngine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            scale: empty_scale(&config),
            simulation: Simulation::new(config.forces),
            gesture: GestureController::new(config.gesture),
            request: None,
            rng,
            fallback_focus: Focus::Overview,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn request(&self) -> Option<&LayoutRequest> {
        self.request.as_ref()
    }

    pub fn scale(&self) -> &PolarScale {
        &self.scale
    }

    pub fn focus(&self) -> &Focus {
        self.request
            .as_ref()
            .map_or(&self.fallback_focus, |request| &request.focus)
    }

    pub fn viewport(&self) -> Vec2 {
        self.request
            .as_ref()
            .map_or(Vec2::ZERO, |request| request.viewport)
    }

    /// Relayouts when `request` differs from the last one; returns whether it did.
    pub fn configure(&mut self, request: LayoutRequest) -> bool {
        if self.request.as_ref() == Some(&request) {
            return false;
        }
        self.relayout(request);
        true
    }

    fn relayout(&mut self, request: LayoutRequest) {
        // Node indices are about to change, so no drag may survive.
        self.gesture.cancel();

        let carry_over = if self.simulation.mode() == request.mode() {
            self.simulation
                .nodes()
                .iter()
                .map(|node| (node.id.clone(), node.position))
                .collect::<HashMap<_, _>>()
        } else {
            HashMap::new()
        };

        let seed = seed_layout(
            &request.input(),
            &self.config.layout,
            &carry_over,
            &mut self.rng,
        );
        debug!(
            "relayout: {} nodes, viewport {:?}, focus {:?}, {} carried over",
            seed.nodes.len(),
            request.viewport,
            request.focus,
            carry_over.len()
        );

        self.scale = seed.scale.clone();
        self.simulation.stop();
        self.simulation.start(seed);
        self.request = Some(request);
    }

    pub fn tick(&mut self) -> Option<Arc<PositionSnapshot>> {
        self.simulation.tick()
    }

    /// Ticks until the layout settles or `max_ticks` pass; for headless hosts.
    pub fn run_until_idle(&mut self, max_ticks: usize) -> usize {
        self.simulation.run_until_idle(max_ticks)
    }

    pub fn is_running(&self) -> bool {
        self.simulation.is_running()
    }

    pub fn alpha(&self) -> f32 {
        self.simulation.alpha()
    }

    pub fn latest_snapshot(&self) -> Arc<PositionSnapshot> {
        self.simulation.latest_snapshot()
    }

    pub fn transform(&self) -> ViewTransform {
        self.gesture.transform()
    }

    pub fn set_transform(&mut self, transform: ViewTransform) {
        self.gesture.set_transform(transform);
    }

    pub fn dragged_node(&self) -> Option<usize> {
        self.gesture.state().dragged_node()
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent, handler: &mut impl InteractionHandler) {
        let snapshot = self.simulation.latest_snapshot();
        let scene = Scene {
            viewport: self
                .request
                .as_ref()
                .map_or(Vec2::ZERO, |request| request.viewport),
            snapshot: &snapshot,
            scale: &self.scale,
            focus: self
                .request
                .as_ref()
                .map_or(&self.fallback_focus, |request| &request.focus),
            hit_radius: self.config.hit_radius(),
        };
        let effects = self.gesture.handle(scene, event);
        self.apply(effects, handler);
    }

    /// Abandons any gesture in progress, releasing a dragged node.
    pub fn cancel_gesture(&mut self) {
        let effects = self.gesture.cancel();
        self.apply(effects, &mut Vec::<GraphEvent>::new());
    }

    fn apply(&mut self, effects: Vec<GestureEffect>, handler: &mut impl InteractionHandler) {
        let drag_target = self.config.forces.drag_alpha_target;
        for effect in effects {
            match effect {
                // The controller already holds the new transform.
                GestureEffect::SetTransform(_) => {}
                GestureEffect::GrabNode { index, position }
                | GestureEffect::MoveNode { index, position } => {
                    if self.simulation.fix(index, position) {
                        self.simulation.reheat(drag_target);
                    }
                }
                GestureEffect::ReleaseNode { index } => {
                    self.simulation.release(index);
                    self.simulation.cool();
                }
                GestureEffect::NodeClick(id) => handler.on_node_click(&id),
                GestureEffect::SectorClick(tag) => handler.on_sector_click(&tag),
                GestureEffect::BackgroundClick => handler.on_background_click(),
            }
        }
    }

    /// Wheel or trackpad zoom around `anchor`; ignored mid-gesture.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) -> Option<ViewTransform> {
        let viewport = self.viewport();
        self.gesture.zoom_at(anchor, viewport, factor)
    }

    /// Kicks the simulation back to full energy and lets it cool again.
    pub fn reheat(&mut self) {
        self.simulation.reheat(1.0);
        self.simulation.cool();
    }

    /// Halts ticking and clears every drag lock. Layout inputs are kept.
    pub fn stop(&mut self) {
        self.cancel_gesture();
        self.simulation.stop();
    }

    /// Drops the layout entirely; the next `configure` always relayouts.
    /// The view transform is left alone.
    pub fn reset(&mut self) {
        self.cancel_gesture();
        self.simulation.reset();
        self.request = None;
        self.scale = empty_scale(&self.config);
        debug!("engine reset");
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    const VIEWPORT: Vec2 = vec2(400.0, 800.0);

    fn engine() -> RadialEngine {
        RadialEngine::new(EngineConfig {
            seed: Some(11),
            ..EngineConfig::default()
        })
    }

    fn request() -> LayoutRequest {
        LayoutRequest {
            nodes: vec![
                SkillNode {
                    id: "rust".to_owned(),
                    title: "Rust".to_owned(),
                    tags: vec!["lang".to_owned()],
                    difficulty: Difficulty::Hard,
                    links: vec!["c".to_owned()],
                },
                SkillNode {
                    id: "c".to_owned(),
                    title: "C".to_owned(),
                    tags: vec!["lang".to_owned()],
                    difficulty: Difficulty::Medium,
                    links: Vec::new(),
                },
            ],
            tags: vec![Tag {
                name: "lang".to_owned(),
                color: "#dd6633".to_owned(),
            }],
            viewport: VIEWPORT,
            focus: Focus::Overview,
            show_difficulty: true,
            visibility: Visibility::new(),
        }
    }

    fn screen_of(engine: &RadialEngine, id: &str) -> Pos2 {
        let position = engine.latest_snapshot().position_of(id).unwrap();
        engine.transform().graph_to_screen(position, VIEWPORT)
    }

    #[test]
    fn identical_request_does_not_relayout() {
        let mut engine = engine();
        assert!(engine.configure(request()));
        let revision = engine.latest_snapshot().revision;
        assert!(!engine.configure(request()));
        assert_eq!(engine.latest_snapshot().revision, revision);

        let mut changed = request();
        changed.show_difficulty = false;
        assert!(engine.configure(changed));
    }

    #[test]
    fn relayout_in_same_mode_carries_positions_over() {
        let mut engine = engine();
        engine.configure(request());
        engine.simulation.run_until_idle(2_000);
        let settled = engine.latest_snapshot().position_of("rust").unwrap();

        let mut resized = request();
        resized.viewport = vec2(420.0, 800.0);
        engine.configure(resized);
        assert_eq!(engine.latest_snapshot().position_of("rust"), Some(settled));
    }

    #[test]
    fn drag_pins_node_and_release_cools() {
        let mut engine = engine();
        engine.configure(request());
        engine.simulation.run_until_idle(2_000);
        assert!(!engine.is_running());

        let mut events = Vec::new();
        let start = screen_of(&engine, "rust");
        engine.handle_pointer(&PointerEvent::down(start), &mut events);
        let index = engine.dragged_node().unwrap();
        assert!(engine.is_running());

        let target = start + vec2(60.0, 0.0);
        engine.handle_pointer(&PointerEvent::moved(target), &mut events);
        for _ in 0..20 {
            engine.tick();
        }
        let expected = engine.transform().screen_to_graph(target, VIEWPORT);
        let snapshot = engine.latest_snapshot();
        assert_eq!(snapshot.positions[index], expected);
        assert!(snapshot.fixed[index]);

        engine.handle_pointer(&PointerEvent::up(), &mut events);
        assert!(events.is_empty());
        assert_eq!(engine.dragged_node(), None);
        engine.simulation.run_until_idle(5_000);
        assert!(!engine.is_running());
        assert!(!engine.latest_snapshot().fixed.iter().any(|fixed| *fixed));
    }

    #[test]
    fn tap_on_node_reaches_handler() {
        let mut engine = engine();
        engine.configure(request());
        let point = screen_of(&engine, "c");
        let mut events = Vec::new();
        engine.handle_pointer(&PointerEvent::down(point), &mut events);
        engine.handle_pointer(&PointerEvent::up(), &mut events);
        assert_eq!(events, vec![GraphEvent::NodeClick("c".to_owned())]);
    }

    #[test]
    fn stop_mid_drag_leaves_nothing_pinned() {
        let mut engine = engine();
        engine.configure(request());
        let mut events = Vec::new();
        engine.handle_pointer(&PointerEvent::down(screen_of(&engine, "rust")), &mut events);
        assert!(engine.dragged_node().is_some());

        engine.stop();
        assert_eq!(engine.dragged_node(), None);
        assert!(!engine.is_running());
        assert!(engine.simulation.nodes().iter().all(|node| node.fixed_position.is_none()));
    }

    #[test]
    fn reset_forgets_layout_but_keeps_transform() {
        let mut engine = engine();
        engine.configure(request());
        let transform = ViewTransform {
            offset: vec2(12.0, -4.0),
            scale: 1.4,
        };
        engine.set_transform(transform);

        engine.reset();
        assert!(engine.latest_snapshot().is_empty());
        assert!(engine.request().is_none());
        assert!(engine.scale().angular.is_empty());
        assert_eq!(engine.transform(), transform);
        assert!(engine.configure(request()));
    }

    #[test]
    fn reheat_restarts_an_idle_layout() {
        let mut engine = engine();
        engine.configure(request());
        engine.simulation.run_until_idle(2_000);
        engine.reheat();
        assert!(engine.is_running());
        assert!(engine.tick().is_some());
    }
}

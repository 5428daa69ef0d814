//! Touch and pointer gesture state machine.
//!
//! [`transition`] is pure: it takes the current [`GestureState`], a read-only
//! [`GestureContext`] and one [`PointerEvent`], and returns the next state plus
//! the effects the host must apply. [`GestureController`] owns the state and
//! the live [`ViewTransform`] and applies transform effects itself.

use eframe::egui::{Pos2, Vec2};
use log::trace;

use crate::config::GestureConfig;
use crate::hit_test::{node_at, sector_at};
use crate::model::{Focus, NodeId};
use crate::physics::PositionSnapshot;
use crate::scale::PolarScale;
use crate::transform::ViewTransform;

const MIN_PINCH_DISTANCE: f32 = 1.0;

/// Raw input. Every variant except `Cancel` carries the touches that are
/// active *after* the event, in viewport coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerEvent {
    Down { touches: Vec<Pos2> },
    Move { touches: Vec<Pos2> },
    Up { touches: Vec<Pos2> },
    Cancel,
}

impl PointerEvent {
    pub fn down(point: Pos2) -> Self {
        Self::Down {
            touches: vec![point],
        }
    }

    pub fn moved(point: Pos2) -> Self {
        Self::Move {
            touches: vec![point],
        }
    }

    pub fn up() -> Self {
        Self::Up {
            touches: Vec::new(),
        }
    }
}

/// Bookkeeping for one touch stream, from the first finger down to the last up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Press {
    pub origin: Pos2,
    pub last: Pos2,
    /// Path length travelled since the press started.
    pub travel: f32,
    pub baseline: ViewTransform,
    pub multi_touch: bool,
}

impl Press {
    fn new(point: Pos2, baseline: ViewTransform) -> Self {
        Self {
            origin: point,
            last: point,
            travel: 0.0,
            baseline,
            multi_touch: false,
        }
    }

    fn rebased(self, point: Pos2, baseline: ViewTransform) -> Self {
        Self {
            origin: point,
            last: point,
            baseline,
            ..self
        }
    }

    fn advance(&mut self, point: Pos2) {
        let step = point.distance(self.last);
        if step.is_finite() {
            self.travel += step;
        }
        self.last = point;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GestureState {
    /// `press` is set while a single touch is down but not yet a pan.
    Idle { press: Option<Press> },
    Panning(Press),
    Pinching { press: Press, initial_distance: f32 },
    DraggingNode { index: usize, id: NodeId, press: Press },
}

impl Default for GestureState {
    fn default() -> Self {
        Self::Idle { press: None }
    }
}

impl GestureState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle { press: None } => "idle",
            Self::Idle { press: Some(_) } => "pressed",
            Self::Panning(_) => "panning",
            Self::Pinching { .. } => "pinching",
            Self::DraggingNode { .. } => "dragging",
        }
    }

    pub fn dragged_node(&self) -> Option<usize> {
        match self {
            Self::DraggingNode { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GestureEffect {
    SetTransform(ViewTransform),
    GrabNode { index: usize, position: Vec2 },
    MoveNode { index: usize, position: Vec2 },
    ReleaseNode { index: usize },
    NodeClick(NodeId),
    SectorClick(String),
    BackgroundClick,
}

/// What the controller can see of the graph while interpreting one event.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    pub viewport: Vec2,
    pub snapshot: &'a PositionSnapshot,
    pub scale: &'a PolarScale,
    pub focus: &'a Focus,
    pub hit_radius: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct GestureContext<'a> {
    pub scene: Scene<'a>,
    pub transform: ViewTransform,
    pub config: GestureConfig,
}

impl GestureContext<'_> {
    fn to_graph(&self, point: Pos2) -> Vec2 {
        self.transform.screen_to_graph(point, self.scene.viewport)
    }

    fn node_under(&self, point: Pos2) -> Option<usize> {
        node_at(
            self.transform,
            self.scene.viewport,
            &self.scene.snapshot.positions,
            point,
            self.scene.hit_radius,
        )
    }

    fn clamp(&self, transform: ViewTransform) -> ViewTransform {
        transform.clamped(self.config.min_scale, self.config.max_scale)
    }

    fn is_tap(&self, press: &Press) -> bool {
        !press.multi_touch && press.travel <= self.config.tap_threshold
    }
}

pub fn transition(
    state: GestureState,
    context: &GestureContext<'_>,
    event: &PointerEvent,
) -> (GestureState, Vec<GestureEffect>) {
    let mut effects = Vec::new();
    let next = match event {
        PointerEvent::Down { touches } => on_down(state, context, touches, &mut effects),
        PointerEvent::Move { touches } => on_move(state, context, touches, &mut effects),
        PointerEvent::Up { touches } => on_up(state, context, touches, &mut effects),
        PointerEvent::Cancel => on_cancel(state, &mut effects),
    };
    (next, effects)
}

fn pinch_distance(touches: &[Pos2]) -> Option<f32> {
    match touches {
        [first, second, ..] => {
            let distance = first.distance(*second);
            distance.is_finite().then_some(distance)
        }
        _ => None,
    }
}

fn midpoint(touches: &[Pos2]) -> Pos2 {
    match touches {
        [first, second, ..] => first.lerp(*second, 0.5),
        [only] => *only,
        [] => Pos2::ZERO,
    }
}

/// Starts (or re-baselines) a pinch from the live transform so scale never jumps.
fn begin_pinch(previous: Option<Press>, context: &GestureContext<'_>, touches: &[Pos2]) -> GestureState {
    let center = midpoint(touches);
    let press = match previous {
        Some(press) => press.rebased(center, context.transform),
        None => Press::new(center, context.transform),
    };
    GestureState::Pinching {
        press: Press {
            multi_touch: true,
            ..press
        },
        initial_distance: pinch_distance(touches)
            .unwrap_or(MIN_PINCH_DISTANCE)
            .max(MIN_PINCH_DISTANCE),
    }
}

fn begin_pan(press: Press, context: &GestureContext<'_>, point: Pos2) -> GestureState {
    GestureState::Panning(press.rebased(point, context.transform))
}

fn on_down(
    state: GestureState,
    context: &GestureContext<'_>,
    touches: &[Pos2],
    effects: &mut Vec<GestureEffect>,
) -> GestureState {
    match (state, touches) {
        (state, []) => state,
        // A second finger never interrupts a node drag, but the press stops being a tap.
        (GestureState::DraggingNode { index, id, press }, _) => GestureState::DraggingNode {
            index,
            id,
            press: Press {
                multi_touch: true,
                ..press
            },
        },
        (GestureState::Idle { press: None }, [point]) => {
            let point = *point;
            let press = Press::new(point, context.transform);
            match context.node_under(point) {
                Some(index) => {
                    let position = context.scene.snapshot.positions[index];
                    effects.push(GestureEffect::GrabNode { index, position });
                    GestureState::DraggingNode {
                        index,
                        id: context.scene.snapshot.ids[index].clone(),
                        press,
                    }
                }
                None => GestureState::Idle { press: Some(press) },
            }
        }
        (GestureState::Idle { press: Some(press) }, [point])
        | (GestureState::Panning(press), [point])
        | (GestureState::Pinching { press, .. }, [point]) => begin_pan(press, context, *point),
        (GestureState::Idle { press }, touches) => begin_pinch(press, context, touches),
        (GestureState::Panning(press), touches) | (GestureState::Pinching { press, .. }, touches) => {
            begin_pinch(Some(press), context, touches)
        }
    }
}

fn on_move(
    state: GestureState,
    context: &GestureContext<'_>,
    touches: &[Pos2],
    effects: &mut Vec<GestureEffect>,
) -> GestureState {
    match (state, touches) {
        (state, []) => state,
        (GestureState::Idle { press: None }, _) => GestureState::Idle { press: None },
        (
            GestureState::DraggingNode {
                index,
                id,
                mut press,
            },
            touches,
        ) => {
            // Follow the finger that stayed closest to the grab, whatever order touches arrive in.
            let point = nearest_touch(touches, press.last);
            press.advance(point);
            let position = context.to_graph(point);
            if position.is_finite() {
                effects.push(GestureEffect::MoveNode { index, position });
            }
            GestureState::DraggingNode { index, id, press }
        }
        (GestureState::Idle { press: Some(mut press) }, [point]) => {
            press.advance(*point);
            if press.travel > context.config.tap_threshold {
                effects.push(GestureEffect::SetTransform(pan_transform(&press, context)));
                GestureState::Panning(press)
            } else {
                GestureState::Idle { press: Some(press) }
            }
        }
        (GestureState::Panning(mut press), [point]) => {
            press.advance(*point);
            effects.push(GestureEffect::SetTransform(pan_transform(&press, context)));
            GestureState::Panning(press)
        }
        // A finger went missing mid-pinch: continue as a pan from here.
        (GestureState::Pinching { press, .. }, [point]) => begin_pan(press, context, *point),
        (
            GestureState::Pinching {
                mut press,
                initial_distance,
            },
            touches,
        ) => {
            let center = midpoint(touches);
            press.advance(center);
            if let Some(distance) = pinch_distance(touches) {
                let ratio = distance / initial_distance;
                effects.push(GestureEffect::SetTransform(context.clamp(ViewTransform {
                    offset: context.transform.offset,
                    scale: press.baseline.safe_scale() * ratio,
                })));
            }
            GestureState::Pinching {
                press,
                initial_distance,
            }
        }
        // Two touches reported without a matching down: treat as a new pinch.
        (GestureState::Idle { press }, touches) => begin_pinch(press, context, touches),
        (GestureState::Panning(press), touches) => begin_pinch(Some(press), context, touches),
    }
}

fn nearest_touch(touches: &[Pos2], last: Pos2) -> Pos2 {
    touches
        .iter()
        .copied()
        .min_by(|a, b| a.distance_sq(last).total_cmp(&b.distance_sq(last)))
        .unwrap_or(last)
}

fn pan_transform(press: &Press, context: &GestureContext<'_>) -> ViewTransform {
    ViewTransform {
        offset: press.baseline.offset + (press.last - press.origin),
        scale: context.transform.scale,
    }
}

fn on_up(
    state: GestureState,
    context: &GestureContext<'_>,
    remaining: &[Pos2],
    effects: &mut Vec<GestureEffect>,
) -> GestureState {
    match (state, remaining) {
        (GestureState::Pinching { press, .. }, [point]) => begin_pan(press, context, *point),
        (GestureState::Pinching { press, .. }, [_, _, ..]) => {
            begin_pinch(Some(press), context, remaining)
        }
        // The remaining fingers never grabbed the node.
        (GestureState::DraggingNode { index, .. }, [_, ..]) => {
            effects.push(GestureEffect::ReleaseNode { index });
            GestureState::default()
        }
        (state, [_, ..]) => state,
        (GestureState::DraggingNode { index, id, press }, []) => {
            effects.push(GestureEffect::ReleaseNode { index });
            if context.is_tap(&press) {
                effects.push(GestureEffect::NodeClick(id));
            }
            GestureState::default()
        }
        (GestureState::Idle { press: Some(press) }, []) => {
            if context.is_tap(&press) {
                classify_tap(context, press.last, effects);
            }
            GestureState::default()
        }
        (_, []) => GestureState::default(),
    }
}

fn classify_tap(context: &GestureContext<'_>, point: Pos2, effects: &mut Vec<GestureEffect>) {
    let scene = &context.scene;
    match sector_at(context.transform, scene.viewport, scene.scale, point) {
        Some(tag) => {
            let already_focused = matches!(scene.focus, Focus::Category(focused) if focused == tag);
            if !already_focused {
                effects.push(GestureEffect::SectorClick(tag.to_owned()));
            }
        }
        None => effects.push(GestureEffect::BackgroundClick),
    }
}

fn on_cancel(state: GestureState, effects: &mut Vec<GestureEffect>) -> GestureState {
    if let GestureState::DraggingNode { index, .. } = state {
        effects.push(GestureEffect::ReleaseNode { index });
    }
    GestureState::default()
}

/// Owns the gesture state and the live view transform.
#[derive(Clone, Debug)]
pub struct GestureController {
    state: GestureState,
    transform: ViewTransform,
    config: GestureConfig,
}

impl GestureController {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            state: GestureState::default(),
            transform: ViewTransform::IDENTITY,
            config,
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Replaces the live transform; the next gesture starts from it.
    pub fn set_transform(&mut self, transform: ViewTransform) {
        self.transform = transform.clamped(self.config.min_scale, self.config.max_scale);
    }

    pub fn handle(&mut self, scene: Scene<'_>, event: &PointerEvent) -> Vec<GestureEffect> {
        let context = GestureContext {
            scene,
            transform: self.transform,
            config: self.config,
        };
        let previous = std::mem::take(&mut self.state);
        let previous_name = previous.name();
        let (next, effects) = transition(previous, &context, event);
        if next.name() != previous_name {
            trace!("gesture {previous_name} -> {}", next.name());
        }

        for effect in &effects {
            if let GestureEffect::SetTransform(transform) = effect {
                self.transform = *transform;
            }
        }
        self.state = next;
        effects
    }

    /// Abandons the current gesture, releasing any dragged node.
    pub fn cancel(&mut self) -> Vec<GestureEffect> {
        let mut effects = Vec::new();
        self.state = on_cancel(std::mem::take(&mut self.state), &mut effects);
        effects
    }

    /// Wheel zoom around `anchor`; ignored while a touch gesture is in progress.
    pub fn zoom_at(&mut self, anchor: Pos2, viewport: Vec2, factor: f32) -> Option<ViewTransform> {
        if self.state != GestureState::default() || !factor.is_finite() || factor <= 0.0 {
            return None;
        }
        self.transform = self.transform.zoomed_at(
            anchor,
            viewport,
            factor,
            self.config.min_scale,
            self.config.max_scale,
        );
        Some(self.transform)
    }
}

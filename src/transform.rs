use eframe::egui::{Pos2, Vec2};

/// Smallest scale ever used as a divisor.
pub const MIN_SCALE_EPSILON: f32 = 1e-3;

/// Pan offset and zoom applied to the whole scene, relative to the viewport centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub offset: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        offset: Vec2::ZERO,
        scale: 1.0,
    };

    pub fn safe_scale(self) -> f32 {
        if self.scale.is_finite() {
            self.scale.max(MIN_SCALE_EPSILON)
        } else {
            1.0
        }
    }

    pub fn clamped(self, min_scale: f32, max_scale: f32) -> Self {
        let min_scale = min_scale.max(MIN_SCALE_EPSILON);
        Self {
            offset: self.offset,
            scale: self.safe_scale().clamp(min_scale, max_scale.max(min_scale)),
        }
    }

    /// `(screen - viewport_center - offset) / scale`
    pub fn screen_to_graph(self, screen: Pos2, viewport: Vec2) -> Vec2 {
        (screen - viewport * 0.5 - self.offset).to_vec2() / self.safe_scale()
    }

    pub fn graph_to_screen(self, graph: Vec2, viewport: Vec2) -> Pos2 {
        (viewport * 0.5 + self.offset + graph * self.safe_scale()).to_pos2()
    }

    /// Rescales by `factor` while keeping the graph point under `anchor` in place.
    pub fn zoomed_at(
        self,
        anchor: Pos2,
        viewport: Vec2,
        factor: f32,
        min_scale: f32,
        max_scale: f32,
    ) -> Self {
        let graph_before = self.screen_to_graph(anchor, viewport);
        let scale = Self {
            offset: self.offset,
            scale: self.safe_scale() * factor,
        }
        .clamped(min_scale, max_scale)
        .scale;
        Self {
            offset: anchor.to_vec2() - viewport * 0.5 - graph_before * scale,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    const VIEWPORT: Vec2 = vec2(400.0, 800.0);

    #[test]
    fn identity_maps_center_to_origin() {
        let graph = ViewTransform::IDENTITY.screen_to_graph(pos2(200.0, 400.0), VIEWPORT);
        assert_eq!(graph, Vec2::ZERO);
    }

    #[test]
    fn screen_round_trip_under_pan_and_zoom() {
        let transform = ViewTransform {
            offset: vec2(-35.0, 12.0),
            scale: 1.75,
        };
        let graph = vec2(42.0, -17.5);
        let screen = transform.graph_to_screen(graph, VIEWPORT);
        let back = transform.screen_to_graph(screen, VIEWPORT);
        assert!((back - graph).length() < 1e-4);
    }

    #[test]
    fn zero_or_nan_scale_never_divides_by_zero() {
        let zero = ViewTransform {
            offset: Vec2::ZERO,
            scale: 0.0,
        };
        assert!(zero.screen_to_graph(pos2(10.0, 10.0), VIEWPORT).is_finite());

        let nan = ViewTransform {
            offset: Vec2::ZERO,
            scale: f32::NAN,
        };
        assert!(nan.screen_to_graph(pos2(10.0, 10.0), VIEWPORT).is_finite());
    }

    #[test]
    fn clamp_respects_bounds() {
        let big = ViewTransform {
            offset: Vec2::ZERO,
            scale: 9.0,
        };
        assert_eq!(big.clamped(0.5, 3.0).scale, 3.0);
        let small = ViewTransform {
            offset: Vec2::ZERO,
            scale: 0.1,
        };
        assert_eq!(small.clamped(0.5, 3.0).scale, 0.5);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let transform = ViewTransform {
            offset: vec2(20.0, -10.0),
            scale: 1.0,
        };
        let anchor = pos2(310.0, 150.0);
        let before = transform.screen_to_graph(anchor, VIEWPORT);
        let zoomed = transform.zoomed_at(anchor, VIEWPORT, 1.5, 0.5, 3.0);
        assert_eq!(zoomed.scale, 1.5);
        let after = zoomed.screen_to_graph(anchor, VIEWPORT);
        assert!((after - before).length() < 1e-3);
    }
}

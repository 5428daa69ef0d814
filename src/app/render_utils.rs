use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};
use skill_radar::transform::ViewTransform;

pub(super) const UNASSIGNED_COLOR: Color32 = Color32::from_rgb(150, 150, 150);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * amount) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.35 + (factor * 0.65))) as u8,
    )
}

/// `#rgb` or `#rrggbb`; anything else is `None`.
pub(super) fn parse_hex_color(raw: &str) -> Option<Color32> {
    let hex = raw.trim().strip_prefix('#')?;
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();

    match hex.len() {
        6 => Some(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => {
            let short = |index: usize| channel(index..index + 1).map(|value| value * 17);
            Some(Color32::from_rgb(short(0)?, short(1)?, short(2)?))
        }
        _ => None,
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn graph_to_screen(rect: Rect, transform: ViewTransform, graph: Vec2) -> Pos2 {
    rect.min + transform.graph_to_screen(graph, rect.size()).to_vec2()
}

/// Window coordinates to the graph viewport's own coordinates.
pub(super) fn to_viewport(rect: Rect, window: Pos2) -> Pos2 {
    window - rect.min.to_vec2()
}

pub(super) fn ring_stroke(alpha: u8) -> Stroke {
    Stroke::new(1.0, Color32::from_rgba_unmultiplied(96, 108, 122, alpha))
}

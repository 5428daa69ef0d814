use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Vec2, vec2};

const INNER_HOLE_FRACTION: f32 = 0.2;

/// Graph-space position for an angle measured clockwise from 12 o'clock.
pub fn polar_to_graph(angle: f32, radius: f32) -> Vec2 {
    let theta = angle - FRAC_PI_2;
    vec2(radius * theta.cos(), radius * theta.sin())
}

/// Inverse of [`polar_to_graph`]: `(radius, angle)` with the angle in `[0, TAU)`.
pub fn graph_to_polar(point: Vec2) -> (f32, f32) {
    let radius = point.length();
    let angle = normalize_angle(point.y.atan2(point.x) + FRAC_PI_2);
    (radius, angle)
}

pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngularBand {
    pub start: f32,
    pub width: f32,
}

impl AngularBand {
    pub fn end(self) -> f32 {
        self.start + self.width
    }

    pub fn mid(self) -> f32 {
        self.start + self.width * 0.5
    }

    pub fn contains(self, angle: f32) -> bool {
        angle >= self.start && angle < self.end()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AngularScale {
    names: Vec<String>,
}

impl AngularScale {
    /// Bands follow the order names are given in, not alphabetical order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self { names: unique }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn band_width(&self) -> f32 {
        if self.names.is_empty() {
            0.0
        } else {
            TAU / self.names.len() as f32
        }
    }

    pub fn band_at(&self, index: usize) -> Option<AngularBand> {
        if index >= self.names.len() {
            return None;
        }
        let width = self.band_width();
        Some(AngularBand {
            start: index as f32 * width,
            width,
        })
    }

    pub fn band(&self, name: &str) -> Option<AngularBand> {
        let index = self.names.iter().position(|candidate| candidate == name)?;
        self.band_at(index)
    }

    pub fn bands(&self) -> impl Iterator<Item = (&str, AngularBand)> + '_ {
        let width = self.band_width();
        self.names.iter().enumerate().map(move |(index, name)| {
            (
                name.as_str(),
                AngularBand {
                    start: index as f32 * width,
                    width,
                },
            )
        })
    }

    /// Category whose band contains `angle`, after normalising it into `[0, TAU)`.
    pub fn locate(&self, angle: f32) -> Option<&str> {
        if self.names.is_empty() {
            return None;
        }
        let angle = normalize_angle(angle);
        let index = ((angle / self.band_width()).floor() as usize).min(self.names.len() - 1);
        Some(self.names[index].as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialBand {
    pub inner: f32,
    pub outer: f32,
}

impl RadialBand {
    pub fn mid(self) -> f32 {
        (self.inner + self.outer) * 0.5
    }

    pub fn contains(self, radius: f32) -> bool {
        radius >= self.inner && radius < self.outer
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialScale {
    levels: usize,
    inner: f32,
    outer: f32,
}

impl RadialScale {
    pub fn new(levels: usize, inner: f32, outer: f32) -> Self {
        Self {
            levels,
            inner: inner.min(outer),
            outer,
        }
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn band(&self, rank: usize) -> Option<RadialBand> {
        if rank >= self.levels {
            return None;
        }
        let width = (self.outer - self.inner) / self.levels as f32;
        let inner = self.inner + rank as f32 * width;
        Some(RadialBand {
            inner,
            outer: inner + width,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolarScale {
    pub angular: AngularScale,
    pub radial: RadialScale,
    pub inner_radius: f32,
    pub outer_radius: f32,
}

impl PolarScale {
    pub fn for_viewport<I, S>(viewport: Vec2, margin: f32, categories: I, levels: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let outer_radius = (viewport.min_elem() * 0.5 - margin).max(0.0);
        let inner_radius = outer_radius * INNER_HOLE_FRACTION;
        Self {
            angular: AngularScale::new(categories),
            radial: RadialScale::new(levels, inner_radius, outer_radius),
            inner_radius,
            outer_radius,
        }
    }

    pub fn unassigned_radius(&self, offset: f32) -> f32 {
        self.outer_radius + offset
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use proptest::prelude::*;

    use super::*;

    fn abc() -> AngularScale {
        AngularScale::new(["A", "B", "C"])
    }

    #[test]
    fn bands_follow_insertion_order() {
        let scale = AngularScale::new(["Zeta", "Alpha"]);
        assert_eq!(scale.band("Zeta").map(|band| band.start), Some(0.0));
        assert_eq!(scale.band("Alpha").map(|band| band.start), Some(PI));
    }

    #[test]
    fn three_bands_split_the_circle() {
        let scale = abc();
        let band = scale.band("A").unwrap();
        assert!((band.width - TAU / 3.0).abs() < 1e-6);
        assert!((band.mid() - PI / 3.0).abs() < 1e-6);
        assert_eq!(scale.locate(PI / 3.0), Some("A"));
        assert_eq!(scale.locate(PI), Some("B"));
        assert_eq!(scale.locate(-0.1), Some("C"));
        assert_eq!(scale.band("D"), None);
    }

    #[test]
    fn empty_scale_has_no_sectors() {
        let scale = AngularScale::new(Vec::<String>::new());
        assert!(scale.is_empty());
        assert_eq!(scale.locate(1.0), None);
        assert_eq!(scale.band_at(0), None);
    }

    #[test]
    fn radial_bands_leave_center_hole() {
        let scale = PolarScale::for_viewport(vec2(400.0, 800.0), 40.0, ["A"], 3);
        assert_eq!(scale.outer_radius, 160.0);
        assert!((scale.inner_radius - 32.0).abs() < 1e-4);
        let easy = scale.radial.band(0).unwrap();
        let hard = scale.radial.band(2).unwrap();
        assert!((easy.inner - 32.0).abs() < 1e-4);
        assert!((hard.outer - 160.0).abs() < 1e-3);
        assert!(easy.mid() < hard.mid());
        assert_eq!(scale.radial.band(3), None);
    }

    #[test]
    fn tiny_viewport_floors_radius_at_zero() {
        let scale = PolarScale::for_viewport(vec2(20.0, 20.0), 40.0, ["A"], 3);
        assert_eq!(scale.outer_radius, 0.0);
        assert_eq!(scale.inner_radius, 0.0);
    }

    #[test]
    fn twelve_oclock_is_angle_zero() {
        let top = polar_to_graph(0.0, 10.0);
        assert!(top.x.abs() < 1e-5 && (top.y + 10.0).abs() < 1e-5);
        let right = polar_to_graph(FRAC_PI_2, 10.0);
        assert!((right.x - 10.0).abs() < 1e-5 && right.y.abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn polar_round_trip(angle in 0.0f32..6.28, radius in 1.0f32..500.0) {
            let (r, theta) = graph_to_polar(polar_to_graph(angle, radius));
            prop_assert!((r - radius).abs() < 1e-2);
            prop_assert!((theta - angle).abs() < 1e-3 || (TAU - (theta - angle).abs()) < 1e-3);
        }

        #[test]
        fn every_angle_lands_in_its_own_band(angle in -20.0f32..20.0, count in 1usize..12) {
            let scale = AngularScale::new((0..count).map(|index| format!("tag-{index}")));
            let normalized = normalize_angle(angle);
            let name = scale.locate(angle).expect("non-empty scale locates every angle");
            let band = scale.band(name).unwrap();
            prop_assert!((band.mid() - normalized).abs() <= band.width * 0.5 + 1e-3);
        }
    }
}

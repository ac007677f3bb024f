//! Colour ramps for classified readings.
//!
//! Continuous scales interpolate linearly in sRGB between evenly spaced stops.
//! Discrete scales take the first `k` stops, one per class.

use std::fmt;

use serde::Serialize;

use crate::classify::{Classification, ClassificationScale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn from_hex(hex: u32) -> Self {
        Self((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Colour used for missing readings; never part of a ramp.
pub const NO_DATA: Rgb = Rgb::from_hex(0xcccccc);

pub struct ColorRamp {
    stops: &'static [Rgb],
}

impl ColorRamp {
    pub const fn new(stops: &'static [Rgb]) -> Self {
        Self { stops }
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Sample at `t`, clamped to `[0, 1]`.
    pub fn sample(&self, t: f64) -> Rgb {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        match self.stops.len() {
            0 => NO_DATA,
            1 => self.stops[0],
            n => {
                let scaled = t * (n - 1) as f64;
                let lower = (scaled as usize).min(n - 2);
                self.stops[lower].lerp(self.stops[lower + 1], scaled - lower as f64)
            }
        }
    }

    /// Colour for class `index`; indices past the last stop reuse it.
    pub fn step(&self, index: usize) -> Rgb {
        match self.stops.len() {
            0 => NO_DATA,
            n => self.stops[index.min(n - 1)],
        }
    }

    pub fn color_for(&self, classification: Classification) -> Rgb {
        match classification {
            Classification::NoData => NO_DATA,
            Classification::Position(t) => self.sample(t),
            Classification::Class(index) => self.step(index),
        }
    }

    /// Legend swatches: one per class, or every stop for a gradient.
    pub fn legend(&self, scale: &ClassificationScale) -> Vec<Rgb> {
        match scale.class_count() {
            Some(classes) => (0..classes).map(|idx| self.step(idx)).collect(),
            None => self.stops.to_vec(),
        }
    }
}

/// Nine-stop sequential red ramp, light to dark.
pub static REDS: ColorRamp = ColorRamp::new(&[
    Rgb::from_hex(0xfff5f0),
    Rgb::from_hex(0xfcbba1),
    Rgb::from_hex(0xfc9272),
    Rgb::from_hex(0xfb6a4a),
    Rgb::from_hex(0xef3b2c),
    Rgb::from_hex(0xcb181d),
    Rgb::from_hex(0x99000d),
    Rgb::from_hex(0x67000d),
    Rgb::from_hex(0x3b0008),
]);

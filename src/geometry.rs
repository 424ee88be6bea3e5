/// Shared geometric and color primitives used by the store, renderer and codec.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: i32,
    pub y: i32,
}

impl CanvasPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl std::fmt::Display for CanvasPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

/// Axis-aligned box with a non-negative extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ShapeBounds {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the box spanned by two opposite corners given in any order.
    pub fn from_corners(a: CanvasPoint, b: CanvasPoint) -> Self {
        let width = (i64::from(a.x) - i64::from(b.x)).unsigned_abs();
        let height = (i64::from(a.y) - i64::from(b.y)).unsigned_abs();
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: u32::try_from(width).unwrap_or(u32::MAX),
            height: u32::try_from(height).unwrap_or(u32::MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Gray level expressed as a fraction of full intensity, e.g. `0.8` for light gray.
    pub fn gray(level: f32) -> Self {
        let value = (level.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(value, value, value)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Accepts `#rrggbb` or bare `rrggbb`.
pub fn parse_hex_rgb(value: &str) -> Option<Color> {
    let hex = value.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let red = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let green = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let blue = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::new(red, green, blue))
}

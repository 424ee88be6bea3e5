use std::path::Path;

use image::{ImageFormat, ImageResult, Rgba, RgbaImage};

use super::{circle_bounds, DrawOp, PaintSurface};
use crate::geometry::{CanvasPoint, CanvasSize, Color, ShapeBounds};

// Enough samples for any oval up to 16k pixels across without gaps.
const MAX_OVAL_STEPS: f64 = 65_536.0;

/// Software surface that rasterizes paint operations with hard (non-antialiased) edges.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    image: RgbaImage,
}

impl RasterCanvas {
    pub fn new(size: CanvasSize, background: Color) -> Self {
        Self {
            image: RgbaImage::from_pixel(
                size.width.max(1),
                size.height.max(1),
                to_rgba(background),
            ),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.image.width() || y >= self.image.height() {
            return None;
        }
        let Rgba([r, g, b, _]) = *self.image.get_pixel(x, y);
        Some(Color::new(r, g, b))
    }

    pub fn save_png(&self, path: &Path) -> ImageResult<()> {
        self.image.save_with_format(path, ImageFormat::Png)
    }

    fn plot(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, color);
        }
    }

    fn stroke_segment(&mut self, from: CanvasPoint, to: CanvasPoint, color: Rgba<u8>) {
        let Some(((mut x, mut y), (x1, y1))) = self.clip_segment(from, to) else {
            return;
        };
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let doubled = 2 * err;
            if doubled >= dy {
                err += dy;
                x += sx;
            }
            if doubled <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Liang-Barsky clip of a segment to the pixel grid, so stroking never walks
    /// further than the image. `None` when the segment misses the image.
    fn clip_segment(&self, from: CanvasPoint, to: CanvasPoint) -> Option<((i64, i64), (i64, i64))> {
        let (x0, y0) = (f64::from(from.x), f64::from(from.y));
        let (dx, dy) = (f64::from(to.x) - x0, f64::from(to.y) - y0);
        let max_x = f64::from(self.image.width() - 1);
        let max_y = f64::from(self.image.height() - 1);

        let (mut enter, mut exit) = (0.0_f64, 1.0_f64);
        for (p, q) in [(-dx, x0), (dx, max_x - x0), (-dy, y0), (dy, max_y - y0)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > exit {
                    return None;
                }
                enter = enter.max(r);
            } else {
                if r < enter {
                    return None;
                }
                exit = exit.min(r);
            }
        }

        let at = |t: f64| ((x0 + t * dx).round() as i64, (y0 + t * dy).round() as i64);
        Some((at(enter), at(exit)))
    }

    fn stroke_rect(&mut self, bounds: ShapeBounds, color: Rgba<u8>) {
        let (left, top) = (bounds.x, bounds.y);
        let right = left.saturating_add(i32::try_from(bounds.width).unwrap_or(i32::MAX));
        let bottom = top.saturating_add(i32::try_from(bounds.height).unwrap_or(i32::MAX));
        let corners = [
            CanvasPoint::new(left, top),
            CanvasPoint::new(right, top),
            CanvasPoint::new(right, bottom),
            CanvasPoint::new(left, bottom),
        ];
        for (index, corner) in corners.iter().enumerate() {
            self.stroke_segment(*corner, corners[(index + 1) % corners.len()], color);
        }
    }

    fn stroke_oval(&mut self, bounds: ShapeBounds, color: Rgba<u8>) {
        if bounds.width == 0 || bounds.height == 0 {
            self.stroke_rect(bounds, color);
            return;
        }
        let rx = f64::from(bounds.width) / 2.0;
        let ry = f64::from(bounds.height) / 2.0;
        let cx = f64::from(bounds.x) + rx;
        let cy = f64::from(bounds.y) + ry;
        if !self.overlaps(bounds) {
            return;
        }
        let steps = ((rx + ry) * 4.0).ceil().clamp(16.0, MAX_OVAL_STEPS) as u32;

        for step in 0..steps {
            let angle = std::f64::consts::TAU * f64::from(step) / f64::from(steps);
            let x = (cx + rx * angle.cos()).round() as i64;
            let y = (cy + ry * angle.sin()).round() as i64;
            self.plot(x, y, color);
        }
    }

    fn overlaps(&self, bounds: ShapeBounds) -> bool {
        let right = i64::from(bounds.x) + i64::from(bounds.width);
        let bottom = i64::from(bounds.y) + i64::from(bounds.height);
        right >= 0
            && bottom >= 0
            && i64::from(bounds.x) < i64::from(self.image.width())
            && i64::from(bounds.y) < i64::from(self.image.height())
    }

    fn fill_circle(&mut self, center: CanvasPoint, diameter: u32, color: Rgba<u8>) {
        if diameter == 0 {
            return;
        }
        let bounds = circle_bounds(center, diameter);
        let radius = f64::from(diameter) / 2.0;
        let cx = f64::from(bounds.x) + radius;
        let cy = f64::from(bounds.y) + radius;
        let x0 = i64::from(bounds.x);
        let y0 = i64::from(bounds.y);
        let x_range = x0.max(0)..(x0 + i64::from(diameter)).min(i64::from(self.image.width()));
        let y_range = y0.max(0)..(y0 + i64::from(diameter)).min(i64::from(self.image.height()));

        for y in y_range {
            for x in x_range.clone() {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    self.plot(x, y, color);
                }
            }
        }
    }
}

impl PaintSurface for RasterCanvas {
    fn paint(&mut self, op: &DrawOp) {
        match *op {
            DrawOp::GridLine { from, to, color } | DrawOp::StrokeLine { from, to, color } => {
                self.stroke_segment(from, to, to_rgba(color));
            }
            DrawOp::FillCircle {
                center,
                diameter,
                color,
            } => self.fill_circle(center, diameter, to_rgba(color)),
            DrawOp::StrokeRect { bounds, color } => self.stroke_rect(bounds, to_rgba(color)),
            DrawOp::StrokeOval { bounds, color } => self.stroke_oval(bounds, to_rgba(color)),
        }
    }
}

fn to_rgba(color: Color) -> Rgba<u8> {
    let (r, g, b) = color.rgb();
    Rgba([r, g, b, 255])
}

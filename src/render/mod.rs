//! Turns a store snapshot into an ordered list of paint operations.
//!
//! Output depends only on the store, the grid flags and the canvas size, so painting
//! the same state twice yields identical operation lists.

pub mod raster;

use crate::drawing::{ShapeEntry, ShapeKind, ShapeStore};
use crate::geometry::{CanvasPoint, CanvasSize, Color, ShapeBounds};

pub use raster::RasterCanvas;

pub const FINE_GRID_SPACING: u32 = 10;
pub const COARSE_GRID_SPACING: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridFlags {
    pub fine: bool,
    pub coarse: bool,
}

impl GridFlags {
    pub const fn none() -> Self {
        Self {
            fine: false,
            coarse: false,
        }
    }

    pub const fn both() -> Self {
        Self {
            fine: true,
            coarse: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridStyle {
    pub fine_spacing: u32,
    pub coarse_spacing: u32,
    pub fine_color: Color,
    pub coarse_color: Color,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            fine_spacing: FINE_GRID_SPACING,
            coarse_spacing: COARSE_GRID_SPACING,
            fine_color: Color::gray(0.8),
            coarse_color: Color::gray(0.6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    pub canvas: CanvasSize,
    pub grid: GridFlags,
    pub style: GridStyle,
}

impl RenderContext {
    pub fn new(canvas: CanvasSize, grid: GridFlags) -> Self {
        Self {
            canvas,
            grid,
            style: GridStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawOp {
    GridLine {
        from: CanvasPoint,
        to: CanvasPoint,
        color: Color,
    },
    FillCircle {
        center: CanvasPoint,
        diameter: u32,
        color: Color,
    },
    StrokeRect {
        bounds: ShapeBounds,
        color: Color,
    },
    StrokeOval {
        bounds: ShapeBounds,
        color: Color,
    },
    StrokeLine {
        from: CanvasPoint,
        to: CanvasPoint,
        color: Color,
    },
}

impl DrawOp {
    pub const fn is_grid(&self) -> bool {
        matches!(self, Self::GridLine { .. })
    }

    pub const fn color(&self) -> Color {
        match self {
            Self::GridLine { color, .. }
            | Self::FillCircle { color, .. }
            | Self::StrokeRect { color, .. }
            | Self::StrokeOval { color, .. }
            | Self::StrokeLine { color, .. } => *color,
        }
    }
}

/// Box a dab of `diameter` centered on `center` is painted into.
pub fn circle_bounds(center: CanvasPoint, diameter: u32) -> ShapeBounds {
    let half = i32::try_from(diameter / 2).unwrap_or(i32::MAX);
    ShapeBounds::new(
        center.x.saturating_sub(half),
        center.y.saturating_sub(half),
        diameter,
        diameter,
    )
}

/// Receiver of paint operations, e.g. a widget's paint handler or [`RasterCanvas`].
pub trait PaintSurface {
    fn paint(&mut self, op: &DrawOp);
}

impl PaintSurface for Vec<DrawOp> {
    fn paint(&mut self, op: &DrawOp) {
        self.push(*op);
    }
}

pub fn render(store: &ShapeStore, context: &RenderContext) -> Vec<DrawOp> {
    let mut ops = Vec::new();
    paint(store, context, &mut ops);
    ops
}

/// Paints grids first, then dabs, rectangles, ovals and lines, each oldest first.
/// A shape still being dragged is painted after the committed ones of its kind.
pub fn paint<S: PaintSurface + ?Sized>(
    store: &ShapeStore,
    context: &RenderContext,
    surface: &mut S,
) {
    let style = &context.style;
    if context.grid.fine {
        paint_grid(context.canvas, style.fine_spacing, style.fine_color, surface);
    }
    if context.grid.coarse {
        paint_grid(context.canvas, style.coarse_spacing, style.coarse_color, surface);
    }

    for dab in store.freehand_dabs() {
        surface.paint(&DrawOp::FillCircle {
            center: dab.position,
            diameter: dab.size,
            color: dab.color,
        });
    }

    for kind in [ShapeKind::Rectangle, ShapeKind::Oval, ShapeKind::Line] {
        let live = store.shapes(kind).iter().chain(store.pending(kind));
        for entry in live {
            surface.paint(&shape_op(kind, entry));
        }
    }
}

fn shape_op(kind: ShapeKind, entry: &ShapeEntry) -> DrawOp {
    match kind {
        ShapeKind::Rectangle => DrawOp::StrokeRect {
            bounds: entry.bounds(),
            color: entry.color,
        },
        ShapeKind::Oval => DrawOp::StrokeOval {
            bounds: entry.bounds(),
            color: entry.color,
        },
        ShapeKind::Line => DrawOp::StrokeLine {
            from: entry.start,
            to: entry.end,
            color: entry.color,
        },
    }
}

fn paint_grid<S: PaintSurface + ?Sized>(
    canvas: CanvasSize,
    spacing: u32,
    color: Color,
    surface: &mut S,
) {
    if spacing == 0 {
        return;
    }
    let width = i32::try_from(canvas.width).unwrap_or(i32::MAX);
    let height = i32::try_from(canvas.height).unwrap_or(i32::MAX);
    let step = usize::try_from(spacing).unwrap_or(usize::MAX);

    for y in (0..height).step_by(step) {
        surface.paint(&DrawOp::GridLine {
            from: CanvasPoint::new(0, y),
            to: CanvasPoint::new(width, y),
            color,
        });
    }
    for x in (0..width).step_by(step) {
        surface.paint(&DrawOp::GridLine {
            from: CanvasPoint::new(x, 0),
            to: CanvasPoint::new(x, height),
            color,
        });
    }
}

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Color;

pub const MIN_FREEHAND_THICKNESS: u8 = 0;
pub const MAX_FREEHAND_THICKNESS: u8 = 20;
pub const DEFAULT_FREEHAND_THICKNESS: u8 = 1;

/// Two-corner shape categories. Freehand dabs are kept apart from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Oval,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [Self::Line, Self::Rectangle, Self::Oval];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Rectangle => "rectangle",
            Self::Oval => "oval",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Line,
    Rectangle,
    Oval,
    Freehand,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [Self::Line, Self::Rectangle, Self::Oval, Self::Freehand];

    pub const fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            Self::Line => Some(ShapeKind::Line),
            Self::Rectangle => Some(ShapeKind::Rectangle),
            Self::Oval => Some(ShapeKind::Oval),
            Self::Freehand => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Line => "Line",
            Self::Rectangle => "Rectangle",
            Self::Oval => "Oval",
            Self::Freehand => "Freehand",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown drawing tool: {0}")]
pub struct UnknownToolError(pub String);

impl FromStr for ToolKind {
    type Err = UnknownToolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownToolError(value.to_string()))
    }
}

/// Session-wide tool selection read on every pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolState {
    active_tool: ToolKind,
    color: Color,
    thickness: u8,
}

impl Default for ToolState {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolState {
    pub const fn new() -> Self {
        Self {
            active_tool: ToolKind::Line,
            color: Color::BLACK,
            thickness: DEFAULT_FREEHAND_THICKNESS,
        }
    }

    pub fn with_defaults(tool: ToolKind, color: Color, thickness: u8) -> Self {
        let mut state = Self::new();
        state.select_tool(tool);
        state.set_color(color);
        state.set_thickness(thickness);
        state
    }

    pub const fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    pub const fn color(&self) -> Color {
        self.color
    }

    pub const fn thickness(&self) -> u8 {
        self.thickness
    }

    pub fn select_tool(&mut self, tool: ToolKind) {
        self.active_tool = tool;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_thickness(&mut self, thickness: u8) {
        self.thickness = thickness.clamp(MIN_FREEHAND_THICKNESS, MAX_FREEHAND_THICKNESS);
    }
}

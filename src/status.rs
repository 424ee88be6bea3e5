use std::collections::VecDeque;
use std::path::PathBuf;

use crate::drawing::StoreCategory;

const DEFAULT_LOG_LINES: usize = 500;

/// Human-readable notices for the message area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    InkRemaining(usize),
    CapacityExhausted(StoreCategory),
    Cleared,
    Saved(PathBuf),
    Opened(PathBuf),
    SaveFailed { path: PathBuf, reason: String },
    LoadFailed { path: PathBuf, reason: String },
    Exported(PathBuf),
    ExportFailed { path: PathBuf, reason: String },
    NothingToAnimate,
}

impl StatusMessage {
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::CapacityExhausted(_)
                | Self::SaveFailed { .. }
                | Self::LoadFailed { .. }
                | Self::ExportFailed { .. }
                | Self::NothingToAnimate
        )
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InkRemaining(left) => write!(f, "You have {left} inks left."),
            Self::CapacityExhausted(StoreCategory::Freehand) => {
                f.write_str("There are no inks left! You must clear the canvas!")
            }
            Self::CapacityExhausted(StoreCategory::Shape(kind)) => {
                write!(f, "No {kind}s left! You must clear the canvas!")
            }
            Self::Cleared => f.write_str("Canvas has been cleared"),
            Self::Saved(path) => write!(f, "Saved file to {}", path.display()),
            Self::Opened(path) => write!(f, "Open file {}", path.display()),
            Self::SaveFailed { path, reason } => {
                write!(f, "Could not save {}: {reason}", path.display())
            }
            Self::LoadFailed { path, reason } => {
                write!(f, "Could not open {}: {reason}", path.display())
            }
            Self::Exported(path) => write!(f, "Exported image to {}", path.display()),
            Self::ExportFailed { path, reason } => {
                write!(f, "Could not export {}: {reason}", path.display())
            }
            Self::NothingToAnimate => f.write_str("Draw an oval first, then press Animate."),
        }
    }
}

/// Bounded, append-only text log backing the message area.
#[derive(Debug, Clone)]
pub struct MessageLog {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_max_lines(DEFAULT_LOG_LINES)
    }
}

impl MessageLog {
    pub fn with_max_lines(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
        }
    }

    pub fn push(&mut self, message: &StatusMessage) {
        if self.lines.len() == self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(message.to_string());
    }

    /// Drops the history and leaves `message` as the only line.
    pub fn reset_to(&mut self, message: &StatusMessage) {
        self.lines.clear();
        self.push(message);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn text(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }
}

use thiserror::Error;

use super::tool::ShapeKind;
use crate::geometry::{CanvasPoint, Color, ShapeBounds};

pub const DEFAULT_FREEHAND_CAPACITY: usize = 100_000;
pub const DEFAULT_SHAPE_CAPACITY: usize = 10;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreCategory {
    Freehand,
    Shape(ShapeKind),
}

impl std::fmt::Display for StoreCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Freehand => f.write_str("freehand"),
            Self::Shape(kind) => write!(f, "{kind}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{category} capacity of {capacity} reached")]
    CapacityExceeded {
        category: StoreCategory,
        capacity: usize,
    },
}

/// Upper bound on committed entries in one category. `None` grows without limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPolicy {
    limit: Option<usize>,
}

impl CapacityPolicy {
    pub const fn bounded(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }

    pub const fn unbounded() -> Self {
        Self { limit: None }
    }

    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn admits(&self, len: usize) -> bool {
        self.limit.is_none_or(|limit| len < limit)
    }

    pub fn remaining(&self, len: usize) -> Option<usize> {
        self.limit.map(|limit| limit.saturating_sub(len))
    }

    fn check(&self, category: StoreCategory, len: usize) -> StoreResult<()> {
        match self.limit {
            Some(capacity) if len >= capacity => {
                Err(StoreError::CapacityExceeded { category, capacity })
            }
            _ => Ok(()),
        }
    }

    fn check_total(&self, category: StoreCategory, total: usize) -> StoreResult<()> {
        match self.limit {
            Some(capacity) if total > capacity => {
                Err(StoreError::CapacityExceeded { category, capacity })
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCapacities {
    pub freehand: CapacityPolicy,
    pub lines: CapacityPolicy,
    pub rectangles: CapacityPolicy,
    pub ovals: CapacityPolicy,
}

impl Default for StoreCapacities {
    fn default() -> Self {
        Self {
            freehand: CapacityPolicy::bounded(DEFAULT_FREEHAND_CAPACITY),
            lines: CapacityPolicy::bounded(DEFAULT_SHAPE_CAPACITY),
            rectangles: CapacityPolicy::bounded(DEFAULT_SHAPE_CAPACITY),
            ovals: CapacityPolicy::bounded(DEFAULT_SHAPE_CAPACITY),
        }
    }
}

impl StoreCapacities {
    pub const fn unbounded() -> Self {
        Self {
            freehand: CapacityPolicy::unbounded(),
            lines: CapacityPolicy::unbounded(),
            rectangles: CapacityPolicy::unbounded(),
            ovals: CapacityPolicy::unbounded(),
        }
    }

    pub const fn for_shape(&self, kind: ShapeKind) -> CapacityPolicy {
        match kind {
            ShapeKind::Line => self.lines,
            ShapeKind::Rectangle => self.rectangles,
            ShapeKind::Oval => self.ovals,
        }
    }
}

/// One freehand ink mark: a filled circle of diameter `size` centered on `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FreehandDab {
    pub position: CanvasPoint,
    pub size: u32,
    pub color: Color,
}

impl FreehandDab {
    pub const fn new(position: CanvasPoint, size: u32, color: Color) -> Self {
        Self {
            position,
            size,
            color,
        }
    }
}

/// A line, rectangle or oval stored as the two points the user dragged between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeEntry {
    pub start: CanvasPoint,
    pub end: CanvasPoint,
    pub color: Color,
}

impl ShapeEntry {
    pub const fn new(start: CanvasPoint, end: CanvasPoint, color: Color) -> Self {
        Self { start, end, color }
    }

    pub const fn degenerate(at: CanvasPoint, color: Color) -> Self {
        Self::new(at, at, color)
    }

    pub fn bounds(&self) -> ShapeBounds {
        ShapeBounds::from_corners(self.start, self.end)
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        self.start = self.start.offset(dx, dy);
        self.end = self.end.offset(dx, dy);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeList {
    kind: ShapeKind,
    committed: Vec<ShapeEntry>,
    pending: Option<ShapeEntry>,
    capacity: CapacityPolicy,
}

impl ShapeList {
    fn new(kind: ShapeKind, capacity: CapacityPolicy) -> Self {
        Self {
            kind,
            committed: Vec::new(),
            pending: None,
            capacity,
        }
    }

    pub fn entries(&self) -> &[ShapeEntry] {
        &self.committed
    }

    pub fn pending(&self) -> Option<&ShapeEntry> {
        self.pending.as_ref()
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    fn begin(&mut self, at: CanvasPoint, color: Color) -> StoreResult<usize> {
        self.capacity
            .check(StoreCategory::Shape(self.kind), self.committed.len())?;
        self.pending = Some(ShapeEntry::degenerate(at, color));
        Ok(self.committed.len())
    }

    fn update(&mut self, end: CanvasPoint) -> bool {
        match self.pending.as_mut() {
            Some(entry) => {
                entry.end = end;
                true
            }
            None => false,
        }
    }

    fn discard(&mut self) -> bool {
        self.pending.take().is_some()
    }

    fn commit(&mut self) -> Option<usize> {
        let entry = self.pending.take()?;
        // The slot was reserved by `begin`, but a restore in between may have filled it.
        if !self.capacity.admits(self.committed.len()) {
            return None;
        }
        self.committed.push(entry);
        Some(self.committed.len() - 1)
    }

    fn clear(&mut self) {
        self.committed.clear();
        self.pending = None;
    }
}

/// Counts of committed entries per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreCounts {
    pub freehand: usize,
    pub lines: usize,
    pub rectangles: usize,
    pub ovals: usize,
}

impl StoreCounts {
    pub const fn shapes_total(&self) -> usize {
        self.lines + self.rectangles + self.ovals
    }
}

/// Whole-store copy of every committed entry; pending shapes are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreSnapshot {
    pub lines: Vec<ShapeEntry>,
    pub ovals: Vec<ShapeEntry>,
    pub rectangles: Vec<ShapeEntry>,
    pub freehand: Vec<FreehandDab>,
}

impl StoreSnapshot {
    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            freehand: self.freehand.len(),
            lines: self.lines.len(),
            rectangles: self.rectangles.len(),
            ovals: self.ovals.len(),
        }
    }

    pub fn shapes(&self, kind: ShapeKind) -> &[ShapeEntry] {
        match kind {
            ShapeKind::Line => &self.lines,
            ShapeKind::Rectangle => &self.rectangles,
            ShapeKind::Oval => &self.ovals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeStore {
    capacities: StoreCapacities,
    freehand: Vec<FreehandDab>,
    lines: ShapeList,
    rectangles: ShapeList,
    ovals: ShapeList,
}

impl Default for ShapeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeStore {
    pub fn new() -> Self {
        Self::with_capacities(StoreCapacities::default())
    }

    pub fn with_capacities(capacities: StoreCapacities) -> Self {
        Self {
            capacities,
            freehand: Vec::new(),
            lines: ShapeList::new(ShapeKind::Line, capacities.lines),
            rectangles: ShapeList::new(ShapeKind::Rectangle, capacities.rectangles),
            ovals: ShapeList::new(ShapeKind::Oval, capacities.ovals),
        }
    }

    pub const fn capacities(&self) -> StoreCapacities {
        self.capacities
    }

    fn list(&self, kind: ShapeKind) -> &ShapeList {
        match kind {
            ShapeKind::Line => &self.lines,
            ShapeKind::Rectangle => &self.rectangles,
            ShapeKind::Oval => &self.ovals,
        }
    }

    fn list_mut(&mut self, kind: ShapeKind) -> &mut ShapeList {
        match kind {
            ShapeKind::Line => &mut self.lines,
            ShapeKind::Rectangle => &mut self.rectangles,
            ShapeKind::Oval => &mut self.ovals,
        }
    }

    pub fn append_freehand_dab(
        &mut self,
        position: CanvasPoint,
        size: u32,
        color: Color,
    ) -> StoreResult<()> {
        self.capacities
            .freehand
            .check(StoreCategory::Freehand, self.freehand.len())?;
        self.freehand.push(FreehandDab::new(position, size, color));
        Ok(())
    }

    /// Dabs that can still be appended before the freehand quota runs out.
    pub fn freehand_remaining(&self) -> Option<usize> {
        self.capacities.freehand.remaining(self.freehand.len())
    }

    pub fn freehand_dabs(&self) -> &[FreehandDab] {
        &self.freehand
    }

    /// Starts a degenerate shape at `at`; returns the slot it will occupy once committed.
    pub fn begin_pending(
        &mut self,
        kind: ShapeKind,
        at: CanvasPoint,
        color: Color,
    ) -> StoreResult<usize> {
        self.list_mut(kind).begin(at, color)
    }

    /// Moves the second corner of the pending shape. Returns `false` when nothing is pending.
    pub fn update_pending(&mut self, kind: ShapeKind, end: CanvasPoint) -> bool {
        self.list_mut(kind).update(end)
    }

    /// Makes the pending shape permanent. Without a pending shape this is a no-op.
    pub fn commit_pending(&mut self, kind: ShapeKind) -> Option<usize> {
        self.list_mut(kind).commit()
    }

    /// Drops the pending shape without committing it. Returns whether one was pending.
    pub fn discard_pending(&mut self, kind: ShapeKind) -> bool {
        self.list_mut(kind).discard()
    }

    pub fn pending(&self, kind: ShapeKind) -> Option<&ShapeEntry> {
        self.list(kind).pending()
    }

    pub fn shapes(&self, kind: ShapeKind) -> &[ShapeEntry] {
        self.list(kind).entries()
    }

    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            freehand: self.freehand.len(),
            lines: self.lines.len(),
            rectangles: self.rectangles.len(),
            ovals: self.ovals.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.freehand.is_empty()
            && ShapeKind::ALL
                .into_iter()
                .all(|kind| self.list(kind).is_empty() && self.list(kind).pending().is_none())
    }

    pub fn clear_all(&mut self) {
        self.freehand.clear();
        self.freehand.shrink_to_fit();
        for kind in ShapeKind::ALL {
            self.list_mut(kind).clear();
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            lines: self.lines.entries().to_vec(),
            ovals: self.ovals.entries().to_vec(),
            rectangles: self.rectangles.entries().to_vec(),
            freehand: self.freehand.clone(),
        }
    }

    /// Replaces every category wholesale. Fails without touching the store when the
    /// snapshot does not fit the configured capacities.
    pub fn restore(&mut self, snapshot: StoreSnapshot) -> StoreResult<()> {
        self.capacities
            .freehand
            .check_total(StoreCategory::Freehand, snapshot.freehand.len())?;
        for kind in ShapeKind::ALL {
            self.capacities
                .for_shape(kind)
                .check_total(StoreCategory::Shape(kind), snapshot.shapes(kind).len())?;
        }

        let StoreSnapshot {
            lines,
            ovals,
            rectangles,
            freehand,
        } = snapshot;
        self.freehand = freehand;
        for (kind, entries) in [
            (ShapeKind::Line, lines),
            (ShapeKind::Rectangle, rectangles),
            (ShapeKind::Oval, ovals),
        ] {
            let list = self.list_mut(kind);
            list.committed = entries;
            list.pending = None;
        }
        Ok(())
    }

    /// Shifts a committed shape in place. Only the animator moves committed geometry.
    pub(crate) fn translate_shape(
        &mut self,
        kind: ShapeKind,
        index: usize,
        dx: i32,
        dy: i32,
    ) -> bool {
        match self.list_mut(kind).committed.get_mut(index) {
            Some(entry) => {
                entry.translate(dx, dy);
                true
            }
            None => false,
        }
    }
}

//! In-memory drawing model: tool selection, committed shapes and the pointer protocol
//! that mutates them.

pub mod store;
pub mod tool;
pub mod translator;

pub use store::{
    CapacityPolicy, FreehandDab, ShapeEntry, ShapeList, ShapeStore, StoreCapacities,
    StoreCategory, StoreCounts, StoreError, StoreResult, StoreSnapshot,
    DEFAULT_FREEHAND_CAPACITY, DEFAULT_SHAPE_CAPACITY,
};
pub use tool::{
    ShapeKind, ToolKind, ToolState, UnknownToolError, MAX_FREEHAND_THICKNESS,
    MIN_FREEHAND_THICKNESS,
};
pub use translator::{InputOutcome, InputTranslator, PointerEvent};

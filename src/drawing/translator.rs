use super::store::{ShapeStore, StoreError};
use super::tool::{ShapeKind, ToolKind, ToolState};
use crate::geometry::CanvasPoint;
use crate::status::StatusMessage;

/// Canvas-local pointer input as forwarded by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press(CanvasPoint),
    Drag(CanvasPoint),
    Release(CanvasPoint),
    /// Press and release without any drag in between.
    Click(CanvasPoint),
    Move(CanvasPoint),
}

impl PointerEvent {
    pub const fn position(self) -> CanvasPoint {
        match self {
            Self::Press(at)
            | Self::Drag(at)
            | Self::Release(at)
            | Self::Click(at)
            | Self::Move(at) => at,
        }
    }
}

/// What the UI should do after an event was applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputOutcome {
    pub repaint: bool,
    /// New value for the coordinate readout, reported on moves and drags.
    pub pointer: Option<CanvasPoint>,
    pub messages: Vec<StatusMessage>,
}

impl InputOutcome {
    fn pointer_at(at: CanvasPoint) -> Self {
        Self {
            pointer: Some(at),
            ..Self::default()
        }
    }

    fn warn(&mut self, message: StatusMessage) {
        self.messages.push(message);
    }
}

/// Turns pointer sequences into store mutations according to the active tool.
///
/// A shape gesture keeps the tool it was started with, so switching tools while the
/// button is held cannot commit into a different category than the one that was begun.
#[derive(Debug, Clone, Default)]
pub struct InputTranslator {
    held_tool: Option<ToolKind>,
}

impl InputTranslator {
    pub const fn new() -> Self {
        Self { held_tool: None }
    }

    pub fn is_pressed(&self) -> bool {
        self.held_tool.is_some()
    }

    /// Forgets the gesture in progress, e.g. after the store was cleared mid-drag.
    pub fn reset(&mut self) {
        self.held_tool = None;
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        tools: &ToolState,
        store: &mut ShapeStore,
    ) -> InputOutcome {
        match event {
            PointerEvent::Press(at) => self.press(at, tools, store),
            PointerEvent::Drag(at) => self.drag(at, tools, store),
            PointerEvent::Release(_) => self.release(store),
            PointerEvent::Click(at) => click(at, tools, store),
            PointerEvent::Move(at) => InputOutcome::pointer_at(at),
        }
    }

    fn press(
        &mut self,
        at: CanvasPoint,
        tools: &ToolState,
        store: &mut ShapeStore,
    ) -> InputOutcome {
        // A press without a release for the previous gesture abandons its preview.
        if let Some(kind) = self.held_tool.take().and_then(ToolKind::shape_kind) {
            if store.discard_pending(kind) {
                tracing::debug!(%kind, "abandoned unreleased shape");
            }
        }
        let tool = tools.active_tool();
        self.held_tool = Some(tool);

        match tool.shape_kind() {
            Some(kind) => begin_shape(kind, at, tools, store),
            None => InputOutcome::default(),
        }
    }

    fn drag(
        &mut self,
        at: CanvasPoint,
        tools: &ToolState,
        store: &mut ShapeStore,
    ) -> InputOutcome {
        let tool = *self.held_tool.get_or_insert(tools.active_tool());

        let mut outcome = match tool.shape_kind() {
            Some(kind) => drag_shape(kind, at, store),
            None => freehand_dab(at, tools, store),
        };
        outcome.pointer = Some(at);
        outcome
    }

    fn release(&mut self, store: &mut ShapeStore) -> InputOutcome {
        let Some(tool) = self.held_tool.take() else {
            return InputOutcome::default();
        };
        match tool.shape_kind() {
            Some(kind) => commit_shape(kind, store),
            None => InputOutcome::default(),
        }
    }
}

fn click(at: CanvasPoint, tools: &ToolState, store: &mut ShapeStore) -> InputOutcome {
    match tools.active_tool() {
        ToolKind::Freehand => freehand_dab(at, tools, store),
        ToolKind::Line | ToolKind::Rectangle | ToolKind::Oval => InputOutcome::default(),
    }
}

fn freehand_dab(at: CanvasPoint, tools: &ToolState, store: &mut ShapeStore) -> InputOutcome {
    let mut outcome = InputOutcome::default();
    match store.append_freehand_dab(at, u32::from(tools.thickness()), tools.color()) {
        Ok(()) => {
            outcome.repaint = true;
            if let Some(remaining) = store.freehand_remaining().filter(|left| *left > 0) {
                outcome.messages.push(StatusMessage::InkRemaining(remaining));
            }
        }
        Err(err) => {
            tracing::warn!(%err, x = at.x, y = at.y, "freehand dab rejected");
            outcome.warn(capacity_warning(err));
        }
    }
    outcome
}

fn begin_shape(
    kind: ShapeKind,
    at: CanvasPoint,
    tools: &ToolState,
    store: &mut ShapeStore,
) -> InputOutcome {
    let mut outcome = InputOutcome::default();
    match store.begin_pending(kind, at, tools.color()) {
        Ok(slot) => {
            tracing::debug!(%kind, slot, x = at.x, y = at.y, "shape begun");
            outcome.repaint = true;
        }
        Err(err) => {
            tracing::warn!(%err, %kind, "shape rejected");
            outcome.warn(capacity_warning(err));
        }
    }
    outcome
}

fn drag_shape(kind: ShapeKind, at: CanvasPoint, store: &mut ShapeStore) -> InputOutcome {
    InputOutcome {
        repaint: store.update_pending(kind, at),
        ..InputOutcome::default()
    }
}

fn commit_shape(kind: ShapeKind, store: &mut ShapeStore) -> InputOutcome {
    let committed = store.commit_pending(kind);
    if let Some(index) = committed {
        tracing::debug!(%kind, index, "shape committed");
    }
    InputOutcome {
        repaint: committed.is_some(),
        ..InputOutcome::default()
    }
}

fn capacity_warning(err: StoreError) -> StatusMessage {
    match err {
        StoreError::CapacityExceeded { category, .. } => StatusMessage::CapacityExhausted(category),
    }
}

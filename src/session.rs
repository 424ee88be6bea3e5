use std::path::Path;
use std::time::Instant;

use crate::animation::{AnimationTarget, Animator, TickOutcome};
use crate::config::SessionSettings;
use crate::drawing::{
    InputOutcome, InputTranslator, PointerEvent, ShapeKind, ShapeStore, ToolKind, ToolState,
};
use crate::error::{AppError, AppResult};
use crate::geometry::{CanvasSize, Color};
use crate::render::{
    self, DrawOp, GridFlags, GridStyle, PaintSurface, RasterCanvas, RenderContext,
};
use crate::status::{MessageLog, StatusMessage};
use crate::storage::{DrawingStorage, FileDrawingStorage, StorageError, StorageResult};

/// The animate button always targets the first committed oval.
const DEFAULT_ANIMATION_TARGET: AnimationTarget = AnimationTarget::new(ShapeKind::Oval, 0);

/// Everything the UI collaborator talks to: tool selection, the shape store and its
/// pointer protocol, grid toggles, the animator, persistence and the message area.
#[derive(Debug)]
pub struct DrawingSession<S = FileDrawingStorage> {
    tools: ToolState,
    store: ShapeStore,
    translator: InputTranslator,
    grid: GridFlags,
    grid_style: GridStyle,
    animator: Animator,
    log: MessageLog,
    storage: S,
}

impl Default for DrawingSession {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

impl DrawingSession {
    pub fn new(settings: SessionSettings) -> Self {
        Self::with_storage(settings, FileDrawingStorage::new())
    }
}

impl<S: DrawingStorage> DrawingSession<S> {
    pub fn with_storage(settings: SessionSettings, storage: S) -> Self {
        Self {
            tools: settings.tools,
            store: ShapeStore::with_capacities(settings.capacities),
            translator: InputTranslator::new(),
            grid: settings.grid,
            grid_style: settings.grid_style,
            animator: Animator::new(settings.animation_period),
            log: MessageLog::with_max_lines(settings.message_log_lines),
            storage,
        }
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn store(&self) -> &ShapeStore {
        &self.store
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn grid(&self) -> GridFlags {
        self.grid
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Applies one pointer event and appends any resulting notices to the message log.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> InputOutcome {
        let outcome = self.translator.handle(event, &self.tools, &mut self.store);
        for message in &outcome.messages {
            self.log.push(message);
        }
        outcome
    }

    pub fn select_tool(&mut self, tool: ToolKind) {
        tracing::debug!(tool = tool.label(), "tool selected");
        self.tools.select_tool(tool);
    }

    pub fn set_color(&mut self, color: Color) {
        tracing::debug!(r = color.r, g = color.g, b = color.b, "color selected");
        self.tools.set_color(color);
    }

    pub fn set_thickness(&mut self, thickness: u8) {
        self.tools.set_thickness(thickness);
        tracing::debug!(thickness = self.tools.thickness(), "thickness changed");
    }

    pub fn set_fine_grid(&mut self, enabled: bool) {
        self.grid.fine = enabled;
    }

    pub fn set_coarse_grid(&mut self, enabled: bool) {
        self.grid.coarse = enabled;
    }

    /// Empties every category. A running animation notices on its next tick.
    pub fn clear(&mut self) {
        self.store.clear_all();
        self.translator.reset();
        self.log.reset_to(&StatusMessage::Cleared);
        tracing::info!("canvas cleared");
    }

    /// Starts moving the first oval. Returns false (and posts a notice) when there is none.
    pub fn start_animation(&mut self, now: Instant) -> bool {
        match self.start_animation_on(DEFAULT_ANIMATION_TARGET, now) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%err, "nothing to animate");
                self.log.push(&StatusMessage::NothingToAnimate);
                false
            }
        }
    }

    pub fn start_animation_on(&mut self, target: AnimationTarget, now: Instant) -> AppResult<()> {
        self.animator.start(target, &self.store, now)?;
        Ok(())
    }

    pub fn stop_animation(&mut self) -> bool {
        self.animator.stop()
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        self.animator.tick(&mut self.store, now)
    }

    pub fn render_context(&self, canvas: CanvasSize) -> RenderContext {
        RenderContext {
            canvas,
            grid: self.grid,
            style: self.grid_style,
        }
    }

    pub fn render(&self, canvas: CanvasSize) -> Vec<DrawOp> {
        render::render(&self.store, &self.render_context(canvas))
    }

    pub fn paint<P: PaintSurface + ?Sized>(&self, canvas: CanvasSize, surface: &mut P) {
        render::paint(&self.store, &self.render_context(canvas), surface);
    }

    pub fn save_to(&mut self, path: &Path) -> AppResult<()> {
        match self.storage.save_drawing(path, &self.store.snapshot()) {
            Ok(()) => {
                let counts = self.store.counts();
                tracing::info!(
                    path = %path.display(),
                    freehand = counts.freehand,
                    shapes = counts.shapes_total(),
                    "drawing saved"
                );
                self.log.push(&StatusMessage::Saved(path.to_path_buf()));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, path = %path.display(), "save failed");
                self.log.push(&StatusMessage::SaveFailed {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Replaces the drawing with the file's contents. On any failure the current drawing
    /// stays as it was.
    pub fn load_from(&mut self, path: &Path) -> AppResult<()> {
        match self.try_load(path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "drawing opened");
                self.log.push(&StatusMessage::Opened(path.to_path_buf()));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, path = %path.display(), "open failed");
                self.log.push(&StatusMessage::LoadFailed {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    fn try_load(&mut self, path: &Path) -> StorageResult<()> {
        let snapshot = self.storage.load_drawing(path)?;
        self.store
            .restore(snapshot)
            .map_err(|source| StorageError::Restore {
                path: path.to_path_buf(),
                source,
            })?;
        self.translator.reset();
        self.animator.stop();
        Ok(())
    }

    /// Rasterizes the current scene onto a white canvas and writes it as PNG.
    pub fn export_png(&mut self, path: &Path, size: CanvasSize) -> AppResult<()> {
        let mut canvas = RasterCanvas::new(size, Color::WHITE);
        self.paint(size, &mut canvas);
        match canvas.save_png(path) {
            Ok(()) => {
                tracing::info!(
                    path = %path.display(),
                    width = size.width,
                    height = size.height,
                    "png exported"
                );
                self.log.push(&StatusMessage::Exported(path.to_path_buf()));
                Ok(())
            }
            Err(source) => {
                tracing::warn!(err = %source, path = %path.display(), "png export failed");
                self.log.push(&StatusMessage::ExportFailed {
                    path: path.to_path_buf(),
                    reason: source.to_string(),
                });
                Err(AppError::Export {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
}

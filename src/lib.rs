pub mod animation;
pub mod config;
pub mod drawing;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod render;
pub mod session;
pub mod status;
pub mod storage;

pub use error::{AppError, AppResult};
pub use session::DrawingSession;

/// Entrypoint used by the UI collaborator: logging, configuration, then a fresh session.
pub fn bootstrap() -> DrawingSession {
    logging::init();
    tracing::info!("starting nxdraw");

    let settings = config::load_session_settings();
    tracing::info!(
        tool = settings.tools.active_tool().label(),
        freehand_capacity = ?settings.capacities.freehand.limit(),
        fine_grid = settings.grid.fine,
        coarse_grid = settings.grid.coarse,
        period_ms = settings.animation_period.as_millis(),
        "session settings resolved"
    );
    DrawingSession::new(settings)
}

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::drawing::{ShapeKind, ShapeStore};

pub const DEFAULT_ANIMATION_PERIOD: Duration = Duration::from_millis(10);
const MIN_ANIMATION_PERIOD: Duration = Duration::from_millis(1);
// A stalled event loop should not make the shape jump across the canvas.
const MAX_CATCH_UP_TICKS: u32 = 100;

/// A committed shape addressed by category and commit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTarget {
    pub kind: ShapeKind,
    pub index: usize,
}

impl AnimationTarget {
    pub const fn new(kind: ShapeKind, index: usize) -> Self {
        Self { kind, index }
    }
}

impl std::fmt::Display for AnimationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.kind, self.index)
    }
}

/// Offset applied to both corners of the target on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationStep {
    pub dx: i32,
    pub dy: i32,
}

impl Default for AnimationStep {
    fn default() -> Self {
        Self { dx: 0, dy: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnimationError {
    #[error("animation target {0} does not exist")]
    TargetMissing(AnimationTarget),
}

pub type AnimationResult<T> = std::result::Result<T, AnimationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No animation is running.
    Idle,
    /// Running, but the next tick is not due yet.
    Waiting,
    /// The target moved by this many steps; the canvas needs a repaint.
    Advanced(u32),
    /// The target disappeared (cleared or replaced by a load) and the animation stopped.
    Stopped(AnimationTarget),
}

#[derive(Debug, Clone, Copy)]
struct Running {
    target: AnimationTarget,
    next_tick: Instant,
}

/// Periodic mover for a single shape. The caller owns the clock and drives [`Animator::tick`].
#[derive(Debug, Clone)]
pub struct Animator {
    period: Duration,
    step: AnimationStep,
    running: Option<Running>,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(DEFAULT_ANIMATION_PERIOD)
    }
}

impl Animator {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_ANIMATION_PERIOD),
            step: AnimationStep::default(),
            running: None,
        }
    }

    pub fn with_step(mut self, step: AnimationStep) -> Self {
        self.step = step;
        self
    }

    pub const fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn target(&self) -> Option<AnimationTarget> {
        self.running.map(|running| running.target)
    }

    /// Starts (or restarts) animating `target`; the first tick is due one period after `now`.
    pub fn start(
        &mut self,
        target: AnimationTarget,
        store: &ShapeStore,
        now: Instant,
    ) -> AnimationResult<()> {
        if store.shapes(target.kind).len() <= target.index {
            return Err(AnimationError::TargetMissing(target));
        }
        tracing::debug!(%target, period_ms = self.period.as_millis(), "animation started");
        self.running = Some(Running {
            target,
            next_tick: now + self.period,
        });
        Ok(())
    }

    /// Returns whether an animation was running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.running.take().is_some();
        if was_running {
            tracing::debug!("animation stopped");
        }
        was_running
    }

    /// Applies every step that fell due up to `now`.
    pub fn tick(&mut self, store: &mut ShapeStore, now: Instant) -> TickOutcome {
        let Some(running) = self.running.as_mut() else {
            return TickOutcome::Idle;
        };

        let mut due = 0_u32;
        while running.next_tick <= now {
            due += 1;
            running.next_tick += self.period;
            if due == MAX_CATCH_UP_TICKS {
                running.next_tick = now + self.period;
                break;
            }
        }
        if due == 0 {
            return TickOutcome::Waiting;
        }

        let target = running.target;
        match self.advance(store, target, due) {
            Ok(()) => TickOutcome::Advanced(due),
            Err(AnimationError::TargetMissing(target)) => TickOutcome::Stopped(target),
        }
    }

    /// Moves the target by exactly one step, for callers that run their own timer.
    pub fn step_once(&mut self, store: &mut ShapeStore) -> AnimationResult<bool> {
        let Some(running) = self.running else {
            return Ok(false);
        };
        self.advance(store, running.target, 1)?;
        Ok(true)
    }

    fn advance(
        &mut self,
        store: &mut ShapeStore,
        target: AnimationTarget,
        steps: u32,
    ) -> AnimationResult<()> {
        let steps = i32::try_from(steps).unwrap_or(i32::MAX);
        let dx = self.step.dx.saturating_mul(steps);
        let dy = self.step.dy.saturating_mul(steps);
        if store.translate_shape(target.kind, target.index, dx, dy) {
            return Ok(());
        }

        tracing::info!(%target, "animation target vanished; stopping");
        self.running = None;
        Err(AnimationError::TargetMissing(target))
    }
}

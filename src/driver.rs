use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::config::SceneSettings;
use crate::context::SceneContext;
use crate::emitter::Emitter;
use crate::integrator::Integrator;
use crate::mascot::MascotPose;
use crate::scene::NodeKey;

/// Frame counter. Elapsed time is derived from the frame index, not accumulated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clock {
    frame: u64,
    step: f64,
}

impl Clock {
    pub fn new(step: f64) -> Self {
        Self { frame: 0, step }
    }

    /// Moves to the next frame and returns its elapsed time.
    pub fn advance(&mut self) -> f64 {
        self.frame += 1;
        self.elapsed()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn elapsed(&self) -> f64 {
        self.frame as f64 * self.step
    }
}

/// Why a frame could not be presented.
#[derive(Debug, thiserror::Error)]
pub enum PresentError {
    #[error("frame skipped: {0}")]
    Skipped(String),
    #[error("renderer cannot continue: {0}")]
    Fatal(String),
}

/// Anything that can show the scene once per frame.
pub trait FrameTarget {
    fn present(&mut self, ctx: &SceneContext) -> Result<(), PresentError>;
}

/// Target that draws nothing; used by the headless preview.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl FrameTarget for Headless {
    fn present(&mut self, _ctx: &SceneContext) -> Result<(), PresentError> {
        Ok(())
    }
}

/// What happened during one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub elapsed: f64,
    pub pose: MascotPose,
    pub spawned: Option<NodeKey>,
    pub removed: usize,
    pub live: usize,
}

/// Cloneable handle that cancels a running [`FrameDriver`].
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Runs clock, mascot motion, emitter, integrator and presentation in order,
/// once per display refresh, until stopped.
#[derive(Debug)]
pub struct FrameDriver {
    clock: Clock,
    emitter: Emitter,
    integrator: Integrator,
    running: Arc<AtomicBool>,
}

impl FrameDriver {
    pub fn new(settings: &SceneSettings) -> Self {
        Self {
            clock: Clock::new(settings.time_step),
            emitter: Emitter::new(settings),
            integrator: Integrator::new(settings),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Advances the simulation by one frame without presenting it.
    /// Returns `None` once the driver has been stopped.
    pub fn update(&mut self, ctx: &mut SceneContext) -> Option<FrameReport> {
        if !self.is_running() {
            return None;
        }
        let elapsed = self.clock.advance();
        let pose = MascotPose::at(elapsed);
        ctx.mascot.apply(&mut ctx.graph, pose);
        let spawned = self.emitter.emit(ctx, elapsed);
        let removed = self.integrator.tick(ctx);
        if removed > 0 {
            debug!("frame {}: removed {removed} icons", self.clock.frame());
        }
        Some(FrameReport {
            frame: self.clock.frame(),
            elapsed,
            pose,
            spawned,
            removed,
            live: ctx.live.len(),
        })
    }

    /// Updates and presents one frame. A fatal presentation error stops the driver.
    pub fn frame<T: FrameTarget + ?Sized>(
        &mut self,
        ctx: &mut SceneContext,
        target: &mut T,
    ) -> Option<FrameReport> {
        let report = self.update(ctx)?;
        match target.present(ctx) {
            Ok(()) => {}
            Err(err @ PresentError::Skipped(_)) => warn!("{err}"),
            Err(err @ PresentError::Fatal(_)) => {
                error!("{err}");
                self.stop();
            }
        }
        Some(report)
    }

    /// Drives up to `max_frames` frames back to back. Returns the number run.
    pub fn run<T: FrameTarget + ?Sized>(
        &mut self,
        ctx: &mut SceneContext,
        target: &mut T,
        max_frames: u64,
    ) -> u64 {
        let mut count = 0;
        while count < max_frames && self.frame(ctx, target).is_some() {
            count += 1;
        }
        info!(
            "ran {count} frames: spawned {}, removed {}, live {}",
            ctx.stats.spawned,
            ctx.stats.removed,
            ctx.live.len()
        );
        count
    }
}

//! Frame pacing and the per-frame update of the cube.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

use log::{debug, info};

use crate::context::{ClearMask, GraphicsContext, IndexType, Primitive};
use crate::transform::{TransformState, TransformUniforms};

pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.75, 0.85, 0.8, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Shared flag that ends a running loop before its next tick.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Blocks until the next frame is due and returns the time since the loop
/// started. `None` means the host will not schedule further frames.
pub trait FrameScheduler {
    fn wait_for_frame(&mut self) -> Option<Duration>;
}

/// Simulated clock advancing by a fixed step for a fixed number of frames.
#[derive(Debug, Clone)]
pub struct FixedStepScheduler {
    step: Duration,
    remaining: u32,
    elapsed: Duration,
}

impl FixedStepScheduler {
    /// The first frame reports `step`, the n-th frame `n * step`.
    pub fn new(step: Duration, frames: u32) -> Self {
        Self {
            step,
            remaining: frames,
            elapsed: Duration::ZERO,
        }
    }
}

impl FrameScheduler for FixedStepScheduler {
    fn wait_for_frame(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.elapsed += self.step;
        Some(self.elapsed)
    }
}

/// Wall clock measured from construction. Pacing comes from the context's
/// present, so every call yields a frame.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl FrameScheduler for MonotonicClock {
    fn wait_for_frame(&mut self) -> Option<Duration> {
        Some(self.elapsed())
    }
}

/// What a frame draws after clearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    Arrays { count: u32 },
    Elements { count: u32 },
}

/// Clears color and depth, issues `draw` and presents.
pub fn draw_frame(ctx: &mut dyn GraphicsContext, clear_color: [f32; 4], draw: DrawCommand) {
    ctx.clear_color(clear_color);
    ctx.clear(ClearMask::COLOR_DEPTH);
    match draw {
        DrawCommand::Arrays { count } => ctx.draw_arrays(Primitive::Triangles, 0, count),
        DrawCommand::Elements { count } => {
            ctx.draw_elements(Primitive::Triangles, count, IndexType::U16, 0)
        }
    }
    ctx.present();
}

/// Owns the transform and redraws the cube once per scheduled frame.
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    transform: TransformState,
    uniforms: TransformUniforms,
    clear_color: [f32; 4],
    draw: DrawCommand,
    stop: StopHandle,
    frames: u64,
}

impl RenderLoop {
    pub fn new(
        transform: TransformState,
        uniforms: TransformUniforms,
        clear_color: [f32; 4],
        index_count: u32,
    ) -> Self {
        Self {
            state: LoopState::Idle,
            transform,
            uniforms,
            clear_color,
            draw: DrawCommand::Elements { count: index_count },
            stop: StopHandle::new(),
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// One frame at `elapsed` since the loop started.
    pub fn tick(&mut self, ctx: &mut dyn GraphicsContext, elapsed: Duration) {
        self.state = LoopState::Running;
        self.transform.advance(elapsed);
        self.uniforms.upload_world(ctx, &self.transform);
        draw_frame(ctx, self.clear_color, self.draw);
        self.frames += 1;
    }

    /// Ticks until the stop handle is set or the scheduler runs dry.
    pub fn run(&mut self, ctx: &mut dyn GraphicsContext, scheduler: &mut dyn FrameScheduler) {
        info!("Render loop started");
        while !self.stop.is_stopped() {
            let Some(elapsed) = scheduler.wait_for_frame() else {
                debug!("scheduler has no further frames");
                break;
            };
            self.tick(ctx, elapsed);
        }
        self.state = LoopState::Idle;
        info!("Render loop stopped after {} frame(s)", self.frames);
    }
}

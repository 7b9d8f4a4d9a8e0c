//! A vertex-colored cube spinning on an immediate-mode graphics pipeline,
//! plus the static triangle it grew out of.
//!
//! Setup compiles and links a WGSL program, uploads the mesh once, wires the
//! vertex attributes and pushes the camera matrices. After that only the world
//! matrix changes: the render loop recomputes it from elapsed time, uploads it
//! and redraws once per frame. Everything talks to the device through
//! [`GraphicsContext`], so the pipeline runs unchanged against a window, a
//! canvas or the headless [`RecordingContext`].

pub mod binder;
pub mod config;
pub mod context;
pub mod error;
pub mod geometry;
pub mod render_loop;
pub mod session;
pub mod shader;
pub mod transform;
#[cfg(target_arch = "wasm32")]
pub mod web;
#[cfg(not(target_arch = "wasm32"))]
pub mod window;

pub use config::{RenderConfig, SceneKind};
pub use context::{GraphicsContext, RecordingContext, WgpuContext};
pub use error::{SetupError, ShaderStage};
pub use render_loop::{FixedStepScheduler, FrameScheduler, LoopState, RenderLoop, StopHandle};
pub use session::{CubeSession, LogNotifier, Notifier, Session, TriangleSession};
pub use shader::{build_program, ProgramDescriptor, ShaderProgram};
pub use transform::{world_at, CameraConfig, TransformState, TransformUniforms};

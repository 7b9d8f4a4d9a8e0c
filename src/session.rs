//! One-time setup of a scene on a context, and the handles used to drive it
//! afterwards.

use std::time::Duration;

use log::{error, info};

use crate::binder::{activate_program, bind_attributes, upload_geometry, GeometryBuffers};
use crate::config::{RenderConfig, SceneKind};
use crate::context::{Capability, ClearMask, Face, GraphicsContext, Winding};
use crate::error::SetupError;
use crate::geometry::{cube_mesh, triangle_mesh};
use crate::render_loop::{draw_frame, DrawCommand, FrameScheduler, RenderLoop, StopHandle};
use crate::shader::{build_program, ShaderProgram, CUBE_PROGRAM, TRIANGLE_PROGRAM};
use crate::transform::{TransformState, TransformUniforms};

/// Receives messages the user must see when setup cannot continue.
pub trait Notifier {
    fn fatal(&mut self, message: &str);
}

impl Notifier for Vec<String> {
    fn fatal(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

/// Native notifier: the message goes to stderr and the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn fatal(&mut self, message: &str) {
        error!("{message}");
        eprintln!("{message}");
    }
}

fn acquire<C>(ctx: Option<C>, notifier: &mut dyn Notifier) -> Result<C, SetupError> {
    ctx.ok_or_else(|| {
        let err = SetupError::ContextUnavailable;
        notifier.fatal(&err.notice());
        err
    })
}

/// The rotating cube: context, program, buffers and the loop that animates
/// them.
pub struct CubeSession<C: GraphicsContext> {
    ctx: C,
    program: ShaderProgram,
    geometry: GeometryBuffers,
    render_loop: RenderLoop,
}

impl<C: GraphicsContext> CubeSession<C> {
    /// Runs the full setup sequence. On failure nothing is drawn.
    pub fn initialize(
        ctx: Option<C>,
        config: &RenderConfig,
        notifier: &mut dyn Notifier,
    ) -> Result<Self, SetupError> {
        let mut ctx = acquire(ctx, notifier)?;

        ctx.clear_color(config.clear_color);
        ctx.clear(ClearMask::COLOR_DEPTH);
        ctx.enable(Capability::DepthTest);
        ctx.enable(Capability::CullFace);
        ctx.front_face(Winding::Ccw);
        ctx.cull_face(Face::Back);

        let program = build_program(&mut ctx, &CUBE_PROGRAM, config.validate)?;
        let mesh = cube_mesh();
        let geometry = upload_geometry(&mut ctx, &mesh).inspect_err(|err| error!("{err}"))?;
        bind_attributes(&mut ctx, &program, &mesh.layout).inspect_err(|err| error!("{err}"))?;
        activate_program(&mut ctx, &program);

        let transform = TransformState::new(&config.camera, config.aspect());
        let uniforms = TransformUniforms::resolve(&program);
        uniforms.upload_all(&mut ctx, &transform);

        info!(
            "Cube ready: {} attribute(s), {} uniform(s), {} indices",
            program.resolved_attributes(),
            program.resolved_uniforms(),
            geometry.index_count
        );
        let render_loop = RenderLoop::new(
            transform,
            uniforms,
            config.clear_color,
            geometry.index_count,
        );
        Ok(Self {
            ctx,
            program,
            geometry,
            render_loop,
        })
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.render_loop.tick(&mut self.ctx, elapsed);
    }

    pub fn run(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.render_loop.run(&mut self.ctx, scheduler);
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.render_loop.stop_handle()
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn geometry(&self) -> &GeometryBuffers {
        &self.geometry
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }
}

/// The static red triangle. It is drawn once during setup and again whenever
/// the host asks for a redraw.
pub struct TriangleSession<C: GraphicsContext> {
    ctx: C,
    program: ShaderProgram,
    geometry: GeometryBuffers,
    clear_color: [f32; 4],
    frames: u64,
    stop: StopHandle,
}

impl<C: GraphicsContext> TriangleSession<C> {
    pub fn initialize(
        ctx: Option<C>,
        config: &RenderConfig,
        notifier: &mut dyn Notifier,
    ) -> Result<Self, SetupError> {
        let mut ctx = acquire(ctx, notifier)?;

        let program = build_program(&mut ctx, &TRIANGLE_PROGRAM, config.validate)?;
        let mesh = triangle_mesh();
        let geometry = upload_geometry(&mut ctx, &mesh).inspect_err(|err| error!("{err}"))?;
        bind_attributes(&mut ctx, &program, &mesh.layout).inspect_err(|err| error!("{err}"))?;
        activate_program(&mut ctx, &program);

        let mut session = Self {
            ctx,
            program,
            geometry,
            clear_color: config.clear_color,
            frames: 0,
            stop: StopHandle::new(),
        };
        session.redraw();
        info!("Triangle ready");
        Ok(session)
    }

    pub fn redraw(&mut self) {
        draw_frame(
            &mut self.ctx,
            self.clear_color,
            DrawCommand::Arrays {
                count: self.geometry.vertex_count,
            },
        );
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }
}

/// Either scene behind one handle, as chosen by [`RenderConfig::scene`].
pub enum Session<C: GraphicsContext> {
    Cube(CubeSession<C>),
    Triangle(TriangleSession<C>),
}

impl<C: GraphicsContext> Session<C> {
    pub fn initialize(
        ctx: Option<C>,
        config: &RenderConfig,
        notifier: &mut dyn Notifier,
    ) -> Result<Self, SetupError> {
        Ok(match config.scene {
            SceneKind::Cube => Self::Cube(CubeSession::initialize(ctx, config, notifier)?),
            SceneKind::Triangle => {
                Self::Triangle(TriangleSession::initialize(ctx, config, notifier)?)
            }
        })
    }

    /// Whether the scene changes over time and needs continuous frames.
    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Cube(_))
    }

    /// Draws one frame at `elapsed` since start.
    pub fn frame(&mut self, elapsed: Duration) {
        match self {
            Self::Cube(cube) => cube.tick(elapsed),
            Self::Triangle(triangle) => triangle.redraw(),
        }
    }

    /// Animated scenes run until stopped; the triangle is already on screen.
    pub fn run(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Self::Cube(cube) = self {
            cube.run(scheduler);
        }
    }

    /// Set by hosts on teardown; they stop scheduling frames once it is set.
    pub fn stop_handle(&self) -> StopHandle {
        match self {
            Self::Cube(cube) => cube.stop_handle(),
            Self::Triangle(triangle) => triangle.stop_handle(),
        }
    }

    pub fn frames(&self) -> u64 {
        match self {
            Self::Cube(cube) => cube.render_loop().frames(),
            Self::Triangle(triangle) => triangle.frames(),
        }
    }

    pub fn program(&self) -> &ShaderProgram {
        match self {
            Self::Cube(cube) => cube.program(),
            Self::Triangle(triangle) => triangle.program(),
        }
    }

    pub fn transform(&self) -> Option<&TransformState> {
        match self {
            Self::Cube(cube) => Some(cube.render_loop().transform()),
            Self::Triangle(_) => None,
        }
    }

    pub fn context(&self) -> &C {
        match self {
            Self::Cube(cube) => cube.context(),
            Self::Triangle(triangle) => triangle.context(),
        }
    }

    pub fn context_mut(&mut self) -> &mut C {
        match self {
            Self::Cube(cube) => cube.context_mut(),
            Self::Triangle(triangle) => triangle.context_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Command, RecordingContext};

    #[test]
    fn cube_setup_enables_depth_and_back_face_culling() {
        let mut notices: Vec<String> = Vec::new();
        let session = CubeSession::initialize(
            Some(RecordingContext::new()),
            &RenderConfig::default(),
            &mut notices,
        )
        .unwrap();
        let commands = session.context().commands();
        assert!(commands.contains(&Command::Enable(Capability::DepthTest)));
        assert!(commands.contains(&Command::Enable(Capability::CullFace)));
        assert!(commands.contains(&Command::FrontFace(Winding::Ccw)));
        assert!(commands.contains(&Command::CullFace(Face::Back)));
        assert!(notices.is_empty());
        assert_eq!(session.context().draw_calls(), 0);
    }

    #[test]
    fn program_is_active_before_uniform_uploads() {
        let session = CubeSession::initialize(
            Some(RecordingContext::new()),
            &RenderConfig::default(),
            &mut Vec::<String>::new(),
        )
        .unwrap();
        let commands = session.context().commands();
        let use_at = commands
            .iter()
            .position(|c| matches!(c, Command::UseProgram(_)))
            .unwrap();
        let first_upload = commands
            .iter()
            .position(|c| matches!(c, Command::UniformMatrix4 { .. }))
            .unwrap();
        assert!(use_at < first_upload);
    }

    #[test]
    fn missing_context_notifies_once() {
        let mut notices: Vec<String> = Vec::new();
        let result = Session::<RecordingContext>::initialize(
            None,
            &RenderConfig::default(),
            &mut notices,
        );
        assert!(matches!(result, Err(SetupError::ContextUnavailable)));
        assert_eq!(notices.len(), 1);
    }

    #[test]
    fn triangle_draws_once_at_setup() {
        let config = RenderConfig {
            scene: SceneKind::Triangle,
            ..RenderConfig::default()
        };
        let mut session = Session::initialize(
            Some(RecordingContext::new()),
            &config,
            &mut Vec::<String>::new(),
        )
        .unwrap();
        assert!(!session.is_animated());
        assert_eq!(session.context().draw_calls(), 1);

        let mut scheduler =
            crate::render_loop::FixedStepScheduler::new(Duration::from_millis(16), 10);
        session.run(&mut scheduler);
        assert_eq!(session.frames(), 1);

        session.frame(Duration::ZERO);
        assert_eq!(session.context().draw_calls(), 2);
        assert!(session.transform().is_none());
    }
}

#![cfg(not(target_arch = "wasm32"))]

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::RenderConfig;
use crate::context::WgpuContext;
use crate::render_loop::MonotonicClock;
use crate::session::{LogNotifier, Session};

/// The windowing system could not be reached. Callers may fall back to a
/// headless run.
#[derive(Debug)]
pub struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

/// Opens a window and renders the configured scene until it is closed.
pub fn run_window(config: RenderConfig) -> Result<()> {
    // Some platforms panic instead of returning an error without a display.
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;

    let mut app = WindowApp::new(config);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    match app.error {
        Some(err) => Err(err),
        None => {
            if let Some(session) = &app.session {
                info!("Closed after {} frame(s)", session.frames());
            }
            Ok(())
        }
    }
}

struct WindowApp {
    config: RenderConfig,
    window: Option<Arc<Window>>,
    session: Option<Session<WgpuContext>>,
    clock: MonotonicClock,
    error: Option<anyhow::Error>,
}

impl WindowApp {
    fn new(config: RenderConfig) -> Self {
        Self {
            config,
            window: None,
            session: None,
            clock: MonotonicClock::start(),
            error: None,
        }
    }

    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(format!("Spinning {}", self.config.scene))
            .with_inner_size(LogicalSize::new(
                self.config.width as f64,
                self.config.height as f64,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );

        let size = window.inner_size();
        let config = self.config.for_surface(size.width, size.height);
        let ctx = match block_on(WgpuContext::new(
            Arc::clone(&window),
            config.width,
            config.height,
        )) {
            Ok(ctx) => Some(ctx),
            Err(err) => {
                warn!("{err:#}");
                None
            }
        };

        let session = Session::initialize(ctx, &config, &mut LogNotifier)
            .context("failed to set up scene")?;
        self.clock = MonotonicClock::start();
        self.session = Some(session);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }
}

impl ApplicationHandler for WindowApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        if let Err(err) = self.open(event_loop) {
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                session.stop_handle().stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                session
                    .context_mut()
                    .resize_surface(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if session.stop_handle().is_stopped() {
                    return;
                }
                session.frame(self.clock.elapsed());
                if session.is_animated() {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            _ => {}
        }
    }
}

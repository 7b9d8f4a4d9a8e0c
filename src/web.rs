#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use log::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlCanvasElement};

use crate::config::{RenderConfig, SceneKind};
use crate::context::WgpuContext;
use crate::render_loop::StopHandle;
use crate::session::{Notifier, Session};

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Shows fatal setup messages in a browser dialog.
struct AlertNotifier;

impl Notifier for AlertNotifier {
    fn fatal(&mut self, message: &str) {
        web_sys::console::error_1(&JsValue::from_str(message));
        if let Some(window) = window() {
            let _ = window.alert_with_message(message);
        }
    }
}

#[wasm_bindgen]
pub struct WebApp {
    inner: Rc<RefCell<WebState>>,
}

#[wasm_bindgen]
impl WebApp {
    /// Sets up `scene` ("cube" or "triangle") on the canvas with id
    /// `canvas_id`.
    #[wasm_bindgen(constructor)]
    pub async fn new(canvas_id: String, scene: Option<String>) -> Result<WebApp, JsValue> {
        let scene = match scene.as_deref() {
            None | Some("cube") => SceneKind::Cube,
            Some("triangle") => SceneKind::Triangle,
            Some(other) => return Err(JsValue::from_str(&format!("unknown scene: {other}"))),
        };

        let window = window().ok_or_else(|| JsValue::from_str("window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document not available"))?;
        let canvas = document
            .get_element_by_id(&canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas element not found"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("element is not a canvas"))?;

        let config = RenderConfig {
            scene,
            ..RenderConfig::default()
        }
        .for_surface(canvas.width(), canvas.height());
        let ctx = match WgpuContext::new(
            wgpu::SurfaceTarget::Canvas(canvas),
            config.width,
            config.height,
        )
        .await
        {
            Ok(ctx) => Some(ctx),
            Err(err) => {
                warn!("{err:#}");
                None
            }
        };

        let session = Session::initialize(ctx, &config, &mut AlertNotifier)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let stop = session.stop_handle();
        Ok(Self {
            inner: Rc::new(RefCell::new(WebState {
                session,
                stop,
                started_at: None,
                animation_closure: None,
            })),
        })
    }

    pub fn start(&self) -> Result<(), JsValue> {
        schedule_animation_loop(Rc::clone(&self.inner))
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    /// No frame is scheduled after this returns.
    pub fn stop(&self) {
        self.inner.borrow().stop.stop();
    }
}

struct WebState {
    session: Session<WgpuContext>,
    stop: StopHandle,
    started_at: Option<f64>,
    animation_closure: Option<Closure<dyn FnMut()>>,
}

impl WebState {
    fn render_frame(&mut self) -> Result<()> {
        let now = window()
            .and_then(|window| window.performance())
            .ok_or_else(|| anyhow!("performance timer not available"))?
            .now();
        let started_at = *self.started_at.get_or_insert(now);
        let elapsed = std::time::Duration::from_secs_f64(((now - started_at) / 1000.0).max(0.0));
        self.session.frame(elapsed);
        Ok(())
    }
}

fn schedule_animation_loop(app: Rc<RefCell<WebState>>) -> Result<()> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let mut state = app.borrow_mut();
    if state.stop.is_stopped() {
        state.animation_closure = None;
        return Ok(());
    }
    let app_clone = Rc::clone(&app);

    let closure = Closure::wrap(Box::new(move || {
        let animated = {
            let mut state = app_clone.borrow_mut();
            if state.stop.is_stopped() {
                return;
            }
            if let Err(err) = state.render_frame() {
                web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
            }
            state.session.is_animated()
        };
        if animated {
            if let Err(err) = schedule_animation_loop(Rc::clone(&app_clone)) {
                web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
            }
        }
    }) as Box<dyn FnMut()>);

    window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))?;

    state.animation_closure = Some(closure);
    Ok(())
}

use crate::browser;
use anyhow::{anyhow, Result};
// wasm is single threaded, so Rc<RefCell<...>> instead of Mutex
use async_trait::async_trait;
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;
use web_sys::CanvasRenderingContext2d;

/// One scene driven by the persistent animation loop.
/// `initialize` resolves every DOM dependency once; `update`/`draw` run
/// every animation frame with the `performance.now()` timestamp.
#[async_trait(?Send)]
pub trait Stage {
    async fn initialize(&mut self) -> Result<()>;
    fn update(&mut self, now: f64);
    fn draw(&self, renderer: &Renderer);
    /// While true the loop reschedules itself; flipping it false stops
    /// scheduling within one frame.
    fn keep_running(&self) -> bool;
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

pub struct FrameLoop;

impl FrameLoop {
    pub async fn start(mut stage: impl Stage + 'static) -> Result<()> {
        stage.initialize().await?;
        let renderer = Renderer {
            context: browser::context()?,
        };

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            stage.update(perf);
            stage.draw(&renderer);
            if stage.keep_running() {
                let _ = browser::request_animation_frame(f.borrow().as_ref().unwrap());
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("FrameLoop: loop closure is None"))?,
        )?;

        Ok(())
    }
}

/// CSS-pixel size of the drawing surface plus the device pixel ratio the
/// backing store is scaled by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

impl Viewport {
    /// A point expressed as viewport fractions, in CSS pixels.
    pub fn at(&self, fx: f64, fy: f64) -> (f64, f64) {
        (self.width * fx, self.height * fy)
    }
}

/// Resize the canvas backing store to the current viewport, scaled for
/// device pixel density (clamped to at most 2x so retina screens do not
/// quadruple the fill cost).
pub fn resize_canvas() -> Result<Viewport> {
    let window = browser::window()?;
    let dpr = window.device_pixel_ratio().clamp(1.0, 2.0);
    let width = window
        .inner_width()
        .map_err(|err| anyhow!("Cannot read innerWidth : {:#?}", err))?
        .as_f64()
        .unwrap_or(0.0)
        .floor();
    let height = window
        .inner_height()
        .map_err(|err| anyhow!("Cannot read innerHeight : {:#?}", err))?
        .as_f64()
        .unwrap_or(0.0)
        .floor();

    let canvas = browser::canvas()?;
    canvas.set_width((width * dpr) as u32);
    canvas.set_height((height * dpr) as u32);
    canvas
        .style()
        .set_property("width", &format!("{width}px"))
        .ok();
    canvas
        .style()
        .set_property("height", &format!("{height}px"))
        .ok();

    browser::context()?
        .set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)
        .map_err(|err| anyhow!("Cannot set canvas transform : {:#?}", err))?;

    Ok(Viewport { width, height, dpr })
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, viewport: &Viewport) {
        self.context
            .clear_rect(0.0, 0.0, viewport.width, viewport.height);
    }

    /// Soft radial glow behind the particles, brightest above center.
    pub fn vignette(&self, viewport: &Viewport) {
        let (w, h) = (viewport.width, viewport.height);
        if let Ok(gradient) = self.context.create_radial_gradient(
            w * 0.5,
            h * 0.35,
            80.0,
            w * 0.5,
            h * 0.5,
            w.max(h) * 0.65,
        ) {
            gradient.add_color_stop(0.0, "rgba(255,77,141,0.08)").ok();
            gradient.add_color_stop(1.0, "rgba(0,0,0,0)").ok();
            self.context.set_fill_style_canvas_gradient(&gradient);
            self.context.fill_rect(0.0, 0.0, w, h);
        }
    }

    pub fn fill_circle(&self, x: f64, y: f64, radius: f64, color: &str) {
        self.context.begin_path();
        self.context.set_fill_style_str(color);
        self.context.arc(x, y, radius, 0.0, TAU).ok();
        self.context.fill();
    }
}

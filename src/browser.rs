use anyhow::{anyhow, Result};
use futures::channel::oneshot::channel;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

#[rustfmt::skip]
use web_sys::{
    CanvasRenderingContext2d,
    Document,
    Element,
    HtmlAudioElement,
    HtmlCanvasElement,
    HtmlElement,
    Window,
};

macro_rules! log {
    ($($t:tt)*) => {
        web_sys::console::log_1(&format!($($t)*).into())
    }
}

// ==================== Constants ====================
// Every DOM hook the page exposes, in one place.
pub mod ids {
    pub const CANVAS: &str = "fx";
    pub const CONTEXT_2D: &str = "2d";
    pub const START: &str = "start";
    pub const HEADLINE: &str = "headline";
    pub const SUBTITLE: &str = "subtitle";
    pub const LINES: [&str; 3] = ["l1", "l2", "l3"];
    pub const QUESTION: &str = "question";
    pub const RESULT: &str = "result";
    pub const RESULT_TITLE: &str = "resultTitle";
    pub const RESULT_TEXT: &str = "resultText";
    pub const REPLAY: &str = "replay";
    pub const YES: &str = "yes";
    pub const NO: &str = "no";
    pub const MUSIC: &str = "music";
    pub const GALLERY: &str = "imageGallery";
    pub const CARD_SELECTOR: &str = ".card";
    pub const GALLERY_IMAGE_SELECTOR: &str = ".gallery-image";
}

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn body() -> Result<HtmlElement> {
    document()?.body().ok_or_else(|| anyhow!("No Body Found"))
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    element(ids::CANVAS)?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    canvas()?
        .get_context(ids::CONTEXT_2D)
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

pub fn element(id: &str) -> Result<Element> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| anyhow!("No element found with ID : '{:#?}'", id))
}

pub fn html_element(id: &str) -> Result<HtmlElement> {
    element(id)?
        .dyn_into::<HtmlElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlElement", element))
}

pub fn audio_element(id: &str) -> Result<HtmlAudioElement> {
    element(id)?
        .dyn_into::<HtmlAudioElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlAudioElement", element))
}

/// Create a `<div>` attached to `<body>`, carrying a class marker so a
/// page-level sweep can always find it.
pub fn create_marked_div(class_name: &str) -> Result<HtmlElement> {
    let div = document()?
        .create_element("div")
        .map_err(|err| anyhow!("Could not create div : {:#?}", err))?
        .dyn_into::<HtmlElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlElement", element))?;
    div.set_class_name(class_name);
    body()?
        .append_child(&div)
        .map_err(|err| anyhow!("Could not append div : {:#?}", err))?;
    Ok(div)
}

pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

// ==================== Frame scheduling ====================

pub type LoopClosure = Closure<dyn FnMut(f64)>;

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    Closure::wrap(Box::new(f) as Box<dyn FnMut(f64)>)
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Cooperative sleep backed by `setTimeout`, in the same
/// channel-around-callback shape as asset loading callbacks.
pub async fn sleep(ms: f64) -> Result<()> {
    let (tx, rx) = channel::<()>();
    let tx = Rc::new(RefCell::new(Some(tx)));
    let callback: Closure<dyn FnMut()> = Closure::once(move || {
        if let Some(tx) = tx.borrow_mut().take() {
            let _ = tx.send(());
        }
    });

    window()?
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            // round up so the timer never wakes before the requested delay
            ms.ceil() as i32,
        )
        .map_err(|err| anyhow!("Cannot set timeout : {:#?}", err))?;
    // keep callback alive until the timer fires
    callback.forget();

    rx.await
        .map_err(|_| anyhow!("Timeout callback dropped without firing"))?;
    Ok(())
}

// ==================== Repeating timers ====================

/// Owning handle for a `setInterval` timer. The browser-side timer is
/// cleared when the handle drops, so a handle field going `None` is the
/// whole stop story.
pub struct IntervalHandle {
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

impl IntervalHandle {
    pub fn new(ms: i32, f: impl FnMut() + 'static) -> Result<Self> {
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut()>);
        let id = window()?
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                ms,
            )
            .map_err(|err| anyhow!("Cannot set interval : {:#?}", err))?;
        Ok(IntervalHandle {
            id,
            _closure: closure,
        })
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    // The macro must expand without a trailing semicolon so it is legal
    // in expression position (match arms in the error paths use it that
    // way). Compile-time check; the guard keeps it from ever logging.
    #[test]
    fn log_macro_works_in_expression_position() {
        let emit = false;
        if emit {
            match emit {
                true => log!("never printed {}", 1),
                false => log!("never printed"),
            }
        }
    }
}

#[macro_use]
pub mod browser;
pub mod audio;
pub mod choice;
pub mod engine;
pub mod gallery;
pub mod motion;
pub mod particles;
pub mod scene;
pub mod sprites;
pub mod timeline;

use anyhow::{anyhow, Result};
use browser::ids;
use engine::FrameLoop;
use scene::{Scene, SceneHandle, SequenceOptions};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, MouseEvent};

/// Page entry point. `options` is an optional plain object from the
/// embedding script, e.g. `{ fast: true }`.
#[wasm_bindgen]
pub fn main_js(options: JsValue) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let options: SequenceOptions = if options.is_undefined() || options.is_null() {
        SequenceOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|err| JsValue::from_str(&format!("Invalid options object : {err}")))?
    };

    let handle = SceneHandle::new(Scene::new(options));
    wire_listeners(&handle).map_err(|err| JsValue::from_str(&format!("{err:#}")))?;

    browser::spawn_local(async move {
        if let Err(err) = FrameLoop::start(handle).await {
            log!("Frame loop failed to start : {err:#?}");
        }
    });
    Ok(())
}

fn on_event(target: &Element, event: &str, f: impl FnMut() + 'static) -> Result<()> {
    let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut()>);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot attach {} listener : {:#?}", event, err))?;
    closure.forget();
    Ok(())
}

fn wire_listeners(handle: &SceneHandle) -> Result<()> {
    let start = browser::element(ids::START)?;
    let h = handle.clone();
    on_event(&start, "click", move || scene::start(h.clone()))?;

    let yes = browser::element(ids::YES)?;
    let h = handle.clone();
    on_event(&yes, "click", move || scene::choose_yes(h.clone()))?;

    // the "no" control flees from hover and touch, and resolves kindly
    // when actually clicked
    let no = browser::element(ids::NO)?;
    let h = handle.clone();
    on_event(&no, "mouseenter", move || scene::dodge_no(h.clone()))?;

    // touchstart must stay non-passive and consume the tap, otherwise
    // the same tap synthesizes a click that resolves the choice
    let h = handle.clone();
    let touch = Closure::wrap(Box::new(move |event: web_sys::Event| {
        event.prevent_default();
        scene::dodge_no(h.clone());
    }) as Box<dyn FnMut(web_sys::Event)>);
    let touch_options = web_sys::AddEventListenerOptions::new();
    touch_options.set_passive(false);
    no.add_event_listener_with_callback_and_add_event_listener_options(
        "touchstart",
        touch.as_ref().unchecked_ref(),
        &touch_options,
    )
    .map_err(|err| anyhow!("Cannot attach touchstart listener : {:#?}", err))?;
    touch.forget();

    let h = handle.clone();
    on_event(&no, "click", move || scene::choose_no(h.clone()))?;

    let replay = browser::element(ids::REPLAY)?;
    let h = handle.clone();
    on_event(&replay, "click", move || scene::replay(&h))?;

    let h = handle.clone();
    let pointer = Closure::wrap(Box::new(move |event: MouseEvent| {
        scene::pointer_burst(&h, event.client_x() as f64, event.client_y() as f64);
    }) as Box<dyn FnMut(MouseEvent)>);
    browser::document()?
        .add_event_listener_with_callback("pointerdown", pointer.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot attach pointerdown listener : {:#?}", err))?;
    pointer.forget();

    let h = handle.clone();
    let resize = Closure::wrap(Box::new(move || scene::handle_resize(&h)) as Box<dyn FnMut()>);
    browser::window()?
        .add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot attach resize listener : {:#?}", err))?;
    resize.forget();

    Ok(())
}

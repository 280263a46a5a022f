//! The page session: one `Scene` owns every piece of mutable state (the
//! particle field, the sprite registry, the gallery, the interval
//! handles, the audio ramp) and the frame loop drives it through the
//! `Stage` trait. Reset is a single call here, not clearing scattered
//! across handlers.

use crate::audio::{self, Music};
use crate::browser::{self, ids, IntervalHandle};
use crate::choice::{self, PhaseEvent, RectPx, ScenePhase};
use crate::engine::{self, Renderer, Stage, Viewport};
use crate::gallery::{self, Gallery};
use crate::motion::Rng;
use crate::particles::ParticleField;
use crate::sprites::SpriteRegistry;
use crate::timeline::{self, Scheduler, StepAction};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

/// Options accepted from the embedding page. `fast` skips the
/// type-writer and fade timing (reduced motion / skip scenarios).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct SequenceOptions {
    pub fast: bool,
}

pub struct Scene {
    options: SequenceOptions,
    running: bool,
    /// Bumped by every reset; in-flight async tasks compare against it
    /// and bail out, which cancels the whole narrative as a unit.
    generation: u64,
    phase: ScenePhase,
    rng: Rng,
    particles: ParticleField,
    sprites: SpriteRegistry,
    gallery: Gallery,
    music: Music,
    viewport: Viewport,
    last_tick: f64,
    gallery_frame: Option<HtmlElement>,
    slideshow: Option<IntervalHandle>,
    ambient_hearts: Option<IntervalHandle>,
    ambient_petals: Option<IntervalHandle>,
    drifters: Option<IntervalHandle>,
}

impl Scene {
    pub fn new(options: SequenceOptions) -> Self {
        Scene {
            options,
            running: true,
            generation: 0,
            phase: ScenePhase::Idle,
            rng: Rng::new(),
            particles: ParticleField::new(),
            sprites: SpriteRegistry::new(),
            gallery: Gallery::new(gallery::image_count()),
            music: Music::locate(),
            viewport: Viewport {
                width: 0.0,
                height: 0.0,
                dpr: 1.0,
            },
            last_tick: 0.0,
            gallery_frame: None,
            slideshow: None,
            ambient_hearts: None,
            ambient_petals: None,
            drifters: None,
        }
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    fn burst(&mut self, x: f64, y: f64, count: usize) {
        self.particles
            .burst(&mut self.rng, x, y, count, self.last_tick);
    }

    fn burst_at_fraction(&mut self, fx: f64, fy: f64, count: usize) {
        let (x, y) = self.viewport.at(fx, fy);
        self.burst(x, y, count);
    }

    fn spawn_heart(&mut self, x: f64, y: f64) {
        let now = self.last_tick;
        self.sprites.spawn_heart(&mut self.rng, x, y, now).ok();
    }

    fn spawn_petal(&mut self, x: f64, y: f64) {
        let now = self.last_tick;
        self.sprites.spawn_petal(&mut self.rng, x, y, now).ok();
    }

    /// Ring of DOM hearts around a center, radius sampled per heart.
    fn heart_ring(&mut self, cx: f64, cy: f64, count: usize, r_min: f64, r_max: f64) {
        for i in 0..count {
            let angle = TAU * i as f64 / count as f64;
            let radius = self.rng.uniform(r_min, r_max);
            self.spawn_heart(cx + angle.cos() * radius, cy + angle.sin() * radius);
        }
    }

    /// Restore the page to its pre-start state. Idempotent and safe to
    /// call before any sequence has run.
    pub fn reset(&mut self) -> Result<()> {
        self.generation += 1;
        self.phase = self.phase.transition(PhaseEvent::Reset);

        for id in ids::LINES {
            if let Ok(line) = browser::element(id) {
                line.set_text_content(Some(""));
            }
        }
        if let Ok(question) = browser::html_element(ids::QUESTION) {
            question.set_hidden(true);
            set_styles(
                &question,
                &[("opacity", "1"), ("transform", "translateY(0)")],
            );
        }
        if let Ok(result) = browser::html_element(ids::RESULT) {
            result.set_hidden(true);
        }
        if let Ok(headline) = browser::element(ids::HEADLINE) {
            headline.set_text_content(Some("Hey love..."));
        }
        if let Ok(subtitle) = browser::html_element(ids::SUBTITLE) {
            subtitle.set_text_content(Some(""));
            set_styles(
                &subtitle,
                &[("opacity", "0"), ("transform", "translateY(10px)")],
            );
        }
        if let Ok(start) = browser::html_element(ids::START) {
            start.remove_attribute("disabled").ok();
            start.style().remove_property("display").ok();
        }
        if let Ok(Some(card)) = card_element() {
            card.class_list().remove_1("question-focus").ok();
        }
        if let Ok(body) = browser::body() {
            body.class_list().remove_1("romantic-focus").ok();
        }
        if let Ok(title) = browser::html_element(ids::RESULT_TITLE) {
            title.class_list().remove_1("heartbeat-reveal").ok();
            set_styles(&title, &[("opacity", "1"), ("transform", "scale(1)")]);
        }
        if let Ok(text) = browser::html_element(ids::RESULT_TEXT) {
            text.class_list().remove_1("love-reveal").ok();
            set_styles(&text, &[("opacity", "1"), ("transform", "scale(1)")]);
        }
        if let Ok(no) = browser::html_element(ids::NO) {
            for prop in ["position", "left", "top", "transform", "transition"] {
                no.style().remove_property(prop).ok();
            }
        }

        self.particles.clear();
        if let Ok(context) = browser::context() {
            context.clear_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
        }
        self.sprites.clear();

        self.slideshow = None;
        self.ambient_hearts = None;
        self.ambient_petals = None;
        if let Ok(panel) = gallery::panel() {
            panel.style().set_property("display", "none").ok();
        }
        gallery::set_active_image(usize::MAX).ok();
        self.gallery.reset();

        self.music.reset();
        Ok(())
    }
}

/// Shared handle the frame loop, event listeners and async tasks all
/// hold. wasm is single threaded, so `Rc<RefCell>` instead of a mutex;
/// borrows are kept short and never held across an await.
#[derive(Clone)]
pub struct SceneHandle(Rc<RefCell<Scene>>);

impl SceneHandle {
    pub fn new(scene: Scene) -> Self {
        SceneHandle(Rc::new(RefCell::new(scene)))
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.0.borrow().generation != generation
    }
}

#[async_trait(?Send)]
impl Stage for SceneHandle {
    async fn initialize(&mut self) -> Result<()> {
        let viewport = engine::resize_canvas()?;
        let frame = browser::document()?
            .query_selector(".gallery-frame")
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());

        let handle = self.clone();
        let drifters = IntervalHandle::new(3000, move || {
            handle.with(|scene| {
                // ambient drifters pause while the question is up
                if !scene.running || scene.phase == ScenePhase::AwaitingChoice {
                    return;
                }
                let x = scene.rng.uniform(0.0, scene.viewport.width);
                let y = scene.viewport.height + 20.0;
                let now = scene.last_tick;
                scene.sprites.spawn_drifter(&mut scene.rng, x, y, now).ok();
            });
        })?;

        // RAF timestamps share the page time origin, so births must use
        // the current clock or the bloom spawns pre-aged
        let now = browser::now()?;
        self.with(|scene| {
            scene.viewport = viewport;
            scene.gallery_frame = frame;
            scene.drifters = Some(drifters);
            scene.last_tick = now;
            // small idle bloom before anyone presses start
            scene.burst_at_fraction(0.5, 0.55, 70);
        });
        Ok(())
    }

    fn update(&mut self, now: f64) {
        let scene = &mut *self.0.borrow_mut();
        scene.last_tick = now;
        scene.particles.step(now);
        scene.sprites.step(&mut scene.rng, now);
        scene.music.step(now);

        if scene.gallery.visible {
            let (dx, dy) = scene.gallery.tick_float();
            if let Some(frame) = &scene.gallery_frame {
                frame
                    .style()
                    .set_property("transform", &format!("translate({dx}px, {dy}px)"))
                    .ok();
            }
        }

        // the ambient petal shower outlives the celebration only until
        // the result panel goes away
        if scene.ambient_petals.is_some() && scene.phase != ScenePhase::ResolvedYes {
            scene.ambient_petals = None;
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let scene = self.0.borrow();
        renderer.clear(&scene.viewport);
        renderer.vignette(&scene.viewport);
        scene.particles.draw(renderer, scene.last_tick);
    }

    fn keep_running(&self) -> bool {
        self.0.borrow().running
    }
}

fn set_styles(el: &HtmlElement, pairs: &[(&str, &str)]) {
    for (prop, value) in pairs {
        el.style().set_property(prop, value).ok();
    }
}

fn card_element() -> Result<Option<Element>> {
    Ok(browser::document()?
        .query_selector(ids::CARD_SELECTOR)
        .ok()
        .flatten())
}

fn rect_px(el: &Element) -> RectPx {
    let rect = el.get_bounding_client_rect();
    RectPx {
        left: rect.left(),
        top: rect.top(),
        width: rect.width(),
        height: rect.height(),
    }
}

// ==================== Sequence start ====================

/// Kick off the scripted narrative. No-op unless the scene is idle.
pub fn start(handle: SceneHandle) {
    let started = handle.with(|scene| {
        if scene.phase != ScenePhase::Idle {
            return None;
        }
        scene.phase = scene.phase.transition(PhaseEvent::Start);
        scene.running = true;
        Some((scene.generation, scene.options.fast))
    });
    let Some((generation, fast)) = started else {
        return;
    };

    if let Ok(start_btn) = browser::element(ids::START) {
        start_btn.set_attribute("disabled", "").ok();
    }

    start_music(handle.clone(), generation);
    if let Err(err) = start_gallery(handle.clone(), generation) {
        log!("Gallery failed to start: {err:#?}");
    }

    let narrative = handle.clone();
    browser::spawn_local(async move {
        if let Err(err) = run_narrative(narrative, generation, fast).await {
            log!("Narrative sequence failed: {err:#?}");
        }
    });
}

fn start_music(handle: SceneHandle, generation: u64) {
    let Some(element) = handle.with(|scene| scene.music.element()) else {
        return;
    };
    browser::spawn_local(async move {
        match audio::play(element).await {
            Ok(()) => {
                if handle.is_stale(generation) {
                    return;
                }
                if let Ok(now) = browser::now() {
                    handle.with(|scene| scene.music.mark_started(now));
                }
            }
            // autoplay policy: keep going without sound
            Err(err) => log!("Audio play failed: {err:#?}"),
        }
    });
}

async fn run_narrative(handle: SceneHandle, generation: u64, fast: bool) -> Result<()> {
    let mut scheduler = Scheduler::new(timeline::script().to_vec(), browser::now()?);

    if fast {
        for action in scheduler.fire_due(f64::MAX) {
            apply_action(&handle, generation, action, true).await?;
        }
        return Ok(());
    }

    loop {
        let now = browser::now()?;
        let Some(wait) = scheduler.time_to_next(now) else {
            break;
        };
        if wait > 0.0 {
            browser::sleep(wait).await?;
        }
        if handle.is_stale(generation) {
            return Ok(());
        }
        let fired = scheduler.fire_due(browser::now()?);
        // an early timer wake fires nothing; rebasing then would restart
        // the pending delay from scratch
        if fired.is_empty() {
            continue;
        }
        for action in fired {
            apply_action(&handle, generation, action, false).await?;
            if handle.is_stale(generation) {
                return Ok(());
            }
        }
        scheduler.rebase(browser::now()?);
    }
    Ok(())
}

async fn apply_action(
    handle: &SceneHandle,
    generation: u64,
    action: StepAction,
    fast: bool,
) -> Result<()> {
    match action {
        StepAction::Headline(text) => fade_in_line(ids::HEADLINE, text, fast).await,
        StepAction::Subtitle(text) => fade_in_line(ids::SUBTITLE, text, fast).await,
        StepAction::TypeLine { slot, text } => {
            type_line(handle, generation, slot, text, fast).await
        }
        StepAction::Burst { fx, fy, count } => {
            handle.with(|scene| scene.burst_at_fraction(fx, fy, count));
            Ok(())
        }
        StepAction::FocusCard => {
            if let Some(card) = card_element()? {
                card.class_list().add_1("question-focus").ok();
            }
            Ok(())
        }
        StepAction::ShowQuestion => show_question(handle, fast).await,
    }
}

/// Set the text, then fade it up from a slight downward offset.
async fn fade_in_line(id: &str, text: &str, fast: bool) -> Result<()> {
    let el = browser::html_element(id)?;
    el.set_text_content(Some(text));
    if fast {
        set_styles(&el, &[("opacity", "1"), ("transform", "translateY(0)")]);
        return Ok(());
    }
    set_styles(
        &el,
        &[
            ("opacity", "0"),
            ("transform", "translateY(10px)"),
            ("transition", "opacity 1.2s ease-out, transform 1.2s ease-out"),
        ],
    );
    // give the style a frame to land before transitioning
    browser::sleep(16.0).await?;
    set_styles(&el, &[("opacity", "1"), ("transform", "translateY(0)")]);
    Ok(())
}

/// Append one character at a time with a jittered delay.
async fn type_line(
    handle: &SceneHandle,
    generation: u64,
    slot: usize,
    text: &str,
    fast: bool,
) -> Result<()> {
    let el = browser::html_element(ids::LINES[slot])?;
    if fast {
        el.set_text_content(Some(text));
        return Ok(());
    }

    el.class_list().add_1("typing").ok();
    el.set_text_content(Some(""));
    let mut shown = String::with_capacity(text.len());
    for ch in text.chars() {
        if handle.is_stale(generation) {
            break;
        }
        shown.push(ch);
        el.set_text_content(Some(&shown));
        let delay = handle.with(|scene| timeline::type_delay(&mut scene.rng, timeline::TYPE_SPEED_MS));
        browser::sleep(delay).await?;
    }
    el.class_list().remove_1("typing").ok();
    Ok(())
}

async fn show_question(handle: &SceneHandle, fast: bool) -> Result<()> {
    let question = browser::html_element(ids::QUESTION)?;
    question.set_hidden(false);
    if let Ok(start_btn) = browser::html_element(ids::START) {
        start_btn.style().set_property("display", "none").ok();
    }

    if fast {
        set_styles(
            &question,
            &[("opacity", "1"), ("transform", "translateY(0)")],
        );
    } else {
        set_styles(
            &question,
            &[("opacity", "0"), ("transform", "translateY(20px)")],
        );
        browser::sleep(16.0).await?;
        set_styles(
            &question,
            &[
                ("transition", "opacity 1.5s ease-out, transform 1.5s ease-out"),
                ("opacity", "1"),
                ("transform", "translateY(0)"),
            ],
        );
    }

    handle.with(|scene| {
        scene.phase = scene.phase.transition(PhaseEvent::QuestionShown);
        // a little bloom under the card
        scene.burst_at_fraction(0.5, 0.68, 130);
    });
    Ok(())
}

// ==================== Gallery flow ====================

fn start_gallery(handle: SceneHandle, generation: u64) -> Result<()> {
    let panel = gallery::panel()?;
    set_styles(&panel, &[("opacity", "0"), ("display", "block")]);

    let rect = rect_px(&panel);
    let (panel_w, panel_h) = (
        if rect.width > 0.0 { rect.width } else { 400.0 },
        if rect.height > 0.0 { rect.height } else { 500.0 },
    );

    handle.with(|scene| {
        let placement = gallery::random_placement(
            &mut scene.rng,
            scene.viewport.width,
            scene.viewport.height,
            panel_w,
            panel_h,
        );
        gallery::apply_placement(&panel, &placement);
        scene.gallery.visible = true;
    });
    gallery::set_active_image(0).ok();

    // entrance fade
    {
        let panel = panel.clone();
        browser::spawn_local(async move {
            if browser::sleep(16.0).await.is_ok() {
                set_styles(
                    &panel,
                    &[
                        (
                            "transition",
                            "opacity 1.5s ease-in-out, transform 1.5s cubic-bezier(0.4, 0, 0.2, 1)",
                        ),
                        ("opacity", "1"),
                    ],
                );
            }
        });
    }

    // opening burst once the panel has settled
    {
        let handle = handle.clone();
        let panel = panel.clone();
        browser::spawn_local(async move {
            if browser::sleep(800.0).await.is_err() || handle.is_stale(generation) {
                return;
            }
            let (cx, cy) = rect_px(&panel).center();
            handle.with(|scene| {
                scene.burst(cx, cy, 200);
                scene.heart_ring(cx, cy, 15, 120.0, 200.0);
            });
        });
    }

    let slideshow = {
        let handle = handle.clone();
        IntervalHandle::new(4500, move || {
            advance_slideshow(&handle, generation);
        })?
    };

    let ambient_hearts = {
        let handle = handle.clone();
        let panel = panel.clone();
        IntervalHandle::new(2000, move || {
            handle.with(|scene| {
                if !scene.running || scene.phase != ScenePhase::AwaitingChoice {
                    return;
                }
                let rect = rect_px(&panel);
                let x = rect.left + scene.rng.uniform(0.0, rect.width);
                let y = rect.top + scene.rng.uniform(0.0, rect.height);
                scene.spawn_heart(x, y);
            });
        })?
    };

    handle.with(|scene| {
        scene.slideshow = Some(slideshow);
        scene.ambient_hearts = Some(ambient_hearts);
    });
    Ok(())
}

fn advance_slideshow(handle: &SceneHandle, generation: u64) {
    let Ok(panel) = gallery::panel() else {
        return;
    };
    let index = handle.with(|scene| scene.gallery.advance());
    gallery::set_active_image(index).ok();

    panel
        .style()
        .set_property("transition", "all 1.2s cubic-bezier(0.4, 0, 0.2, 1)")
        .ok();
    let rect = rect_px(&panel);
    handle.with(|scene| {
        let placement = gallery::random_placement(
            &mut scene.rng,
            scene.viewport.width,
            scene.viewport.height,
            rect.width.max(1.0),
            rect.height.max(1.0),
        );
        gallery::apply_placement(&panel, &placement);
    });

    // celebrate at the panel's new center once it has begun moving
    let handle = handle.clone();
    browser::spawn_local(async move {
        if browser::sleep(100.0).await.is_err() || handle.is_stale(generation) {
            return;
        }
        let Ok(panel) = gallery::panel() else {
            return;
        };
        let (cx, cy) = rect_px(&panel).center();
        handle.with(|scene| {
            scene.heart_ring(cx, cy, 12, 100.0, 180.0);
            scene.burst(cx, cy, 150);
        });

        if browser::sleep(500.0).await.is_err() || handle.is_stale(generation) {
            return;
        }
        handle.with(|scene| {
            for _ in 0..5 {
                let x = cx + scene.rng.uniform(-120.0, 120.0);
                let y = cy + scene.rng.uniform(-120.0, 120.0);
                scene.spawn_heart(x, y);
            }
        });
    });
}

// ==================== Choice handlers ====================

/// Affirmative ending: hide the question, focus the page, then reveal
/// the result in two beats with a celebratory bloom.
pub fn choose_yes(handle: SceneHandle) {
    let generation = handle.with(|scene| {
        if scene.phase != ScenePhase::AwaitingChoice {
            return None;
        }
        scene.phase = scene.phase.transition(PhaseEvent::ChooseYes);
        Some(scene.generation)
    });
    let Some(generation) = generation else {
        return;
    };

    if let Ok(yes_btn) = browser::element(ids::YES) {
        let (cx, cy) = rect_px(&yes_btn).center();
        handle.with(|scene| {
            scene.burst(cx, cy, 100);
            for _ in 0..8 {
                let x = cx + scene.rng.uniform(-30.0, 30.0);
                let y = cy + scene.rng.uniform(-30.0, 30.0);
                scene.spawn_heart(x, y);
            }
        });
    }

    if let Ok(question) = browser::html_element(ids::QUESTION) {
        question.set_hidden(true);
    }
    if let Ok(body) = browser::body() {
        body.class_list().add_1("romantic-focus").ok();
    }

    browser::spawn_local(async move {
        if let Err(err) = reveal_result(handle, generation).await {
            log!("Result reveal failed: {err:#?}");
        }
    });
}

async fn reveal_result(handle: SceneHandle, generation: u64) -> Result<()> {
    // cinematic pause before the reveal
    browser::sleep(800.0).await?;
    if handle.is_stale(generation) {
        return Ok(());
    }

    let result = browser::html_element(ids::RESULT)?;
    result.set_hidden(false);

    let title = browser::html_element(ids::RESULT_TITLE)?;
    title.set_text_content(Some(
        "Yay 🥹💘 you just made my heart smile, like you always do ❤️",
    ));
    let text = browser::html_element(ids::RESULT_TEXT)?;
    text.set_text_content(Some("I LOVE YOU TO THE MOON AND BACK"));
    text.class_list().remove_1("love-reveal").ok();
    set_styles(&text, &[("opacity", "0"), ("transform", "scale(0.9)")]);

    title.class_list().add_1("heartbeat-reveal").ok();
    set_styles(&title, &[("opacity", "0"), ("transform", "scale(0.8)")]);
    browser::sleep(16.0).await?;
    set_styles(
        &title,
        &[
            (
                "transition",
                "opacity 0.6s ease-out, transform 0.6s cubic-bezier(0.34, 1.56, 0.64, 1)",
            ),
            ("opacity", "1"),
            ("transform", "scale(1)"),
        ],
    );

    // the emphasis line follows the title
    browser::sleep(900.0).await?;
    if handle.is_stale(generation) {
        return Ok(());
    }

    text.class_list().add_1("love-reveal").ok();
    set_styles(
        &text,
        &[
            ("transition", "opacity 1.2s ease-out, transform 1.2s ease-out"),
            ("opacity", "1"),
            ("transform", "scale(1)"),
        ],
    );

    let card_rect = card_element()?
        .map(|card| rect_px(&card))
        .unwrap_or(RectPx {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
        });
    let (cx, cy) = card_rect.center();
    handle.with(|scene| {
        scene.burst(cx, cy, 280);
        scene.heart_ring(cx, cy, 20, 100.0, 200.0);
    });

    petal_waves(handle.clone(), generation, card_rect);

    // recurring low-rate petal shower while the result stays visible
    let ambient = {
        let handle = handle.clone();
        IntervalHandle::new(300, move || {
            handle.with(|scene| {
                if scene.phase != ScenePhase::ResolvedYes {
                    return;
                }
                let x = scene.rng.uniform(0.0, scene.viewport.width);
                scene.spawn_petal(x, -30.0);
            });
        })?
    };
    handle.with(|scene| scene.ambient_petals = Some(ambient));
    Ok(())
}

/// Three staggered waves: from above the panel, from the side edges,
/// then a broad shower across the whole viewport width.
fn petal_waves(handle: SceneHandle, generation: u64, card: RectPx) {
    let (center_x, _) = card.center();
    let top_y = card.top;

    {
        let handle = handle.clone();
        browser::spawn_local(async move {
            for _ in 0..25 {
                if handle.is_stale(generation) {
                    return;
                }
                handle.with(|scene| {
                    let x = center_x + scene.rng.uniform(-200.0, 200.0);
                    scene.spawn_petal(x, top_y - 50.0);
                });
                if browser::sleep(80.0).await.is_err() {
                    return;
                }
            }
        });
    }

    {
        let handle = handle.clone();
        browser::spawn_local(async move {
            if browser::sleep(500.0).await.is_err() {
                return;
            }
            for _ in 0..20 {
                if handle.is_stale(generation) {
                    return;
                }
                handle.with(|scene| {
                    let from_left = scene.rng.uniform(0.0, 1.0) > 0.5;
                    let x = if from_left {
                        card.left - 50.0 + scene.rng.uniform(-30.0, 30.0)
                    } else {
                        card.left + card.width + 50.0 + scene.rng.uniform(-30.0, 30.0)
                    };
                    let y = top_y + scene.rng.uniform(0.0, card.height);
                    scene.spawn_petal(x, y);
                });
                if browser::sleep(100.0).await.is_err() {
                    return;
                }
            }
        });
    }

    browser::spawn_local(async move {
        if browser::sleep(1500.0).await.is_err() {
            return;
        }
        for _ in 0..30 {
            if handle.is_stale(generation) {
                return;
            }
            handle.with(|scene| {
                let x = scene.rng.uniform(0.0, scene.viewport.width);
                scene.spawn_petal(x, -50.0);
            });
            if browser::sleep(120.0).await.is_err() {
                return;
            }
        }
    });
}

/// Negative ending, click variant: resolve kindly, no penalty.
pub fn choose_no(handle: SceneHandle) {
    let resolved = handle.with(|scene| {
        if scene.phase != ScenePhase::AwaitingChoice {
            return false;
        }
        scene.phase = scene.phase.transition(PhaseEvent::ChooseNo);
        true
    });
    if !resolved {
        return;
    }

    if let Ok(question) = browser::html_element(ids::QUESTION) {
        question.set_hidden(true);
    }
    if let Ok(result) = browser::html_element(ids::RESULT) {
        result.set_hidden(false);
    }
    if let Ok(title) = browser::element(ids::RESULT_TITLE) {
        title.set_text_content(Some("That's okay 💗"));
    }
    if let Ok(text) = browser::element(ids::RESULT_TEXT) {
        text.set_text_content(Some(
            "Thank you for being honest. You still mean the world to me, \
             and I'm grateful for you.",
        ));
    }
    handle.with(|scene| scene.burst_at_fraction(0.5, 0.4, 120));
}

/// Negative path, proximity variant: relocate the control inside the
/// card with a playful flourish and hearts at both locations.
pub fn dodge_no(handle: SceneHandle) {
    let awaiting = handle.with(|scene| scene.phase == ScenePhase::AwaitingChoice);
    if !awaiting {
        return;
    }
    let Ok(no_btn) = browser::html_element(ids::NO) else {
        return;
    };
    let Ok(Some(card)) = card_element() else {
        return;
    };

    let panel = rect_px(&card);
    let control = rect_px(no_btn.as_ref());
    let generation = handle.with(|scene| scene.generation);

    let ((new_x, new_y), (rot, scale)) = handle.with(|scene| {
        (
            choice::dodge_position(&mut scene.rng, &panel, &control),
            choice::dodge_flourish(&mut scene.rng),
        )
    });

    set_styles(
        &no_btn,
        &[
            ("transition", "all 0.4s cubic-bezier(0.34, 1.56, 0.64, 1)"),
            ("position", "fixed"),
            ("left", &format!("{new_x}px")),
            ("top", &format!("{new_y}px")),
            ("transform", &format!("rotate({rot}deg) scale({scale})")),
        ],
    );

    // settle back to neutral after the hop
    {
        let no_btn = no_btn.clone();
        browser::spawn_local(async move {
            if browser::sleep(400.0).await.is_ok() {
                set_styles(
                    &no_btn,
                    &[
                        ("transition", "all 0.3s ease-out"),
                        ("transform", "rotate(0deg) scale(1)"),
                    ],
                );
            }
        });
    }

    let (old_cx, old_cy) = control.center();
    handle.with(|scene| {
        scene.spawn_heart(old_cx, old_cy);
        scene.burst(old_cx, old_cy, 30);
    });

    let new_cx = new_x + control.width * 0.5;
    let new_cy = new_y + control.height * 0.5;
    browser::spawn_local(async move {
        if browser::sleep(200.0).await.is_err() || handle.is_stale(generation) {
            return;
        }
        handle.with(|scene| {
            scene.spawn_heart(new_cx, new_cy);
            scene.burst(new_cx, new_cy, 40);
        });
    });
}

/// Tap-anywhere sparkles while the sequence is live and unresolved.
pub fn pointer_burst(handle: &SceneHandle, x: f64, y: f64) {
    handle.with(|scene| {
        if !scene.running || scene.phase.is_resolved() {
            return;
        }
        for _ in 0..6 {
            let hx = x + scene.rng.uniform(-14.0, 14.0);
            let hy = y + scene.rng.uniform(-14.0, 14.0);
            scene.spawn_heart(hx, hy);
        }
        scene.burst(x, y, 60);
    });
}

/// Viewport change: rescale the canvas and remember the new metrics.
pub fn handle_resize(handle: &SceneHandle) {
    match engine::resize_canvas() {
        Ok(viewport) => handle.with(|scene| scene.viewport = viewport),
        Err(err) => log!("Resize failed: {err:#?}"),
    }
}

/// Replay: full teardown back to the initial state.
pub fn replay(handle: &SceneHandle) {
    if let Err(err) = handle.with(|scene| scene.reset()) {
        log!("Reset failed: {err:#?}");
    }
}

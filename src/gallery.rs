//! Image gallery sub-flow: a floating panel that hops between a handful
//! of screen slots while a slideshow cycles its images. Placement and
//! float math are pure; only the thin appliers below touch the DOM.

use crate::browser;
use crate::motion::Rng;
use anyhow::Result;
use std::fmt;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

/// Below this viewport width the panel sits in a bottom band instead of
/// the anchored desktop slots.
pub const MOBILE_BREAKPOINT: f64 = 968.0;
/// Phase advance per frame for the continuous float.
pub const FLOAT_STEP: f64 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CssLen {
    Px(f64),
    Percent(f64),
}

impl fmt::Display for CssLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssLen::Px(v) => write!(f, "{v}px"),
            CssLen::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// One resolved panel position: exactly one horizontal and one vertical
/// anchor are set; the rest stay `auto`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: Option<CssLen>,
    pub right: Option<CssLen>,
    pub top: Option<CssLen>,
    pub bottom: Option<CssLen>,
    pub transform: &'static str,
}

/// Sample a fresh slot for the panel. Desktop picks one of five anchored
/// corner/side placements; mobile picks a random horizontal position in
/// the lower band of the screen.
pub fn random_placement(
    rng: &mut Rng,
    viewport_w: f64,
    viewport_h: f64,
    panel_w: f64,
    panel_h: f64,
) -> Placement {
    if viewport_w <= MOBILE_BREAKPOINT {
        let max_x = (viewport_w - panel_w - 20.0).max(20.0);
        let x = rng.uniform(20.0, max_x.max(20.0 + f64::EPSILON));
        let y = rng.uniform(viewport_h * 0.55, viewport_h * 0.85);
        return Placement {
            left: Some(CssLen::Px(x)),
            right: None,
            top: None,
            bottom: Some(CssLen::Px(viewport_h - y - panel_h)),
            transform: "translateX(0) translateY(0) scale(1)",
        };
    }

    let slot = rng.index(5);
    let (left, right, top, bottom) = match slot {
        0 => (None, Some(rng.uniform(2.0, 8.0)), Some(rng.uniform(10.0, 30.0)), None),
        1 => (None, Some(rng.uniform(2.0, 8.0)), Some(rng.uniform(40.0, 60.0)), None),
        2 => (None, Some(rng.uniform(2.0, 8.0)), None, Some(rng.uniform(5.0, 15.0))),
        3 => (Some(rng.uniform(2.0, 8.0)), None, Some(rng.uniform(15.0, 35.0)), None),
        _ => (Some(rng.uniform(2.0, 8.0)), None, None, Some(rng.uniform(5.0, 20.0))),
    };
    Placement {
        left: left.map(CssLen::Percent),
        right: right.map(CssLen::Percent),
        top: top.map(CssLen::Percent),
        bottom: bottom.map(CssLen::Percent),
        transform: if top.is_some() {
            "translateY(-50%) scale(1)"
        } else {
            "translateY(0) scale(1)"
        },
    }
}

/// Continuous gentle drift, two phase-shifted sine waves.
pub fn float_offset(phase: f64) -> (f64, f64) {
    ((phase * 0.7).cos() * 5.0, phase.sin() * 8.0)
}

/// Runtime slideshow state. The interval handle itself lives on the
/// scene so there is never more than one.
#[derive(Debug, Default)]
pub struct Gallery {
    pub visible: bool,
    pub image_index: usize,
    pub image_count: usize,
    pub float_phase: f64,
}

impl Gallery {
    pub fn new(image_count: usize) -> Self {
        Gallery {
            visible: false,
            image_index: 0,
            image_count,
            float_phase: 0.0,
        }
    }

    /// Advance the slideshow, returning the new active index.
    pub fn advance(&mut self) -> usize {
        if self.image_count > 0 {
            self.image_index = (self.image_index + 1) % self.image_count;
        }
        self.image_index
    }

    pub fn tick_float(&mut self) -> (f64, f64) {
        self.float_phase += FLOAT_STEP;
        float_offset(self.float_phase)
    }

    pub fn reset(&mut self) {
        self.visible = false;
        self.image_index = 0;
        self.float_phase = 0.0;
    }
}

// ==================== DOM appliers ====================

pub fn panel() -> Result<HtmlElement> {
    browser::html_element(browser::ids::GALLERY)
}

pub fn apply_placement(panel: &HtmlElement, placement: &Placement) {
    let style = panel.style();
    for side in ["left", "right", "top", "bottom"] {
        style.set_property(side, "auto").ok();
    }
    if let Some(v) = placement.left {
        style.set_property("left", &v.to_string()).ok();
    }
    if let Some(v) = placement.right {
        style.set_property("right", &v.to_string()).ok();
    }
    if let Some(v) = placement.top {
        style.set_property("top", &v.to_string()).ok();
    }
    if let Some(v) = placement.bottom {
        style.set_property("bottom", &v.to_string()).ok();
    }
    style.set_property("transform", placement.transform).ok();
}

/// Count the slideshow images present in the page.
pub fn image_count() -> usize {
    browser::document()
        .ok()
        .and_then(|doc| {
            doc.query_selector_all(browser::ids::GALLERY_IMAGE_SELECTOR)
                .ok()
        })
        .map(|list| list.length() as usize)
        .unwrap_or(0)
}

/// Mark exactly one image as active.
pub fn set_active_image(index: usize) -> Result<()> {
    let list = browser::document()?
        .query_selector_all(browser::ids::GALLERY_IMAGE_SELECTOR)
        .map_err(|err| anyhow::anyhow!("Cannot query gallery images : {:#?}", err))?;
    for i in 0..list.length() {
        if let Some(node) = list.item(i) {
            if let Ok(el) = node.dyn_into::<Element>() {
                if i as usize == index {
                    el.class_list().add_1("active").ok();
                } else {
                    el.class_list().remove_1("active").ok();
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_placement_stays_in_band() {
        let mut rng = Rng::new();
        for _ in 0..200 {
            let p = random_placement(&mut rng, 400.0, 800.0, 300.0, 400.0);
            let Some(CssLen::Px(left)) = p.left else {
                panic!("mobile placement must anchor left in px");
            };
            assert!(left >= 20.0);
            assert!(left + 300.0 <= 400.0 - 20.0 + 1e-9);
            assert!(p.right.is_none() && p.top.is_none());
            assert!(p.bottom.is_some());
        }
    }

    #[test]
    fn desktop_placement_uses_one_anchor_per_axis() {
        let mut rng = Rng::new();
        for _ in 0..200 {
            let p = random_placement(&mut rng, 1600.0, 900.0, 400.0, 500.0);
            assert_eq!(
                p.left.is_some() as u8 + p.right.is_some() as u8,
                1,
                "one horizontal anchor"
            );
            assert_eq!(
                p.top.is_some() as u8 + p.bottom.is_some() as u8,
                1,
                "one vertical anchor"
            );
            for v in [p.left, p.right, p.top, p.bottom].into_iter().flatten() {
                let CssLen::Percent(pct) = v else {
                    panic!("desktop anchors are percentages");
                };
                assert!((2.0..60.0).contains(&pct));
            }
        }
    }

    #[test]
    fn float_offset_is_bounded() {
        let mut phase = 0.0;
        for _ in 0..10_000 {
            phase += FLOAT_STEP;
            let (x, y) = float_offset(phase);
            assert!(x.abs() <= 5.0 && y.abs() <= 8.0);
        }
    }

    #[test]
    fn slideshow_wraps_around() {
        let mut gallery = Gallery::new(3);
        assert_eq!(gallery.advance(), 1);
        assert_eq!(gallery.advance(), 2);
        assert_eq!(gallery.advance(), 0);

        let mut empty = Gallery::new(0);
        assert_eq!(empty.advance(), 0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut gallery = Gallery::new(4);
        gallery.visible = true;
        gallery.advance();
        gallery.tick_float();
        gallery.reset();
        assert!(!gallery.visible);
        assert_eq!(gallery.image_index, 0);
        assert_eq!(gallery.float_phase, 0.0);
    }
}

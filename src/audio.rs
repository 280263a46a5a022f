//! Background music: one looped track whose volume ramps in linearly
//! once playback is allowed. Autoplay rejection is logged and otherwise
//! ignored; the page degrades to a silent run.

use crate::browser;
use crate::motion::clamp;
use anyhow::{anyhow, Result};
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

pub const RAMP_TARGET: f64 = 0.35;
pub const RAMP_DURATION_MS: f64 = 3000.0;

/// Linear fade from silence to `target` over `duration` milliseconds.
pub fn ramp_volume(elapsed_ms: f64, duration_ms: f64, target: f64) -> f64 {
    target * clamp(elapsed_ms / duration_ms, 0.0, 1.0)
}

/// Start looped playback at volume zero. Resolves once the host accepts
/// the play request; the autoplay policy can reject it.
pub async fn play(element: HtmlAudioElement) -> Result<()> {
    element.set_volume(0.0);
    element.set_loop(true);
    let promise = element
        .play()
        .map_err(|err| anyhow!("Audio play call failed : {:#?}", err))?;
    JsFuture::from(promise)
        .await
        .map_err(|err| anyhow!("Audio playback rejected : {:#?}", err))?;
    Ok(())
}

pub struct Music {
    element: Option<HtmlAudioElement>,
    ramp_started_at: Option<f64>,
}

impl Music {
    /// A missing audio element is not an error; the page just runs
    /// silently.
    pub fn locate() -> Self {
        Music {
            element: browser::audio_element(browser::ids::MUSIC).ok(),
            ramp_started_at: None,
        }
    }

    pub fn element(&self) -> Option<HtmlAudioElement> {
        self.element.clone()
    }

    /// Playback was accepted; begin the fade-in at `now`.
    pub fn mark_started(&mut self, now: f64) {
        self.ramp_started_at = Some(now);
    }

    /// Frame tick: advance the fade while it is in progress.
    pub fn step(&mut self, now: f64) {
        let Some(started) = self.ramp_started_at else {
            return;
        };
        let Some(element) = &self.element else {
            return;
        };
        let elapsed = now - started;
        element.set_volume(ramp_volume(elapsed, RAMP_DURATION_MS, RAMP_TARGET));
        if elapsed >= RAMP_DURATION_MS {
            // ramp complete, stop touching the volume
            self.ramp_started_at = None;
        }
    }

    /// Pause and rewind; safe when playback never started.
    pub fn reset(&mut self) {
        self.ramp_started_at = None;
        if let Some(element) = &self.element {
            element.pause().ok();
            element.set_current_time(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ramp_endpoints() {
        assert_relative_eq!(ramp_volume(0.0, RAMP_DURATION_MS, RAMP_TARGET), 0.0);
        assert_relative_eq!(
            ramp_volume(RAMP_DURATION_MS, RAMP_DURATION_MS, RAMP_TARGET),
            RAMP_TARGET
        );
    }

    #[test]
    fn ramp_is_linear_and_clamped() {
        assert_relative_eq!(ramp_volume(1500.0, 3000.0, 0.35), 0.175);
        assert_relative_eq!(ramp_volume(-100.0, 3000.0, 0.35), 0.0);
        assert_relative_eq!(ramp_volume(10_000.0, 3000.0, 0.35), 0.35);
    }
}

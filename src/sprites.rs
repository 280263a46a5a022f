//! Short-lived DOM sprites: floating hearts, flower petals and slow
//! background drifters. Every live sprite is a record in one central
//! registry stepped by the frame loop, so a page reset can detach all of
//! them immediately instead of waiting for natural expiry.

use crate::browser;
use crate::motion::{clamp, ease_out_cubic, ease_out_quad, Rng};
use anyhow::Result;
use once_cell::sync::Lazy;
use std::f64::consts::PI;
use web_sys::HtmlElement;

static PETAL_PALETTE: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "rgba(255, 182, 193, 0.9)",
        "rgba(255, 105, 180, 0.9)",
        "rgba(255, 192, 203, 0.9)",
        "rgba(255, 160, 122, 0.9)",
        "rgba(255, 218, 185, 0.9)",
        "rgba(255, 228, 225, 0.9)",
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Heart,
    Petal,
    Drifter,
}

impl SpriteKind {
    pub fn class_marker(&self) -> &'static str {
        match self {
            SpriteKind::Heart => "heart",
            SpriteKind::Petal => "flower-petal",
            SpriteKind::Drifter => "background-heart",
        }
    }
}

/// Motion parameters sampled once at spawn. Field meaning varies a
/// little per kind: hearts and drifters rise (`rise` px up over the full
/// lifetime), petals use a signed `drift_y` instead.
#[derive(Debug, Clone, Copy)]
pub struct SpriteParams {
    pub size: f64,
    pub drift_x: f64,
    pub drift_y: f64,
    pub rise: f64,
    pub rot0: f64,
    pub spin: f64,
    pub base_opacity: f64,
    pub duration_ms: f64,
}

/// Visual state derived from elapsed fraction `t`: offsets from the
/// spawn point, rotation in degrees, scale and opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub dx: f64,
    pub dy: f64,
    pub rot_deg: f64,
    pub scale: f64,
    pub opacity: f64,
}

impl SpriteKind {
    /// `wobble` is a fresh random sample per frame; only hearts use it,
    /// for their slight rotational shimmer.
    pub fn pose(&self, t: f64, p: &SpriteParams, wobble: f64) -> Pose {
        match self {
            SpriteKind::Heart => {
                let e = ease_out_cubic(t);
                Pose {
                    dx: p.drift_x * e,
                    dy: -p.rise * e,
                    rot_deg: 45.0 + wobble * e,
                    scale: 1.0 + 0.25 * (e * PI).sin(),
                    opacity: 1.0 - t,
                }
            }
            SpriteKind::Petal => Pose {
                dx: p.drift_x * t + 30.0 * (t * PI * 2.0).sin(),
                dy: p.drift_y * t + 20.0 * (t * PI * 4.0).sin(),
                rot_deg: p.rot0 + p.spin * t,
                scale: 1.0 - t * 0.3,
                opacity: ease_out_quad(t),
            },
            SpriteKind::Drifter => Pose {
                dx: p.drift_x * t + 20.0 * (t * PI * 4.0).sin(),
                dy: -p.rise * t,
                rot_deg: 0.0,
                scale: 1.0,
                opacity: (1.0 - t) * p.base_opacity,
            },
        }
    }
}

struct SpriteRecord {
    kind: SpriteKind,
    node: HtmlElement,
    origin_x: f64,
    origin_y: f64,
    born: f64,
    params: SpriteParams,
}

/// Arena of live sprites. Spawning appends a record, the frame loop
/// steps every record, and `clear` detaches everything at once.
#[derive(Default)]
pub struct SpriteRegistry {
    sprites: Vec<SpriteRecord>,
}

impl SpriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn spawn_heart(&mut self, rng: &mut Rng, x: f64, y: f64, now: f64) -> Result<()> {
        let params = SpriteParams {
            size: rng.uniform(10.0, 18.0),
            drift_x: rng.uniform(-80.0, 80.0),
            drift_y: 0.0,
            rise: rng.uniform(160.0, 260.0),
            rot0: 45.0,
            spin: 0.0,
            base_opacity: 1.0,
            duration_ms: rng.uniform(1200.0, 1900.0),
        };
        let hue = 340.0 + rng.uniform(-8.0, 10.0);
        let color = format!(
            "hsla({hue}, 100%, {}%, {})",
            rng.uniform(65.0, 78.0),
            rng.uniform(0.75, 0.95)
        );
        self.spawn(SpriteKind::Heart, x, y, now, params, &color)
    }

    pub fn spawn_petal(&mut self, rng: &mut Rng, x: f64, y: f64, now: f64) -> Result<()> {
        let params = SpriteParams {
            size: rng.uniform(12.0, 20.0),
            drift_x: rng.uniform(-150.0, 150.0),
            drift_y: rng.uniform(-200.0, -100.0),
            rise: 0.0,
            rot0: rng.uniform(0.0, 360.0),
            spin: rng.uniform(-360.0, 360.0),
            base_opacity: 1.0,
            duration_ms: rng.uniform(2500.0, 4000.0),
        };
        let color = *rng.pick(PETAL_PALETTE.as_slice());
        self.spawn(SpriteKind::Petal, x, y, now, params, color)
    }

    pub fn spawn_drifter(&mut self, rng: &mut Rng, x: f64, y: f64, now: f64) -> Result<()> {
        let params = SpriteParams {
            size: rng.uniform(4.0, 8.0),
            drift_x: rng.uniform(-30.0, 30.0),
            drift_y: 0.0,
            rise: rng.uniform(200.0, 350.0),
            rot0: 0.0,
            spin: 0.0,
            base_opacity: rng.uniform(0.3, 0.6),
            duration_ms: rng.uniform(8000.0, 12000.0),
        };
        let color = format!(
            "hsla({}, {}%, {}%, {})",
            rng.uniform(330.0, 360.0),
            rng.uniform(70.0, 90.0),
            rng.uniform(75.0, 85.0),
            rng.uniform(0.3, 0.6)
        );
        self.spawn(SpriteKind::Drifter, x, y, now, params, &color)
    }

    fn spawn(
        &mut self,
        kind: SpriteKind,
        x: f64,
        y: f64,
        now: f64,
        params: SpriteParams,
        color: &str,
    ) -> Result<()> {
        let node = browser::create_marked_div(kind.class_marker())?;
        let style = node.style();
        style
            .set_property("width", &format!("{}px", params.size))
            .ok();
        style
            .set_property("height", &format!("{}px", params.size))
            .ok();
        style.set_property("background", color).ok();
        style.set_property("left", &format!("{x}px")).ok();
        style.set_property("top", &format!("{y}px")).ok();

        self.sprites.push(SpriteRecord {
            kind,
            node,
            origin_x: x,
            origin_y: y,
            born: now,
            params,
        });
        Ok(())
    }

    /// Advance every sprite one frame; expired sprites detach their node
    /// and leave the registry.
    pub fn step(&mut self, rng: &mut Rng, now: f64) {
        self.sprites.retain_mut(|sprite| {
            let t = clamp((now - sprite.born) / sprite.params.duration_ms, 0.0, 1.0);
            if t >= 1.0 {
                sprite.node.remove();
                return false;
            }

            let wobble = rng.uniform(-12.0, 12.0);
            let pose = sprite.kind.pose(t, &sprite.params, wobble);
            let style = sprite.node.style();
            style
                .set_property("left", &format!("{}px", sprite.origin_x + pose.dx))
                .ok();
            style
                .set_property("top", &format!("{}px", sprite.origin_y + pose.dy))
                .ok();
            style
                .set_property("opacity", &format!("{:.3}", pose.opacity))
                .ok();
            if sprite.kind != SpriteKind::Drifter {
                style
                    .set_property(
                        "transform",
                        &format!(
                            "translate(-50%,-50%) rotate({}deg) scale({})",
                            pose.rot_deg, pose.scale
                        ),
                    )
                    .ok();
            }
            true
        });
    }

    /// Immediate teardown of every in-flight sprite.
    pub fn clear(&mut self) {
        for sprite in self.sprites.drain(..) {
            sprite.node.remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params() -> SpriteParams {
        SpriteParams {
            size: 14.0,
            drift_x: 60.0,
            drift_y: -150.0,
            rise: 200.0,
            rot0: 90.0,
            spin: 180.0,
            base_opacity: 0.5,
            duration_ms: 1500.0,
        }
    }

    #[test]
    fn heart_pose_starts_neutral_and_fades_out() {
        let p = params();
        let start = SpriteKind::Heart.pose(0.0, &p, 0.0);
        assert_relative_eq!(start.dx, 0.0);
        assert_relative_eq!(start.dy, 0.0);
        assert_relative_eq!(start.scale, 1.0);
        assert_relative_eq!(start.opacity, 1.0);

        let end = SpriteKind::Heart.pose(1.0, &p, 0.0);
        assert_relative_eq!(end.dy, -p.rise);
        assert_relative_eq!(end.opacity, 0.0);
    }

    #[test]
    fn heart_scale_pulses_midway() {
        let p = params();
        let mid = SpriteKind::Heart.pose(0.5, &p, 0.0);
        assert!(mid.scale > 1.0 && mid.scale <= 1.25);
    }

    #[test]
    fn petal_fades_quadratically_and_shrinks() {
        let p = params();
        let mid = SpriteKind::Petal.pose(0.5, &p, 0.0);
        assert_relative_eq!(mid.opacity, 0.75);
        assert_relative_eq!(mid.scale, 0.85);

        let end = SpriteKind::Petal.pose(1.0, &p, 0.0);
        assert_relative_eq!(end.opacity, 0.0);
        assert_relative_eq!(end.scale, 0.7);
    }

    #[test]
    fn petal_rotation_accumulates_spin() {
        let p = params();
        let end = SpriteKind::Petal.pose(1.0, &p, 0.0);
        assert_relative_eq!(end.rot_deg, p.rot0 + p.spin);
    }

    #[test]
    fn drifter_rises_with_low_opacity() {
        let p = params();
        let mid = SpriteKind::Drifter.pose(0.5, &p, 0.0);
        assert!(mid.dy < 0.0);
        assert_relative_eq!(mid.opacity, 0.25);
        assert_relative_eq!(mid.scale, 1.0);
    }

    #[test]
    fn wobble_only_affects_hearts() {
        let p = params();
        let petal = SpriteKind::Petal.pose(0.5, &p, 12.0);
        let petal_still = SpriteKind::Petal.pose(0.5, &p, -12.0);
        assert_eq!(petal, petal_still);

        let heart = SpriteKind::Heart.pose(0.5, &p, 12.0);
        let heart_still = SpriteKind::Heart.pose(0.5, &p, -12.0);
        assert!(heart.rot_deg != heart_still.rot_deg);
    }
}

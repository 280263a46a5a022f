//! Canvas particle emitter. Bursts seed particles at a center point with
//! outward velocities aimed at a parametric heart curve, so each burst
//! blooms from the center into a heart silhouette before drifting apart.

use crate::engine::Renderer;
use crate::motion::{clamp, fade_alpha, Rng};
use std::f64::consts::TAU;

const DAMPING: f64 = 0.992;
const GRAVITY: f64 = 0.006;

/// Classic heart curve, y flipped for screen coordinates.
pub fn heart_point(t: f64) -> (f64, f64) {
    let x = 16.0 * t.sin().powi(3);
    let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
    (x, -y)
}

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub hue: f64,
    pub sat: f64,
    pub lum: f64,
    pub alpha: f64,
    pub born: f64,
    pub life: f64,
}

impl Particle {
    pub fn age_fraction(&self, now: f64) -> f64 {
        clamp((now - self.born) / self.life, 0.0, 1.0)
    }

    pub fn is_alive(&self, now: f64) -> bool {
        now - self.born < self.life
    }
}

/// The single live collection; mutated only from the frame callback and
/// from burst calls, so no interior synchronization is needed.
#[derive(Debug, Default)]
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Emit `count` particles from `(cx, cy)`. Each one samples a point on
    /// the heart curve (scaled 6..11 and jittered) and starts at the
    /// center with a velocity proportional to the center-to-point vector.
    pub fn burst(&mut self, rng: &mut Rng, cx: f64, cy: f64, count: usize, now: f64) {
        for _ in 0..count {
            let t = rng.uniform(0.0, TAU);
            let (hx, hy) = heart_point(t);

            let scale = rng.uniform(6.0, 11.0);
            let target_x = cx + hx * scale + rng.uniform(-6.0, 6.0);
            let target_y = cy + hy * scale + rng.uniform(-6.0, 6.0);

            let vx = (target_x - cx) * rng.uniform(0.008, 0.016) + rng.uniform(-0.6, 0.6);
            let vy = (target_y - cy) * rng.uniform(0.008, 0.016) + rng.uniform(-0.6, 0.6);

            self.particles.push(Particle {
                x: cx,
                y: cy,
                vx,
                vy,
                radius: rng.uniform(1.2, 2.6),
                hue: rng.uniform(330.0, 355.0),
                sat: rng.uniform(90.0, 100.0),
                lum: rng.uniform(65.0, 80.0),
                alpha: rng.uniform(0.7, 1.0),
                born: now,
                life: rng.uniform(900.0, 1500.0),
            });
        }
    }

    /// Drop expired particles, then advance the survivors one frame:
    /// multiplicative damping plus a small constant downward pull.
    pub fn step(&mut self, now: f64) {
        self.particles.retain(|p| p.is_alive(now));
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.vx *= DAMPING;
            p.vy *= DAMPING;
            p.vy += GRAVITY;
        }
    }

    pub fn draw(&self, renderer: &Renderer, now: f64) {
        for p in &self.particles {
            let fade = fade_alpha(p.age_fraction(now));
            let color = format!(
                "hsla({}, {}%, {}%, {})",
                p.hue,
                p.sat,
                p.lum,
                p.alpha * fade
            );
            renderer.fill_circle(p.x, p.y, p.radius * (0.85 + 0.6 * fade), &color);
        }
    }

    #[cfg(test)]
    fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn heart_point_closed_form_at_zero() {
        let (x, y) = heart_point(0.0);
        assert_relative_eq!(x, 0.0);
        // 13 - 5 - 2 - 1 = 5, flipped for screen coordinates
        assert_relative_eq!(y, -5.0);
    }

    #[test]
    fn heart_point_is_finite_everywhere() {
        for i in 0..1_000 {
            let (x, y) = heart_point(i as f64 * TAU / 1_000.0);
            assert!(x.is_finite() && y.is_finite());
        }
    }

    #[test]
    fn burst_adds_exactly_count() {
        let mut field = ParticleField::new();
        let mut rng = Rng::new();
        field.burst(&mut rng, 100.0, 100.0, 120, 0.0);
        assert_eq!(field.len(), 120);
        field.burst(&mut rng, 100.0, 100.0, 0, 0.0);
        assert_eq!(field.len(), 120);
    }

    #[test]
    fn particles_start_at_center() {
        let mut field = ParticleField::new();
        let mut rng = Rng::new();
        field.burst(&mut rng, 42.0, 17.0, 30, 0.0);
        for p in field.particles() {
            assert_relative_eq!(p.x, 42.0);
            assert_relative_eq!(p.y, 17.0);
        }
    }

    #[test]
    fn late_burst_is_not_pre_aged() {
        let mut field = ParticleField::new();
        let mut rng = Rng::new();
        // the page had been loading for five seconds before this burst
        field.burst(&mut rng, 0.0, 0.0, 10, 5_000.0);
        field.step(5_016.0);
        assert_eq!(field.len(), 10);
        for p in field.particles() {
            assert!(p.age_fraction(5_016.0) < 0.05);
        }
    }

    #[test]
    fn expired_particles_never_resurrect() {
        let mut field = ParticleField::new();
        let mut rng = Rng::new();
        field.burst(&mut rng, 0.0, 0.0, 50, 0.0);

        // max lifetime is 1500ms, so everything is gone by 2000
        field.step(2_000.0);
        assert!(field.is_empty());

        // stepping back in virtual time must not bring anything back
        field.step(100.0);
        assert!(field.is_empty());
    }

    #[test]
    fn aging_is_monotone_until_expiry() {
        let mut field = ParticleField::new();
        let mut rng = Rng::new();
        field.burst(&mut rng, 0.0, 0.0, 10, 0.0);

        field.step(500.0);
        let alive_at_500 = field.len();
        field.step(1_000.0);
        assert!(field.len() <= alive_at_500);

        for p in field.particles() {
            assert!(p.is_alive(1_000.0));
            assert!(p.age_fraction(1_000.0) < 1.0);
        }
    }

    #[test]
    fn damping_shrinks_horizontal_velocity() {
        let mut field = ParticleField::new();
        let mut rng = Rng::new();
        field.burst(&mut rng, 0.0, 0.0, 20, 0.0);

        let before: Vec<f64> = field.particles().iter().map(|p| p.vx.abs()).collect();
        field.step(16.0);
        for (p, was) in field.particles().iter().zip(before) {
            assert!(p.vx.abs() <= was);
        }
    }
}

//! Scalar helpers shared by every effect: clamping, easing curves and a
//! small uniform RNG. Everything here is pure so the kinematics of the
//! whole page can be unit tested off-browser.

pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Decelerates toward completion: `1 - (1 - t)^3` for `t` in `[0, 1]`.
pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

/// Petal fade curve, `1 - t^2`.
pub fn ease_out_quad(t: f64) -> f64 {
    1.0 - t * t
}

/// Age-based particle fade, `1 - t^1.8`. Slightly harder than linear so
/// particles hold their brightness before dropping off.
pub fn fade_alpha(t: f64) -> f64 {
    1.0 - t.powf(1.8)
}

/// Uniform RNG over `getrandom`, so the same sampling code runs under
/// wasm (browser entropy) and in native tests (OS entropy).
#[derive(Debug, Default)]
pub struct Rng;

impl Rng {
    pub fn new() -> Self {
        Rng
    }

    /// Uniform value in `[0, 1)` with 53 bits of precision.
    fn unit(&mut self) -> f64 {
        let mut bytes = [0u8; 8];
        // Entropy failure has no recovery story on this page; fall back
        // to the midpoint and keep animating.
        if getrandom::getrandom(&mut bytes).is_err() {
            return 0.5;
        }
        (u64::from_le_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform value in `[min, max)`.
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.unit()
    }

    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.unit() * len as f64) as usize % len
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.index(items.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ease_out_cubic_endpoints() {
        assert_relative_eq!(ease_out_cubic(0.0), 0.0);
        assert_relative_eq!(ease_out_cubic(1.0), 1.0);
    }

    #[test]
    fn ease_out_cubic_is_monotone() {
        let mut prev = ease_out_cubic(0.0);
        for i in 1..=100 {
            let next = ease_out_cubic(i as f64 / 100.0);
            assert!(next >= prev, "not monotone at step {i}");
            prev = next;
        }
    }

    #[test]
    fn fade_alpha_endpoints() {
        assert_relative_eq!(fade_alpha(0.0), 1.0);
        assert_relative_eq!(fade_alpha(1.0), 0.0);
    }

    #[test]
    fn clamp_bounds() {
        assert_relative_eq!(clamp(-3.0, 0.0, 1.0), 0.0);
        assert_relative_eq!(clamp(0.4, 0.0, 1.0), 0.4);
        assert_relative_eq!(clamp(7.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut rng = Rng::new();
        for _ in 0..1_000 {
            let v = rng.uniform(-4.0, 9.0);
            assert!((-4.0..9.0).contains(&v));
        }
    }

    #[test]
    fn index_stays_in_range() {
        let mut rng = Rng::new();
        for _ in 0..1_000 {
            assert!(rng.index(7) < 7);
        }
        assert_eq!(rng.index(0), 0);
    }
}

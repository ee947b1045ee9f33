//! Exponential smoothing toward a target, one step per frame.

use glam::Vec3;

/// One easing step: `current + (target - current) * factor`.
///
/// For `factor` in `(0, 1]` the result lies between `current` and `target`,
/// so repeated steps approach the target monotonically and never cross it.
#[inline]
pub fn ease_toward(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

#[inline]
pub fn ease_vec3(current: Vec3, target: Vec3, factor: f32) -> Vec3 {
    current + (target - current) * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_monotonically_without_overshoot() {
        for &(start, target, factor) in &[
            (0.0_f32, 1.0_f32, 0.02_f32),
            (3.0, -2.0, 0.05),
            (-1.5, 0.0, 0.5),
            (0.0, 0.0, 0.02),
        ] {
            let mut value = start;
            let mut distance = (target - value).abs();
            for _ in 0..2000 {
                let next = ease_toward(value, target, factor);
                let next_distance = (target - next).abs();
                assert!(next_distance <= distance, "distance grew at {next}");
                // Still on the starting side of the target.
                assert!((next - target) * (start - target) >= 0.0);
                value = next;
                distance = next_distance;
            }
            assert!(distance < 1e-3, "did not converge: {value} vs {target}");
        }
    }

    #[test]
    fn factor_one_snaps() {
        assert_eq!(ease_toward(4.0, 1.0, 1.0), 1.0);
        assert_eq!(ease_vec3(Vec3::ZERO, Vec3::ONE, 1.0), Vec3::ONE);
    }

    #[test]
    fn vec3_matches_componentwise() {
        let c = Vec3::new(1.0, -2.0, 5.0);
        let t = Vec3::new(0.5, 0.0, 5.0);
        let v = ease_vec3(c, t, 0.05);
        assert_eq!(v.x, ease_toward(c.x, t.x, 0.05));
        assert_eq!(v.y, ease_toward(c.y, t.y, 0.05));
        assert_eq!(v.z, 5.0);
    }
}

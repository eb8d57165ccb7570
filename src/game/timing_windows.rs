// Shared judgment window definitions. Grading and any visual zone markers
// must read the same numbers.

// A zone's grading span is half its radius; distances are normalized
// against that span and clamped to [0, 1].
pub const GRADE_SPAN_OF_RADIUS: f32 = 0.5;

// Inclusive upper bounds on the normalized distance, best grade first.
pub const PERFECT_MAX: f32 = 0.25;
pub const GREAT_MAX: f32 = 0.40;
pub const GOOD_MAX: f32 = 0.60;
pub const BAD_MAX: f32 = 0.85;

#[inline(always)]
pub const fn normalized_windows() -> [f32; 4] {
    [PERFECT_MAX, GREAT_MAX, GOOD_MAX, BAD_MAX]
}

/// Normalized distance in [0, 1], or `None` when the radius cannot grade.
#[inline(always)]
pub fn normalized_distance(distance: f32, radius: f32) -> Option<f32> {
    if !radius.is_finite() || radius <= 0.0 {
        return None;
    }
    let n = distance.abs() / (radius * GRADE_SPAN_OF_RADIUS);
    if n.is_nan() {
        return None;
    }
    Some(n.clamp(0.0, 1.0))
}

/// World-space distance at which each window closes for a given radius.
#[inline(always)]
pub fn windows_for_radius(radius: f32) -> [f32; 4] {
    let span = radius.max(0.0) * GRADE_SPAN_OF_RADIUS;
    normalized_windows().map(|w| w * span)
}

#[cfg(test)]
mod tests {
    use super::{normalized_distance, windows_for_radius};

    #[test]
    fn normalization_clamps_and_rejects_degenerate_radius() {
        assert_eq!(normalized_distance(1.0, 4.0), Some(0.5));
        assert_eq!(normalized_distance(-1.0, 4.0), Some(0.5));
        assert_eq!(normalized_distance(100.0, 4.0), Some(1.0));
        assert_eq!(normalized_distance(1.0, 0.0), None);
        assert_eq!(normalized_distance(1.0, -2.0), None);
        assert_eq!(normalized_distance(f32::NAN, 2.0), None);
        assert_eq!(normalized_distance(f32::INFINITY, 2.0), Some(1.0));
    }

    #[test]
    fn windows_scale_with_radius() {
        let w = windows_for_radius(8.0);
        assert!((w[0] - 1.0).abs() <= 1e-6, "perfect window for r=8 should be 1.0, got {}", w[0]);
        assert!((w[3] - 3.4).abs() <= 1e-5, "bad window for r=8 should be 3.4, got {}", w[3]);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Display scale model — maps an image's original resolution to the display
// resolution that every annotation coordinate is expressed in.

use crate::error::{MarkshotError, Result};

/// Display size is 9/10 of the original size on each axis.
const DISPLAY_RATIO_NUMERATOR: u64 = 9;
const DISPLAY_RATIO_DENOMINATOR: u64 = 10;

/// Compute the display resolution for an image of the given original size.
///
/// Each axis is `floor(0.9 * n)`, evaluated in integer arithmetic so that no
/// float rounding can creep in. The result is pinned on the record at creation
/// time: feeding it back through `scale` shrinks it again, so callers must
/// invoke this exactly once per record.
pub fn scale(original_width: u32, original_height: u32) -> Result<(u32, u32)> {
    if original_width == 0 || original_height == 0 {
        return Err(MarkshotError::InvalidInput(format!(
            "image dimensions must be positive, got {original_width}x{original_height}"
        )));
    }
    Ok((scale_axis(original_width), scale_axis(original_height)))
}

fn scale_axis(n: u32) -> u32 {
    // n * 9 / 10 <= n, so the narrowing cast cannot truncate.
    (u64::from(n) * DISPLAY_RATIO_NUMERATOR / DISPLAY_RATIO_DENOMINATOR) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_to_ninety_percent() {
        assert_eq!(scale(1200, 900).unwrap(), (1080, 810));
        assert_eq!(scale(1920, 1080).unwrap(), (1728, 972));
    }

    #[test]
    fn floors_fractional_results() {
        // 0.9 * 15 = 13.5, 0.9 * 7 = 6.3
        assert_eq!(scale(15, 7).unwrap(), (13, 6));
        assert_eq!(scale(1, 1).unwrap(), (0, 0));
    }

    #[test]
    fn matches_float_floor_over_a_range() {
        for w in 1..2000u32 {
            let expected = (f64::from(w) * 0.9).floor() as u32;
            let (got, _) = scale(w, 1).unwrap();
            assert_eq!(got, expected, "w = {w}");
        }
    }

    #[test]
    fn reapplying_shrinks_again() {
        let first = scale(1200, 900).unwrap();
        let second = scale(first.0, first.1).unwrap();
        assert_ne!(first, second);
        assert_eq!(second, (972, 729));
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            scale(0, 10),
            Err(MarkshotError::InvalidInput(_))
        ));
        assert!(matches!(
            scale(10, 0),
            Err(MarkshotError::InvalidInput(_))
        ));
    }
}

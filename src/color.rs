// color.rs

use plotters::prelude::RGBColor;

pub const GREEN: RGBColor = RGBColor(0, 255, 0);
pub const YELLOW: RGBColor = RGBColor(255, 255, 0);
pub const RED: RGBColor = RGBColor(255, 0, 0);

/// Maps a ratio in [0, 1] onto the green -> yellow -> red ramp.
///
/// Missing, non-finite and out-of-range ratios are treated as the neutral
/// midpoint (yellow) rather than rejected.
pub fn color_for(ratio: Option<f64>) -> RGBColor {
    let ratio = match ratio {
        Some(r) if r.is_finite() && (0.0..=1.0).contains(&r) => r,
        _ => 0.5,
    };

    if ratio <= 0.5 {
        let t = ratio * 2.0;
        RGBColor((t * 255.0).round() as u8, 255, 0)
    } else {
        let t = (ratio - 0.5) * 2.0;
        RGBColor(255, (255.0 - t * 255.0).round() as u8, 0)
    }
}

/// Fill for class `index` out of `class_count`, sampled at the class midpoint.
pub fn class_color(index: usize, class_count: usize) -> RGBColor {
    if class_count == 0 {
        return color_for(None);
    }
    color_for(Some((index as f64 + 0.5) / class_count as f64))
}

pub fn to_hex(color: RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

/// Color from a `0xRRGGBB` literal, for the fixed style constants.
pub const fn hex(rgb: u32) -> RGBColor {
    RGBColor((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_endpoints() {
        assert_eq!(color_for(Some(0.0)), GREEN);
        assert_eq!(color_for(Some(0.5)), YELLOW);
        assert_eq!(color_for(Some(1.0)), RED);
    }

    #[test]
    fn ramp_interpolates_linearly() {
        assert_eq!(color_for(Some(0.25)), RGBColor(128, 255, 0));
        assert_eq!(color_for(Some(0.75)), RGBColor(255, 128, 0));
    }

    #[test]
    fn invalid_ratios_fall_back_to_midpoint() {
        let mid = color_for(Some(0.5));
        for bad in [
            None,
            Some(-0.1),
            Some(1.5),
            Some(f64::NAN),
            Some(f64::INFINITY),
            Some(f64::NEG_INFINITY),
        ] {
            assert_eq!(color_for(bad), mid, "ratio {:?}", bad);
        }
    }

    #[test]
    fn ramp_is_continuous_in_each_channel() {
        // One step of 1/1000 may move a channel by at most ~1 unit after rounding.
        let mut prev = color_for(Some(0.0));
        for i in 1..=1000 {
            let c = color_for(Some(i as f64 / 1000.0));
            assert!((c.0 as i32 - prev.0 as i32).abs() <= 1);
            assert!((c.1 as i32 - prev.1 as i32).abs() <= 1);
            assert_eq!(c.2, 0);
            prev = c;
        }
    }

    #[test]
    fn class_colors_sample_midpoints() {
        assert_eq!(class_color(0, 5), color_for(Some(0.1)));
        assert_eq!(class_color(4, 5), color_for(Some(0.9)));
        assert_eq!(to_hex(hex(0x94a3b8)), "#94a3b8");
    }
}

// crates/mediacore-video/src/geometry.rs
//
// Letterbox/pillarbox fit of a picture into a surface: horizontal-fit
// first, falling back to vertical-fit if the resulting height overflows
// the surface. Display width is always rounded down to a multiple of
// `ALIGNMENT` — some display backends require scanline alignment on that
// boundary.

use mediacore_types::AspectRatio;

use crate::surface::{Rect, ALIGNMENT};

fn round_down_align(v: u32) -> u32 {
    (v / ALIGNMENT) * ALIGNMENT
}

fn height_for_width(dw: u32, pw: u32, ph: u32, aspect: AspectRatio) -> u32 {
    if aspect == AspectRatio::Square {
        ((ph as f64) * (dw as f64) / (pw as f64)).round() as u32
    } else {
        (dw as f64 / aspect.value()).round() as u32
    }
}

fn width_for_height(dh: u32, pw: u32, ph: u32, aspect: AspectRatio) -> u32 {
    if aspect == AspectRatio::Square {
        ((pw as f64) * (dh as f64) / (ph as f64)).round() as u32
    } else {
        (dh as f64 * aspect.value()).round() as u32
    }
}

/// Fit a `pw`x`ph` picture with aspect tag `aspect` into a `sw`x`sh`
/// surface, centered on both axes.
pub fn fit_picture_to_surface(
    pw: u32,
    ph: u32,
    aspect: AspectRatio,
    sw: u32,
    sh: u32,
) -> Rect {
    let mut dw = round_down_align(sw.min(pw)).max(ALIGNMENT.min(sw));
    let mut dh = height_for_width(dw, pw, ph, aspect);

    if dh > sh {
        dh = sh.min(ph);
        dw = round_down_align(width_for_height(dh, pw, ph, aspect)).max(ALIGNMENT.min(sw));
    }

    let x = sw.saturating_sub(dw) / 2;
    let y = sh.saturating_sub(dh) / 2;
    Rect { x, y, w: dw, h: dh }
}

/// Vertical letterbox bands left uncovered by `rect` within a surface of
/// height `sh` — `(top, bottom)`, either possibly empty (`y0 > y1`).
pub fn letterbox_bands(rect: Rect, sh: u32) -> [(u32, u32); 2] {
    let top = if rect.y == 0 { (1, 0) } else { (0, rect.y - 1) };
    let bottom_start = rect.y + rect.h;
    let bottom = if bottom_start >= sh { (1, 0) } else { (bottom_start, sh - 1) };
    [top, bottom]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_nine_picture_wider_than_surface_letterboxes() {
        let rect = fit_picture_to_surface(720, 480, AspectRatio::SixteenNine, 640, 480);
        assert_eq!(rect, Rect { x: 0, y: 60, w: 640, h: 360 });
    }

    #[test]
    fn letterbox_bands_cover_top_and_bottom() {
        let rect = Rect { x: 0, y: 60, w: 640, h: 360 };
        let [top, bottom] = letterbox_bands(rect, 480);
        assert_eq!(top, (0, 59));
        assert_eq!(bottom, (420, 479));
    }

    #[test]
    fn letterbox_bands_empty_when_picture_fills_surface() {
        let rect = Rect { x: 0, y: 0, w: 640, h: 480 };
        let [top, bottom] = letterbox_bands(rect, 480);
        assert!(top.0 > top.1);
        assert!(bottom.0 > bottom.1);
    }

    #[test]
    fn matching_aspect_fills_surface_exactly() {
        let rect = fit_picture_to_surface(640, 480, AspectRatio::FourThree, 640, 480);
        assert_eq!(rect.w, 640);
        assert_eq!(rect.h, 480);
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 0);
    }

    #[test]
    fn display_width_is_always_16_aligned() {
        let rect = fit_picture_to_surface(701, 481, AspectRatio::FourThree, 639, 479);
        assert_eq!(rect.w % ALIGNMENT, 0);
    }
}

//! Resize and crop geometry.
//!
//! Pure functions over pixel dimensions. Callers validate that every
//! dimension is non-zero before calling.

/// A square region inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareCrop {
    /// Left edge of the region
    pub x: u32,
    /// Top edge of the region
    pub y: u32,
    /// Side length of the region
    pub edge: u32,
}

/// Largest size that fits inside `max_w x max_h` with the source aspect ratio.
///
/// Sources already within bounds are returned unchanged; nothing is upscaled.
/// Scaled dimensions are rounded to whole pixels and never drop below 1.
pub fn contained_size(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    debug_assert!(src_w > 0 && src_h > 0 && max_w > 0 && max_h > 0);

    if src_w <= max_w && src_h <= max_h {
        return (src_w, src_h);
    }

    let ratio = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let scale = |dim: u32, bound: u32| ((dim as f64 * ratio).round() as u32).clamp(1, bound);
    (scale(src_w, max_w), scale(src_h, max_h))
}

/// The largest centered square inside a `src_w x src_h` image.
pub fn center_square_crop(src_w: u32, src_h: u32) -> SquareCrop {
    debug_assert!(src_w > 0 && src_h > 0);

    let edge = src_w.min(src_h);
    SquareCrop {
        x: (src_w - edge) / 2,
        y: (src_h - edge) / 2,
        edge,
    }
}

/// Width divided by height.
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    debug_assert!(height > 0);
    width as f64 / height as f64
}

/// Pixel count in millions, rounded to two decimals.
pub fn megapixels(width: u32, height: u32) -> f64 {
    let mp = width as f64 * height as f64 / 1_000_000.0;
    (mp * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: [u32; 8] = [1, 3, 150, 640, 1080, 1920, 3000, 4032];

    #[test]
    fn test_contained_size_within_bounds_is_unchanged() {
        for &w in &SIZES {
            for &h in &SIZES {
                assert_eq!(contained_size(w, h, 4032, 4032), (w, h));
            }
        }
        assert_eq!(contained_size(1920, 1080, 1920, 1080), (1920, 1080));
    }

    #[test]
    fn test_contained_size_preserves_aspect_and_bounds() {
        let bounds = [(1920, 1920), (800, 600), (150, 150), (1000, 200)];
        for &w in &SIZES[2..] {
            for &h in &SIZES[2..] {
                for &(max_w, max_h) in &bounds {
                    if w <= max_w && h <= max_h {
                        continue;
                    }
                    let (out_w, out_h) = contained_size(w, h, max_w, max_h);
                    assert!(out_w <= max_w && out_h <= max_h, "{w}x{h} -> {out_w}x{out_h}");
                    assert!(out_w <= w && out_h <= h);

                    // Rounding to whole pixels bounds the drift by half a pixel per side
                    let src = aspect_ratio(w, h);
                    let out = aspect_ratio(out_w, out_h);
                    let tolerance = src * (1.0 / out_w as f64 + 1.0 / out_h as f64);
                    assert!(
                        (src - out).abs() <= tolerance,
                        "{w}x{h} -> {out_w}x{out_h}: {src} vs {out}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_contained_size_landscape() {
        assert_eq!(contained_size(4000, 3000, 1920, 1920), (1920, 1440));
    }

    #[test]
    fn test_contained_size_portrait() {
        assert_eq!(contained_size(3000, 4000, 1920, 1920), (1440, 1920));
    }

    #[test]
    fn test_contained_size_never_collapses_to_zero() {
        assert_eq!(contained_size(10_000, 2, 100, 100), (100, 1));
    }

    #[test]
    fn test_center_square_crop_is_centered_and_contained() {
        for &w in &SIZES {
            for &h in &SIZES {
                let crop = center_square_crop(w, h);
                assert_eq!(crop.edge, w.min(h));
                assert!(crop.x + crop.edge <= w);
                assert!(crop.y + crop.edge <= h);

                let center_x = crop.x as f64 + crop.edge as f64 / 2.0;
                let center_y = crop.y as f64 + crop.edge as f64 / 2.0;
                assert!((center_x - w as f64 / 2.0).abs() <= 0.5);
                assert!((center_y - h as f64 / 2.0).abs() <= 0.5);
            }
        }
    }

    #[test]
    fn test_center_square_crop_landscape() {
        assert_eq!(
            center_square_crop(1000, 500),
            SquareCrop {
                x: 250,
                y: 0,
                edge: 500
            }
        );
    }

    #[test]
    fn test_megapixels_rounding() {
        assert_eq!(megapixels(4000, 3000), 12.0);
        assert_eq!(megapixels(1920, 1080), 2.07);
        assert_eq!(megapixels(1, 1), 0.0);
    }

    #[test]
    fn test_aspect_ratio() {
        assert!((aspect_ratio(4000, 3000) - 4.0 / 3.0).abs() < 1e-12);
    }
}

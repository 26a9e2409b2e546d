//! Mask compositing
//!
//! Paints each side's mask with that side's color, in Top, Bottom, Left,
//! Right order. With first-wins compositing a corner pixel claimed by an
//! earlier side is left alone by later sides; with last-wins the last side
//! to cover it decides its color. Alpha is never modified.

use image::{DynamicImage, GenericImage, GenericImageView, ImageBuffer, Pixel};
use tracing::warn;

use super::options::{BorderOptions, SideColors};
use super::types::{BorderMask, Side};

/// Paints border masks onto images
pub struct Whitener;

impl Whitener {
    /// Paint `masks` onto `image`, returning painted pixel counts per side.
    ///
    /// Masks whose size differs from the image are skipped.
    pub fn apply(image: &mut DynamicImage, masks: &[BorderMask], options: &BorderOptions) -> Vec<(Side, usize)> {
        let (width, height) = image.dimensions();

        let ordered: Vec<&BorderMask> = Side::all()
            .iter()
            .flat_map(|&side| masks.iter().filter(move |m| m.side == side))
            .filter(|m| {
                let fits = m.dimensions() == (width, height);
                if !fits {
                    warn!(
                        side = %m.side,
                        mask = ?m.dimensions(),
                        image = ?(width, height),
                        "Skipping mask with mismatched size"
                    );
                }
                fits
            })
            .collect();

        let colors = &options.colors;
        let first_wins = options.first_wins;

        match image {
            DynamicImage::ImageLuma8(buf) => paint_buffer(buf, &ordered, first_wins, colors, |p, c| {
                p.0[0] = luma(c);
            }),
            DynamicImage::ImageLumaA8(buf) => paint_buffer(buf, &ordered, first_wins, colors, |p, c| {
                p.0[0] = luma(c);
            }),
            DynamicImage::ImageRgb8(buf) => paint_buffer(buf, &ordered, first_wins, colors, |p, c| {
                p.0 = c;
            }),
            DynamicImage::ImageRgba8(buf) => paint_buffer(buf, &ordered, first_wins, colors, |p, c| {
                p.0[..3].copy_from_slice(&c);
            }),
            DynamicImage::ImageLuma16(buf) => paint_buffer(buf, &ordered, first_wins, colors, |p, c| {
                p.0[0] = widen(luma(c));
            }),
            DynamicImage::ImageLumaA16(buf) => paint_buffer(buf, &ordered, first_wins, colors, |p, c| {
                p.0[0] = widen(luma(c));
            }),
            DynamicImage::ImageRgb16(buf) => paint_buffer(buf, &ordered, first_wins, colors, |p, c| {
                p.0 = c.map(widen);
            }),
            DynamicImage::ImageRgba16(buf) => paint_buffer(buf, &ordered, first_wins, colors, |p, c| {
                for (dst, v) in p.0.iter_mut().zip(c) {
                    *dst = widen(v);
                }
            }),
            DynamicImage::ImageRgb32F(buf) => paint_buffer(buf, &ordered, first_wins, colors, |p, c| {
                p.0 = c.map(unit);
            }),
            DynamicImage::ImageRgba32F(buf) => paint_buffer(buf, &ordered, first_wins, colors, |p, c| {
                for (dst, v) in p.0.iter_mut().zip(c) {
                    *dst = unit(v);
                }
            }),
            other => paint_generic(other, &ordered, first_wins, colors),
        }
    }
}

/// BT.601 luma of an RGB color
pub(crate) fn luma(c: [u8; 3]) -> u8 {
    let y = (299 * c[0] as u32 + 587 * c[1] as u32 + 114 * c[2] as u32 + 500) / 1000;
    y.min(255) as u8
}

fn widen(v: u8) -> u16 {
    v as u16 * 257
}

fn unit(v: u8) -> f32 {
    v as f32 / 255.0
}

/// Paint masks onto a typed buffer; `write` sets the color channels of one pixel
fn paint_buffer<P, F>(
    buffer: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    masks: &[&BorderMask],
    first_wins: bool,
    colors: &SideColors,
    mut write: F,
) -> Vec<(Side, usize)>
where
    P: Pixel,
    F: FnMut(&mut P, [u8; 3]),
{
    let width = buffer.width() as usize;
    let mut painted = vec![false; width * buffer.height() as usize];

    masks
        .iter()
        .map(|mask| {
            let color = colors.for_side(mask.side);
            let mut count = 0usize;
            for (i, &m) in mask.mask.as_raw().iter().enumerate() {
                if m == 0 || (first_wins && painted[i]) {
                    continue;
                }
                let (x, y) = ((i % width) as u32, (i / width) as u32);
                write(buffer.get_pixel_mut(x, y), color);
                painted[i] = true;
                count += 1;
            }
            (mask.side, count)
        })
        .collect()
}

/// Slow path for pixel layouts without a dedicated buffer arm
fn paint_generic(
    image: &mut DynamicImage,
    masks: &[&BorderMask],
    first_wins: bool,
    colors: &SideColors,
) -> Vec<(Side, usize)> {
    let (width, height) = image.dimensions();
    let mut painted = vec![false; width as usize * height as usize];

    masks
        .iter()
        .map(|mask| {
            let color = colors.for_side(mask.side);
            let mut count = 0usize;
            for (x, y, m) in mask.mask.enumerate_pixels() {
                let i = y as usize * width as usize + x as usize;
                if m.0[0] == 0 || (first_wins && painted[i]) {
                    continue;
                }
                let mut px = image.get_pixel(x, y);
                px.0[..3].copy_from_slice(&color);
                image.put_pixel(x, y, px);
                painted[i] = true;
                count += 1;
            }
            (mask.side, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, LumaA, Rgb, RgbImage, Rgba, RgbaImage};

    fn band(side: Side, width: u32, height: u32, depth: u32) -> BorderMask {
        let mut mask = BorderMask::new(side, width, height);
        for index in 0..side.scanline_count(width, height) {
            for d in 0..depth {
                let (x, y) = side.to_xy(width, height, index, d);
                mask.set(x, y);
            }
        }
        mask
    }

    #[test]
    fn test_luma() {
        assert_eq!(luma([255, 255, 255]), 255);
        assert_eq!(luma([0, 0, 0]), 0);
        assert_eq!(luma([255, 0, 0]), 76);
    }

    #[test]
    fn test_rgb_paint_counts() {
        let mut image = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])));
        let masks = vec![band(Side::Top, 10, 10, 2)];
        let counts = Whitener::apply(&mut image, &masks, &BorderOptions::default());

        assert_eq!(counts, vec![(Side::Top, 20)]);
        let rgb = image.to_rgb8();
        assert_eq!(rgb.get_pixel(5, 1), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(5, 2), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_first_wins_corner() {
        let options = BorderOptions::diagnostic();
        let mut image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let masks = vec![band(Side::Left, 10, 10, 3), band(Side::Top, 10, 10, 3)];
        let counts = Whitener::apply(&mut image, &masks, &options);

        assert_eq!(counts, vec![(Side::Top, 30), (Side::Left, 21)]);
        assert_eq!(image.to_rgb8().get_pixel(0, 0).0, options.colors.top);
    }

    #[test]
    fn test_last_wins_corner() {
        let options = BorderOptions {
            first_wins: false,
            ..BorderOptions::diagnostic()
        };
        let mut image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let masks = vec![band(Side::Top, 10, 10, 3), band(Side::Left, 10, 10, 3)];
        let counts = Whitener::apply(&mut image, &masks, &options);

        assert_eq!(counts, vec![(Side::Top, 30), (Side::Left, 30)]);
        assert_eq!(image.to_rgb8().get_pixel(0, 0).0, options.colors.left);
    }

    #[test]
    fn test_alpha_preserved() {
        let mut image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 6, Rgba([0, 0, 0, 77])));
        Whitener::apply(&mut image, &[band(Side::Right, 6, 6, 2)], &BorderOptions::default());
        let rgba = image.as_rgba8().map(|b| *b.get_pixel(5, 0));
        assert_eq!(rgba, Some(Rgba([255, 255, 255, 77])));

        let mut image = DynamicImage::ImageLumaA8(image::ImageBuffer::from_pixel(6, 6, LumaA([0, 12])));
        Whitener::apply(&mut image, &[band(Side::Bottom, 6, 6, 1)], &BorderOptions::default());
        let la = image.as_luma_alpha8().map(|b| *b.get_pixel(0, 5));
        assert_eq!(la, Some(LumaA([255, 12])));
    }

    #[test]
    fn test_gray_and_16bit() {
        let mut image = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        Whitener::apply(&mut image, &[band(Side::Left, 4, 4, 1)], &BorderOptions::default());
        assert_eq!(image.as_luma8().map(|b| *b.get_pixel(0, 3)), Some(Luma([255])));

        let mut image = DynamicImage::ImageLuma16(image::ImageBuffer::new(4, 4));
        Whitener::apply(&mut image, &[band(Side::Left, 4, 4, 1)], &BorderOptions::default());
        assert_eq!(image.as_luma16().map(|b| b.get_pixel(0, 0).0[0]), Some(u16::MAX));
    }

    #[test]
    fn test_mismatched_mask_skipped() {
        let mut image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let counts = Whitener::apply(&mut image, &[band(Side::Top, 8, 8, 2)], &BorderOptions::default());
        assert!(counts.is_empty());
        assert_eq!(image.to_rgb8().get_pixel(0, 0), &Rgb([0, 0, 0]));
    }
}

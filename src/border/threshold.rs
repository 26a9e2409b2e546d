//! Page-white / scanner-bed threshold estimation
//!
//! Samples a central patch of the page: whatever lies at the middle of a
//! scanned page is page, never scanner bed.

use image::GrayImage;

use super::options::BorderOptions;
use super::types::Thresholds;

/// Side length of the central sample patch, as fraction of each dimension
const CENTER_PATCH_FRACTION: f32 = 0.2;

/// Lowest white threshold ever produced
const MIN_WHITE_THRESHOLD: f32 = 150.0;

/// White threshold used when the image cannot be sampled
const FALLBACK_WHITE_THRESHOLD: f32 = 230.0;

/// Estimates per-image brightness thresholds
pub struct ThresholdEstimator;

impl ThresholdEstimator {
    /// Estimate thresholds from the central patch of `gray`.
    ///
    /// Never fails: degenerate images fall back to fixed defaults.
    pub fn estimate(gray: &GrayImage, options: &BorderOptions) -> Thresholds {
        let dark_threshold = options.dark_threshold;

        let Some(center_mean) = Self::center_mean(gray) else {
            return Thresholds {
                white_threshold: FALLBACK_WHITE_THRESHOLD,
                dark_threshold: dark_threshold.min(FALLBACK_WHITE_THRESHOLD - 1.0),
            };
        };

        let white_threshold = (center_mean - options.page_white_delta).max(MIN_WHITE_THRESHOLD);

        Thresholds {
            white_threshold,
            dark_threshold: dark_threshold.min(white_threshold - 1.0),
        }
    }

    /// Mean brightness of the central patch, `None` for an empty image
    pub fn center_mean(gray: &GrayImage) -> Option<f32> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        let patch_w = ((width as f32 * CENTER_PATCH_FRACTION) as u32).max(1);
        let patch_h = ((height as f32 * CENTER_PATCH_FRACTION) as u32).max(1);
        let x0 = (width - patch_w) / 2;
        let y0 = (height - patch_h) / 2;

        let mut sum = 0u64;
        for y in y0..y0 + patch_h {
            for x in x0..x0 + patch_w {
                sum += gray.get_pixel(x, y).0[0] as u64;
            }
        }

        let count = patch_w as u64 * patch_h as u64;
        if count == 0 {
            return None;
        }
        Some(sum as f32 / count as f32)
    }
}

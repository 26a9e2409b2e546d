//! Projection-variance strategy
//!
//! The outermost window of a scanline seeds a baseline (mean, std-dev) for
//! the border. Walking inward in non-overlapping windows, a window is
//! content-like when its std-dev jumps well above the baseline or its mean
//! leaves the baseline by more than a configured delta. Windows that stay on
//! the baseline widen it, up to `projection_baseline` windows, until the
//! first content-like window is seen; a border thinner than the full
//! baseline is therefore never averaged away. Two consecutive content-like
//! windows are required, so a single noisy window never ends the border.

use image::GrayImage;

use super::{scan_side, ScanlineDetector};
use crate::border::options::BorderOptions;
use crate::border::types::{ScanlineBoundary, Side, Thresholds};

/// Consecutive content-like windows needed to accept a transition
const CONFIRM_WINDOWS: usize = 2;

/// Std-dev multiplier over the baseline that marks content
const STD_FACTOR: f32 = 2.0;

/// Sliding-window mean/variance detector
pub struct ProjectionVarianceDetector<'a> {
    options: &'a BorderOptions,
}

impl<'a> ProjectionVarianceDetector<'a> {
    pub fn new(options: &'a BorderOptions) -> Self {
        Self { options }
    }

    fn scan_line(&self, line: &[u8], limit: usize, thresholds: &Thresholds) -> Option<u32> {
        let window = self.options.projection_window as usize;
        let max_baseline = self.options.projection_baseline.max(1) as usize;
        if window == 0 || window * (1 + CONFIRM_WINDOWS) > line.len() {
            return None;
        }

        let (mut base_mean, mut base_std) = window_stats(&line[..window]);

        // The edge already looks like page: nothing to remove on this line
        if base_mean >= thresholds.white_threshold {
            return None;
        }

        let mean_delta = self.options.projection_mean_delta;
        let std_floor = self.options.projection_std_floor;

        let mut base_windows = 1usize;
        let mut growing = true;
        let mut run = 0usize;
        let mut first = 0usize;
        let mut start = window;

        while start + window <= line.len() {
            // A transition must begin within the scan limit
            if run == 0 && start >= limit {
                break;
            }

            let (mean, std) = window_stats(&line[start..start + window]);
            let std_limit = (STD_FACTOR * base_std).max(std_floor);
            let content = std > std_limit || (mean - base_mean).abs() > mean_delta;

            if content {
                growing = false;
                if run == 0 {
                    first = start;
                }
                run += 1;
                if run >= CONFIRM_WINDOWS {
                    let boundary = refine(&line[first..first + window], base_mean, mean_delta)
                        .map_or(first + window / 2, |i| first + i);
                    return (boundary > 0 && boundary <= limit).then_some(boundary as u32);
                }
            } else {
                run = 0;
                if growing && base_windows < max_baseline {
                    base_windows += 1;
                    (base_mean, base_std) = window_stats(&line[..base_windows * window]);
                }
            }

            start += window;
        }

        None
    }
}

impl ScanlineDetector for ProjectionVarianceDetector<'_> {
    fn detect(&self, gray: &GrayImage, side: Side, thresholds: &Thresholds) -> ScanlineBoundary {
        let (width, height) = gray.dimensions();
        let limit = self.options.scan_limit(side.depth(width, height)) as usize;

        scan_side(gray, side, |line| self.scan_line(line, limit, thresholds))
    }
}

/// Mean and population std-dev of a window
fn window_stats(values: &[u8]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let n = values.len() as f32;
    let (sum, sum_sq) = values.iter().fold((0.0f32, 0.0f32), |(s, sq), &v| {
        let v = v as f32;
        (s + v, sq + v * v)
    });
    let mean = sum / n;
    let var = (sum_sq / n - mean * mean).max(0.0);
    (mean, var.sqrt())
}

/// First pixel of the window that leaves the baseline mean
fn refine(window: &[u8], base_mean: f32, mean_delta: f32) -> Option<usize> {
    window
        .iter()
        .position(|&v| (v as f32 - base_mean).abs() > mean_delta)
}

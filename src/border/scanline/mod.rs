//! Per-scanline border detection
//!
//! Every strategy reports, for each row (left/right) or column (top/bottom),
//! the offset from the edge at which page content begins. Raw offsets are
//! then smoothed with a moving median and pruned by neighbor consensus.
//!
//! # Strategies
//!
//! - [`ProjectionVarianceDetector`] - window mean/std-dev departure from an edge baseline
//! - [`PageEdgeDetector`] - dark run followed by a sustained white run
//! - [`CenterOutDetector`] - text-to-white transition walking outward from the center
//! - [`WdwDetector`] - white-dark-white with per-side percentile levels

mod center_out;
mod page_edge;
mod projection;
mod wdw;

pub use center_out::CenterOutDetector;
pub use page_edge::PageEdgeDetector;
pub use projection::ProjectionVarianceDetector;
pub use wdw::WdwDetector;

use image::GrayImage;

use super::options::{BorderOptions, DetectionStrategy};
use super::types::{ScanlineBoundary, Side, Thresholds};

/// Common contract of the scanline strategies
pub trait ScanlineDetector {
    /// Raw per-scanline boundaries for one side, before smoothing
    fn detect(&self, gray: &GrayImage, side: Side, thresholds: &Thresholds) -> ScanlineBoundary;
}

/// Detector for the configured strategy, `None` for the grid strategy
pub fn detector_for(options: &BorderOptions) -> Option<Box<dyn ScanlineDetector + '_>> {
    match options.strategy {
        DetectionStrategy::ProjectionVariance => {
            Some(Box::new(ProjectionVarianceDetector::new(options)))
        }
        DetectionStrategy::PageEdge => Some(Box::new(PageEdgeDetector::new(options))),
        DetectionStrategy::CenterOut => Some(Box::new(CenterOutDetector::new(options))),
        DetectionStrategy::EdgeInWdw => Some(Box::new(WdwDetector::new(options))),
        DetectionStrategy::Grid => None,
    }
}

/// Detect one side and apply smoothing and neighbor consensus
pub fn detect_side(
    detector: &dyn ScanlineDetector,
    gray: &GrayImage,
    side: Side,
    thresholds: &Thresholds,
    options: &BorderOptions,
) -> ScanlineBoundary {
    detector
        .detect(gray, side, thresholds)
        .smoothed(options.smoothing_window)
        .consensus_filtered(
            options.neighbor_window,
            options.neighbor_min,
            options.neighbor_delta,
        )
}

/// Run `scan` over every scanline of `side`.
///
/// Each scanline is handed over as luma values ordered from the edge
/// inward; the buffer is reused across scanlines.
pub(crate) fn scan_side<F>(gray: &GrayImage, side: Side, mut scan: F) -> ScanlineBoundary
where
    F: FnMut(&[u8]) -> Option<u32>,
{
    let (width, height) = gray.dimensions();
    let count = side.scanline_count(width, height);
    let mut line = Vec::with_capacity(side.depth(width, height) as usize);

    let offsets = (0..count)
        .map(|index| {
            fill_scanline(gray, side, index, &mut line);
            scan(&line)
        })
        .collect();

    ScanlineBoundary::new(side, offsets)
}

/// Copy one scanline into `buf`, edge-first
pub(crate) fn fill_scanline(gray: &GrayImage, side: Side, index: u32, buf: &mut Vec<u8>) {
    let (width, height) = gray.dimensions();
    let (w, h, i) = (width as usize, height as usize, index as usize);
    let raw = gray.as_raw();
    buf.clear();

    match side {
        Side::Top => buf.extend((0..h).map(|y| raw[y * w + i])),
        Side::Bottom => buf.extend((0..h).rev().map(|y| raw[y * w + i])),
        Side::Left => buf.extend_from_slice(&raw[i * w..(i + 1) * w]),
        Side::Right => buf.extend(raw[i * w..(i + 1) * w].iter().rev()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{GrayImage, Luma};

    pub const PAGE: u8 = 240;
    pub const BED: u8 = 25;

    /// Page of `PAGE` brightness with a solid `BED` band on top
    pub fn top_band(width: u32, height: u32, band: u32) -> GrayImage {
        let mut gray = GrayImage::from_pixel(width, height, Luma([PAGE]));
        for y in 0..band.min(height) {
            for x in 0..width {
                gray.put_pixel(x, y, Luma([BED]));
            }
        }
        gray
    }

    /// Page with a left band whose width grows linearly from `from` to `to` down the page
    pub fn slanted_left_band(width: u32, height: u32, from: u32, to: u32) -> GrayImage {
        let mut gray = GrayImage::from_pixel(width, height, Luma([PAGE]));
        for y in 0..height {
            let band = from + (to - from) * y / height.max(1);
            for x in 0..band.min(width) {
                gray.put_pixel(x, y, Luma([BED]));
            }
        }
        gray
    }
}

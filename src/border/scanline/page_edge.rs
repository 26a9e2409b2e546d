//! Page-edge sustained-run strategy
//!
//! Walks from the edge inward. After a dark pixel has been seen, the border
//! ends at the first run of `sustained_run` consecutive white pixels;
//! shorter bright runs inside the dark border are sensor noise.

use image::GrayImage;

use super::{scan_side, ScanlineDetector};
use crate::border::options::BorderOptions;
use crate::border::types::{ScanlineBoundary, Side, Thresholds};

/// Edge-inward dark-run detector
pub struct PageEdgeDetector<'a> {
    options: &'a BorderOptions,
}

impl<'a> PageEdgeDetector<'a> {
    pub fn new(options: &'a BorderOptions) -> Self {
        Self { options }
    }

    fn scan_line(&self, line: &[u8], limit: usize, thresholds: &Thresholds) -> Option<u32> {
        // Starts bright: the page reaches the edge on this line
        if line.first().map_or(true, |&v| thresholds.is_white(v)) {
            return None;
        }

        let sustained = self.options.sustained_run as usize;
        let mut seen_dark = false;
        let mut run = 0usize;
        let mut run_start = 0usize;

        for (i, &v) in line.iter().enumerate() {
            if thresholds.is_white(v) {
                if run == 0 {
                    if i > limit {
                        break;
                    }
                    run_start = i;
                }
                run += 1;
                if run >= sustained {
                    return seen_dark.then_some(run_start as u32);
                }
            } else {
                if i >= limit {
                    break;
                }
                run = 0;
                seen_dark |= thresholds.is_dark(v);
            }
        }

        None
    }
}

impl ScanlineDetector for PageEdgeDetector<'_> {
    fn detect(&self, gray: &GrayImage, side: Side, thresholds: &Thresholds) -> ScanlineBoundary {
        let (width, height) = gray.dimensions();
        let limit = self.options.scan_limit(side.depth(width, height)) as usize;

        scan_side(gray, side, |line| self.scan_line(line, limit, thresholds))
    }
}

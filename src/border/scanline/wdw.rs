//! Edge-in white-dark-white (WDW) strategy
//!
//! Walking from the edge inward: an optional short bright lip, a sustained
//! dark run (the scanner bed), then a sustained bright run (the page
//! margin). The start of that bright run is the boundary.
//!
//! Levels come from percentiles of the side's own outer band instead of the
//! global thresholds, so a side lit differently from the page center is
//! still classified correctly.

use image::GrayImage;
use tracing::trace;

use super::{fill_scanline, scan_side, ScanlineDetector};
use crate::border::options::BorderOptions;
use crate::border::types::{ScanlineBoundary, Side, Thresholds};

/// Scanlines sampled when building the edge-band histogram
const HISTOGRAM_SAMPLES: u32 = 200;

/// Fraction of the dark/bright contrast used as a guard on each level
const LEVEL_MARGIN: f32 = 0.35;

/// Per-side brightness levels
#[derive(Debug, Clone, Copy, PartialEq)]
struct SideLevels {
    /// At or below: scanner bed
    dark_cut: f32,
    /// At or above: page
    bright_cut: f32,
}

/// Edge-in WDW detector
pub struct WdwDetector<'a> {
    options: &'a BorderOptions,
}

impl<'a> WdwDetector<'a> {
    pub fn new(options: &'a BorderOptions) -> Self {
        Self { options }
    }

    /// Percentile levels of the side, `None` when it has too little contrast.
    ///
    /// The bright level comes from the whole edge band. The dark level comes
    /// only from the outermost `wdw_max_lip + wdw_min_dark_run` pixels of each
    /// scanline: any line this strategy can accept has its bed there, so a
    /// thin bed on a large page still reaches the dark percentile.
    fn side_levels(&self, gray: &GrayImage, side: Side) -> Option<SideLevels> {
        let (width, height) = gray.dimensions();
        let count = side.scanline_count(width, height);
        let band = self.options.edge_band(side.depth(width, height)).max(1) as usize;
        let outer = ((self.options.wdw_max_lip + self.options.wdw_min_dark_run) as usize).clamp(1, band);
        if count == 0 {
            return None;
        }

        let step = (count / HISTOGRAM_SAMPLES).max(1);
        let mut band_hist = Histogram::default();
        let mut outer_hist = Histogram::default();
        let mut line = Vec::new();

        for index in (0..count).step_by(step as usize) {
            fill_scanline(gray, side, index, &mut line);
            for (d, &v) in line.iter().take(band).enumerate() {
                band_hist.add(v);
                if d < outer {
                    outer_hist.add(v);
                }
            }
        }

        let dark = outer_hist.percentile(self.options.dark_percentile) as f32;
        let bright = band_hist.percentile(self.options.bright_percentile) as f32;
        let contrast = bright - dark;

        trace!(%side, dark, bright, contrast, "WDW side levels");

        if contrast < self.options.wdw_min_contrast {
            return None;
        }

        Some(SideLevels {
            dark_cut: dark + LEVEL_MARGIN * contrast,
            bright_cut: bright - LEVEL_MARGIN * contrast,
        })
    }

    fn scan_line(&self, line: &[u8], limit: usize, levels: SideLevels) -> Option<u32> {
        let is_bright = |v: u8| v as f32 >= levels.bright_cut;
        let is_dark = |v: u8| v as f32 <= levels.dark_cut;

        // Outer lip
        let lip = line.iter().take_while(|&&v| is_bright(v)).count();
        if lip == line.len() || lip > self.options.wdw_max_lip as usize {
            return None;
        }

        let min_dark = self.options.wdw_min_dark_run as usize;
        let min_bright = self.options.wdw_min_bright_run as usize;

        let mut dark_run = 0usize;
        let mut longest_dark = 0usize;
        let mut bright_run = 0usize;
        let mut run_start = 0usize;

        for (i, &v) in line.iter().enumerate().skip(lip) {
            if is_bright(v) {
                if bright_run == 0 {
                    if i > limit {
                        break;
                    }
                    run_start = i;
                }
                dark_run = 0;
                bright_run += 1;
                if bright_run >= min_bright {
                    if longest_dark >= min_dark {
                        return Some(run_start as u32);
                    }
                    // Bright run with no bed before it: the page starts here
                    return None;
                }
            } else {
                if i >= limit {
                    break;
                }
                bright_run = 0;
                if is_dark(v) {
                    dark_run += 1;
                    longest_dark = longest_dark.max(dark_run);
                } else {
                    dark_run = 0;
                }
            }
        }

        None
    }
}

impl ScanlineDetector for WdwDetector<'_> {
    fn detect(&self, gray: &GrayImage, side: Side, _thresholds: &Thresholds) -> ScanlineBoundary {
        let (width, height) = gray.dimensions();
        let count = side.scanline_count(width, height) as usize;

        let Some(levels) = self.side_levels(gray, side) else {
            return ScanlineBoundary::empty(side, count);
        };
        let limit = self.options.scan_limit(side.depth(width, height)) as usize;

        scan_side(gray, side, |line| self.scan_line(line, limit, levels))
    }
}

/// 256-bin luma histogram
struct Histogram {
    bins: [u64; 256],
    total: u64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            bins: [0; 256],
            total: 0,
        }
    }
}

impl Histogram {
    fn add(&mut self, value: u8) {
        self.bins[value as usize] += 1;
        self.total += 1;
    }

    /// Smallest value with at least `pct` percent of the samples at or below it
    fn percentile(&self, pct: f32) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let target = ((pct.clamp(0.0, 100.0) / 100.0) * self.total as f32).ceil().max(1.0) as u64;
        let mut seen = 0u64;
        for (value, &n) in self.bins.iter().enumerate() {
            seen += n;
            if seen >= target {
                return value as u8;
            }
        }
        255
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use image::Luma;

    fn thresholds() -> Thresholds {
        Thresholds {
            white_threshold: 200.0,
            dark_threshold: 80.0,
        }
    }

    fn levels() -> SideLevels {
        SideLevels {
            dark_cut: 100.0,
            bright_cut: 170.0,
        }
    }

    fn line(lip: usize, border: usize, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| if i >= lip && i < lip + border { BED } else { PAGE })
            .collect()
    }

    #[test]
    fn test_percentile() {
        let mut h = Histogram::default();
        for _ in 0..50 {
            h.add(10);
            h.add(200);
        }
        assert_eq!(h.percentile(5.0), 10);
        assert_eq!(h.percentile(50.0), 10);
        assert_eq!(h.percentile(51.0), 200);
        assert_eq!(h.percentile(90.0), 200);
        assert_eq!(Histogram::default().percentile(90.0), 0);
    }

    #[test]
    fn test_plain_border() {
        let options = BorderOptions::default();
        let d = WdwDetector::new(&options);
        assert_eq!(d.scan_line(&line(0, 40, 300), 120, levels()), Some(40));
    }

    #[test]
    fn test_short_lip_is_consumed() {
        let options = BorderOptions::default();
        let d = WdwDetector::new(&options);
        assert_eq!(d.scan_line(&line(3, 40, 300), 120, levels()), Some(43));
    }

    #[test]
    fn test_long_lip_means_page() {
        let options = BorderOptions::default();
        let d = WdwDetector::new(&options);
        assert_eq!(d.scan_line(&line(20, 40, 300), 120, levels()), None);
    }

    #[test]
    fn test_short_dark_run_rejected() {
        let options = BorderOptions::default();
        let d = WdwDetector::new(&options);
        assert_eq!(d.scan_line(&line(0, 2, 300), 120, levels()), None);
    }

    #[test]
    fn test_detect_top_band() {
        let gray = top_band(120, 300, 40);
        let options = BorderOptions::default();
        let b = WdwDetector::new(&options).detect(&gray, Side::Top, &thresholds());
        assert_eq!(b.valid_count(), 120);
        assert_eq!(b.median(), Some(40));
    }

    #[test]
    fn test_low_contrast_side_reports_nothing() {
        let gray = GrayImage::from_pixel(100, 100, Luma([PAGE]));
        let options = BorderOptions::default();
        let b = WdwDetector::new(&options).detect(&gray, Side::Left, &thresholds());
        assert_eq!(b.len(), 100);
        assert_eq!(b.valid_count(), 0);
    }

    #[test]
    fn test_thin_band_on_large_page() {
        // A 12px bed is under 2% of the 25% edge band of a 2480x3508 page
        let gray = top_band(2480, 3508, 12);
        let options = BorderOptions::default();
        let b = WdwDetector::new(&options).detect(&gray, Side::Top, &thresholds());
        assert_eq!(b.valid_count(), 2480);
        assert_eq!(b.median(), Some(12));
    }

    #[test]
    fn test_dark_level_from_outer_pixels() {
        let gray = top_band(300, 1600, 10);
        let options = BorderOptions::default();
        let levels = WdwDetector::new(&options).side_levels(&gray, Side::Top);
        let levels = levels.expect("bed at the edge gives contrast");
        assert!(levels.dark_cut < 110.0);
        assert!(levels.bright_cut > 160.0);

        // Left edge is page except for the 10 bed rows
        assert_eq!(WdwDetector::new(&options).side_levels(&gray, Side::Left), None);
    }
}

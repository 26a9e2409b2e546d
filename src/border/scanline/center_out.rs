//! Center-out text-to-white (TW) strategy
//!
//! Reasons from what a page must look like rather than from raw brightness
//! jumps: walking from the middle of the scanline toward the edge we first
//! need text, then a sustained white margin. The margin ends where a
//! sustained dark run begins; that point is the boundary. Text resuming
//! after a white run means the white run was an interior gap (between
//! paragraphs or columns) and the search goes on.
//!
//! Lines where no margin is ever reached, or where the margin runs all the
//! way to the edge, report no boundary. That includes scanlines that never
//! cross text, such as blank columns beside the text block. Once the side
//! is accepted, [`BorderVerifier::fill_dark_scanlines`] completes those from
//! their own dark run, so a slanted bed is still whitened at both ends.
//!
//! [`BorderVerifier::fill_dark_scanlines`]: crate::border::BorderVerifier::fill_dark_scanlines

use image::GrayImage;

use super::{scan_side, ScanlineDetector};
use crate::border::options::BorderOptions;
use crate::border::types::{PixelClass, ScanlineBoundary, Side, Thresholds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for a sustained non-white run
    SeekText,
    /// Text seen, waiting for a sustained white run
    SeekWhite,
    /// Inside a white margin, waiting for the border
    Margin,
}

/// Center-out TW detector
pub struct CenterOutDetector<'a> {
    options: &'a BorderOptions,
}

impl<'a> CenterOutDetector<'a> {
    pub fn new(options: &'a BorderOptions) -> Self {
        Self { options }
    }

    fn scan_line(&self, line: &[u8], limit: usize, thresholds: &Thresholds) -> Option<u32> {
        if line.len() < 2 {
            return None;
        }

        let sustained_text = self.options.sustained_text as usize;
        let sustained_run = self.options.sustained_run as usize;

        let mut phase = Phase::SeekText;
        let mut content_run = 0usize;
        let mut white_run = 0usize;
        // Outermost white pixel of the current margin
        let mut margin_outer = 0usize;
        // Non-white run inside the margin
        let mut pending = 0usize;
        let mut pending_dark = 0usize;

        let accept = |outer: usize| (outer > 0 && outer <= limit).then_some(outer as u32);

        for i in (0..=line.len() / 2).rev() {
            let class = thresholds.classify(line[i]);

            match phase {
                Phase::SeekText => {
                    if class == PixelClass::White {
                        content_run = 0;
                    } else {
                        content_run += 1;
                        if content_run >= sustained_text {
                            phase = Phase::SeekWhite;
                            white_run = 0;
                        }
                    }
                }
                Phase::SeekWhite => {
                    if class == PixelClass::White {
                        white_run += 1;
                        if white_run >= sustained_run {
                            phase = Phase::Margin;
                            margin_outer = i;
                            pending = 0;
                            pending_dark = 0;
                        }
                    } else {
                        white_run = 0;
                    }
                }
                Phase::Margin => {
                    if class == PixelClass::White {
                        if pending >= sustained_text {
                            // Text again: that white run was a gap inside the content
                            phase = Phase::SeekWhite;
                            white_run = 1;
                        } else {
                            margin_outer = i;
                        }
                        pending = 0;
                        pending_dark = 0;
                    } else {
                        pending += 1;
                        if class == PixelClass::Dark {
                            pending_dark += 1;
                            if pending_dark >= sustained_run {
                                return accept(margin_outer);
                            }
                        }
                    }
                }
            }
        }

        // Edge reached inside the margin: a short border touching the edge
        // still counts when it is mostly dark
        if phase == Phase::Margin && pending > 0 && pending_dark * 2 >= pending {
            return accept(margin_outer);
        }

        None
    }
}

impl ScanlineDetector for CenterOutDetector<'_> {
    fn detect(&self, gray: &GrayImage, side: Side, thresholds: &Thresholds) -> ScanlineBoundary {
        let (width, height) = gray.dimensions();
        let limit = self.options.scan_limit(side.depth(width, height)) as usize;

        scan_side(gray, side, |line| self.scan_line(line, limit, thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use image::{GrayImage, Luma};

    const TEXT: u8 = 120;

    fn thresholds() -> Thresholds {
        Thresholds {
            white_threshold: 200.0,
            dark_threshold: 80.0,
        }
    }

    /// Edge-first line: `border` dark, `margin` white, then text lines to the middle and beyond
    fn page_line(border: usize, margin: usize, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| {
                if i < border {
                    BED
                } else if i < border + margin {
                    PAGE
                } else if (i - border - margin) % 14 < 6 {
                    TEXT
                } else {
                    PAGE
                }
            })
            .collect()
    }

    #[test]
    fn test_text_margin_border() {
        let options = BorderOptions::default();
        let d = CenterOutDetector::new(&options);
        let line = page_line(30, 60, 400);
        assert_eq!(d.scan_line(&line, 160, &thresholds()), Some(30));
    }

    #[test]
    fn test_interior_gap_is_skipped() {
        let options = BorderOptions::default();
        let d = CenterOutDetector::new(&options);
        let mut line = page_line(30, 40, 400);
        // Wide paragraph gap between the middle and the margin
        line[120..150].fill(PAGE);
        assert_eq!(d.scan_line(&line, 160, &thresholds()), Some(30));
    }

    #[test]
    fn test_margin_to_edge_has_no_border() {
        let options = BorderOptions::default();
        let d = CenterOutDetector::new(&options);
        let line = page_line(0, 60, 400);
        assert_eq!(d.scan_line(&line, 160, &thresholds()), None);
    }

    #[test]
    fn test_blank_and_dark_lines() {
        let options = BorderOptions::default();
        let d = CenterOutDetector::new(&options);
        assert_eq!(d.scan_line(&[PAGE; 300], 120, &thresholds()), None);
        assert_eq!(d.scan_line(&[BED; 300], 120, &thresholds()), None);
    }

    #[test]
    fn test_short_border_at_edge() {
        let options = BorderOptions::default();
        let d = CenterOutDetector::new(&options);
        let line = page_line(5, 60, 400);
        assert_eq!(d.scan_line(&line, 160, &thresholds()), Some(5));
    }

    #[test]
    fn test_detect_left_side_of_text_page() {
        let mut gray = GrayImage::from_pixel(300, 200, Luma([PAGE]));
        for y in 0..200 {
            for x in 0..25 {
                gray.put_pixel(x, y, Luma([BED]));
            }
            for x in 80..260 {
                if x % 14 < 6 {
                    gray.put_pixel(x, y, Luma([TEXT]));
                }
            }
        }

        let options = BorderOptions::default();
        let b = CenterOutDetector::new(&options).detect(&gray, Side::Left, &thresholds());
        assert_eq!(b.valid_count(), 200);
        assert_eq!(b.median(), Some(25));
    }
}

//! Candidate border verification
//!
//! A candidate width only becomes a border when the inner part of the
//! candidate band actually contains scanner-bed pixels. The outer slice is
//! skipped so anti-aliased or copier-lit edge lips do not count as evidence.
//! A wide but uniformly white margin fails here and is never whitened.

use image::GrayImage;
use tracing::debug;

use super::options::BorderOptions;
use super::types::{ScanlineBoundary, SideReport, SideStatus, Thresholds};

/// Verifies per-side candidate widths
pub struct BorderVerifier;

impl BorderVerifier {
    /// Verify the candidate from `boundary` and report the outcome.
    ///
    /// `verified_width` is 0 unless the status is [`SideStatus::Accepted`].
    pub fn verify(
        gray: &GrayImage,
        boundary: &ScanlineBoundary,
        thresholds: &Thresholds,
        options: &BorderOptions,
    ) -> SideReport {
        let side = boundary.side;
        let mut report = SideReport::none(side);
        report.valid_ratio = boundary.valid_ratio();

        let Some(candidate) = boundary.median() else {
            return report;
        };
        report.candidate_width = candidate;

        if report.valid_ratio < options.min_valid_ratio {
            report.status = SideStatus::SparseDetection;
            debug!(
                %side,
                valid_ratio = report.valid_ratio,
                min = options.min_valid_ratio,
                "Too few scanlines with a boundary"
            );
            return report;
        }

        report.dark_fraction = Self::inner_dark_fraction(gray, boundary, candidate, thresholds, options);

        if report.dark_fraction < options.min_dark_fraction {
            report.status = SideStatus::NoDarkEvidence;
            debug!(
                %side,
                candidate,
                dark_fraction = report.dark_fraction,
                "Candidate band has no scanner-bed evidence"
            );
            return report;
        }

        report.status = SideStatus::Accepted;
        report.verified_width = candidate;
        report
    }

    /// Complete scanlines without a boundary that start with scanner bed.
    ///
    /// The dark run from the edge becomes the boundary when it ends inside
    /// the scan limit. A run that reaches the limit (page corners under a
    /// perpendicular border, dark all the way) takes `width` instead.
    /// Scanlines starting on a non-dark pixel stay empty.
    pub fn fill_dark_scanlines(
        gray: &GrayImage,
        boundary: &ScanlineBoundary,
        width: u32,
        thresholds: &Thresholds,
        options: &BorderOptions,
    ) -> ScanlineBoundary {
        let side = boundary.side;
        let (w, h) = gray.dimensions();
        let depth = side.depth(w, h);
        if width == 0 || depth == 0 {
            return boundary.clone();
        }
        let limit = options.scan_limit(depth).min(depth);

        let offsets = boundary
            .offsets
            .iter()
            .enumerate()
            .map(|(index, offset)| {
                if offset.is_some() {
                    return *offset;
                }
                let run = (0..limit)
                    .take_while(|&d| {
                        let (x, y) = side.to_xy(w, h, index as u32, d);
                        thresholds.is_dark(gray.get_pixel(x, y).0[0])
                    })
                    .count() as u32;
                match run {
                    0 => None,
                    r if r >= limit => Some(width.min(depth)),
                    r => Some(r),
                }
            })
            .collect();

        ScanlineBoundary::new(side, offsets)
    }

    /// Outer slice skipped before sampling a band of `candidate` pixels
    pub fn skip_for(candidate: u32, options: &BorderOptions) -> u32 {
        let by_fraction = (candidate as f32 * options.verify_skip_fraction).round() as u32;
        by_fraction
            .min(options.edge_inset)
            .min(candidate.saturating_sub(1))
    }

    /// Fraction of dark pixels in `[skip, candidate)` across every scanline
    fn inner_dark_fraction(
        gray: &GrayImage,
        boundary: &ScanlineBoundary,
        candidate: u32,
        thresholds: &Thresholds,
        options: &BorderOptions,
    ) -> f32 {
        let side = boundary.side;
        let (width, height) = gray.dimensions();
        let depth = side.depth(width, height);
        let end = candidate.min(depth);
        let start = Self::skip_for(candidate, options).min(end);
        if start >= end {
            return 0.0;
        }

        let mut dark = 0u64;
        let mut total = 0u64;
        for index in 0..side.scanline_count(width, height) {
            for offset in start..end {
                let (x, y) = side.to_xy(width, height, index, offset);
                if thresholds.is_dark(gray.get_pixel(x, y).0[0]) {
                    dark += 1;
                }
                total += 1;
            }
        }

        if total == 0 {
            0.0
        } else {
            dark as f32 / total as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::border::types::Side;
    use image::Luma;

    fn thresholds() -> Thresholds {
        Thresholds {
            white_threshold: 200.0,
            dark_threshold: 80.0,
        }
    }

    fn full(side: Side, n: usize, value: u32) -> ScanlineBoundary {
        ScanlineBoundary::new(side, vec![Some(value); n])
    }

    #[test]
    fn test_skip_for() {
        let options = BorderOptions::default();
        assert_eq!(BorderVerifier::skip_for(20, &options), 4);
        assert_eq!(BorderVerifier::skip_for(200, &options), 10);
        assert_eq!(BorderVerifier::skip_for(1, &options), 0);
        assert_eq!(BorderVerifier::skip_for(0, &options), 0);
    }

    #[test]
    fn test_dark_band_accepted() {
        let mut gray = GrayImage::from_pixel(100, 200, Luma([240]));
        for y in 0..30 {
            for x in 0..100 {
                gray.put_pixel(x, y, Luma([20]));
            }
        }
        let report = BorderVerifier::verify(
            &gray,
            &full(Side::Top, 100, 30),
            &thresholds(),
            &BorderOptions::default(),
        );
        assert_eq!(report.status, SideStatus::Accepted);
        assert_eq!(report.verified_width, 30);
        assert!(report.dark_fraction > 0.99);
    }

    #[test]
    fn test_white_margin_rejected() {
        let gray = GrayImage::from_pixel(100, 200, Luma([240]));
        let report = BorderVerifier::verify(
            &gray,
            &full(Side::Left, 200, 60),
            &thresholds(),
            &BorderOptions::default(),
        );
        assert_eq!(report.status, SideStatus::NoDarkEvidence);
        assert_eq!(report.candidate_width, 60);
        assert_eq!(report.verified_width, 0);
    }

    #[test]
    fn test_dark_lip_only_rejected() {
        // Only the outer 3px are dark; the sampled inner band is white
        let mut gray = GrayImage::from_pixel(100, 200, Luma([240]));
        for y in 0..200 {
            for x in 0..3 {
                gray.put_pixel(x, y, Luma([10]));
            }
        }
        let report = BorderVerifier::verify(
            &gray,
            &full(Side::Left, 200, 50),
            &thresholds(),
            &BorderOptions::default(),
        );
        assert_eq!(report.status, SideStatus::NoDarkEvidence);
    }

    #[test]
    fn test_fill_dark_corner_scanlines() {
        // Top border 20, left border 10: the first 10 columns are dark all the way down
        let gray = GrayImage::from_fn(60, 80, |x, y| {
            if y < 20 || x < 10 {
                Luma([15])
            } else {
                Luma([240])
            }
        });
        let mut offsets = vec![Some(20); 60];
        for o in offsets.iter_mut().take(10) {
            *o = None;
        }
        offsets[30] = None;
        let boundary = ScanlineBoundary::new(Side::Top, offsets);

        let filled =
            BorderVerifier::fill_dark_scanlines(&gray, &boundary, 20, &thresholds(), &BorderOptions::default());
        assert_eq!(filled.valid_count(), 60);
        assert_eq!(filled.offsets[0], Some(20));
        assert_eq!(filled.offsets[30], Some(20));
    }

    #[test]
    fn test_fill_follows_own_dark_run() {
        // Bed depth varies per column; only a few columns have a boundary
        let bed = |x: u32| 5 + x / 2;
        let gray = GrayImage::from_fn(100, 300, |x, y| if y < bed(x) { Luma([15]) } else { Luma([240]) });
        let mut offsets = vec![None; 100];
        offsets[50] = Some(bed(50));
        let boundary = ScanlineBoundary::new(Side::Top, offsets);

        let filled =
            BorderVerifier::fill_dark_scanlines(&gray, &boundary, 30, &thresholds(), &BorderOptions::default());
        assert_eq!(filled.valid_count(), 100);
        // Shallow end: 5px of bed, far less than half of the verified 30
        assert_eq!(filled.offsets[0], Some(5));
        // Deep end: past the verified width
        assert_eq!(filled.offsets[99], Some(54));
    }

    #[test]
    fn test_fill_skips_bright_scanlines() {
        let gray = GrayImage::from_pixel(40, 40, Luma([240]));
        let boundary = ScanlineBoundary::empty(Side::Left, 40);
        let filled =
            BorderVerifier::fill_dark_scanlines(&gray, &boundary, 15, &thresholds(), &BorderOptions::default());
        assert_eq!(filled.valid_count(), 0);
    }

    #[test]
    fn test_sparse_detection() {
        let gray = GrayImage::from_pixel(100, 100, Luma([20]));
        let mut offsets = vec![None; 100];
        for o in offsets.iter_mut().take(30) {
            *o = Some(20);
        }
        let report = BorderVerifier::verify(
            &gray,
            &ScanlineBoundary::new(Side::Right, offsets),
            &thresholds(),
            &BorderOptions::default(),
        );
        assert_eq!(report.status, SideStatus::SparseDetection);
        assert_eq!(report.verified_width, 0);
    }

    #[test]
    fn test_no_candidate() {
        let gray = GrayImage::from_pixel(10, 10, Luma([20]));
        let report = BorderVerifier::verify(
            &gray,
            &ScanlineBoundary::empty(Side::Bottom, 10),
            &thresholds(),
            &BorderOptions::default(),
        );
        assert_eq!(report.status, SideStatus::NoCandidate);
        assert_eq!(report.candidate_width, 0);
    }
}

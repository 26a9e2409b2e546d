//! Border removal pipeline
//!
//! `Image -> ThresholdEstimator -> ScanlineDetector x4 -> BorderVerifier ->
//! MaskBuilder -> Whitener`, or the grid analyzer in place of the middle
//! three stages. In-memory operations never fail; only file I/O does.

use image::{DynamicImage, GenericImageView, GrayImage};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::grid::GridAnalyzer;
use super::mask::MaskBuilder;
use super::options::BorderOptions;
use super::scanline::{detect_side, detector_for};
use super::threshold::ThresholdEstimator;
use super::types::{
    BorderError, BorderMask, BorderReport, Result, ScanlineBoundary, Side, SideReport, Thresholds,
};
use super::verify::BorderVerifier;
use super::whiten::Whitener;

/// Analysis result for one page, before painting
#[derive(Debug, Clone)]
pub struct BorderDetection {
    pub thresholds: Thresholds,
    /// Smoothed per-side boundaries (empty for the grid strategy)
    pub boundaries: Vec<ScanlineBoundary>,
    /// Masks of accepted sides only
    pub masks: Vec<BorderMask>,
    /// One report per side, Top, Bottom, Left, Right
    pub sides: Vec<SideReport>,
}

impl BorderDetection {
    /// Detection with nothing found
    fn none(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            boundaries: Vec::new(),
            masks: Vec::new(),
            sides: Side::all().iter().map(|&s| SideReport::none(s)).collect(),
        }
    }
}

/// Outcome of one page in a batch
#[derive(Debug, Clone, Serialize)]
pub struct PageOutcome {
    /// 1-based position in the batch
    pub page_index: usize,
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BorderReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Scanned-page border remover
pub struct BorderRemover;

impl BorderRemover {
    /// Detect borders on a grayscale page without modifying it
    pub fn detect(gray: &GrayImage, options: &BorderOptions) -> BorderDetection {
        let (width, height) = gray.dimensions();
        let thresholds = ThresholdEstimator::estimate(gray, options);

        if width == 0 || height == 0 {
            return BorderDetection::none(thresholds);
        }

        debug!(
            width,
            height,
            white = thresholds.white_threshold,
            dark = thresholds.dark_threshold,
            strategy = %options.strategy,
            "Estimated thresholds"
        );

        match detector_for(options) {
            Some(detector) => {
                let mut detection = BorderDetection::none(thresholds);
                detection.sides.clear();

                for side in Side::all() {
                    let boundary = detect_side(detector.as_ref(), gray, side, &thresholds, options);
                    let report = BorderVerifier::verify(gray, &boundary, &thresholds, options);

                    debug!(
                        %side,
                        candidate = report.candidate_width,
                        verified = report.verified_width,
                        valid_ratio = report.valid_ratio,
                        dark_fraction = report.dark_fraction,
                        status = ?report.status,
                        "Side verified"
                    );

                    let boundary = if report.is_accepted() {
                        let filled = BorderVerifier::fill_dark_scanlines(
                            gray,
                            &boundary,
                            report.verified_width,
                            &thresholds,
                            options,
                        );
                        let mask = MaskBuilder::build(&filled, width, height, options);
                        if !mask.is_empty() {
                            detection.masks.push(mask);
                        }
                        filled
                    } else {
                        boundary
                    };
                    detection.sides.push(report);
                    detection.boundaries.push(boundary);
                }

                detection
            }
            None => {
                let mut masks = GridAnalyzer::analyze(gray, &thresholds, options);
                let sides = masks
                    .iter_mut()
                    .map(|mask| GridAnalyzer::verify(gray, mask, &thresholds, options))
                    .collect();
                masks.retain(|m| !m.is_empty());

                BorderDetection {
                    thresholds,
                    boundaries: Vec::new(),
                    masks,
                    sides,
                }
            }
        }
    }

    /// Remove borders from `image` in place.
    ///
    /// Dimensions and channel layout are preserved; an empty image is left untouched.
    pub fn remove_in_place(image: &mut DynamicImage, options: &BorderOptions) -> BorderReport {
        let gray = image.to_luma8();
        let detection = Self::detect(&gray, options);
        let size = image.dimensions();

        let mut report = BorderReport {
            image_size: size,
            strategy: options.strategy,
            thresholds: detection.thresholds,
            sides: detection.sides,
        };

        if size.0 == 0 || size.1 == 0 || detection.masks.is_empty() {
            return report;
        }

        for (side, painted) in Whitener::apply(image, &detection.masks, options) {
            if let Some(s) = report.sides.iter_mut().find(|s| s.side == side) {
                s.painted_pixels = painted;
            }
        }

        info!(
            top = report.width(Side::Top),
            bottom = report.width(Side::Bottom),
            left = report.width(Side::Left),
            right = report.width(Side::Right),
            painted = report.painted_pixels(),
            "Borders removed"
        );

        report
    }

    /// Remove borders from a copy of `image`
    pub fn remove(image: &DynamicImage, options: &BorderOptions) -> (DynamicImage, BorderReport) {
        let mut output = image.clone();
        let report = Self::remove_in_place(&mut output, options);
        (output, report)
    }

    /// Remove borders from an image file and save the result
    pub fn process_file(input: &Path, output: &Path, options: &BorderOptions) -> Result<BorderReport> {
        options.validate()?;

        if !input.exists() {
            return Err(BorderError::ImageNotFound(input.to_path_buf()));
        }

        let mut image = image::open(input).map_err(|e| BorderError::InvalidImage(e.to_string()))?;
        let report = Self::remove_in_place(&mut image, options);

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        image
            .save(output)
            .map_err(|e| BorderError::InvalidImage(e.to_string()))?;

        Ok(report)
    }

    /// Process `(input, output)` pairs in parallel
    pub fn process_batch(pairs: &[(PathBuf, PathBuf)], options: &BorderOptions) -> Vec<PageOutcome> {
        Self::process_batch_with_progress(pairs, options, |_| {})
    }

    /// Process pairs in parallel, calling `on_page` as each page finishes.
    ///
    /// A failing page yields an outcome with `error` set; the batch continues.
    pub fn process_batch_with_progress<F>(
        pairs: &[(PathBuf, PathBuf)],
        options: &BorderOptions,
        on_page: F,
    ) -> Vec<PageOutcome>
    where
        F: Fn(&PageOutcome) + Sync,
    {
        pairs
            .par_iter()
            .enumerate()
            .map(|(idx, (input, output))| {
                let outcome = match Self::process_file(input, output, options) {
                    Ok(report) => PageOutcome {
                        page_index: idx + 1,
                        input: input.clone(),
                        output: output.clone(),
                        report: Some(report),
                        error: None,
                    },
                    Err(e) => {
                        warn!(input = %input.display(), error = %e, "Page failed");
                        PageOutcome {
                            page_index: idx + 1,
                            input: input.clone(),
                            output: output.clone(),
                            report: None,
                            error: Some(e.to_string()),
                        }
                    }
                };
                on_page(&outcome);
                outcome
            })
            .collect()
    }
}

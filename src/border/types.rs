//! Common types for the border module

use image::{GrayImage, Luma};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use super::options::DetectionStrategy;

/// Border error types
#[derive(Debug, Error)]
pub enum BorderError {
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid border options: {0}")]
    InvalidOptions(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BorderError>;

// ============================================================
// Side
// ============================================================

/// Page side a border can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// All sides, in compositing order
    pub fn all() -> [Side; 4] {
        [Side::Top, Side::Bottom, Side::Left, Side::Right]
    }

    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// Whether scanlines for this side are columns (top/bottom) or rows (left/right)
    pub fn scans_columns(&self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }

    /// Number of scanlines for an image of the given size
    pub fn scanline_count(&self, width: u32, height: u32) -> u32 {
        if self.scans_columns() {
            width
        } else {
            height
        }
    }

    /// Length of each scanline (distance from this edge to the opposite one)
    pub fn depth(&self, width: u32, height: u32) -> u32 {
        if self.scans_columns() {
            height
        } else {
            width
        }
    }

    /// Map (scanline index, offset from this edge) to image coordinates.
    ///
    /// Callers guarantee `offset < depth` and `index < scanline_count`.
    #[inline]
    pub fn to_xy(&self, width: u32, height: u32, index: u32, offset: u32) -> (u32, u32) {
        match self {
            Side::Top => (index, offset),
            Side::Bottom => (index, height - 1 - offset),
            Side::Left => (offset, index),
            Side::Right => (width - 1 - offset, index),
        }
    }

    /// Distance of pixel (x, y) from this edge
    #[inline]
    pub fn distance(&self, width: u32, height: u32, x: u32, y: u32) -> u32 {
        match self {
            Side::Top => y,
            Side::Bottom => height - 1 - y,
            Side::Left => x,
            Side::Right => width - 1 - x,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================
// Thresholds
// ============================================================

/// Brightness levels derived once per image
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    /// Pixels at or above this level count as page white
    pub white_threshold: f32,
    /// Pixels at or below this level count as scanner bed
    pub dark_threshold: f32,
}

/// Per-pixel brightness class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelClass {
    Dark,
    Text,
    White,
}

impl Thresholds {
    /// Classify a luma value
    #[inline]
    pub fn classify(&self, value: u8) -> PixelClass {
        let v = value as f32;
        if v >= self.white_threshold {
            PixelClass::White
        } else if v <= self.dark_threshold {
            PixelClass::Dark
        } else {
            PixelClass::Text
        }
    }

    #[inline]
    pub fn is_white(&self, value: u8) -> bool {
        value as f32 >= self.white_threshold
    }

    #[inline]
    pub fn is_dark(&self, value: u8) -> bool {
        value as f32 <= self.dark_threshold
    }
}

// ============================================================
// Scanline boundary
// ============================================================

/// Per-scanline content offsets for one side.
///
/// `None` means no border was found on that scanline.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanlineBoundary {
    pub side: Side,
    pub offsets: Vec<Option<u32>>,
}

impl ScanlineBoundary {
    pub fn new(side: Side, offsets: Vec<Option<u32>>) -> Self {
        Self { side, offsets }
    }

    /// Boundary with no border on any scanline
    pub fn empty(side: Side, len: usize) -> Self {
        Self {
            side,
            offsets: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Number of scanlines with a boundary
    pub fn valid_count(&self) -> usize {
        self.offsets.iter().filter(|o| o.is_some()).count()
    }

    /// Fraction of scanlines with a boundary (0.0 when empty)
    pub fn valid_ratio(&self) -> f32 {
        if self.offsets.is_empty() {
            return 0.0;
        }
        self.valid_count() as f32 / self.offsets.len() as f32
    }

    /// Median of the valid offsets (lower median for even counts)
    pub fn median(&self) -> Option<u32> {
        let mut values: Vec<u32> = self.offsets.iter().flatten().copied().collect();
        if values.is_empty() {
            return None;
        }
        values.sort_unstable();
        Some(values[(values.len() - 1) / 2])
    }

    /// Moving-median smoothing over valid entries.
    ///
    /// Entries without a boundary stay empty; each valid entry becomes the
    /// median of the valid entries inside the centered window.
    pub fn smoothed(&self, window: usize) -> Self {
        if window <= 1 || self.offsets.len() < 2 {
            return self.clone();
        }

        let half = window / 2;
        let n = self.offsets.len();
        let mut scratch = Vec::with_capacity(window);
        let offsets = (0..n)
            .map(|i| {
                self.offsets[i]?;
                scratch.clear();
                let lo = i.saturating_sub(half);
                let hi = (i + half).min(n - 1);
                scratch.extend(self.offsets[lo..=hi].iter().flatten().copied());
                scratch.sort_unstable();
                Some(scratch[scratch.len() / 2])
            })
            .collect();

        Self::new(self.side, offsets)
    }

    /// Discard boundaries that too few neighbors agree with.
    ///
    /// A valid entry survives when at least `min_agree` other valid entries
    /// within `window / 2` scanlines lie within `delta` pixels of it.
    pub fn consensus_filtered(&self, window: usize, min_agree: usize, delta: u32) -> Self {
        if min_agree == 0 {
            return self.clone();
        }

        let half = (window / 2).max(1);
        let n = self.offsets.len();
        let offsets = (0..n)
            .map(|i| {
                let value = self.offsets[i]?;
                let lo = i.saturating_sub(half);
                let hi = (i + half).min(n.saturating_sub(1));
                let agreeing = (lo..=hi)
                    .filter(|&j| j != i)
                    .filter_map(|j| self.offsets[j])
                    .filter(|other| other.abs_diff(value) <= delta)
                    .count();
                (agreeing >= min_agree).then_some(value)
            })
            .collect();

        Self::new(self.side, offsets)
    }
}

// ============================================================
// Border mask
// ============================================================

/// Mask value for pixels inside a border
pub(crate) const MASK_ON: u8 = 255;

/// Boolean mask of one side's border region, same size as the image.
///
/// Stored as a binary `GrayImage` (0 / 255) so morphology from
/// `imageproc` applies directly.
#[derive(Debug, Clone)]
pub struct BorderMask {
    pub side: Side,
    pub mask: GrayImage,
}

impl BorderMask {
    /// Empty mask
    pub fn new(side: Side, width: u32, height: u32) -> Self {
        Self {
            side,
            mask: GrayImage::new(width, height),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.mask.get_pixel(x, y).0[0] > 0
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32) {
        self.mask.put_pixel(x, y, Luma([MASK_ON]));
    }

    /// Number of pixels in the mask
    pub fn count(&self) -> usize {
        self.mask.as_raw().iter().filter(|&&v| v > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.as_raw().iter().all(|&v| v == 0)
    }

    /// Farthest distance from this side's edge covered by the mask, plus one
    pub fn depth(&self) -> u32 {
        let (width, height) = self.mask.dimensions();
        self.mask
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] > 0)
            .map(|(x, y, _)| self.side.distance(width, height, x, y) + 1)
            .max()
            .unwrap_or(0)
    }
}

// ============================================================
// Reports
// ============================================================

/// Outcome of border verification for one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SideStatus {
    /// No scanline produced a boundary
    #[default]
    NoCandidate,
    /// Too few scanlines produced a boundary
    SparseDetection,
    /// Candidate band lacks scanner-bed pixels
    NoDarkEvidence,
    /// Border accepted and masked
    Accepted,
}

/// Detection statistics for one side
#[derive(Debug, Clone, Serialize)]
pub struct SideReport {
    pub side: Side,
    /// Median boundary before verification
    pub candidate_width: u32,
    /// Accepted border width (0 unless verified)
    pub verified_width: u32,
    /// Fraction of scanlines with a boundary
    pub valid_ratio: f32,
    /// Fraction of dark pixels in the verified inner band
    pub dark_fraction: f32,
    pub status: SideStatus,
    /// Pixels painted for this side by the whitener
    pub painted_pixels: usize,
}

impl SideReport {
    /// Report for a side with nothing detected
    pub fn none(side: Side) -> Self {
        Self {
            side,
            candidate_width: 0,
            verified_width: 0,
            valid_ratio: 0.0,
            dark_fraction: 0.0,
            status: SideStatus::NoCandidate,
            painted_pixels: 0,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == SideStatus::Accepted
    }
}

/// Per-page border statistics
#[derive(Debug, Clone, Serialize)]
pub struct BorderReport {
    pub image_size: (u32, u32),
    pub strategy: DetectionStrategy,
    pub thresholds: Thresholds,
    pub sides: Vec<SideReport>,
}

impl BorderReport {
    /// Report for an image that was left untouched
    pub fn untouched(image_size: (u32, u32), strategy: DetectionStrategy, thresholds: Thresholds) -> Self {
        Self {
            image_size,
            strategy,
            thresholds,
            sides: Side::all().iter().map(|&s| SideReport::none(s)).collect(),
        }
    }

    /// Report for one side
    pub fn side(&self, side: Side) -> Option<&SideReport> {
        self.sides.iter().find(|s| s.side == side)
    }

    /// Verified width for a side (0 when not accepted)
    pub fn width(&self, side: Side) -> u32 {
        self.side(side).map(|s| s.verified_width).unwrap_or(0)
    }

    /// Total pixels painted across all sides
    pub fn painted_pixels(&self) -> usize {
        self.sides.iter().map(|s| s.painted_pixels).sum()
    }

    /// Whether any side was whitened
    pub fn has_border(&self) -> bool {
        self.sides.iter().any(|s| s.is_accepted() && s.painted_pixels > 0)
    }
}

//! Border removal options
//!
//! A single immutable value object threaded through every pipeline stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::types::{BorderError, Result, Side};

// ============================================================
// Constants
// ============================================================

/// Absolute cap on how far a scanline is searched, in pixels
const DEFAULT_MAX_BORDER_WIDTH: u32 = 1000;

/// Tolerance below the sampled page color that still counts as white
const DEFAULT_PAGE_WHITE_DELTA: f32 = 40.0;

/// Expected brightness of a scanner bed (0-255)
const DEFAULT_DARK_THRESHOLD: f32 = 80.0;

/// Consecutive white pixels that confirm a transition
const DEFAULT_SUSTAINED_RUN: u32 = 12;

/// Consecutive non-white pixels that confirm text
const DEFAULT_SUSTAINED_TEXT: u32 = 3;

/// Fraction of the page depth searched from each edge
const DEFAULT_MAX_CHECK_PERCENTAGE: f32 = 0.4;

/// Maximum outer lip skipped by verification, in pixels
const DEFAULT_EDGE_INSET: u32 = 10;

/// Fraction of the candidate band skipped by verification
const DEFAULT_VERIFY_SKIP_FRACTION: f32 = 0.2;

const DEFAULT_SMOOTHING_WINDOW: usize = 5;
const DEFAULT_MIN_VALID_RATIO: f32 = 0.7;
const DEFAULT_MIN_DARK_FRACTION: f32 = 0.12;
const DEFAULT_MASK_ERODE_PX: u8 = 2;

/// Outer fraction of the page a side's mask may cover
const DEFAULT_EDGE_PROCESS_PCT: f32 = 0.25;

const DEFAULT_NEIGHBOR_WINDOW: usize = 15;
const DEFAULT_NEIGHBOR_MIN: usize = 3;
const DEFAULT_NEIGHBOR_DELTA: u32 = 10;

const DEFAULT_PROJECTION_WINDOW: u32 = 4;
const DEFAULT_PROJECTION_BASELINE: u32 = 5;
const DEFAULT_PROJECTION_MEAN_DELTA: f32 = 40.0;
const DEFAULT_PROJECTION_STD_FLOOR: f32 = 12.0;

const DEFAULT_BRIGHT_PERCENTILE: f32 = 90.0;
const DEFAULT_DARK_PERCENTILE: f32 = 5.0;
const DEFAULT_WDW_MIN_DARK_RUN: u32 = 4;
const DEFAULT_WDW_MIN_BRIGHT_RUN: u32 = 12;
const DEFAULT_WDW_MAX_LIP: u32 = 8;
const DEFAULT_WDW_MIN_CONTRAST: f32 = 60.0;

const DEFAULT_GRID_TILE: u32 = 100;
const DEFAULT_GRID_MIN_TILE: u32 = 25;
const DEFAULT_GRID_PAGE_FRACTION: f32 = 0.5;
const DEFAULT_GRID_PATCHY_STD: f32 = 20.0;
const DEFAULT_GRID_LEAF_DARK_FRACTION: f32 = 0.2;

const WHITE: [u8; 3] = [255, 255, 255];

// ============================================================
// Strategy
// ============================================================

/// Border detection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionStrategy {
    /// Sliding-window mean/variance departure from an edge baseline
    ProjectionVariance,
    /// Edge-in walk through a dark run until a sustained white run
    PageEdge,
    /// Center-out text-to-white transition
    CenterOut,
    /// Edge-in white-dark-white with per-side percentile levels
    #[default]
    EdgeInWdw,
    /// Coarse-to-fine tile classification
    Grid,
}

impl DetectionStrategy {
    pub fn all() -> [DetectionStrategy; 5] {
        [
            DetectionStrategy::ProjectionVariance,
            DetectionStrategy::PageEdge,
            DetectionStrategy::CenterOut,
            DetectionStrategy::EdgeInWdw,
            DetectionStrategy::Grid,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            DetectionStrategy::ProjectionVariance => "projection-variance",
            DetectionStrategy::PageEdge => "page-edge",
            DetectionStrategy::CenterOut => "center-out",
            DetectionStrategy::EdgeInWdw => "edge-in-wdw",
            DetectionStrategy::Grid => "grid",
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DetectionStrategy {
    type Err = BorderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "projection-variance" | "projection" => Ok(DetectionStrategy::ProjectionVariance),
            "page-edge" => Ok(DetectionStrategy::PageEdge),
            "center-out" | "tw" => Ok(DetectionStrategy::CenterOut),
            "edge-in-wdw" | "wdw" => Ok(DetectionStrategy::EdgeInWdw),
            "grid" => Ok(DetectionStrategy::Grid),
            other => Err(BorderError::InvalidOptions(format!(
                "unknown strategy: {}",
                other
            ))),
        }
    }
}

// ============================================================
// Colors
// ============================================================

/// Whitening color per side (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideColors {
    pub top: [u8; 3],
    pub bottom: [u8; 3],
    pub left: [u8; 3],
    pub right: [u8; 3],
}

impl Default for SideColors {
    fn default() -> Self {
        Self::uniform(WHITE)
    }
}

impl SideColors {
    /// Same color on every side
    pub fn uniform(color: [u8; 3]) -> Self {
        Self {
            top: color,
            bottom: color,
            left: color,
            right: color,
        }
    }

    /// Distinct light shades per side, for inspecting which side painted what
    pub fn diagnostic() -> Self {
        Self {
            top: [255, 220, 220],
            bottom: [220, 255, 220],
            left: [220, 220, 255],
            right: [255, 255, 200],
        }
    }

    pub fn for_side(&self, side: Side) -> [u8; 3] {
        match side {
            Side::Top => self.top,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

// ============================================================
// Options
// ============================================================

/// Border detection and removal options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderOptions {
    /// Detection strategy
    pub strategy: DetectionStrategy,

    /// Absolute cap on scan distance from an edge (pixels)
    pub max_border_width: u32,
    /// Fraction of the page depth searched from an edge (0.0-1.0)
    pub max_check_percentage: f32,

    /// Page white = center mean minus this delta
    pub page_white_delta: f32,
    /// Scanner-bed brightness cutoff (0-255)
    pub dark_threshold: f32,

    /// White run length confirming a transition
    pub sustained_run: u32,
    /// Non-white run length confirming text
    pub sustained_text: u32,

    /// Outer lip skipped by verification, in pixels (upper bound)
    pub edge_inset: u32,
    /// Outer lip skipped by verification, as fraction of the candidate width
    pub verify_skip_fraction: f32,
    /// Minimum fraction of scanlines with a boundary
    pub min_valid_ratio: f32,
    /// Minimum dark-pixel fraction in the verified band
    pub min_dark_fraction: f32,

    /// Moving-median window over scanline boundaries
    pub smoothing_window: usize,
    /// Neighbor-consensus window (scanlines)
    pub neighbor_window: usize,
    /// Neighbors that must agree for a boundary to survive
    pub neighbor_min: usize,
    /// Maximum disagreement between agreeing neighbors (pixels)
    pub neighbor_delta: u32,

    /// Radius of the morphological cleanup applied to masks
    pub mask_erode_px: u8,
    /// Fraction of width/height a side's mask may cover (0.0-0.5)
    pub edge_process_pct: f32,

    /// Sliding window length for the projection-variance strategy
    pub projection_window: u32,
    /// Window positions used to build the edge baseline
    pub projection_baseline: u32,
    /// Mean departure from baseline that marks content
    pub projection_mean_delta: f32,
    /// Absolute floor on the std-dev that marks content
    pub projection_std_floor: f32,

    /// Percentile of the edge band taken as the bright level
    pub bright_percentile: f32,
    /// Percentile of the edge band taken as the dark level
    pub dark_percentile: f32,
    /// Minimum dark pixels in the scanner-bed run
    pub wdw_min_dark_run: u32,
    /// Minimum bright run that marks the page margin
    pub wdw_min_bright_run: u32,
    /// Longest bright lip tolerated at the very edge
    pub wdw_max_lip: u32,
    /// Minimum bright/dark level gap for a side to be analysed
    pub wdw_min_contrast: f32,

    /// Coarse tile size for the grid strategy
    pub grid_tile: u32,
    /// Smallest tile the grid strategy refines to
    pub grid_min_tile: u32,
    /// Bright-pixel fraction that marks a row/column as page
    pub grid_page_fraction: f32,
    /// Std-dev above which a tile is patchy
    pub grid_patchy_std: f32,
    /// Dark fraction that whitens a leaf tile
    pub grid_leaf_dark_fraction: f32,

    /// Whitening color per side
    pub colors: SideColors,
    /// Earlier sides keep overlapping corner pixels
    pub first_wins: bool,
}

impl Default for BorderOptions {
    fn default() -> Self {
        Self {
            strategy: DetectionStrategy::default(),
            max_border_width: DEFAULT_MAX_BORDER_WIDTH,
            max_check_percentage: DEFAULT_MAX_CHECK_PERCENTAGE,
            page_white_delta: DEFAULT_PAGE_WHITE_DELTA,
            dark_threshold: DEFAULT_DARK_THRESHOLD,
            sustained_run: DEFAULT_SUSTAINED_RUN,
            sustained_text: DEFAULT_SUSTAINED_TEXT,
            edge_inset: DEFAULT_EDGE_INSET,
            verify_skip_fraction: DEFAULT_VERIFY_SKIP_FRACTION,
            min_valid_ratio: DEFAULT_MIN_VALID_RATIO,
            min_dark_fraction: DEFAULT_MIN_DARK_FRACTION,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            neighbor_window: DEFAULT_NEIGHBOR_WINDOW,
            neighbor_min: DEFAULT_NEIGHBOR_MIN,
            neighbor_delta: DEFAULT_NEIGHBOR_DELTA,
            mask_erode_px: DEFAULT_MASK_ERODE_PX,
            edge_process_pct: DEFAULT_EDGE_PROCESS_PCT,
            projection_window: DEFAULT_PROJECTION_WINDOW,
            projection_baseline: DEFAULT_PROJECTION_BASELINE,
            projection_mean_delta: DEFAULT_PROJECTION_MEAN_DELTA,
            projection_std_floor: DEFAULT_PROJECTION_STD_FLOOR,
            bright_percentile: DEFAULT_BRIGHT_PERCENTILE,
            dark_percentile: DEFAULT_DARK_PERCENTILE,
            wdw_min_dark_run: DEFAULT_WDW_MIN_DARK_RUN,
            wdw_min_bright_run: DEFAULT_WDW_MIN_BRIGHT_RUN,
            wdw_max_lip: DEFAULT_WDW_MAX_LIP,
            wdw_min_contrast: DEFAULT_WDW_MIN_CONTRAST,
            grid_tile: DEFAULT_GRID_TILE,
            grid_min_tile: DEFAULT_GRID_MIN_TILE,
            grid_page_fraction: DEFAULT_GRID_PAGE_FRACTION,
            grid_patchy_std: DEFAULT_GRID_PATCHY_STD,
            grid_leaf_dark_fraction: DEFAULT_GRID_LEAF_DARK_FRACTION,
            colors: SideColors::default(),
            first_wins: true,
        }
    }
}

impl BorderOptions {
    /// Create a new options builder
    pub fn builder() -> BorderOptionsBuilder {
        BorderOptionsBuilder::default()
    }

    /// Distinct per-side colors for inspecting results
    pub fn diagnostic() -> Self {
        Self {
            colors: SideColors::diagnostic(),
            ..Default::default()
        }
    }

    /// Tile-based analysis for patchy borders
    pub fn grid() -> Self {
        Self {
            strategy: DetectionStrategy::Grid,
            ..Default::default()
        }
    }

    /// Accept thinner dark evidence and sparser detection
    pub fn aggressive() -> Self {
        Self {
            min_valid_ratio: 0.5,
            min_dark_fraction: 0.08,
            edge_process_pct: 0.35,
            ..Default::default()
        }
    }

    /// Demand strong evidence and a narrow edge band
    pub fn conservative() -> Self {
        Self {
            min_valid_ratio: 0.85,
            min_dark_fraction: 0.2,
            edge_process_pct: 0.15,
            neighbor_min: 5,
            ..Default::default()
        }
    }

    /// Scan distance limit for a side of the given depth (at least 1)
    pub fn scan_limit(&self, depth: u32) -> u32 {
        let by_fraction = (depth as f32 * self.max_check_percentage).round() as u32;
        by_fraction.min(self.max_border_width).min(depth).max(1)
    }

    /// Edge-band limit for a side of the given depth
    pub fn edge_band(&self, depth: u32) -> u32 {
        ((depth as f32 * self.edge_process_pct).round() as u32).min(depth)
    }

    /// Check options for internally inconsistent values
    pub fn validate(&self) -> Result<()> {
        let fraction = |name: &str, v: f32| -> Result<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(BorderError::InvalidOptions(format!(
                    "{} must be within 0.0..=1.0, got {}",
                    name, v
                )))
            }
        };
        let nonzero = |name: &str, v: u32| -> Result<()> {
            if v > 0 {
                Ok(())
            } else {
                Err(BorderError::InvalidOptions(format!("{} must be positive", name)))
            }
        };

        fraction("max_check_percentage", self.max_check_percentage)?;
        fraction("verify_skip_fraction", self.verify_skip_fraction)?;
        fraction("min_valid_ratio", self.min_valid_ratio)?;
        fraction("min_dark_fraction", self.min_dark_fraction)?;
        fraction("grid_page_fraction", self.grid_page_fraction)?;
        fraction("grid_leaf_dark_fraction", self.grid_leaf_dark_fraction)?;
        if !(0.0..=0.5).contains(&self.edge_process_pct) {
            return Err(BorderError::InvalidOptions(format!(
                "edge_process_pct must be within 0.0..=0.5, got {}",
                self.edge_process_pct
            )));
        }

        nonzero("sustained_run", self.sustained_run)?;
        nonzero("sustained_text", self.sustained_text)?;
        nonzero("projection_window", self.projection_window)?;
        nonzero("projection_baseline", self.projection_baseline)?;
        nonzero("wdw_min_dark_run", self.wdw_min_dark_run)?;
        nonzero("wdw_min_bright_run", self.wdw_min_bright_run)?;
        nonzero("grid_min_tile", self.grid_min_tile)?;

        if self.grid_tile < self.grid_min_tile {
            return Err(BorderError::InvalidOptions(format!(
                "grid_tile ({}) must not be smaller than grid_min_tile ({})",
                self.grid_tile, self.grid_min_tile
            )));
        }
        if self.dark_percentile >= self.bright_percentile
            || !(0.0..=100.0).contains(&self.dark_percentile)
            || !(0.0..=100.0).contains(&self.bright_percentile)
        {
            return Err(BorderError::InvalidOptions(format!(
                "percentiles must satisfy 0 <= dark ({}) < bright ({}) <= 100",
                self.dark_percentile, self.bright_percentile
            )));
        }
        if !(0.0..=255.0).contains(&self.dark_threshold) {
            return Err(BorderError::InvalidOptions(format!(
                "dark_threshold must be within 0..=255, got {}",
                self.dark_threshold
            )));
        }

        Ok(())
    }
}

/// Builder for BorderOptions
#[derive(Debug, Default)]
pub struct BorderOptionsBuilder {
    options: BorderOptions,
}

impl BorderOptionsBuilder {
    #[must_use]
    pub fn strategy(mut self, strategy: DetectionStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    #[must_use]
    pub fn max_border_width(mut self, pixels: u32) -> Self {
        self.options.max_border_width = pixels;
        self
    }

    /// Set the searched fraction of the page depth (0.0-1.0)
    #[must_use]
    pub fn max_check_percentage(mut self, fraction: f32) -> Self {
        self.options.max_check_percentage = fraction.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn page_white_delta(mut self, delta: f32) -> Self {
        self.options.page_white_delta = delta.max(0.0);
        self
    }

    /// Set the scanner-bed cutoff (0-255)
    #[must_use]
    pub fn dark_threshold(mut self, threshold: f32) -> Self {
        self.options.dark_threshold = threshold.clamp(0.0, 255.0);
        self
    }

    #[must_use]
    pub fn sustained_run(mut self, pixels: u32) -> Self {
        self.options.sustained_run = pixels.max(1);
        self
    }

    #[must_use]
    pub fn sustained_text(mut self, pixels: u32) -> Self {
        self.options.sustained_text = pixels.max(1);
        self
    }

    #[must_use]
    pub fn edge_inset(mut self, pixels: u32) -> Self {
        self.options.edge_inset = pixels;
        self
    }

    #[must_use]
    pub fn smoothing_window(mut self, window: usize) -> Self {
        self.options.smoothing_window = window;
        self
    }

    #[must_use]
    pub fn min_valid_ratio(mut self, ratio: f32) -> Self {
        self.options.min_valid_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn min_dark_fraction(mut self, fraction: f32) -> Self {
        self.options.min_dark_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn neighbor_consensus(mut self, window: usize, min: usize, delta: u32) -> Self {
        self.options.neighbor_window = window;
        self.options.neighbor_min = min;
        self.options.neighbor_delta = delta;
        self
    }

    #[must_use]
    pub fn mask_erode_px(mut self, radius: u8) -> Self {
        self.options.mask_erode_px = radius;
        self
    }

    /// Set the edge band fraction (0.0-0.5)
    #[must_use]
    pub fn edge_process_pct(mut self, fraction: f32) -> Self {
        self.options.edge_process_pct = fraction.clamp(0.0, 0.5);
        self
    }

    #[must_use]
    pub fn percentiles(mut self, dark: f32, bright: f32) -> Self {
        self.options.dark_percentile = dark.clamp(0.0, 100.0);
        self.options.bright_percentile = bright.clamp(0.0, 100.0);
        self
    }

    #[must_use]
    pub fn colors(mut self, colors: SideColors) -> Self {
        self.options.colors = colors;
        self
    }

    #[must_use]
    pub fn first_wins(mut self, first_wins: bool) -> Self {
        self.options.first_wins = first_wins;
        self
    }

    #[must_use]
    pub fn build(self) -> BorderOptions {
        self.options
    }
}

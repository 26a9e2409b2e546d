//! Scanned-page border removal
//!
//! Detects the dark scanner-bed borders that surround a scanned page and
//! paints them over with a background color, leaving page content alone.
//!
//! # Features
//!
//! - Per-image threshold estimation from the page center
//! - Five detection strategies (projection variance, page edge, center-out
//!   TW, edge-in WDW, grid)
//! - Moving-median smoothing and neighbor consensus over scanlines
//! - Dark-evidence verification, so white margins are never whitened
//! - Edge-band-clipped masks with morphological cleanup
//! - First-wins / last-wins corner compositing, per-side colors
//! - Parallel batch processing
//!
//! # Example
//!
//! ```rust,no_run
//! use superbook_border::{BorderOptions, BorderRemover, DetectionStrategy};
//! use std::path::Path;
//!
//! let options = BorderOptions::builder()
//!     .strategy(DetectionStrategy::EdgeInWdw)
//!     .edge_process_pct(0.2)
//!     .build();
//!
//! let report = BorderRemover::process_file(
//!     Path::new("page.png"),
//!     Path::new("cleaned/page.png"),
//!     &options,
//! ).unwrap();
//!
//! println!("Top border: {}px", report.width(superbook_border::Side::Top));
//! ```

mod engine;
mod grid;
mod mask;
mod options;
mod threshold;
mod types;
mod verify;
mod whiten;

pub mod scanline;

pub use engine::{BorderDetection, BorderRemover, PageOutcome};
pub use grid::{ContentRect, GridAnalyzer};
pub use mask::MaskBuilder;
pub use options::{BorderOptions, BorderOptionsBuilder, DetectionStrategy, SideColors};
pub use threshold::ThresholdEstimator;
pub use types::{
    BorderError, BorderMask, BorderReport, PixelClass, Result, ScanlineBoundary, Side,
    SideReport, SideStatus, Thresholds,
};
pub use verify::BorderVerifier;
pub use whiten::Whitener;

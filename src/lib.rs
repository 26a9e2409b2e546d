//! superbook-border - Scanner-bed border removal for scanned book pages
//!
//! Finds the dark scanner-bed region around a scanned page and whitens it
//! without cropping, so the page keeps its size and its content stays
//! untouched.
//!
//! # Modules
//!
//! - [`border`] - detection, verification, masking and whitening
//! - [`config`] - TOML configuration and CLI overrides
//! - [`cli`] - command-line argument definitions
//!
//! # Example
//!
//! ```rust,no_run
//! use superbook_border::{BorderOptions, BorderRemover};
//!
//! let image = image::open("page.png").unwrap();
//! let (cleaned, report) = BorderRemover::remove(&image, &BorderOptions::default());
//!
//! for side in &report.sides {
//!     println!("{}: {}px ({:?})", side.side, side.verified_width, side.status);
//! }
//! cleaned.save("page-clean.png").unwrap();
//! ```

pub mod border;
pub mod cli;
pub mod config;

pub use border::{
    BorderDetection, BorderError, BorderMask, BorderOptions, BorderOptionsBuilder, BorderRemover,
    BorderReport, BorderVerifier, ContentRect, DetectionStrategy, GridAnalyzer, MaskBuilder,
    PageOutcome, PixelClass, ScanlineBoundary, Side, SideColors, SideReport, SideStatus,
    ThresholdEstimator, Thresholds, Whitener,
};
pub use cli::{CleanArgs, Cli, Commands};
pub use config::{CliOverrides, Config, ConfigError};

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INPUT_NOT_FOUND: i32 = 2;
    pub const INVALID_CONFIG: i32 = 3;
}

//! Command-line interface definitions

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::border::DetectionStrategy;
use crate::config::CliOverrides;

/// Image extensions picked up from an input directory
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Scanner-bed border removal for scanned book pages
#[derive(Debug, Parser)]
#[command(name = "superbook-border", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Whiten scanner borders on an image or a directory of images
    Clean(CleanArgs),
    /// Show version, config locations and default options
    Info,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Input image file or directory
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "./cleaned")]
    pub output: PathBuf,

    /// Config file (defaults to the standard search paths)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Detection strategy: projection-variance, page-edge, center-out, edge-in-wdw, grid
    #[arg(short, long, value_parser = parse_strategy)]
    pub strategy: Option<DetectionStrategy>,

    /// Earlier sides keep overlapping corners
    #[arg(long, conflicts_with = "last_wins")]
    pub first_wins: bool,

    /// Later sides overwrite overlapping corners
    #[arg(long)]
    pub last_wins: bool,

    /// Paint each side with a distinct light color
    #[arg(long)]
    pub diagnostic_colors: bool,

    /// Fraction of width/height a side may cover (0.0-0.5)
    #[arg(long)]
    pub edge_band: Option<f32>,

    /// Scanner-bed brightness cutoff (0-255)
    #[arg(long)]
    pub dark_threshold: Option<f32>,

    /// Worker threads (all cores when unset)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Write a JSON report with one entry per page
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Show what would be processed without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl CleanArgs {
    /// Overrides for values given explicitly on the command line
    pub fn overrides(&self) -> CliOverrides {
        let first_wins = if self.first_wins {
            Some(true)
        } else if self.last_wins {
            Some(false)
        } else {
            None
        };

        CliOverrides {
            strategy: self.strategy,
            first_wins,
            diagnostic_colors: self.diagnostic_colors,
            edge_process_pct: self.edge_band,
            dark_threshold: self.dark_threshold,
            threads: self.threads,
        }
    }
}

fn parse_strategy(s: &str) -> Result<DetectionStrategy, String> {
    s.parse().map_err(|e: crate::border::BorderError| e.to_string())
}

/// Whether `path` has one of the supported image extensions
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Collect images from a file or directory (non-recursive, sorted)
pub fn collect_images(input: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    if input.is_file() {
        if is_image_file(input) {
            images.push(input.to_path_buf());
        }
    } else if input.is_dir() {
        for entry in std::fs::read_dir(input)? {
            let path = entry?.path();
            if path.is_file() && is_image_file(&path) {
                images.push(path);
            }
        }
        images.sort();
    }

    Ok(images)
}

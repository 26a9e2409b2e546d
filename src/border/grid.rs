//! Coarse-to-fine grid strategy
//!
//! Works on tiles instead of scanlines, which copes better with ragged or
//! partial borders. A content rectangle is estimated from the rows and
//! columns that are mostly page-white; every tile reaching outside it is
//! classified from the statistics of its outside pixels:
//!
//! - uniform and not white: scanner bed, whiten
//! - uniform and white: page, keep
//! - patchy: split into quadrants and reclassify, down to `grid_min_tile`
//!
//! Marked pixels go to the mask of their nearest outside side, clipped to
//! that side's edge band.

use image::GrayImage;
use tracing::debug;

use super::mask::MaskBuilder;
use super::options::BorderOptions;
use super::types::{BorderMask, Side, SideReport, SideStatus, Thresholds};

/// Inclusive content rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl ContentRect {
    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

/// Tile statistics over the pixels outside the content rectangle
#[derive(Debug, Default)]
struct TileStats {
    count: u64,
    mean: f32,
    std: f32,
    dark_fraction: f32,
}

/// Grid-based border analysis
pub struct GridAnalyzer;

impl GridAnalyzer {
    /// Analyse `gray` and return one cleaned mask per side (Top, Bottom, Left, Right)
    pub fn analyze(gray: &GrayImage, thresholds: &Thresholds, options: &BorderOptions) -> Vec<BorderMask> {
        let (width, height) = gray.dimensions();
        let mut masks: Vec<BorderMask> = Side::all()
            .iter()
            .map(|&side| BorderMask::new(side, width, height))
            .collect();

        let Some(rect) = Self::content_rect(gray, thresholds, options) else {
            debug!("Grid: no page rows or columns found");
            return masks;
        };
        debug!(?rect, "Grid content rectangle");

        let mut walker = TileWalker {
            gray,
            rect,
            thresholds,
            options,
            masks: &mut masks,
            bands: Side::all().map(|side| options.edge_band(side.depth(width, height))),
        };

        let tile = options.grid_tile.max(1);
        for y in (0..height).step_by(tile as usize) {
            for x in (0..width).step_by(tile as usize) {
                let w = tile.min(width - x);
                let h = tile.min(height - y);
                walker.classify(x, y, w, h, tile);
            }
        }

        for mask in masks.iter_mut() {
            MaskBuilder::clean(mask, options.mask_erode_px);
        }
        masks
    }

    /// Rectangle spanned by rows and columns that are mostly page-white
    pub fn content_rect(gray: &GrayImage, thresholds: &Thresholds, options: &BorderOptions) -> Option<ContentRect> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        let mut row_white = vec![0u32; height as usize];
        let mut col_white = vec![0u32; width as usize];
        for (x, y, p) in gray.enumerate_pixels() {
            if thresholds.is_white(p.0[0]) {
                row_white[y as usize] += 1;
                col_white[x as usize] += 1;
            }
        }

        let page_like = |counts: &[u32], len: u32| -> Option<(u32, u32)> {
            let min = options.grid_page_fraction * len as f32;
            let first = counts.iter().position(|&c| c as f32 >= min)?;
            let last = counts.iter().rposition(|&c| c as f32 >= min)?;
            Some((first as u32, last as u32))
        };

        let (y0, y1) = page_like(&row_white, width)?;
        let (x0, x1) = page_like(&col_white, height)?;
        Some(ContentRect { x0, y0, x1, y1 })
    }

    /// Side report for a grid mask.
    ///
    /// A mask without enough dark pixels fails verification and is cleared.
    pub fn verify(gray: &GrayImage, mask: &mut BorderMask, thresholds: &Thresholds, options: &BorderOptions) -> SideReport {
        let side = mask.side;
        let (width, height) = gray.dimensions();
        let mut report = SideReport::none(side);

        let mut covered = vec![false; side.scanline_count(width, height) as usize];
        let mut count = 0u64;
        let mut dark = 0u64;
        for (x, y, m) in mask.mask.enumerate_pixels() {
            if m.0[0] == 0 {
                continue;
            }
            count += 1;
            if thresholds.is_dark(gray.get_pixel(x, y).0[0]) {
                dark += 1;
            }
            let index = if side.scans_columns() { x } else { y };
            covered[index as usize] = true;
        }

        if count == 0 {
            return report;
        }

        let depth = mask.depth();
        report.candidate_width = depth;
        report.valid_ratio = covered.iter().filter(|&&c| c).count() as f32 / covered.len().max(1) as f32;
        report.dark_fraction = dark as f32 / count as f32;

        if report.dark_fraction < options.min_dark_fraction {
            report.status = SideStatus::NoDarkEvidence;
            *mask = BorderMask::new(side, width, height);
            debug!(%side, dark_fraction = report.dark_fraction, "Grid mask rejected");
            return report;
        }

        report.status = SideStatus::Accepted;
        report.verified_width = depth;
        report
    }
}

struct TileWalker<'a> {
    gray: &'a GrayImage,
    rect: ContentRect,
    thresholds: &'a Thresholds,
    options: &'a BorderOptions,
    masks: &'a mut [BorderMask],
    bands: [u32; 4],
}

impl TileWalker<'_> {
    fn classify(&mut self, x: u32, y: u32, w: u32, h: u32, size: u32) {
        if w == 0 || h == 0 {
            return;
        }

        let stats = self.stats(x, y, w, h);
        if stats.count == 0 {
            return;
        }

        if size <= self.options.grid_min_tile {
            if stats.dark_fraction >= self.options.grid_leaf_dark_fraction {
                self.mark(x, y, w, h);
            }
            return;
        }

        if stats.std < self.options.grid_patchy_std {
            if stats.mean < self.thresholds.white_threshold {
                self.mark(x, y, w, h);
            }
            return;
        }

        let half = size.div_ceil(2);
        for (dx, dy) in [(0, 0), (half, 0), (0, half), (half, half)] {
            if dx < w && dy < h {
                self.classify(x + dx, y + dy, half.min(w - dx), half.min(h - dy), half);
            }
        }
    }

    fn stats(&self, x: u32, y: u32, w: u32, h: u32) -> TileStats {
        let mut count = 0u64;
        let mut sum = 0f64;
        let mut sum_sq = 0f64;
        let mut dark = 0u64;

        for py in y..y + h {
            for px in x..x + w {
                if self.rect.contains(px, py) {
                    continue;
                }
                let v = self.gray.get_pixel(px, py).0[0];
                count += 1;
                sum += v as f64;
                sum_sq += (v as f64) * (v as f64);
                if self.thresholds.is_dark(v) {
                    dark += 1;
                }
            }
        }

        if count == 0 {
            return TileStats::default();
        }

        let n = count as f64;
        let mean = sum / n;
        let var = (sum_sq / n - mean * mean).max(0.0);
        TileStats {
            count,
            mean: mean as f32,
            std: var.sqrt() as f32,
            dark_fraction: (dark as f64 / n) as f32,
        }
    }

    /// Assign every outside pixel of the tile to its nearest outside side
    fn mark(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let (width, height) = self.gray.dimensions();
        let rect = self.rect;

        for py in y..y + h {
            for px in x..x + w {
                if rect.contains(px, py) {
                    continue;
                }

                let outside = [py < rect.y0, py > rect.y1, px < rect.x0, px > rect.x1];
                let nearest = Side::all()
                    .into_iter()
                    .enumerate()
                    .filter(|&(i, _)| outside[i])
                    .min_by_key(|&(_, side)| side.distance(width, height, px, py));

                if let Some((i, side)) = nearest {
                    if side.distance(width, height, px, py) < self.bands[i] {
                        self.masks[i].set(px, py);
                    }
                }
            }
        }
    }
}

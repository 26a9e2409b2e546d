//! Border mask construction
//!
//! Turns per-scanline boundaries into a per-side pixel mask. Every pixel of
//! a side's mask lies within that side's edge band; morphology only ever
//! removes pixels, so cleaning keeps that containment.

use imageproc::distance_transform::Norm;
use imageproc::morphology;

use super::options::BorderOptions;
use super::types::{BorderMask, ScanlineBoundary};

/// Builds and cleans border masks
pub struct MaskBuilder;

impl MaskBuilder {
    /// Mask covering `[0, min(boundary, edge_band))` on every scanline with a boundary
    pub fn build(
        boundary: &ScanlineBoundary,
        width: u32,
        height: u32,
        options: &BorderOptions,
    ) -> BorderMask {
        let side = boundary.side;
        let mut mask = BorderMask::new(side, width, height);
        let band = options.edge_band(side.depth(width, height));
        let count = side.scanline_count(width, height) as usize;

        for (index, offset) in boundary.offsets.iter().enumerate().take(count) {
            let Some(offset) = *offset else {
                continue;
            };
            for d in 0..offset.min(band) {
                let (x, y) = side.to_xy(width, height, index as u32, d);
                mask.set(x, y);
            }
        }

        Self::clean(&mut mask, options.mask_erode_px);
        mask
    }

    /// Morphological opening with a square structuring element of `radius`.
    ///
    /// Removes specks and slivers thinner than the element.
    pub fn clean(mask: &mut BorderMask, radius: u8) {
        if radius == 0 || mask.is_empty() {
            return;
        }
        mask.mask = morphology::open(&mask.mask, Norm::LInf, radius);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::border::types::Side;

    #[test]
    fn test_build_top_band() {
        let options = BorderOptions::default();
        let boundary = ScanlineBoundary::new(Side::Top, vec![Some(20); 50]);
        let mask = MaskBuilder::build(&boundary, 50, 200, &options);

        assert_eq!(mask.count(), 50 * 20);
        assert!(mask.contains(10, 19));
        assert!(!mask.contains(10, 20));
        assert_eq!(mask.depth(), 20);
    }

    #[test]
    fn test_clipped_to_edge_band() {
        let options = BorderOptions::default();
        let boundary = ScanlineBoundary::new(Side::Right, vec![Some(90); 40]);
        let mask = MaskBuilder::build(&boundary, 200, 40, &options);

        // 25% of 200
        assert_eq!(mask.depth(), 50);
        assert!(mask.contains(199, 0));
        assert!(!mask.contains(149, 0));
    }

    #[test]
    fn test_clean_removes_sliver() {
        let options = BorderOptions::default();
        let mut offsets = vec![None; 60];
        // One scanline on its own is thinner than the structuring element
        offsets[30] = Some(25);
        let boundary = ScanlineBoundary::new(Side::Left, offsets);
        let mask = MaskBuilder::build(&boundary, 100, 60, &options);
        assert!(mask.is_empty());
    }

    #[test]
    fn test_no_erosion_keeps_pixels() {
        let options = BorderOptions::builder().mask_erode_px(0).build();
        let mut offsets = vec![None; 60];
        offsets[30] = Some(25);
        let boundary = ScanlineBoundary::new(Side::Left, offsets);
        let mask = MaskBuilder::build(&boundary, 100, 60, &options);
        assert_eq!(mask.count(), 25);
    }
}

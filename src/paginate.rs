//! Page planning: fit one tall raster onto fixed-size pages.
//!
//! The raster is always placed at full content width. When the resulting
//! height overflows one page, the source is cut into equal pixel bands, one
//! per page, and every band is placed at the same height so nothing is
//! stretched or cropped. Band edges are computed from shared rounded
//! positions so consecutive bands cover every source row exactly once.

use crate::error::MillError;

/// Physical page setup in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub margin_mm: f64,
}

impl PageGeometry {
    pub const A4_PORTRAIT: PageGeometry = PageGeometry {
        page_width_mm: 210.0,
        page_height_mm: 297.0,
        margin_mm: 5.0,
    };

    pub fn content_width(&self) -> f64 {
        self.page_width_mm - 2.0 * self.margin_mm
    }

    pub fn content_height(&self) -> f64 {
        self.page_height_mm - 2.0 * self.margin_mm
    }
}

/// One horizontal source band and where it lands on its page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSlice {
    /// First source row of the band.
    pub src_y: u32,
    /// Band height in source rows.
    pub src_height: u32,
    pub dest_width_mm: f64,
    pub dest_height_mm: f64,
}

/// The full placement plan for one raster.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub geometry: PageGeometry,
    pub slices: Vec<PageSlice>,
    /// Source pixels per placed millimetre, the scale the whole plan shares.
    pub px_per_mm: f64,
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        self.slices.len()
    }
}

/// Plan the placement of a `width` x `height` raster on the given geometry.
pub fn paginate(width: u32, height: u32, geometry: &PageGeometry) -> Result<PagePlan, MillError> {
    if width == 0 || height == 0 {
        return Err(MillError::Export(
            "cannot paginate an empty raster".to_string(),
        ));
    }
    let content_w = geometry.content_width();
    let content_h = geometry.content_height();
    if content_w <= 0.0 || content_h <= 0.0 {
        return Err(MillError::Export(
            "page geometry leaves no content area".to_string(),
        ));
    }

    let aspect = width as f64 / height as f64;
    let rendered_height = content_w / aspect;
    let px_per_mm = height as f64 / rendered_height;

    let mut slices = Vec::new();
    if rendered_height <= content_h {
        slices.push(PageSlice {
            src_y: 0,
            src_height: height,
            dest_width_mm: content_w,
            dest_height_mm: rendered_height,
        });
    } else {
        let page_count = (rendered_height / content_h).ceil() as u32;
        let band = height as f64 / page_count as f64;
        let dest_height_mm = (rendered_height / page_count as f64).min(content_h);

        for i in 0..page_count {
            let start = (band * i as f64).round() as u32;
            let end = ((band * (i + 1) as f64).round() as u32).min(height);
            slices.push(PageSlice {
                src_y: start,
                src_height: end - start,
                dest_width_mm: content_w,
                dest_height_mm,
            });
        }
    }

    Ok(PagePlan {
        geometry: *geometry,
        slices,
        px_per_mm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_fits_one_page() {
        let plan = paginate(1600, 2000, &PageGeometry::A4_PORTRAIT).unwrap();
        assert_eq!(plan.page_count(), 1);
        let slice = plan.slices[0];
        assert_eq!(slice.src_y, 0);
        assert_eq!(slice.src_height, 2000);
        assert!((slice.dest_width_mm - 200.0).abs() < 1e-9);
        assert!((slice.dest_height_mm - 250.0).abs() < 1e-9);
    }

    #[test]
    fn exact_page_height_stays_single() {
        // 200mm wide placement of 1600x2296 is exactly 287mm tall.
        let plan = paginate(1600, 2296, &PageGeometry::A4_PORTRAIT).unwrap();
        assert_eq!(plan.page_count(), 1);
    }

    #[test]
    fn overflow_splits_into_equal_bands() {
        // 200 * 2400 / 1600 = 300mm rendered, just over one 287mm page.
        let plan = paginate(1600, 2400, &PageGeometry::A4_PORTRAIT).unwrap();
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.slices[0].src_y, 0);
        assert_eq!(plan.slices[0].src_height, 1200);
        assert_eq!(plan.slices[1].src_y, 1200);
        assert_eq!(plan.slices[1].src_height, 1200);
        for slice in &plan.slices {
            assert!((slice.dest_height_mm - 150.0).abs() < 1e-9);
        }
    }

    #[test]
    fn three_point_four_pages_round_up_to_four() {
        let geometry = PageGeometry {
            page_width_mm: 110.0,
            page_height_mm: 110.0,
            margin_mm: 5.0,
        };
        // Content box is 100x100mm; a 100x340 raster renders 340mm tall.
        let plan = paginate(100, 340, &geometry).unwrap();
        assert_eq!(plan.page_count(), 4);
        assert!((plan.px_per_mm - 1.0).abs() < 1e-9);

        let expected = [(0, 85), (85, 85), (170, 85), (255, 85)];
        for (slice, (src_y, src_height)) in plan.slices.iter().zip(expected) {
            assert_eq!(slice.src_y, src_y);
            assert_eq!(slice.src_height, src_height);
            assert!((slice.dest_height_mm - 85.0).abs() < 1e-9);
        }
    }

    #[test]
    fn bands_cover_every_row_exactly_once() {
        let geometry = PageGeometry {
            page_width_mm: 110.0,
            page_height_mm: 110.0,
            margin_mm: 5.0,
        };
        let plan = paginate(100, 999, &geometry).unwrap();
        assert!(plan.page_count() > 1);

        let mut next_row = 0;
        for slice in &plan.slices {
            assert_eq!(slice.src_y, next_row);
            assert!(slice.src_height > 0);
            next_row += slice.src_height;
        }
        assert_eq!(next_row, 999);
    }

    #[test]
    fn empty_raster_is_rejected() {
        assert!(paginate(0, 100, &PageGeometry::A4_PORTRAIT).is_err());
        assert!(paginate(100, 0, &PageGeometry::A4_PORTRAIT).is_err());
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        let geometry = PageGeometry {
            page_width_mm: 100.0,
            page_height_mm: 100.0,
            margin_mm: 60.0,
        };
        assert!(paginate(100, 100, &geometry).is_err());
    }
}

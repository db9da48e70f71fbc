//! PDF export: raster the invoice, plan pages, write the document.
//!
//! Export is an explicit three-step machine so a second run cannot start
//! while one is underway. Each step only accepts the phase that feeds it,
//! and any failure resets the machine to `NotStarted`.

use chrono::Utc;
use printpdf::*;

use crate::error::MillError;
use crate::model::InvoiceState;
use crate::paginate::{PageGeometry, PagePlan};
use crate::preview::{render_invoice, PreviewOptions, RasterImage};
use crate::theme::{resolve, ThemePalette};

const MM_TO_PT: f32 = 72.0 / 25.4;

/// Everything an export run needs besides the invoice itself.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Resolves a `System` theme selection.
    pub system_prefers_dark: bool,
    pub geometry: PageGeometry,
    pub preview: PreviewOptions,
    /// Document title stored in the PDF metadata.
    pub title: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            system_prefers_dark: false,
            geometry: PageGeometry::A4_PORTRAIT,
            preview: PreviewOptions::default(),
            title: "Invoice".to_string(),
        }
    }
}

/// Where an export run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    NotStarted,
    Rasterized,
    /// Pages planned; carries the page count.
    Paginated(usize),
    Done,
}

/// Stepwise exporter. `export` drives all three steps in order.
pub struct Exporter {
    options: ExportOptions,
    phase: ExportPhase,
    raster: Option<RasterImage>,
    plan: Option<PagePlan>,
    palette: Option<&'static ThemePalette>,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Exporter {
            options,
            phase: ExportPhase::NotStarted,
            raster: None,
            plan: None,
            palette: None,
        }
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    fn reset(&mut self) {
        self.phase = ExportPhase::NotStarted;
        self.raster = None;
        self.plan = None;
        self.palette = None;
    }

    /// Step 1: draw the invoice into a raster at the export theme.
    pub fn rasterize(&mut self, state: &InvoiceState) -> Result<(), MillError> {
        match self.phase {
            ExportPhase::NotStarted | ExportPhase::Done => {}
            ExportPhase::Rasterized | ExportPhase::Paginated(_) => {
                return Err(MillError::ExportInFlight);
            }
        }
        self.reset();

        let palette = resolve(state.pdf_theme, self.options.system_prefers_dark);
        match render_invoice(state, &self.options.preview, palette) {
            Ok(raster) => {
                log::debug!("Rasterized invoice at {}x{}", raster.width, raster.height);
                self.raster = Some(raster);
                self.palette = Some(palette);
                self.phase = ExportPhase::Rasterized;
                Ok(())
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Step 2: plan how the raster maps onto pages.
    pub fn paginate(&mut self) -> Result<usize, MillError> {
        let raster = match self.phase {
            ExportPhase::Rasterized => match &self.raster {
                Some(raster) => raster,
                None => {
                    self.reset();
                    return Err(MillError::Export("raster went missing".to_string()));
                }
            },
            ExportPhase::Paginated(_) => return Err(MillError::ExportInFlight),
            ExportPhase::NotStarted | ExportPhase::Done => {
                return Err(MillError::Export(
                    "nothing rasterized to paginate".to_string(),
                ));
            }
        };

        match crate::paginate::paginate(raster.width, raster.height, &self.options.geometry) {
            Ok(plan) => {
                let pages = plan.page_count();
                log::debug!("Planned {pages} page(s)");
                self.plan = Some(plan);
                self.phase = ExportPhase::Paginated(pages);
                Ok(pages)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Step 3: write the planned pages into a PDF.
    pub fn serialize(&mut self) -> Result<Vec<u8>, MillError> {
        match self.phase {
            ExportPhase::Paginated(_) => {}
            ExportPhase::Rasterized => {
                return Err(MillError::Export("pages were never planned".to_string()));
            }
            ExportPhase::NotStarted | ExportPhase::Done => {
                return Err(MillError::Export("no export in progress".to_string()));
            }
        }
        let (raster, plan, palette) = match (self.raster.take(), self.plan.take(), self.palette) {
            (Some(raster), Some(plan), Some(palette)) => (raster, plan, palette),
            _ => {
                self.reset();
                return Err(MillError::Export("export state went missing".to_string()));
            }
        };

        match build_pdf(&raster, &plan, palette, &self.options.title) {
            Ok(bytes) => {
                self.reset();
                self.phase = ExportPhase::Done;
                Ok(bytes)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Run all three steps and hand back the document plus its page plan.
    pub fn export(&mut self, state: &InvoiceState) -> Result<(Vec<u8>, PagePlan), MillError> {
        self.rasterize(state)?;
        self.paginate()?;
        let plan = self
            .plan
            .clone()
            .ok_or_else(|| MillError::Export("page plan went missing".to_string()))?;
        let bytes = self.serialize()?;
        Ok((bytes, plan))
    }
}

/// One-shot export with a fresh exporter.
pub fn export_invoice(
    state: &InvoiceState,
    options: ExportOptions,
) -> Result<(Vec<u8>, PagePlan), MillError> {
    Exporter::new(options).export(state)
}

/// Download-style file name, `invoice-<unix millis>.pdf`.
pub fn export_filename() -> String {
    format!("invoice-{}.pdf", Utc::now().timestamp_millis())
}

fn build_pdf(
    raster: &RasterImage,
    plan: &PagePlan,
    palette: &ThemePalette,
    title: &str,
) -> Result<Vec<u8>, MillError> {
    let geometry = plan.geometry;
    let page_w = Mm(geometry.page_width_mm as f32);
    let page_h = Mm(geometry.page_height_mm as f32);
    let page_height_pt = geometry.page_height_mm as f32 * MM_TO_PT;
    let margin_pt = geometry.margin_mm as f32 * MM_TO_PT;

    let mut doc = PdfDocument::new(title);
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();
    let mut pages = Vec::new();

    for slice in &plan.slices {
        let band = band_raster(raster, slice.src_y, slice.src_height, palette);
        let png = band.to_png()?;
        let raw = RawImage::decode_from_bytes(&png, &mut img_warnings)
            .map_err(|e| MillError::Export(format!("page image rejected: {e}")))?;
        let xobj_id = doc.add_image(&raw);

        let dest_w_pt = slice.dest_width_mm as f32 * MM_TO_PT;
        let dest_h_pt = slice.dest_height_mm as f32 * MM_TO_PT;
        // PDF origin is bottom-left; the band top sits at the top margin.
        let band_bottom_pt = page_height_pt - margin_pt - dest_h_pt;

        let ops = vec![Op::UseXobject {
            id: xobj_id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(margin_pt)),
                translate_y: Some(Pt(band_bottom_pt)),
                // At 72 dpi one source pixel is one point, so the scale
                // factors below carry the full placement math.
                dpi: Some(72.0),
                scale_x: Some(dest_w_pt / band.width as f32),
                scale_y: Some(dest_h_pt / band.height as f32),
                rotate: None,
            },
        }];
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // A document must always hold at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}

/// Copy one horizontal band out of the raster onto a background-filled canvas.
fn band_raster(raster: &RasterImage, src_y: u32, src_height: u32, palette: &ThemePalette) -> RasterImage {
    let width = raster.width as usize;
    let bg = palette.background.to_rgba8();
    let mut pixels = vec![0u8; width * src_height as usize * 4];
    for px in pixels.chunks_exact_mut(4) {
        px.copy_from_slice(&bg);
    }

    let src_start = (src_y as usize * width * 4).min(raster.pixels.len());
    let src_end = ((src_y + src_height) as usize * width * 4).min(raster.pixels.len());
    if src_start < src_end {
        let n = src_end - src_start;
        pixels[..n].copy_from_slice(&raster.pixels[src_start..src_end]);
    }

    RasterImage {
        width: raster.width,
        height: src_height,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_invoice;
    use crate::theme::ThemePalette;

    fn assert_valid_pdf(bytes: &[u8]) {
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn default_invoice_exports_one_page() {
        let state = InvoiceState::default();
        let (bytes, plan) = export_invoice(&state, ExportOptions::default()).unwrap();
        assert_valid_pdf(&bytes);
        assert_eq!(plan.page_count(), 1);
    }

    #[test]
    fn sample_invoice_exports() {
        let (bytes, plan) = export_invoice(&sample_invoice(), ExportOptions::default()).unwrap();
        assert_valid_pdf(&bytes);
        assert!(plan.page_count() >= 1);
    }

    #[test]
    fn second_start_is_rejected_mid_flight() {
        let state = InvoiceState::default();
        let mut exporter = Exporter::new(ExportOptions::default());

        exporter.rasterize(&state).unwrap();
        assert!(matches!(
            exporter.rasterize(&state),
            Err(MillError::ExportInFlight)
        ));

        exporter.paginate().unwrap();
        assert!(matches!(
            exporter.rasterize(&state),
            Err(MillError::ExportInFlight)
        ));
        assert!(matches!(
            exporter.paginate(),
            Err(MillError::ExportInFlight)
        ));
    }

    #[test]
    fn finished_export_allows_a_fresh_run() {
        let state = InvoiceState::default();
        let mut exporter = Exporter::new(ExportOptions::default());

        exporter.rasterize(&state).unwrap();
        exporter.paginate().unwrap();
        let first = exporter.serialize().unwrap();
        assert_valid_pdf(&first);
        assert_eq!(exporter.phase(), ExportPhase::Done);

        let (second, _) = exporter.export(&state).unwrap();
        assert_valid_pdf(&second);
        assert_eq!(exporter.phase(), ExportPhase::Done);
    }

    #[test]
    fn steps_out_of_order_are_errors() {
        let mut exporter = Exporter::new(ExportOptions::default());
        assert!(matches!(exporter.paginate(), Err(MillError::Export(_))));
        assert!(matches!(exporter.serialize(), Err(MillError::Export(_))));
        assert_eq!(exporter.phase(), ExportPhase::NotStarted);
    }

    #[test]
    fn failed_step_resets_the_machine() {
        let mut options = ExportOptions::default();
        options.preview.width = 0;
        let mut exporter = Exporter::new(options);

        assert!(exporter.rasterize(&InvoiceState::default()).is_err());
        assert_eq!(exporter.phase(), ExportPhase::NotStarted);
    }

    #[test]
    fn band_copy_fills_missing_rows_with_background() {
        let raster = RasterImage {
            width: 2,
            height: 2,
            pixels: vec![9; 2 * 2 * 4],
        };
        // Band reaches past the raster end; the tail keeps the background.
        let band = band_raster(&raster, 1, 2, &ThemePalette::DARK);
        assert_eq!(band.height, 2);
        assert_eq!(&band.pixels[0..4], &[9, 9, 9, 9]);
        let bg = ThemePalette::DARK.background.to_rgba8();
        assert_eq!(&band.pixels[8..12], &bg);
    }

    #[test]
    fn filename_uses_millisecond_stamp() {
        let name = export_filename();
        assert!(name.starts_with("invoice-"));
        assert!(name.ends_with(".pdf"));
        let stamp = &name["invoice-".len()..name.len() - ".pdf".len()];
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
        assert!(stamp.len() >= 13);
    }
}

//! Invoice preview renderer.
//!
//! Draws an [`InvoiceState`] into an RGBA raster using the resolved theme
//! palette. The same raster feeds both the PNG preview and the PDF exporter,
//! so export output is exactly what the preview shows.
//!
//! Layout works in logical pixels on a fixed-width page; the canvas
//! multiplies everything by a supersampling scale when it touches the
//! buffer. Vertical space is open-ended: the canvas grows downward as
//! sections are drawn and the final height is whatever the content needed.

use std::collections::HashMap;

use base64::Engine;
use chrono::{Datelike, NaiveDate};
use log::warn;

use crate::error::MillError;
use crate::fonts::{self, wrap_text, FontSize};
use crate::model::{format_money, InvoiceState};
use crate::theme::{Color, ThemePalette};
use crate::totals::Totals;

/// Page padding in logical pixels.
const PAD: usize = 32;

/// Logo box, `object-fit: contain` semantics.
const LOGO_MAX_W: usize = 300;
const LOGO_MAX_H: usize = 80;

// Item table column widths.
const QTY_W: usize = 80;
const PRICE_W: usize = 120;
const DISC_W: usize = 80;
const TOTAL_W: usize = 140;

/// The movable invoice sections, drawn top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Header,
    CompanyInfo,
    InvoiceDetails,
    Items,
    Totals,
}

impl SectionKind {
    pub const DEFAULT_ORDER: [SectionKind; 5] = [
        SectionKind::Header,
        SectionKind::CompanyInfo,
        SectionKind::InvoiceDetails,
        SectionKind::Items,
        SectionKind::Totals,
    ];
}

/// Capture parameters for one preview render.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOptions {
    /// Logical page width in pixels.
    pub width: usize,
    /// Supersampling factor applied to the raster.
    pub scale: usize,
    pub section_order: Vec<SectionKind>,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            width: 800,
            scale: 2,
            section_order: SectionKind::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl PreviewOptions {
    /// Move the section at `from` so it lands at `to`, shifting the ones in
    /// between. Out-of-range indices are a no-op.
    pub fn move_section(&mut self, from: usize, to: usize) {
        let len = self.section_order.len();
        if from < len && to < len && from != to {
            let section = self.section_order.remove(from);
            self.section_order.insert(to, section);
        }
    }
}

/// An RGBA8 raster, row major.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Encode as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, MillError> {
        use image::ImageEncoder;

        let mut png_bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(
                &self.pixels,
                self.width,
                self.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| MillError::Capture(format!("PNG encoding failed: {e}")))?;

        Ok(png_bytes)
    }
}

/// Grow-down RGBA drawing surface.
///
/// Drawing methods take logical coordinates; the buffer itself is
/// `scale` times larger in both directions. Rows are prefilled with the
/// background colour so partially drawn regions composite correctly.
pub struct PreviewCanvas {
    /// Device width in pixels.
    width: usize,
    scale: usize,
    /// Device rows currently allocated.
    height: usize,
    buffer: Vec<u8>,
    background: Color,
    glyph_cache: HashMap<(FontSize, char), Vec<u8>>,
}

impl PreviewCanvas {
    pub fn new(logical_width: usize, scale: usize, background: Color) -> Result<Self, MillError> {
        if logical_width == 0 || scale == 0 {
            return Err(MillError::Capture(
                "preview width and scale must be non-zero".to_string(),
            ));
        }

        let width = logical_width * scale;
        let height = 100;
        let mut buffer = vec![0u8; width * height * 4];
        let bg = background.to_rgba8();
        for px in buffer.chunks_exact_mut(4) {
            px.copy_from_slice(&bg);
        }

        Ok(Self {
            width,
            scale,
            height,
            buffer,
            background,
            glyph_cache: HashMap::new(),
        })
    }

    pub fn logical_width(&self) -> usize {
        self.width / self.scale
    }

    /// Ensure the buffer has rows up to and including `y` (device space).
    fn ensure_height(&mut self, y: usize) {
        let needed = y + 1;
        if needed > self.height {
            // Grow by at least 100 rows to amortise resizes.
            let new_height = needed.max(self.height + 100);
            let old_len = self.buffer.len();
            self.buffer.resize(self.width * new_height * 4, 0);
            let bg = self.background.to_rgba8();
            for px in self.buffer[old_len..].chunks_exact_mut(4) {
                px.copy_from_slice(&bg);
            }
            self.height = new_height;
        }
    }

    /// Composite one device pixel over the buffer.
    fn blend_pixel(&mut self, x: usize, y: usize, color: Color) {
        if color.is_transparent() || x >= self.width {
            return;
        }
        self.ensure_height(y);
        let idx = (y * self.width + x) * 4;

        if color.a >= 1.0 {
            self.buffer[idx..idx + 4].copy_from_slice(&color.to_rgba8());
            return;
        }

        let dst_r = self.buffer[idx] as f32 / 255.0;
        let dst_g = self.buffer[idx + 1] as f32 / 255.0;
        let dst_b = self.buffer[idx + 2] as f32 / 255.0;
        let dst_a = self.buffer[idx + 3] as f32 / 255.0;

        let out = Color {
            r: color.r * color.a + dst_r * (1.0 - color.a),
            g: color.g * color.a + dst_g * (1.0 - color.a),
            b: color.b * color.a + dst_b * (1.0 - color.a),
            a: color.a + dst_a * (1.0 - color.a),
        };
        self.buffer[idx..idx + 4].copy_from_slice(&out.to_rgba8());
    }

    /// Fill a rectangle given in logical coordinates.
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: Color) {
        if w == 0 || h == 0 {
            return;
        }
        let (dx0, dy0) = (x * self.scale, y * self.scale);
        let (dw, dh) = (w * self.scale, h * self.scale);
        self.ensure_height(dy0 + dh - 1);
        for dy in 0..dh {
            for dx in 0..dw {
                self.blend_pixel(dx0 + dx, dy0 + dy, color);
            }
        }
    }

    /// One-logical-pixel horizontal rule.
    pub fn hline(&mut self, x: usize, y: usize, w: usize, color: Color) {
        self.fill_rect(x, y, w, 1, color);
    }

    /// One-logical-pixel rectangle outline.
    pub fn stroke_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: Color) {
        if w == 0 || h == 0 {
            return;
        }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w - 1, y, 1, h, color);
    }

    /// Draw a line of text at a logical position.
    pub fn draw_text(&mut self, x: usize, y: usize, text: &str, size: FontSize, color: Color) {
        let metrics = size.metrics();
        let mut pen_x = x * self.scale;
        let pen_y = y * self.scale;
        let advance = metrics.char_width * self.scale;

        // The cache is detached while drawing so glyph refs and pixel writes
        // don't fight over the same borrow.
        let mut cache = std::mem::take(&mut self.glyph_cache);
        for ch in text.chars() {
            let glyph = cache
                .entry((size, ch))
                .or_insert_with(|| fonts::glyph(size, ch));
            for gy in 0..metrics.char_height {
                for gx in 0..metrics.char_width {
                    if glyph[gy * metrics.char_width + gx] == 0 {
                        continue;
                    }
                    for sy in 0..self.scale {
                        for sx in 0..self.scale {
                            self.blend_pixel(
                                pen_x + gx * self.scale + sx,
                                pen_y + gy * self.scale + sy,
                                color,
                            );
                        }
                    }
                }
            }
            pen_x += advance;
        }
        self.glyph_cache = cache;
    }

    /// Draw text so its right edge lands on `right`.
    pub fn draw_text_right(&mut self, right: usize, y: usize, text: &str, size: FontSize, color: Color) {
        let w = fonts::text_width(size, text);
        self.draw_text(right.saturating_sub(w), y, text, size, color);
    }

    /// Draw text centred between `x` and `x + w`.
    pub fn draw_text_centered(&mut self, x: usize, w: usize, y: usize, text: &str, size: FontSize, color: Color) {
        let tw = fonts::text_width(size, text);
        let offset = w.saturating_sub(tw) / 2;
        self.draw_text(x + offset, y, text, size, color);
    }

    /// Blit an image into a logical destination rectangle, nearest neighbour.
    pub fn draw_image(&mut self, x: usize, y: usize, dest_w: usize, dest_h: usize, img: &image::RgbaImage) {
        if dest_w == 0 || dest_h == 0 || img.width() == 0 || img.height() == 0 {
            return;
        }
        let (dx0, dy0) = (x * self.scale, y * self.scale);
        let (dw, dh) = (dest_w * self.scale, dest_h * self.scale);
        self.ensure_height(dy0 + dh - 1);
        for dy in 0..dh {
            for dx in 0..dw {
                let sx = (dx * img.width() as usize / dw) as u32;
                let sy = (dy * img.height() as usize / dh) as u32;
                let p = img.get_pixel(sx, sy);
                let color = Color {
                    r: p[0] as f32 / 255.0,
                    g: p[1] as f32 / 255.0,
                    b: p[2] as f32 / 255.0,
                    a: p[3] as f32 / 255.0,
                };
                self.blend_pixel(dx0 + dx, dy0 + dy, color);
            }
        }
    }

    /// Finish drawing and hand over the raster, cropped or padded to exactly
    /// `logical_height` rows of background-filled canvas.
    pub fn into_raster(mut self, logical_height: usize) -> RasterImage {
        let device_h = logical_height.max(1) * self.scale;
        if device_h > self.height {
            self.ensure_height(device_h - 1);
        }
        self.buffer.truncate(self.width * device_h * 4);
        RasterImage {
            width: self.width as u32,
            height: device_h as u32,
            pixels: self.buffer,
        }
    }
}

/// Render the whole invoice into a raster.
///
/// Sections are drawn in `opts.section_order`; hidden field groups
/// contribute nothing. A logo that fails to decode is skipped with a
/// warning rather than failing the render.
pub fn render_invoice(
    state: &InvoiceState,
    opts: &PreviewOptions,
    palette: &ThemePalette,
) -> Result<RasterImage, MillError> {
    let mut canvas = PreviewCanvas::new(opts.width, opts.scale, palette.background)?;

    let mut y = PAD;
    for section in &opts.section_order {
        y = match section {
            SectionKind::Header => header_section(&mut canvas, state, palette, y),
            SectionKind::CompanyInfo => company_info_section(&mut canvas, state, palette, y),
            SectionKind::InvoiceDetails => notes_section(&mut canvas, state, palette, y),
            SectionKind::Items => items_section(&mut canvas, state, palette, y),
            SectionKind::Totals => totals_section(&mut canvas, state, palette, y),
        };
    }

    Ok(canvas.into_raster(y + PAD))
}

fn content_width(canvas: &PreviewCanvas) -> usize {
    canvas.logical_width().saturating_sub(PAD * 2)
}

/// Logo plus company identity on the left, the INVOICE banner on the right.
fn header_section(c: &mut PreviewCanvas, state: &InvoiceState, pal: &ThemePalette, y0: usize) -> usize {
    let right = PAD + content_width(c);
    let mut left_y = y0;

    if state.active_fields.logo && !state.logo.is_empty() {
        match decode_logo(&state.logo) {
            Ok(img) => {
                let (w, h) = contain_fit(img.width(), img.height(), LOGO_MAX_W, LOGO_MAX_H);
                c.draw_image(PAD, left_y, w, h, &img);
                left_y += h + 6;
            }
            Err(e) => warn!("Skipping logo image: {e}"),
        }
    }

    if state.active_fields.company_name {
        let (name, color) = if state.company_name.is_empty() {
            ("YOUR COMPANY".to_string(), pal.text_secondary)
        } else {
            (state.company_name.to_uppercase(), pal.text)
        };
        c.draw_text(PAD, left_y, &name, FontSize::Heading, color);
        left_y += FontSize::Heading.metrics().line_height();
    }

    if state.active_fields.company_address && !state.company_address.is_empty() {
        for line in state.company_address.lines() {
            c.draw_text(PAD, left_y, line, FontSize::Small, pal.text_secondary);
            left_y += FontSize::Small.metrics().line_height();
        }
    }

    c.draw_text_right(right, y0, "INVOICE", FontSize::Display, pal.text);
    let right_y = y0 + FontSize::Display.metrics().line_height();

    left_y.max(right_y) + 24
}

/// Client identity plus the inline DATE / INVOICE # / DUE / RE metadata.
fn company_info_section(c: &mut PreviewCanvas, state: &InvoiceState, pal: &ThemePalette, y0: usize) -> usize {
    let content_w = content_width(c);
    let right = PAD + content_w;
    let small_lh = FontSize::Small.metrics().line_height();
    let mut y = y0;

    c.draw_text(PAD, y, "CLIENT NAME", FontSize::Small, pal.text);
    y += small_lh + 4;

    if state.active_fields.client_name && !state.client_name.is_empty() {
        c.draw_text(PAD, y, &state.client_name, FontSize::Body, pal.text);
        y += FontSize::Body.metrics().line_height() + 4;
    }
    if state.active_fields.client_address && !state.client_address.is_empty() {
        for line in state.client_address.lines() {
            c.draw_text(PAD, y, line, FontSize::Small, pal.text_secondary);
            y += small_lh;
        }
    }

    y += 16;
    c.hline(PAD, y, content_w, pal.border);
    y += 1 + 20;

    // Inline metadata entries flow left to right and wrap at the content
    // edge; RE always starts its own line.
    let mut entries: Vec<(String, String)> = Vec::new();
    if state.active_fields.date {
        let value = state
            .date
            .map(long_date)
            .unwrap_or_else(|| "[Date]".to_string());
        entries.push(("DATE:".to_string(), value));
    }
    if state.active_fields.invoice_number {
        let value = if state.invoice_number.is_empty() {
            "[#]".to_string()
        } else {
            state.invoice_number.clone()
        };
        entries.push(("INVOICE #:".to_string(), value));
    }
    if let (true, Some(due)) = (state.active_fields.due_date, state.due_date) {
        entries.push(("DUE:".to_string(), long_date(due)));
    }

    let mut x = PAD;
    let mut used_meta_row = false;
    for (label, value) in &entries {
        let label_w = fonts::text_width(FontSize::Small, label);
        let value_w = fonts::text_width(FontSize::Small, value);
        let entry_w = label_w + 6 + value_w;
        if x > PAD && x + entry_w > right {
            x = PAD;
            y += small_lh + 8;
        }
        c.draw_text(x, y, label, FontSize::Small, pal.text);
        c.draw_text(x + label_w + 6, y, value, FontSize::Small, pal.text_secondary);
        x += entry_w + 20;
        used_meta_row = true;
    }
    if used_meta_row {
        y += small_lh;
    }

    if state.active_fields.invoice_title && !state.invoice_title.is_empty() {
        y += 4;
        let label_w = fonts::text_width(FontSize::Small, "RE:");
        c.draw_text(PAD, y, "RE:", FontSize::Small, pal.text);
        c.draw_text(PAD + label_w + 6, y, &state.invoice_title, FontSize::Small, pal.text_secondary);
        y += small_lh;
    }

    y + 20
}

/// The NOTES card. The section reserves its bottom margin even when empty.
fn notes_section(c: &mut PreviewCanvas, state: &InvoiceState, pal: &ThemePalette, y0: usize) -> usize {
    let mut y = y0;

    if state.active_fields.notes && !state.notes.is_empty() {
        let content_w = content_width(c);
        let small_lh = FontSize::Small.metrics().line_height();
        let inner_w = content_w.saturating_sub(24);
        let lines = wrap_text(&state.notes, FontSize::Small, inner_w);
        let box_h = 10 + small_lh + 4 + lines.len() * small_lh + 10;

        c.fill_rect(PAD, y, content_w, box_h, pal.card_background);
        c.stroke_rect(PAD, y, content_w, box_h, pal.border);

        let mut ty = y + 10;
        c.draw_text(PAD + 12, ty, "NOTES:", FontSize::Small, pal.text);
        ty += small_lh + 4;
        for line in &lines {
            c.draw_text(PAD + 12, ty, line, FontSize::Small, pal.text_secondary);
            ty += small_lh;
        }

        y += box_h;
    }

    y + 16
}

/// The line item table. The discount column only exists while the discount
/// group is visible, and row totals ignore row discounts when it is hidden.
fn items_section(c: &mut PreviewCanvas, state: &InvoiceState, pal: &ThemePalette, y0: usize) -> usize {
    let content_w = content_width(c);
    let right = PAD + content_w;
    let small_lh = FontSize::Small.metrics().line_height();
    let body_lh = FontSize::Body.metrics().line_height();
    let show_disc = state.active_fields.discount;

    let numeric_w = QTY_W + PRICE_W + TOTAL_W + if show_disc { DISC_W } else { 0 };
    let desc_w = content_w.saturating_sub(numeric_w);
    let qty_x = PAD + desc_w;
    let price_x = qty_x + QTY_W;
    let disc_x = price_x + PRICE_W;
    let total_x = if show_disc { disc_x + DISC_W } else { disc_x };

    let mut y = y0;

    // Header row.
    let header_y = y + 8;
    c.draw_text(PAD, header_y, "ITEM", FontSize::Small, pal.text_secondary);
    c.draw_text_centered(qty_x, QTY_W, header_y, "QTY", FontSize::Small, pal.text_secondary);
    c.draw_text_right(price_x + PRICE_W, header_y, "PRICE", FontSize::Small, pal.text_secondary);
    if show_disc {
        c.draw_text_centered(disc_x, DISC_W, header_y, "DISC", FontSize::Small, pal.text_secondary);
    }
    c.draw_text_right(right, header_y, "TOTAL", FontSize::Small, pal.text_secondary);
    y = header_y + small_lh + 8;
    c.hline(PAD, y, content_w, pal.border);
    y += 1;

    for item in &state.items {
        let desc = if item.description.is_empty() {
            "[Item Description]"
        } else {
            item.description.as_str()
        };
        let desc_lines = wrap_text(desc, FontSize::Body, desc_w.saturating_sub(12));

        let gross = item.gross();
        let row_discount = if show_disc {
            gross * item.discount / 100.0
        } else {
            0.0
        };
        let row_total = gross - row_discount;

        let row_y = y + 8;
        for (i, line) in desc_lines.iter().enumerate() {
            c.draw_text(PAD, row_y + i * body_lh, line, FontSize::Body, pal.text);
        }
        c.draw_text_centered(qty_x, QTY_W, row_y, &format!("{}", item.quantity), FontSize::Body, pal.text);
        c.draw_text_right(
            price_x + PRICE_W,
            row_y,
            &format_money(&state.currency, item.price),
            FontSize::Body,
            pal.text,
        );
        if show_disc {
            c.draw_text_centered(
                disc_x,
                DISC_W,
                row_y,
                &format!("{:.2}", item.discount),
                FontSize::Body,
                pal.text_secondary,
            );
        }
        c.draw_text_right(
            right,
            row_y,
            &format_money(&state.currency, row_total),
            FontSize::Body,
            pal.text,
        );

        y = row_y + desc_lines.len().max(1) * body_lh + 8;
        c.hline(PAD, y, content_w, pal.border);
        y += 1;
    }

    y + 16 + 20
}

/// Money summary block, the payment / terms columns, and the contact footer.
fn totals_section(c: &mut PreviewCanvas, state: &InvoiceState, pal: &ThemePalette, y0: usize) -> usize {
    let content_w = content_width(c);
    let right = PAD + content_w;
    let small_lh = FontSize::Small.metrics().line_height();
    let body_lh = FontSize::Body.metrics().line_height();
    let totals = Totals::of(state);
    let currency = state.currency.as_str();

    let block_w = 320;
    let block_x = right.saturating_sub(block_w);
    let mut y = y0;

    let money_row = |c: &mut PreviewCanvas, y: usize, label: &str, value: &str, value_color: Color| {
        c.draw_text(block_x + 10, y + 6, label, FontSize::Body, pal.text_secondary);
        c.draw_text_right(right - 10, y + 6, value, FontSize::Body, value_color);
        y + 6 + body_lh + 6
    };

    y = money_row(c, y, "SUB TOTAL:", &format_money(currency, totals.subtotal), pal.text);
    if state.active_fields.tax {
        let label = format!("TAX (GST {}%):", state.tax_rate);
        y = money_row(c, y, &label, &format_money(currency, totals.tax), pal.text);
    }
    if state.active_fields.discount && totals.total_discount > 0.0 {
        let value = format!("-{}", format_money(currency, totals.total_discount));
        y = money_row(c, y, "DISCOUNT", &value, pal.text);
    }

    y += 6;
    c.fill_rect(block_x, y, block_w, 2, pal.border);
    y += 2;
    let due_label = format!("BALANCE DUE ({currency}):");
    c.draw_text(block_x + 10, y + 10, &due_label, FontSize::Body, pal.text);
    c.draw_text_right(
        right - 10,
        y + 10,
        &format_money(currency, totals.grand_total),
        FontSize::Body,
        pal.text,
    );
    y += 10 + body_lh + 10 + 20;

    // Payment and terms sit side by side under a rule.
    c.hline(PAD, y, content_w, pal.border);
    y += 1 + 16;
    let col_w = content_w.saturating_sub(24) / 2;
    let right_col_x = PAD + col_w + 24;
    let columns_top = y;
    let mut left_y = columns_top;
    let mut right_y = columns_top;

    if state.active_fields.payment {
        c.draw_text(PAD, left_y, "PAYMENT", FontSize::Small, pal.text);
        left_y += small_lh + 8;

        if !state.payment_method.is_empty() {
            c.draw_text(PAD, left_y, &state.payment_method, FontSize::Small, pal.text);
            left_y += small_lh + 6;
        }

        let detail_rows: [(&str, &str); 4] = [
            ("BANK:", state.bank_name.as_str()),
            ("NAME:", state.account_name.as_str()),
            ("ACC:", state.account_number.as_str()),
            ("BSB/IFSC:", state.routing_number.as_str()),
        ];
        let mut any_detail = !state.payment_method.is_empty();
        for (label, value) in detail_rows {
            if value.is_empty() {
                continue;
            }
            let label_w = fonts::text_width(FontSize::Small, label);
            c.draw_text(PAD, left_y, label, FontSize::Small, pal.text);
            c.draw_text(PAD + label_w + 6, left_y, value, FontSize::Small, pal.text_secondary);
            left_y += small_lh + 3;
            any_detail = true;
        }
        if !any_detail {
            c.draw_text(PAD, left_y, "[Add payment details]", FontSize::Small, pal.text_secondary);
            left_y += small_lh;
        }

        if let (true, Some(due)) = (state.active_fields.due_date, state.due_date) {
            left_y += 8;
            let line = format!("DUE: {}", due_line_date(due));
            c.draw_text(PAD, left_y, &line, FontSize::Small, pal.text);
            left_y += small_lh;
        }
    }

    if state.active_fields.terms {
        c.draw_text(right_col_x, right_y, "TERMS & CONDITIONS", FontSize::Small, pal.text);
        right_y += small_lh + 8;

        let text = if state.terms.is_empty() {
            "[Add terms and conditions]"
        } else {
            state.terms.as_str()
        };
        for line in wrap_text(text, FontSize::Small, col_w) {
            c.draw_text(right_col_x, right_y, &line, FontSize::Small, pal.text_secondary);
            right_y += small_lh;
        }
    }

    y = left_y.max(right_y);

    // Contact footer.
    let contact_items: Vec<&str> = [
        state.company_website.as_str(),
        state.company_email.as_str(),
        state.company_phone.as_str(),
    ]
    .into_iter()
    .filter(|v| !v.is_empty())
    .collect();

    if state.active_fields.company_contact && !contact_items.is_empty() {
        y += 12;
        c.hline(PAD, y, content_w, pal.border);
        y += 1 + 10;
        let mut x = PAD;
        for item in contact_items {
            c.draw_text(x, y, item, FontSize::Small, pal.text_secondary);
            x += fonts::text_width(FontSize::Small, item) + 16;
        }
        y += small_lh;
    }

    y
}

/// Decode a `data:<mime>;base64,` logo URI into RGBA pixels.
fn decode_logo(uri: &str) -> Result<image::RgbaImage, String> {
    let b64 = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_mime, data)| data)
        .ok_or_else(|| "logo is not a base64 data URI".to_string())?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| format!("invalid base64: {e}"))?;
    let img =
        image::load_from_memory(&bytes).map_err(|e| format!("undecodable image: {e}"))?;
    Ok(img.to_rgba8())
}

/// Fit source dimensions into a box, preserving aspect ratio.
fn contain_fit(w: u32, h: u32, max_w: usize, max_h: usize) -> (usize, usize) {
    if w == 0 || h == 0 {
        return (0, 0);
    }
    let mut out_h = max_h;
    let mut out_w = (w as f64 * max_h as f64 / h as f64).round() as usize;
    if out_w > max_w {
        out_w = max_w;
        out_h = ((h as f64 * max_w as f64 / w as f64).round() as usize).min(max_h);
    }
    (out_w.max(1), out_h.max(1))
}

fn ordinal_day(day: u32) -> String {
    let suffix = match day % 100 {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{day}{suffix}")
}

/// "3rd Jun 2024", the metadata date format.
fn long_date(date: NaiveDate) -> String {
    format!("{} {}", ordinal_day(date.day()), date.format("%b %Y"))
}

/// "Jun 3rd, 2024", the payment block date format.
fn due_line_date(date: NaiveDate) -> String {
    format!("{} {}, {}", date.format("%b"), ordinal_day(date.day()), date.format("%Y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_invoice;
    use crate::theme::ThemePalette;

    fn dark() -> &'static ThemePalette {
        &ThemePalette::DARK
    }

    #[test]
    fn raster_matches_requested_geometry() {
        let raster = render_invoice(&sample_invoice(), &PreviewOptions::default(), dark()).unwrap();
        assert_eq!(raster.width, 1600);
        assert!(raster.height > 0);
        assert_eq!(
            raster.pixels.len(),
            raster.width as usize * raster.height as usize * 4
        );
    }

    #[test]
    fn background_fills_the_corners() {
        let raster = render_invoice(
            &InvoiceState::default(),
            &PreviewOptions::default(),
            &ThemePalette::LIGHT,
        )
        .unwrap();
        assert_eq!(&raster.pixels[0..4], &[255, 255, 255, 255]);
        let last = raster.pixels.len() - 4;
        assert_eq!(&raster.pixels[last..], &[255, 255, 255, 255]);

        let dark = render_invoice(
            &InvoiceState::default(),
            &PreviewOptions::default(),
            &ThemePalette::DARK,
        )
        .unwrap();
        assert_eq!(&dark.pixels[0..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn zero_geometry_is_a_capture_error() {
        let opts = PreviewOptions {
            width: 0,
            ..PreviewOptions::default()
        };
        let err = render_invoice(&sample_invoice(), &opts, dark()).unwrap_err();
        assert!(matches!(err, MillError::Capture(_)));

        let opts = PreviewOptions {
            scale: 0,
            ..PreviewOptions::default()
        };
        assert!(render_invoice(&sample_invoice(), &opts, dark()).is_err());
    }

    #[test]
    fn move_section_reorders() {
        let mut opts = PreviewOptions::default();
        opts.move_section(0, 2);
        assert_eq!(
            opts.section_order[..3],
            [
                SectionKind::CompanyInfo,
                SectionKind::InvoiceDetails,
                SectionKind::Header
            ]
        );

        let before = opts.section_order.clone();
        opts.move_section(0, 9);
        opts.move_section(9, 0);
        assert_eq!(opts.section_order, before);
    }

    #[test]
    fn section_order_changes_the_raster() {
        let state = sample_invoice();
        let default = render_invoice(&state, &PreviewOptions::default(), dark()).unwrap();

        let mut opts = PreviewOptions::default();
        opts.move_section(4, 0);
        let moved = render_invoice(&state, &opts, dark()).unwrap();
        assert_ne!(default.pixels, moved.pixels);
    }

    #[test]
    fn hidden_notes_shrink_the_render() {
        let mut state = sample_invoice();
        state.notes = "A note that occupies a card in the middle of the page.".to_string();
        let with_notes = render_invoice(&state, &PreviewOptions::default(), dark()).unwrap();

        state.active_fields.notes = false;
        let without = render_invoice(&state, &PreviewOptions::default(), dark()).unwrap();
        assert!(without.height < with_notes.height);
    }

    #[test]
    fn broken_logo_renders_like_no_logo() {
        let mut state = sample_invoice();
        state.logo = "data:image/png;base64,@@not-base64@@".to_string();
        let broken = render_invoice(&state, &PreviewOptions::default(), dark()).unwrap();

        state.logo = String::new();
        let clean = render_invoice(&state, &PreviewOptions::default(), dark()).unwrap();
        assert_eq!(broken.pixels, clean.pixels);
    }

    #[test]
    fn valid_logo_leaves_ink() {
        use base64::Engine;

        let mut img = image::RgbaImage::new(4, 4);
        for p in img.pixels_mut() {
            *p = image::Rgba([200, 30, 30, 255]);
        }
        let mut png = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut png),
            image::ImageFormat::Png,
        )
        .unwrap();
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );

        let mut state = sample_invoice();
        state.logo = uri;
        let raster = render_invoice(&state, &PreviewOptions::default(), dark()).unwrap();

        let reddish = raster.pixels.chunks_exact(4).any(|p| p[0] > 150 && p[1] < 90);
        assert!(reddish, "expected logo pixels in the render");
    }

    #[test]
    fn png_encoding_round_trips_dimensions() {
        let raster = render_invoice(&sample_invoice(), &PreviewOptions::default(), dark()).unwrap();
        let png = raster.to_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), raster.width);
        assert_eq!(decoded.height(), raster.height);
    }

    #[test]
    fn contain_fit_respects_both_limits() {
        assert_eq!(contain_fit(100, 100, 300, 80), (80, 80));
        assert_eq!(contain_fit(1000, 100, 300, 80), (300, 30));
        assert_eq!(contain_fit(10, 40, 300, 80), (20, 80));
        assert_eq!(contain_fit(0, 40, 300, 80), (0, 0));
    }

    #[test]
    fn ordinal_days_cover_the_teens() {
        assert_eq!(ordinal_day(1), "1st");
        assert_eq!(ordinal_day(2), "2nd");
        assert_eq!(ordinal_day(3), "3rd");
        assert_eq!(ordinal_day(4), "4th");
        assert_eq!(ordinal_day(11), "11th");
        assert_eq!(ordinal_day(12), "12th");
        assert_eq!(ordinal_day(13), "13th");
        assert_eq!(ordinal_day(21), "21st");
        assert_eq!(ordinal_day(22), "22nd");
        assert_eq!(ordinal_day(23), "23rd");
    }

    #[test]
    fn date_formats_match_the_layout() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(long_date(date), "3rd Jun 2024");
        assert_eq!(due_line_date(date), "Jun 3rd, 2024");
    }
}

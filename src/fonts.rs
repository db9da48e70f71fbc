//! Bitmap font metrics and glyph generation for preview rendering.
//!
//! All text is set in the Spleen 12x24 bitmap face, scaled with nearest
//! neighbour to the four sizes the invoice layout uses. Characters outside
//! the font's coverage render as a box outline.

use spleen_font::{PSF2Font, FONT_12X24};

const NATIVE_W: usize = 12;
const NATIVE_H: usize = 24;

/// The four text sizes the layout uses, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontSize {
    /// Labels and fine print.
    Small,
    /// Regular copy.
    Body,
    /// Section headings and emphasised figures.
    Heading,
    /// The INVOICE banner.
    Display,
}

/// Fixed-width cell dimensions for one size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    pub char_width: usize,
    pub char_height: usize,
}

impl FontMetrics {
    /// Vertical advance between baselines.
    pub const fn line_height(&self) -> usize {
        self.char_height * 7 / 5
    }
}

impl FontSize {
    pub const fn metrics(self) -> FontMetrics {
        match self {
            FontSize::Small => FontMetrics {
                char_width: 12,
                char_height: 24,
            },
            FontSize::Body => FontMetrics {
                char_width: 14,
                char_height: 28,
            },
            FontSize::Heading => FontMetrics {
                char_width: 18,
                char_height: 36,
            },
            FontSize::Display => FontMetrics {
                char_width: 28,
                char_height: 56,
            },
        }
    }
}

/// Width of a string in logical pixels. The face is fixed-width so this is
/// exact, not a heuristic.
pub fn text_width(size: FontSize, text: &str) -> usize {
    text.chars().count() * size.metrics().char_width
}

/// Generate a glyph bitmap for a character at the given size.
/// Each byte in the result is 0 (off) or 1 (on), row-major.
pub fn glyph(size: FontSize, ch: char) -> Vec<u8> {
    let metrics = size.metrics();
    let mut out = vec![0u8; metrics.char_width * metrics.char_height];

    // The font data is a compile-time constant, so parsing cannot fail.
    let mut spleen = PSF2Font::new(FONT_12X24).unwrap();
    let utf8 = ch.to_string();

    if let Some(rows) = spleen.glyph_for_utf8(utf8.as_bytes()) {
        let mut native = vec![0u8; NATIVE_W * NATIVE_H];
        for (y, row) in rows.enumerate() {
            for (x, on) in row.enumerate() {
                if y < NATIVE_H && x < NATIVE_W {
                    native[y * NATIVE_W + x] = if on { 1 } else { 0 };
                }
            }
        }
        if metrics.char_width == NATIVE_W && metrics.char_height == NATIVE_H {
            out = native;
        } else {
            scale_bitmap(
                &native,
                NATIVE_W,
                NATIVE_H,
                &mut out,
                metrics.char_width,
                metrics.char_height,
            );
        }
    } else {
        draw_box(&mut out, metrics.char_width, metrics.char_height);
    }

    out
}

/// Scale a bitmap from src dimensions to dst dimensions using nearest neighbour.
fn scale_bitmap(src: &[u8], src_w: usize, src_h: usize, dst: &mut [u8], dst_w: usize, dst_h: usize) {
    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx * src_w / dst_w;
            let sy = dy * src_h / dst_h;
            let src_idx = sy * src_w + sx;
            let dst_idx = dy * dst_w + dx;
            if src_idx < src.len() && dst_idx < dst.len() {
                dst[dst_idx] = src[src_idx];
            }
        }
    }
}

/// Box outline for characters the font does not cover.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    for x in 0..width {
        glyph[x] = 1;
        glyph[(height - 1) * width + x] = 1;
    }
    for y in 0..height {
        glyph[y * width] = 1;
        glyph[y * width + width - 1] = 1;
    }
}

/// Word-wrap text to fit within `max_width` logical pixels. Existing
/// newlines start fresh paragraphs; a single word wider than the limit gets
/// its own line rather than being split.
pub fn wrap_text(text: &str, size: FontSize, max_width: usize) -> Vec<String> {
    if max_width == 0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in &words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };
            if text_width(size, &candidate) > max_width && !current_line.is_empty() {
                lines.push(current_line);
                current_line = word.to_string();
            } else {
                current_line = candidate;
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_scale_from_the_native_cell() {
        assert_eq!(FontSize::Small.metrics().char_width, 12);
        assert_eq!(FontSize::Small.metrics().char_height, 24);
        assert_eq!(FontSize::Display.metrics().char_width, 28);
        assert_eq!(FontSize::Display.metrics().char_height, 56);
    }

    #[test]
    fn line_height_exceeds_the_cell() {
        for size in [
            FontSize::Small,
            FontSize::Body,
            FontSize::Heading,
            FontSize::Display,
        ] {
            let m = size.metrics();
            assert!(m.line_height() > m.char_height);
        }
    }

    #[test]
    fn glyphs_have_ink_at_every_size() {
        for size in [
            FontSize::Small,
            FontSize::Body,
            FontSize::Heading,
            FontSize::Display,
        ] {
            let m = size.metrics();
            let g = glyph(size, 'A');
            assert_eq!(g.len(), m.char_width * m.char_height);
            assert!(g.iter().any(|&p| p != 0));
        }
    }

    #[test]
    fn uncovered_chars_render_a_box() {
        let m = FontSize::Small.metrics();
        let g = glyph(FontSize::Small, '\u{1F984}');
        // Outline corners are set, interior centre is not.
        assert_eq!(g[0], 1);
        assert_eq!(g[m.char_width - 1], 1);
        assert_eq!(g[(m.char_height / 2) * m.char_width + m.char_width / 2], 0);
    }

    #[test]
    fn text_width_is_exact() {
        assert_eq!(text_width(FontSize::Small, "Hello"), 5 * 12);
        assert_eq!(text_width(FontSize::Heading, ""), 0);
    }

    #[test]
    fn word_wrap_basic() {
        // 10 chars fit per line at Small (120 / 12).
        let lines = wrap_text("aaaa bbbb cccc", FontSize::Small, 120);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn word_wrap_keeps_paragraphs() {
        let lines = wrap_text("one\n\ntwo", FontSize::Small, 240);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn oversized_word_gets_its_own_line() {
        let lines = wrap_text("a extraordinarily b", FontSize::Small, 96);
        assert_eq!(lines, vec!["a", "extraordinarily", "b"]);
    }
}

use unicode_width::UnicodeWidthStr;

/// Measured box of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

/// Text measurement supplied by the host.
///
/// The engine never rasterizes; it only needs widths (for speeds, exits and
/// collision prediction) and heights (for lane geometry).
pub trait GlyphMetrics {
    fn measure(&self, text: &str, font_size: f64) -> TextExtent;

    /// Height of one line of text at `font_size`, used to size lanes.
    fn line_height(&self, font_size: f64) -> f64;
}

impl<M: GlyphMetrics + ?Sized> GlyphMetrics for &M {
    fn measure(&self, text: &str, font_size: f64) -> TextExtent {
        (**self).measure(text, font_size)
    }

    fn line_height(&self, font_size: f64) -> f64 {
        (**self).line_height(font_size)
    }
}

/// Estimate from terminal column widths: a narrow glyph advances
/// `advance_ratio * font_size`, a wide (CJK) glyph twice that.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMetrics {
    pub advance_ratio: f64,
    pub line_ratio: f64,
}

impl Default for ApproxMetrics {
    fn default() -> Self {
        Self {
            advance_ratio: 0.5,
            line_ratio: 1.2,
        }
    }
}

impl GlyphMetrics for ApproxMetrics {
    fn measure(&self, text: &str, font_size: f64) -> TextExtent {
        TextExtent {
            width: text.width() as f64 * self.advance_ratio * font_size,
            height: self.line_height(font_size),
        }
    }

    fn line_height(&self, font_size: f64) -> f64 {
        font_size * self.line_ratio
    }
}

/// Convert a density-independent size to whole pixels, rounding half up.
pub fn dp_to_px(dp: f64, dpr: f64) -> f64 {
    (dp * dpr + 0.5).floor()
}

/// Pixel font size for a requested comment size: clamp to `max_size`,
/// convert to pixels, then scale.
pub fn font_size_px(requested: f64, max_size: f64, dpr: f64, scale: f64) -> f64 {
    dp_to_px(requested.min(max_size), dpr) * scale
}

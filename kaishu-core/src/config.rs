//! Engine metrics.
//!
//! All tuning values are supplied to the engine from the outside; nothing
//! in the core reads global state. The defaults match the reference
//! typeface: a 1024-unit em with a 32-unit brush.

use kaishu_graphics::Scalar;

/// Canvas and brush metrics for one generation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Em size; skeleton coordinates are scaled by this and rounded.
    pub font_size: Scalar,
    /// Nominal brush width. Serif and hook tables are tuned for 32.
    pub stroke_width: Scalar,
    /// Fraction of the em the glyph body occupies; the rest is split into
    /// left and right side bearings.
    pub glyph_width_ratio: Scalar,
    /// Horizontal advance of a full-width glyph.
    pub char_advance: Scalar,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            font_size: 1024.0,
            stroke_width: 32.0,
            glyph_width_ratio: 0.76,
            char_advance: 860.0,
        }
    }
}

impl Metrics {
    /// Left side bearing that centers the glyph body in the em.
    #[must_use]
    pub fn glyph_offset(&self) -> Scalar {
        self.font_size * (1.0 - self.glyph_width_ratio) / 2.0
    }

    /// Half the brush width.
    #[must_use]
    pub fn half_width(&self) -> Scalar {
        self.stroke_width / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_glyph_offset() {
        let m = Metrics::default();
        assert!((m.glyph_offset() - 122.88).abs() < 1e-9);
        assert!((m.half_width() - 16.0).abs() < 1e-9);
    }
}

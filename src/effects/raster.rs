use crate::foundation::error::{MontageError, MontageResult};

/// Text layout input handed to a [`TextRasterizer`].
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayoutRequest<'a> {
    /// UTF-8 text, may contain newlines.
    pub text: &'a str,
    /// Font family name.
    pub font: &'a str,
    /// Font size in pixels.
    pub size_px: f32,
    /// Wrap width in pixels, `None` for no wrapping.
    pub wrap_width: Option<u32>,
    /// Horizontal alignment of lines inside the laid-out block.
    pub align: HAlign,
}

/// Horizontal placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    /// Left edge.
    Left,
    /// Centered.
    Center,
    /// Right edge.
    Right,
}

/// Vertical placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    /// Top edge.
    Top,
    /// Centered.
    Center,
    /// Bottom edge.
    Bottom,
}

/// Lays out and rasterizes text; the text effect only composes the coverage it
/// returns. [`crate::effects::font::FontRasterizer`] is the bundled implementation.
pub trait TextRasterizer: Send + Sync {
    /// Lay out and rasterize text into a coverage mask.
    fn rasterize(&self, req: &TextLayoutRequest<'_>) -> MontageResult<GlyphMask>;
}

/// Rasterizer that produces no coverage.
#[cfg(test)]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NullRasterizer;

#[cfg(test)]
impl TextRasterizer for NullRasterizer {
    fn rasterize(&self, _req: &TextLayoutRequest<'_>) -> MontageResult<GlyphMask> {
        Ok(GlyphMask::empty())
    }
}

/// Single-channel coverage in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphMask {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height` coverage values.
    pub coverage: Vec<f32>,
}

impl GlyphMask {
    /// Zero-sized mask.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            coverage: Vec::new(),
        }
    }

    /// Build a mask, checking the buffer length.
    pub fn new(width: u32, height: u32, coverage: Vec<f32>) -> MontageResult<Self> {
        if coverage.len() != (width as usize) * (height as usize) {
            return Err(MontageError::effect("glyph mask must match width*height"));
        }
        Ok(Self {
            width,
            height,
            coverage,
        })
    }

    /// `true` when the mask covers nothing.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Coverage at `(x, y)`, zero outside the mask.
    pub fn at(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return 0.0;
        }
        self.coverage[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Grow coverage by `radius` pixels (max filter). The result is padded by `radius`
    /// on every side, so its origin sits `radius` pixels up-left of the input's.
    pub fn dilate(&self, radius: u32) -> Self {
        if radius == 0 || self.is_empty() {
            return self.clone();
        }
        let r = i64::from(radius);
        let w = self.width + 2 * radius;
        let h = self.height + 2 * radius;
        let mut out = vec![0.0f32; (w as usize) * (h as usize)];
        for y in 0..i64::from(h) {
            for x in 0..i64::from(w) {
                let mut m = 0.0f32;
                for dy in -r..=r {
                    for dx in -r..=r {
                        if dx * dx + dy * dy > r * r {
                            continue;
                        }
                        m = m.max(self.at(x - r + dx, y - r + dy));
                    }
                }
                out[(y as usize) * (w as usize) + (x as usize)] = m;
            }
        }
        Self {
            width: w,
            height: h,
            coverage: out,
        }
    }

    /// Gaussian blur with `sigma = radius / 2`, padded by `radius` like [`Self::dilate`].
    pub fn blur(&self, radius: u32) -> Self {
        if radius == 0 || self.is_empty() {
            return self.clone();
        }
        let kernel = gaussian_kernel(radius);
        let r = i64::from(radius);
        let w = self.width + 2 * radius;
        let h = self.height + 2 * radius;

        let mut tmp = vec![0.0f32; (w as usize) * (h as usize)];
        for y in 0..i64::from(h) {
            for x in 0..i64::from(w) {
                let mut acc = 0.0f32;
                for (k, weight) in kernel.iter().enumerate() {
                    acc += weight * self.at(x - r + (k as i64 - r), y - r);
                }
                tmp[(y as usize) * (w as usize) + (x as usize)] = acc;
            }
        }

        let padded = Self {
            width: w,
            height: h,
            coverage: tmp,
        };
        let mut out = vec![0.0f32; (w as usize) * (h as usize)];
        for y in 0..i64::from(h) {
            for x in 0..i64::from(w) {
                let mut acc = 0.0f32;
                for (k, weight) in kernel.iter().enumerate() {
                    acc += weight * padded.at(x, y + (k as i64 - r));
                }
                out[(y as usize) * (w as usize) + (x as usize)] = acc.clamp(0.0, 1.0);
            }
        }
        Self {
            width: w,
            height: h,
            coverage: out,
        }
    }
}

fn gaussian_kernel(radius: u32) -> Vec<f32> {
    let r = radius as i32;
    let sigma = f64::from(radius) / 2.0;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| (w / sum) as f32).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/effects/raster.rs"]
mod tests;

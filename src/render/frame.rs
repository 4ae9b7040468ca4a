use crate::foundation::{
    core::Color,
    error::{MontageError, MontageResult},
};

/// Premultiplied RGBA pixel.
pub type PremulRgba = [f32; 4];

/// Source-over for premultiplied pixels with an extra opacity on `src`.
pub fn over(dst: PremulRgba, src: PremulRgba, opacity: f32) -> PremulRgba {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] <= 0.0 {
        return dst;
    }
    let sa = src[3] * opacity;
    let inv = 1.0 - sa;
    [
        src[0] * opacity + dst[0] * inv,
        src[1] * opacity + dst[1] * inv,
        src[2] * opacity + dst[2] * inv,
        sa + dst[3] * inv,
    ]
}

/// Premultiplied RGBA frame with `f32` components, row-major, top-left origin.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` premultiplied components.
    pub data: Vec<f32>,
}

impl VideoFrame {
    /// Fully transparent frame.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::solid(width, height, Color::TRANSPARENT)
    }

    /// Frame filled with `color`.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let px = color.premultiplied();
        let n = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(n * 4);
        for _ in 0..n {
            data.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap straight-alpha RGBA8 bytes (as produced by image decoders).
    pub fn from_straight_rgba8(width: u32, height: u32, bytes: &[u8]) -> MontageResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if bytes.len() != expected {
            return Err(MontageError::validation(
                "rgba8 buffer must match width*height*4",
            ));
        }
        let data = bytes
            .chunks_exact(4)
            .flat_map(|p| {
                Color::rgba(
                    f32::from(p[0]) / 255.0,
                    f32::from(p[1]) / 255.0,
                    f32::from(p[2]) / 255.0,
                    f32::from(p[3]) / 255.0,
                )
                .premultiplied()
            })
            .collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Straight-alpha RGBA8 bytes for image encoders.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.data
            .chunks_exact(4)
            .flat_map(|p| {
                let a = p[3].clamp(0.0, 1.0);
                if a <= 0.0 {
                    return [0, 0, 0, 0];
                }
                [q(p[0] / a), q(p[1] / a), q(p[2] / a), q(a)]
            })
            .collect()
    }

    /// `true` when both frames have identical dimensions.
    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> PremulRgba {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Overwrite pixel at `(x, y)`.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: PremulRgba) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Composite `src` over `self` with `opacity`.
    pub fn over_in_place(&mut self, src: &Self, opacity: f32) -> MontageResult<()> {
        if !self.same_size(src) {
            return Err(MontageError::validation(
                "over_in_place expects equal-size frames",
            ));
        }
        for (d, s) in self.data.chunks_exact_mut(4).zip(src.data.chunks_exact(4)) {
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
            d.copy_from_slice(&out);
        }
        Ok(())
    }

    /// Multiply every component (color and alpha) by `factor`.
    pub fn scale_alpha(&mut self, factor: f32) {
        let factor = factor.clamp(0.0, 1.0);
        if factor >= 1.0 {
            return;
        }
        for v in &mut self.data {
            *v *= factor;
        }
    }

    /// Multiply color components by `factor`, keeping alpha.
    pub fn scale_color(&mut self, factor: f32) {
        let factor = factor.clamp(0.0, 1.0);
        for px in self.data.chunks_exact_mut(4) {
            px[0] *= factor;
            px[1] *= factor;
            px[2] *= factor;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;

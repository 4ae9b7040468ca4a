use kurbo::{Affine, Point, Vec2};
use rayon::prelude::*;

use crate::{
    effects::{
        effect::{EffectProcessor, Params, VideoContext},
        field::{EffectField, FieldDomain, FieldValue},
    },
    foundation::error::MontageResult,
    render::frame::{PremulRgba, VideoFrame},
};

/// Base video effect.
///
/// Position and anchor are pixel offsets from the frame centre, scale is a percentage
/// and rotation is in degrees. The pipeline is
/// `T(centre + position) * R * S * T(-(centre + anchor))`, matching a pivot about the
/// anchor point.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransformEffect;

/// Resolved transform parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformParams {
    /// Offset from the frame centre.
    pub position: Vec2,
    /// Pivot offset from the frame centre.
    pub anchor: Vec2,
    /// Uniform scale factor (1.0 = 100%).
    pub scale: f64,
    /// Rotation in degrees, clockwise on screen.
    pub rotation_deg: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

impl TransformParams {
    fn resolve(p: &Params<'_>) -> MontageResult<Self> {
        Ok(Self {
            position: Vec2::new(p.double("position_x")?, p.double("position_y")?),
            anchor: Vec2::new(p.double("anchor_x")?, p.double("anchor_y")?),
            scale: p.double("scale")? / 100.0,
            rotation_deg: p.double("rotation")?,
            opacity: p.double("opacity")? / 100.0,
        })
    }

    /// `true` when only opacity may change pixels.
    pub fn is_geometric_identity(&self) -> bool {
        self.position - self.anchor == Vec2::ZERO
            && self.scale == 1.0
            && self.rotation_deg % 360.0 == 0.0
    }

    /// Forward mapping from source pixel space to output pixel space.
    pub fn to_affine(self, width: u32, height: u32) -> Affine {
        let centre = Vec2::new(f64::from(width) / 2.0, f64::from(height) / 2.0);
        let t_place = Affine::translate(centre + self.position);
        let t_rotate = Affine::rotate(self.rotation_deg.to_radians());
        let t_scale = Affine::scale(self.scale);
        let t_pivot = Affine::translate(-(centre + self.anchor));
        t_place * t_rotate * t_scale * t_pivot
    }
}

fn offset_field(id: &str) -> EffectField {
    EffectField::new(
        id,
        FieldDomain::Double {
            min: -100_000.0,
            max: 100_000.0,
        },
        FieldValue::Double(0.0),
    )
}

fn fetch(frame: &VideoFrame, x: i64, y: i64) -> PremulRgba {
    if x < 0 || y < 0 || x >= i64::from(frame.width) || y >= i64::from(frame.height) {
        return [0.0; 4];
    }
    frame.pixel(x as u32, y as u32)
}

fn sample_bilinear(frame: &VideoFrame, p: Point) -> PremulRgba {
    let fx = p.x - 0.5;
    let fy = p.y - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = (fx - x0) as f32;
    let ty = (fy - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);
    let a = fetch(frame, x0, y0);
    let b = fetch(frame, x0 + 1, y0);
    let c = fetch(frame, x0, y0 + 1);
    let d = fetch(frame, x0 + 1, y0 + 1);
    let mut out = [0.0f32; 4];
    for i in 0..4 {
        let top = a[i] + (b[i] - a[i]) * tx;
        let bottom = c[i] + (d[i] - c[i]) * tx;
        out[i] = top + (bottom - top) * ty;
    }
    out
}

impl EffectProcessor for TransformEffect {
    fn fields(&self) -> Vec<EffectField> {
        vec![
            offset_field("position_x"),
            offset_field("position_y"),
            EffectField::new(
                "scale",
                FieldDomain::Double {
                    min: 0.0,
                    max: 10_000.0,
                },
                FieldValue::Double(100.0),
            ),
            EffectField::new(
                "rotation",
                FieldDomain::Double {
                    min: -36_000.0,
                    max: 36_000.0,
                },
                FieldValue::Double(0.0),
            ),
            offset_field("anchor_x"),
            offset_field("anchor_y"),
            EffectField::new(
                "opacity",
                FieldDomain::Double {
                    min: 0.0,
                    max: 100.0,
                },
                FieldValue::Double(100.0),
            ),
        ]
    }

    fn process_video(
        &self,
        params: Params<'_>,
        _ctx: &VideoContext<'_>,
        frame: &mut VideoFrame,
    ) -> MontageResult<()> {
        let t = TransformParams::resolve(&params)?;
        if t.opacity <= 0.0 || t.scale <= 0.0 {
            *frame = VideoFrame::transparent(frame.width, frame.height);
            return Ok(());
        }
        if !t.is_geometric_identity() {
            let inverse = t.to_affine(frame.width, frame.height).inverse();
            let width = frame.width as usize;
            let src = &*frame;
            let mut out = VideoFrame::transparent(frame.width, frame.height);
            if width > 0 {
                out.data
                    .par_chunks_mut(width * 4)
                    .enumerate()
                    .for_each(|(y, row)| {
                        for (x, px) in row.chunks_exact_mut(4).enumerate() {
                            let p = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                            px.copy_from_slice(&sample_bilinear(src, p));
                        }
                    });
            }
            *frame = out;
        }
        frame.scale_alpha(t.opacity as f32);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transform.rs"]
mod tests;

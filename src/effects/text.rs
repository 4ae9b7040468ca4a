use crate::{
    effects::{
        effect::{EffectProcessor, Params, VideoContext},
        field::{EffectField, FieldDomain, FieldValue},
        raster::{GlyphMask, HAlign, TextLayoutRequest, VAlign},
    },
    foundation::{core::Color, error::MontageResult},
    render::frame::{VideoFrame, over},
};

/// Text overlay. Superimposes onto the incoming frame: shadow, then outline, then fill.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextEffect;

/// Fraction of the short frame edge kept clear around aligned text.
pub const TEXT_PADDING_RATIO: f64 = 0.05;

fn number(id: &str, min: f64, max: f64, default: f64) -> EffectField {
    EffectField::new(
        id,
        FieldDomain::Double { min, max },
        FieldValue::Double(default),
    )
}

fn color(id: &str, c: Color) -> EffectField {
    EffectField::new(id, FieldDomain::Color, FieldValue::Color(c))
}

fn toggle(id: &str, on: bool) -> EffectField {
    EffectField::new(id, FieldDomain::Bool, FieldValue::Bool(on))
}

/// Composite `mask` tinted with `color` onto `frame` with its top-left at `(x0, y0)`.
fn stamp(frame: &mut VideoFrame, mask: &GlyphMask, x0: i64, y0: i64, color: Color, opacity: f32) {
    let src = color.premultiplied();
    for my in 0..i64::from(mask.height) {
        let y = y0 + my;
        if y < 0 || y >= i64::from(frame.height) {
            continue;
        }
        for mx in 0..i64::from(mask.width) {
            let x = x0 + mx;
            if x < 0 || x >= i64::from(frame.width) {
                continue;
            }
            let cov = mask.at(mx, my);
            if cov <= 0.0 {
                continue;
            }
            let (xu, yu) = (x as u32, y as u32);
            let dst = frame.pixel(xu, yu);
            frame.set_pixel(xu, yu, over(dst, src, cov * opacity));
        }
    }
}

impl EffectProcessor for TextEffect {
    fn fields(&self) -> Vec<EffectField> {
        vec![
            EffectField::new(
                "text",
                FieldDomain::Text,
                FieldValue::Text("Sample Text".to_string()),
            ),
            number("size", 1.0, 1000.0, 48.0),
            color("color", Color::WHITE),
            EffectField::new("font", FieldDomain::Font, FieldValue::Font("Sans".to_string())),
            EffectField::new(
                "halign",
                FieldDomain::options(&["left", "center", "right"]),
                FieldValue::Enum(1),
            ),
            EffectField::new(
                "valign",
                FieldDomain::options(&["top", "center", "bottom"]),
                FieldValue::Enum(1),
            ),
            toggle("word_wrap", true),
            toggle("outline", false),
            number("outline_width", 0.0, 100.0, 2.0),
            color("outline_color", Color::BLACK),
            toggle("shadow", false),
            number("shadow_distance", 0.0, 100.0, 5.0),
            color("shadow_color", Color::BLACK),
            number("shadow_softness", 0.0, 100.0, 5.0),
            number("shadow_opacity", 0.0, 100.0, 50.0),
        ]
    }

    fn process_video(
        &self,
        params: Params<'_>,
        ctx: &VideoContext<'_>,
        frame: &mut VideoFrame,
    ) -> MontageResult<()> {
        let text = params.text("text")?;
        let font = params.text("font")?;
        let size = params.double("size")?;
        let fill = params.color("color")?;
        let halign = params.choice("halign")?;
        let valign = params.choice("valign")?;
        let wrap = params.bool("word_wrap")?;
        let outline = params
            .bool("outline")?
            .then(|| -> MontageResult<_> {
                Ok((params.double("outline_width")?, params.color("outline_color")?))
            })
            .transpose()?;
        let shadow = params
            .bool("shadow")?
            .then(|| -> MontageResult<_> {
                Ok((
                    params.double("shadow_distance")?,
                    params.color("shadow_color")?,
                    params.double("shadow_softness")?,
                    params.double("shadow_opacity")? / 100.0,
                ))
            })
            .transpose()?;

        if text.is_empty() {
            return Ok(());
        }
        let pad = (f64::from(frame.width.min(frame.height)) * TEXT_PADDING_RATIO).round() as i64;
        let align = match halign {
            0 => HAlign::Left,
            2 => HAlign::Right,
            _ => HAlign::Center,
        };
        let valign = match valign {
            0 => VAlign::Top,
            2 => VAlign::Bottom,
            _ => VAlign::Center,
        };
        let wrap_width = wrap.then(|| (i64::from(frame.width) - 2 * pad).max(1) as u32);
        let mask = ctx.rasterizer.rasterize(&TextLayoutRequest {
            text: &text,
            font: &font,
            size_px: size as f32,
            wrap_width,
            align,
        })?;
        if mask.is_empty() {
            return Ok(());
        }

        let free_x = i64::from(frame.width) - i64::from(mask.width);
        let free_y = i64::from(frame.height) - i64::from(mask.height);
        let x = match align {
            HAlign::Left => pad,
            HAlign::Center => free_x / 2,
            HAlign::Right => free_x - pad,
        };
        let y = match valign {
            VAlign::Top => pad,
            VAlign::Center => free_y / 2,
            VAlign::Bottom => free_y - pad,
        };

        if let Some((distance, shadow_color, softness, opacity)) = shadow {
            let radius = softness.round() as u32;
            let blurred = mask.blur(radius);
            let offset = (distance / std::f64::consts::SQRT_2).round() as i64;
            let r = i64::from(radius);
            stamp(
                frame,
                &blurred,
                x - r + offset,
                y - r + offset,
                shadow_color,
                opacity as f32,
            );
        }
        if let Some((width, outline_color)) = outline {
            let radius = width.round() as u32;
            let grown = mask.dilate(radius);
            let r = i64::from(radius);
            stamp(frame, &grown, x - r, y - r, outline_color, 1.0);
        }
        stamp(frame, &mask, x, y, fill, 1.0);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/text.rs"]
mod tests;

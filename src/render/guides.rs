//! Display-only overlays and transforms. Nothing here feeds back into rendered or
//! mixed output.

use kurbo::{Rect, Size};

use crate::{
    config::TitleSafeConfig,
    foundation::core::Color,
    render::frame::{VideoFrame, over},
};

/// Action-safe area as a fraction of the guide box.
pub const ACTION_SAFE: f64 = 0.9;
/// Title-safe area as a fraction of the guide box.
pub const TITLE_SAFE: f64 = 0.8;

const GUIDE_COLOR: Color = Color::rgba(1.0, 1.0, 1.0, 0.75);

/// Action-safe and title-safe rectangles for a `width x height` frame. With
/// `custom_ratio`, the guides are fitted into the largest centred box of that
/// width/height ratio.
pub fn safe_areas(width: u32, height: u32, custom_ratio: Option<f64>) -> (Rect, Rect) {
    let frame = Size::new(f64::from(width), f64::from(height));
    let guide = match custom_ratio {
        Some(r) if r.is_finite() && r > 0.0 => {
            if frame.width / frame.height.max(1.0) > r {
                Size::new(frame.height * r, frame.height)
            } else {
                Size::new(frame.width, frame.width / r)
            }
        }
        _ => frame,
    };
    let centre = frame.to_rect().center();
    let inset = |fraction: f64| Rect::from_center_size(centre, guide * fraction);
    (inset(ACTION_SAFE), inset(TITLE_SAFE))
}

/// Copy of `frame` with the safe-area outlines drawn on top.
pub fn title_safe_overlay(frame: &VideoFrame, cfg: &TitleSafeConfig) -> VideoFrame {
    let mut out = frame.clone();
    let (action, title) = safe_areas(frame.width, frame.height, cfg.custom_ratio);
    outline(&mut out, action);
    outline(&mut out, title);
    out
}

fn outline(frame: &mut VideoFrame, rect: Rect) {
    if frame.width == 0 || frame.height == 0 {
        return;
    }
    let max_x = f64::from(frame.width - 1);
    let max_y = f64::from(frame.height - 1);
    let x0 = rect.x0.round().clamp(0.0, max_x) as u32;
    let x1 = (rect.x1.round() - 1.0).clamp(0.0, max_x) as u32;
    let y0 = rect.y0.round().clamp(0.0, max_y) as u32;
    let y1 = (rect.y1.round() - 1.0).clamp(0.0, max_y) as u32;
    let px = GUIDE_COLOR.premultiplied();

    let mut stamp = |x: u32, y: u32| {
        let blended = over(frame.pixel(x, y), px, 1.0);
        frame.set_pixel(x, y, blended);
    };
    for x in x0..=x1 {
        stamp(x, y0);
        if y1 != y0 {
            stamp(x, y1);
        }
    }
    for y in (y0 + 1)..y1 {
        stamp(x0, y);
        if x1 != x0 {
            stamp(x1, y);
        }
    }
}

/// Split interleaved `samples` into per-channel display values. Rectified mode
/// shows magnitudes.
pub fn waveform_display(samples: &[f32], channels: u16, rectified: bool) -> Vec<Vec<f32>> {
    let channels = usize::from(channels.max(1));
    let mut out = vec![Vec::with_capacity(samples.len() / channels); channels];
    for frame in samples.chunks_exact(channels) {
        for (c, s) in frame.iter().enumerate() {
            out[c].push(if rectified { s.abs() } else { *s });
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/guides.rs"]
mod tests;

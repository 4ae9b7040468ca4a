use crate::{
    effects::effect::VideoContext,
    foundation::core::{Color, FrameIndex},
    media::decoder::MediaDecoder,
    model::clip::Clip,
    render::frame::VideoFrame,
};

/// Decode, run the effect chain and apply transitions for one clip at timeline
/// `frame`. `None` when the clip is not visible there.
///
/// A decoder failure substitutes opaque black for this clip only.
pub fn render_clip(
    clip: &Clip,
    frame: FrameIndex,
    width: u32,
    height: u32,
    decoder: &dyn MediaDecoder,
    ctx: &VideoContext<'_>,
) -> Option<VideoFrame> {
    let local = clip.local_frame(frame)?;
    let source = clip.source_frame(frame)?;

    let mut img = match decoder.video_frame(&clip.media, source, width, height) {
        Ok(img) if img.width == width && img.height == height => img,
        Ok(img) => {
            tracing::warn!(
                clip = %clip.id,
                got_w = img.width,
                got_h = img.height,
                "decoded frame has the wrong size; substituting black"
            );
            VideoFrame::solid(width, height, Color::BLACK)
        }
        Err(e) => {
            tracing::warn!(clip = %clip.id, error = %e, "media unavailable; substituting black");
            VideoFrame::solid(width, height, Color::BLACK)
        }
    };

    for fx in &clip.effects {
        fx.apply_video(source, ctx, &mut img);
    }
    for (t, visibility) in clip.active_transitions(local) {
        t.apply_video(&mut img, visibility);
    }
    Some(img)
}

/// Source-over `layers` bottom first onto a transparent canvas.
pub fn composite_layers(layers: &[VideoFrame], width: u32, height: u32) -> VideoFrame {
    let mut acc = VideoFrame::transparent(width, height);
    for layer in layers {
        if let Err(e) = acc.over_in_place(layer, 1.0) {
            tracing::warn!(error = %e, "layer skipped");
        }
    }
    acc
}

#[cfg(test)]
#[path = "../../tests/unit/render/video.rs"]
mod tests;

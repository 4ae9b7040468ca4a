use super::*;
use crate::{
    effects::{field::FieldValue, raster::NullRasterizer},
    foundation::core::{ClipId, FrameRange, MediaId, MediaKind, TrackId},
    media::decoder::{MemoryDecoder, MemorySource},
    model::transition::{Transition, TransitionKind, TransitionSide},
};

fn ctx() -> VideoContext<'static> {
    VideoContext {
        rasterizer: &NullRasterizer,
    }
}

fn clip(media: &str, start: u64, end: u64, clip_in: u64) -> Clip {
    Clip::new(
        ClipId(9),
        TrackId(1),
        MediaKind::Video,
        MediaId::new(media),
        FrameRange::frames(start, end).unwrap(),
        clip_in,
    )
}

fn decoder() -> MemoryDecoder {
    MemoryDecoder::new()
        .with("red", MemorySource::Color(Color::rgba(1.0, 0.0, 0.0, 1.0)))
        .with(
            "ramp",
            MemorySource::Frames(vec![Color::BLACK, Color::WHITE, Color::BLACK]),
        )
}

#[test]
fn invisible_outside_range() {
    let c = clip("red", 10, 20, 0);
    let d = decoder();
    assert!(render_clip(&c, FrameIndex(9), 2, 2, &d, &ctx()).is_none());
    assert!(render_clip(&c, FrameIndex(20), 2, 2, &d, &ctx()).is_none());
    assert!(render_clip(&c, FrameIndex(19), 2, 2, &d, &ctx()).is_some());
}

#[test]
fn source_frame_honours_clip_in() {
    let c = clip("ramp", 10, 12, 1);
    let d = decoder();
    let f = render_clip(&c, FrameIndex(10), 1, 1, &d, &ctx()).unwrap();
    assert_eq!(f.pixel(0, 0), [1.0, 1.0, 1.0, 1.0]);
    let f = render_clip(&c, FrameIndex(11), 1, 1, &d, &ctx()).unwrap();
    assert_eq!(f.pixel(0, 0), [0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn missing_media_becomes_opaque_black() {
    let c = clip("gone", 0, 5, 0);
    let f = render_clip(&c, FrameIndex(2), 2, 2, &decoder(), &ctx()).unwrap();
    assert_eq!(f, VideoFrame::solid(2, 2, Color::BLACK));
}

#[test]
fn base_opacity_and_dissolve_scale_alpha() {
    let mut c = clip("red", 0, 10, 0);
    c.effects[0]
        .field_mut("opacity")
        .unwrap()
        .set_constant(FieldValue::Double(50.0))
        .unwrap();
    c.transition_in = Some(Transition::new(TransitionKind::CrossDissolve, 2).unwrap());

    let d = decoder();
    let f = render_clip(&c, FrameIndex(0), 1, 1, &d, &ctx()).unwrap();
    assert_eq!(f.pixel(0, 0), [0.25, 0.0, 0.0, 0.25]);
    let f = render_clip(&c, FrameIndex(5), 1, 1, &d, &ctx()).unwrap();
    assert_eq!(f.pixel(0, 0), [0.5, 0.0, 0.0, 0.5]);
    assert!(c.transition(TransitionSide::Closing).is_none());
}

#[test]
fn half_transparent_top_blends_evenly() {
    let bottom = VideoFrame::solid(1, 1, Color::rgba(0.0, 0.0, 1.0, 1.0));
    let top = VideoFrame::solid(1, 1, Color::rgba(1.0, 0.0, 0.0, 0.5));
    let out = composite_layers(&[bottom, top], 1, 1);
    assert_eq!(out.pixel(0, 0), [0.5, 0.0, 0.5, 1.0]);
}

#[test]
fn empty_stack_is_transparent() {
    assert_eq!(composite_layers(&[], 2, 1), VideoFrame::transparent(2, 1));
}

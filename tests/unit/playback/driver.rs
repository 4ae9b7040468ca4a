use super::*;
use crate::{
    config::EngineConfig,
    edit::command::Command,
    foundation::core::{Fps, MediaKind},
    media::decoder::MemoryDecoder,
    model::sequence::Workarea,
};

fn setup() -> (Editor, Compositor) {
    let mut s = Sequence::new("p", 2, 2, Fps::new(25, 1).unwrap(), 100);
    s.add_track(MediaKind::Video);
    s.add_track(MediaKind::Audio);
    let config = EngineConfig::default();
    let editor = Editor::new(s, config.clone()).unwrap();
    let compositor = Compositor::new(config, Arc::new(MemoryDecoder::new())).unwrap();
    (editor, compositor)
}

#[test]
fn idle_playback_yields_nothing() {
    let (ed, comp) = setup();
    let p = Playback::new();
    assert!(p.next_frame(&ed, &comp).unwrap().is_none());
    assert!(p.next_audio(&ed, &comp, 4).unwrap().is_none());
}

#[test]
fn frames_advance_until_stopped_from_another_thread() {
    let (ed, comp) = setup();
    ed.seek(FrameIndex(3)).unwrap();
    let p = Playback::new();
    p.start(&ed).unwrap();

    let (f, _) = p.next_frame(&ed, &comp).unwrap().unwrap();
    assert_eq!(f, FrameIndex(3));
    let (f, _) = p.next_frame(&ed, &comp).unwrap().unwrap();
    assert_eq!(f, FrameIndex(4));

    let handle = p.stop_handle();
    std::thread::spawn(move || handle.store(false, Ordering::SeqCst))
        .join()
        .unwrap();
    assert!(!p.is_running());
    assert!(p.next_frame(&ed, &comp).unwrap().is_none());
    assert_eq!(p.position(), FrameIndex(5));
}

#[test]
fn audio_windows_are_contiguous_and_full_length() {
    let (ed, comp) = setup();
    let p = Playback::new();
    p.start(&ed).unwrap();
    let a = p.next_audio(&ed, &comp, 6).unwrap().unwrap();
    assert_eq!(a.len(), 12);
    assert_eq!(p.sample.load(Ordering::SeqCst), 6);
    p.stop();
    assert!(p.next_audio(&ed, &comp, 6).unwrap().is_none());
}

#[test]
fn looping_wraps_inside_workarea() {
    let (ed, comp) = setup();
    ed.execute(Command::SetWorkarea {
        workarea: Some(Workarea::new(FrameIndex(2), FrameIndex(4)).unwrap()),
    })
    .unwrap();
    let p = Playback::new();
    p.set_looping(true);
    p.seek(&ed, &comp, FrameIndex(2)).unwrap();
    p.start(&ed).unwrap();

    let seen: Vec<u64> = (0..5)
        .map(|_| p.next_frame(&ed, &comp).unwrap().unwrap().0.0)
        .collect();
    assert_eq!(seen, vec![2, 3, 2, 3, 2]);

    // Workarea [2, 4) spans samples [8, 16) at four samples per frame.
    p.next_audio(&ed, &comp, 8).unwrap().unwrap();
    assert_eq!(p.sample.load(Ordering::SeqCst), 8);
}

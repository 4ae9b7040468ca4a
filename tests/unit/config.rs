use super::*;

#[test]
fn defaults_match_documented_values() {
    let c = EngineConfig::default();
    assert_eq!(c.ripple_scope, RippleScope::LinkedTracks);
    assert_eq!(c.default_transition_length, 30);
    assert_eq!(c.audio_channels, 2);
    assert!(c.render.parallel);
    assert!(c.edit_selects_links);
    assert_eq!(c.timecode_view, TimecodeView::DropFrame);
    assert!(c.font_dirs.is_empty());
    c.validate().unwrap();
}

#[test]
fn partial_json_fills_defaults() {
    let c = EngineConfig::from_json_str(r#"{"ripple_scope":"all_tracks","render":{"threads":2}}"#)
        .unwrap();
    assert_eq!(c.ripple_scope, RippleScope::AllTracks);
    assert_eq!(c.render.threads, Some(2));
    assert!(c.render.parallel);
    assert_eq!(c.undo_limit, 256);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(EngineConfig::from_json_str(r#"{"audio_channels":0}"#).is_err());
    assert!(EngineConfig::from_json_str(r#"{"title_safe":{"custom_ratio":-1.0}}"#).is_err());
    assert!(EngineConfig::from_json_str("not json").is_err());
}

#[test]
fn missing_file_yields_defaults_and_save_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.json");
    assert_eq!(EngineConfig::load(&path).unwrap(), EngineConfig::default());

    let cfg = EngineConfig {
        rectified_waveforms: true,
        ripple_scope: RippleScope::Track,
        ..EngineConfig::default()
    };
    cfg.save(&path).unwrap();
    assert_eq!(EngineConfig::load(&path).unwrap(), cfg);
}

#[test]
fn font_dirs_parse_as_paths() {
    let c = EngineConfig::from_json_str(r#"{"font_dirs":["/usr/share/fonts","fonts"]}"#).unwrap();
    assert_eq!(
        c.font_dirs,
        vec![PathBuf::from("/usr/share/fonts"), PathBuf::from("fonts")]
    );
}

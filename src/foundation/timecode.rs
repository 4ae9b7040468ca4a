use crate::foundation::core::{Fps, FrameIndex};

/// How frame positions are presented to users.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimecodeView {
    /// SMPTE drop-frame for NTSC rates, non-drop otherwise.
    #[default]
    DropFrame,
    /// `HH:MM:SS:FF` counted at the nominal integer rate.
    NonDropFrame,
    /// Raw frame number.
    Frames,
}

/// Format `frame` for display at `fps` using `view`.
pub fn format_timecode(frame: FrameIndex, fps: Fps, view: TimecodeView) -> String {
    match view {
        TimecodeView::Frames => frame.0.to_string(),
        TimecodeView::NonDropFrame => hhmmssff(frame.0, fps.nominal(), ':'),
        TimecodeView::DropFrame => match drop_frames_per_minute(fps) {
            Some(drop) => hhmmssff(add_dropped(frame.0, fps.nominal(), drop), fps.nominal(), ';'),
            None => hhmmssff(frame.0, fps.nominal(), ':'),
        },
    }
}

fn drop_frames_per_minute(fps: Fps) -> Option<u64> {
    if fps.den != 1001 {
        return None;
    }
    match fps.nominal() {
        30 => Some(2),
        60 => Some(4),
        _ => None,
    }
}

// Renumber a real frame count into drop-frame label space.
fn add_dropped(frame: u64, nominal: u64, drop: u64) -> u64 {
    let per_ten_minutes = nominal * 600 - drop * 9;
    let per_minute = nominal * 60 - drop;
    let tens = frame / per_ten_minutes;
    let rem = frame % per_ten_minutes;
    let mut labelled = frame + drop * 9 * tens;
    if rem > drop {
        labelled += drop * ((rem - drop) / per_minute);
    }
    labelled
}

fn hhmmssff(frame: u64, nominal: u64, sep: char) -> String {
    let ff = frame % nominal;
    let total_secs = frame / nominal;
    let ss = total_secs % 60;
    let mm = (total_secs / 60) % 60;
    let hh = total_secs / 3600;
    format!("{hh:02}:{mm:02}:{ss:02}{sep}{ff:02}")
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/timecode.rs"]
mod tests;

//! Frame and timecode conversions.
//!
//! Positions and durations travel through Montage as integer frame counts.
//! Timecodes (`HH:MM:SS:FF`) are only produced for human-readable output.

/// Convert a frame count to an `HH:MM:SS:FF` timecode at the given rate.
///
/// Non-integer rates (23.976, 29.97) are rounded to the nearest whole
/// frame base, which matches how editors label non-drop-frame timecode.
pub fn format_timecode(frames: u64, fps: f64) -> String {
    let base = fps.round().max(1.0) as u64;
    let ff = frames % base;
    let total_secs = frames / base;
    let ss = total_secs % 60;
    let mm = (total_secs / 60) % 60;
    let hh = total_secs / 3600;
    format!("{hh:02}:{mm:02}:{ss:02}:{ff:02}")
}

/// Convert seconds to the nearest frame count.
pub fn secs_to_frames(secs: f64, fps: f64) -> u64 {
    (secs.max(0.0) * fps).round() as u64
}

/// Convert a frame count to seconds.
pub fn frames_to_secs(frames: u64, fps: f64) -> f64 {
    if fps <= 0.0 {
        return 0.0;
    }
    frames as f64 / fps
}

//! Display formatting for reconciled fields

use super::BeatMarker;

/// `MM:SS`, or `H:MM:SS` once at least one hour has elapsed
///
/// Fractional seconds are truncated; negative and non-finite inputs read as zero.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Angle in degrees with one decimal, e.g. `-12.5°`
pub fn format_angle(degrees: f64) -> String {
    format!("{:.1}°", degrees)
}

/// Slider value with two decimals
pub fn format_ratio(value: f64) -> String {
    format!("{:.2}", value)
}

/// Bar label as the device names it: six beats are counted in eighths
pub fn format_time_signature(beats: u8) -> String {
    let unit = if beats == 6 { 8 } else { 4 };
    format!("{}/{}", beats, unit)
}

/// One marker per beat; the current beat is active, the first is the downbeat
pub fn beat_markers(beats: u8, current: Option<u8>) -> Vec<BeatMarker> {
    (1..=beats)
        .map(|index| BeatMarker {
            index,
            active: current == Some(index),
            downbeat: index == 1,
        })
        .collect()
}

pub fn format_on_off(on: bool) -> String {
    if on { "on" } else { "off" }.to_string()
}

pub fn format_yes_no(yes: bool) -> String {
    if yes { "yes" } else { "no" }.to_string()
}

/// Derived per-tick values for a video-scrub layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct VideoFrame {
    /// Seek target proportional to progress, in seconds.
    pub seek_secs: f64,
    /// Rounded progress percentage, 0..=100.
    pub percent: u32,
    /// `"MM:SS / MM:SS"` elapsed/total label.
    pub time_label: String,
}

/// Resolve the media writes for `progress` against a known duration.
///
/// Callers skip the tick entirely when the duration is not yet known; ticks
/// are continuous, so the next one retries without bookkeeping.
pub fn video_frame(duration_secs: f64, progress: f64) -> VideoFrame {
    let p = progress.clamp(0.0, 1.0);
    let seek_secs = duration_secs * p;
    VideoFrame {
        seek_secs,
        percent: (p * 100.0).round() as u32,
        time_label: format!("{} / {}", format_mmss(seek_secs), format_mmss(duration_secs)),
    }
}

/// Format seconds as zero-padded `MM:SS` with floor semantics.
pub fn format_mmss(seconds: f64) -> String {
    let s = seconds.max(0.0);
    let mins = (s / 60.0).floor() as u64;
    let secs = (s % 60.0).floor() as u64;
    format!("{mins:02}:{secs:02}")
}

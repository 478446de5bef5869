//! Read-only performance observers: frames per second over rolling 1-second
//! windows, and absolute scroll delta per 100 ms sampling window. Pure
//! consumers — they never influence engine state.

/// Frames-per-second meter. Call [`FpsMeter::on_frame`] once per rendered
/// frame; the reading updates whenever a full second has elapsed.
#[derive(Clone, Copy, Debug)]
pub struct FpsMeter {
    window_start_secs: f64,
    frames: u32,
    fps: u32,
}

impl FpsMeter {
    pub fn new(now_secs: f64) -> Self {
        Self {
            window_start_secs: now_secs,
            frames: 0,
            fps: 0,
        }
    }

    /// Record a frame and return the current reading.
    pub fn on_frame(&mut self, now_secs: f64) -> u32 {
        self.frames = self.frames.saturating_add(1);
        let elapsed = now_secs - self.window_start_secs;
        if elapsed >= 1.0 {
            self.fps = (f64::from(self.frames) / elapsed).round() as u32;
            self.frames = 0;
            self.window_start_secs = now_secs;
        }
        self.fps
    }

    /// Most recent completed-window reading.
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Scroll speed meter: absolute pixel delta per sampling window, re-sampled
/// at most every 100 ms.
#[derive(Clone, Copy, Debug)]
pub struct ScrollSpeedMeter {
    last_offset: f64,
    last_sample_secs: f64,
    speed_px: f64,
}

impl ScrollSpeedMeter {
    const MIN_INTERVAL_SECS: f64 = 0.1;

    pub fn new(now_secs: f64, offset: f64) -> Self {
        Self {
            last_offset: offset,
            last_sample_secs: now_secs,
            speed_px: 0.0,
        }
    }

    /// Feed the current scroll offset; returns the current reading. Calls
    /// within the 100 ms window leave the reading unchanged.
    pub fn sample(&mut self, now_secs: f64, offset: f64) -> f64 {
        if now_secs - self.last_sample_secs >= Self::MIN_INTERVAL_SECS {
            self.speed_px = (offset - self.last_offset).abs().round();
            self.last_offset = offset;
            self.last_sample_secs = now_secs;
        }
        self.speed_px
    }

    pub fn speed_px(&self) -> f64 {
        self.speed_px
    }
}

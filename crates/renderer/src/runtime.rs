use std::path::PathBuf;
use std::time::{Duration, Instant};

/// High-level behaviour requested by the caller.
///
/// The render policy decides whether frames animate continuously in a window,
/// hold a fixed timestamp, or are exported to disk without a window.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Run the render loop continuously, optionally clamping the frame rate.
    Animate {
        /// Optional requested frames-per-second cap.
        target_fps: Option<f32>,
    },
    /// Render a single still frame at an optional timestamp.
    Still {
        /// Timestamp to evaluate the animation at (seconds).
        time: Option<f64>,
    },
    /// Render one frame off-screen and write it to disk as PNG.
    Export {
        /// Timestamp to evaluate the animation at (seconds).
        time: Option<f64>,
        /// Destination path for the exported file.
        path: PathBuf,
    },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate { target_fps: None }
    }
}

/// Snapshot of the animation clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f64,
    /// Monotonic sample counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f64, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Produces the next time sample.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn sample(&mut self) -> TimeSample {
        let elapsed = self.origin.elapsed();
        let sample = TimeSample::new(elapsed.as_secs_f64(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f64,
}

impl FixedTimeSource {
    pub fn new(time: f64) -> Self {
        Self { time }
    }
}

impl TimeSource for FixedTimeSource {
    fn sample(&mut self) -> TimeSample {
        TimeSample::new(self.time, 0)
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Builds a time source suited to the requested render policy.
pub fn time_source_for_policy(policy: &RenderPolicy) -> BoxedTimeSource {
    match policy {
        RenderPolicy::Animate { .. } => Box::new(SystemTimeSource::new()),
        RenderPolicy::Still { time } | RenderPolicy::Export { time, .. } => {
            Box::new(FixedTimeSource::new(time.unwrap_or(0.0)))
        }
    }
}

/// Decides when the window should be asked for another redraw.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Option<Duration>,
    once: bool,
    last_render: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(policy: &RenderPolicy) -> Self {
        let (interval, once) = match policy {
            RenderPolicy::Animate { target_fps } => (target_fps.and_then(frame_interval), false),
            RenderPolicy::Still { .. } | RenderPolicy::Export { .. } => (None, true),
        };
        Self {
            interval,
            once,
            last_render: None,
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match (self.last_render, self.interval) {
            (None, _) => true,
            (Some(_), _) if self.once => false,
            (Some(_), None) => true,
            (Some(last), Some(interval)) => now >= last + interval,
        }
    }

    /// The next instant a frame becomes due, if the loop should sleep until then.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.once {
            return None;
        }
        match (self.last_render, self.interval) {
            (Some(last), Some(interval)) => Some(last + interval),
            _ => None,
        }
    }

    pub fn mark_rendered(&mut self) {
        self.mark_rendered_at(Instant::now());
    }

    pub fn mark_rendered_at(&mut self, now: Instant) {
        self.last_render = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_render = None;
    }
}

fn frame_interval(fps: f32) -> Option<Duration> {
    if fps.is_finite() && fps > 0.0 {
        Some(Duration::from_nanos((1e9 / f64::from(fps)).round() as u64))
    } else {
        None
    }
}

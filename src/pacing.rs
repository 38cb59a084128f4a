//! Frame pacing: interval gating, measured FPS, and the live loop driver.
//!
//! The driver is caller-scheduled: the host calls [`Playback::tick`] as
//! often as its refresh signal fires, and the pacing state decides which
//! invocations become rendered frames. Time comes from an injectable
//! [`Clock`] so throttling is testable without real timers.

use std::time::Instant;

use crate::frame::{self, AsciiFrame, DisplayMode};
use crate::sink::DisplaySink;
use crate::source::{FrameSource, SourceEvent};
use crate::RenderConfig;

/// Monotonic time source in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock anchored at construction.
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Tick acceptance and frame-rate accounting.
///
/// An accepted tick carries the remainder over (`last = now - elapsed %
/// interval`) instead of resetting, so long runs don't drift below the
/// target rate. The measured FPS is the accepted-tick count over a
/// 1-second window.
#[derive(Debug, Clone)]
pub struct PacingState {
    target_fps: u32,
    frame_interval_ms: f64,
    last_tick_ms: f64,
    frame_count: u32,
    measured_fps: u32,
    window_start_ms: f64,
}

impl PacingState {
    pub fn new(target_fps: u32) -> Self {
        let fps = target_fps.max(1);
        Self {
            target_fps: fps,
            frame_interval_ms: 1000.0 / fps as f64,
            last_tick_ms: 0.0,
            frame_count: 0,
            measured_fps: 0,
            window_start_ms: 0.0,
        }
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        self.target_fps = fps.max(1);
        self.frame_interval_ms = 1000.0 / self.target_fps as f64;
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }

    pub fn measured_fps(&self) -> u32 {
        self.measured_fps
    }

    /// Anchor the interval gate and FPS window at `now_ms`.
    pub fn start(&mut self, now_ms: f64) {
        self.last_tick_ms = now_ms;
        self.window_start_ms = now_ms;
        self.frame_count = 0;
        self.measured_fps = 0;
    }

    /// Offer a scheduling signal; `true` means render this tick.
    pub fn offer(&mut self, now_ms: f64) -> bool {
        let elapsed = now_ms - self.last_tick_ms;
        if elapsed < self.frame_interval_ms {
            return false;
        }
        self.last_tick_ms = now_ms - (elapsed % self.frame_interval_ms);

        self.frame_count += 1;
        if now_ms - self.window_start_ms >= 1000.0 {
            self.measured_fps = self.frame_count;
            self.frame_count = 0;
            self.window_start_ms = now_ms;
        }
        true
    }

    pub fn reset(&mut self) {
        self.last_tick_ms = 0.0;
        self.frame_count = 0;
        self.measured_fps = 0;
        self.window_start_ms = 0.0;
    }
}

/// Live loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
    /// Source stalled; rendering suspended, Running intent kept.
    Buffering,
}

/// Derived UI state after an accepted tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Timeline position in seconds.
    pub position: f64,
    /// position / duration in [0, 1].
    pub progress: f64,
    /// floor(position * target_fps).
    pub frame_index: u64,
    pub measured_fps: u32,
}

/// What one `tick` invocation did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Stale token or stopped loop; nothing happened.
    Idle,
    /// Signal arrived faster than the target interval; skipped.
    Throttled,
    Rendered(TickReport),
    Buffering,
    /// Source reached its end; loop stopped, replay is possible.
    Ended,
    /// Render or display failed; loop stopped with this message.
    Failed(String),
}

/// Generation token for a Running session. Ticks carrying a token from a
/// stopped session are ignored, so no stale reschedule can render against
/// a later session's timestamp basis.
pub type Generation = u64;

/// The live playback loop.
pub struct Playback<C: Clock> {
    clock: C,
    pacing: PacingState,
    state: LoopState,
    generation: Generation,
    display: DisplayMode,
    last_error: Option<String>,
}

impl<C: Clock> Playback<C> {
    pub fn new(clock: C, target_fps: u32) -> Self {
        Self {
            clock,
            pacing: PacingState::new(target_fps),
            state: LoopState::Stopped,
            generation: 0,
            display: DisplayMode::Windowed,
            last_error: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn pacing(&self) -> &PacingState {
        &self.pacing
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        self.pacing.set_target_fps(fps);
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display = mode;
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Enter Running and return the token ticks must carry.
    pub fn start<S: FrameSource>(&mut self, source: &mut S) -> Generation {
        self.generation += 1;
        self.state = LoopState::Running;
        self.last_error = None;
        self.pacing.start(self.clock.now_ms());
        source.play();
        self.generation
    }

    /// Leave Running; any tick scheduled under the old token goes stale.
    pub fn stop<S: FrameSource>(&mut self, source: &mut S) {
        source.pause();
        self.state = LoopState::Stopped;
        self.generation += 1;
        self.pacing.reset();
    }

    /// One cooperative step. Never lets a render error escape: failures
    /// stop the loop and surface through the sink and the outcome.
    pub fn tick<S: FrameSource, D: DisplaySink>(
        &mut self,
        token: Generation,
        source: &mut S,
        config: &RenderConfig,
        sink: &mut D,
    ) -> TickOutcome {
        if token != self.generation || self.state == LoopState::Stopped {
            return TickOutcome::Idle;
        }

        for event in source.poll_events() {
            match event {
                SourceEvent::PlaybackEnded => {
                    source.pause();
                    self.state = LoopState::Stopped;
                    self.generation += 1;
                    return TickOutcome::Ended;
                }
                SourceEvent::BufferingStarted => {
                    log::debug!("source stalled, suspending render");
                    self.state = LoopState::Buffering;
                    sink.message("Buffering video...");
                }
                SourceEvent::PlaybackStarted => {
                    if self.state == LoopState::Buffering {
                        self.state = LoopState::Running;
                        self.pacing.start(self.clock.now_ms());
                    }
                }
                SourceEvent::DecodeError(msg) => {
                    self.state = LoopState::Stopped;
                    self.generation += 1;
                    let msg = format!("Decode error: {}", msg);
                    sink.message(&msg);
                    self.last_error = Some(msg.clone());
                    return TickOutcome::Failed(msg);
                }
                SourceEvent::MetadataReady => {}
            }
        }

        if self.state == LoopState::Buffering {
            return TickOutcome::Buffering;
        }

        if !self.pacing.offer(self.clock.now_ms()) {
            return TickOutcome::Throttled;
        }

        match frame::render(source, config, self.display) {
            Ok(ascii) => match self.present(&ascii, source, sink) {
                Ok(report) => TickOutcome::Rendered(report),
                Err(msg) => self.fail(source, sink, msg),
            },
            Err(e) => self.fail(source, sink, e.to_string()),
        }
    }

    fn present<S: FrameSource, D: DisplaySink>(
        &mut self,
        ascii: &AsciiFrame,
        source: &S,
        sink: &mut D,
    ) -> Result<TickReport, String> {
        sink.present(ascii).map_err(|e| e.to_string())?;
        let position = source.position();
        let duration = source.duration();
        let progress = if duration > 0.0 {
            (position / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Ok(TickReport {
            position,
            progress,
            frame_index: (position * self.pacing.target_fps as f64).floor() as u64,
            measured_fps: self.pacing.measured_fps,
        })
    }

    fn fail<S: FrameSource, D: DisplaySink>(
        &mut self,
        source: &mut S,
        sink: &mut D,
        msg: String,
    ) -> TickOutcome {
        source.pause();
        self.state = LoopState::Stopped;
        self.generation += 1;
        sink.message(&msg);
        self.last_error = Some(msg.clone());
        TickOutcome::Failed(msg)
    }
}

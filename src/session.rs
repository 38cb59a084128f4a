//! Session controller: single owner of the source and of who may drive
//! it. Live playback and export are mutually exclusive roles, and every
//! role change funnels through one transition function so the state
//! machine is inspectable and testable in one place.

use crate::error::ExportError;
use crate::export::{self, CancelToken, ExportOptions, ExportProgress, ExportSummary, Sleeper};
use crate::pacing::{Clock, Generation, Playback, TickOutcome};
use crate::sink::{self, DisplaySink, ExportSink};
use crate::source::FrameSource;
use crate::RenderConfig;

/// Who currently drives the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Idle,
    Playing,
    Exporting,
}

/// One open video and the machinery around it.
pub struct Session<S: FrameSource, C: Clock> {
    source: S,
    playback: Playback<C>,
    config: RenderConfig,
    role: Role,
    token: Generation,
    /// Set when the source ran to its end; the next play restarts at 0.
    ended: bool,
}

impl<S: FrameSource, C: Clock> Session<S, C> {
    pub fn new(source: S, clock: C, config: RenderConfig, target_fps: u32) -> Self {
        Self {
            source,
            playback: Playback::new(clock, target_fps),
            config,
            role: Role::Idle,
            token: 0,
            ended: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RenderConfig {
        &mut self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn playback(&self) -> &Playback<C> {
        &self.playback
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        self.playback.set_target_fps(fps);
    }

    pub fn set_display_mode(&mut self, mode: crate::frame::DisplayMode) {
        self.playback.set_display_mode(mode);
    }

    /// Start (or, after the source ended, restart) live playback.
    /// Ignored while an export owns the source.
    pub fn play(&mut self) -> Role {
        self.transition(Transition::Play)
    }

    pub fn pause(&mut self) -> Role {
        self.transition(Transition::Stop)
    }

    /// Pause, rewind, and restore the default rendering settings.
    pub fn reset(&mut self) {
        self.transition(Transition::Stop);
        self.source.seek(0.0);
        self.ended = false;
        self.config = RenderConfig::default();
        self.playback.set_target_fps(crate::DEFAULT_FPS);
    }

    /// One live step. Outside the Playing role this does nothing.
    pub fn tick<D: DisplaySink>(&mut self, sink: &mut D) -> TickOutcome {
        if self.role != Role::Playing {
            return TickOutcome::Idle;
        }
        let outcome = self
            .playback
            .tick(self.token, &mut self.source, &self.config, sink);
        match &outcome {
            TickOutcome::Rendered(report) => {
                sink.status(&format!(
                    "{} / {}  frame {}  {} fps",
                    sink::format_clock(report.position),
                    sink::format_clock(self.source.duration()),
                    report.frame_index,
                    report.measured_fps,
                ));
            }
            TickOutcome::Ended => {
                self.transition(Transition::SourceEnded);
            }
            TickOutcome::Failed(_) => {
                self.transition(Transition::PlaybackFailed);
            }
            _ => {}
        }
        outcome
    }

    /// Run a full export sweep. Live playback, if any, is stopped first;
    /// the session returns to Idle whatever the outcome.
    pub fn export<K, E, F>(
        &mut self,
        fps: u32,
        sink: &mut K,
        sleeper: &E,
        cancel: &CancelToken,
        progress: F,
    ) -> Result<ExportSummary, ExportError>
    where
        K: ExportSink,
        E: Sleeper,
        F: FnMut(ExportProgress),
    {
        self.transition(Transition::BeginExport);
        let options = ExportOptions::new(self.config.clone(), fps);
        let result = export::export_all(
            &mut self.source,
            &options,
            sink,
            sleeper,
            cancel,
            progress,
        );
        self.transition(Transition::EndExport);
        result
    }

    /// The single place roles change.
    fn transition(&mut self, t: Transition) -> Role {
        self.role = match (self.role, t) {
            (Role::Exporting, Transition::Play) => Role::Exporting,
            (_, Transition::Play) => {
                if self.ended {
                    self.source.seek(0.0);
                    self.ended = false;
                }
                self.token = self.playback.start(&mut self.source);
                Role::Playing
            }
            (Role::Playing, Transition::Stop) => {
                self.playback.stop(&mut self.source);
                Role::Idle
            }
            (role, Transition::Stop) => role,
            (_, Transition::SourceEnded) => {
                self.ended = true;
                Role::Idle
            }
            (_, Transition::PlaybackFailed) => Role::Idle,
            (Role::Playing, Transition::BeginExport) => {
                self.playback.stop(&mut self.source);
                Role::Exporting
            }
            (_, Transition::BeginExport) => Role::Exporting,
            (_, Transition::EndExport) => Role::Idle,
        };
        self.role
    }
}

#[derive(Debug, Clone, Copy)]
enum Transition {
    Play,
    Stop,
    SourceEnded,
    PlaybackFailed,
    BeginExport,
    EndExport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::testutil::{CapturingExportSink, RecordingSink};
    use crate::source::testutil::MockSource;
    use crate::source::SourceEvent;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct TestClock(Rc<Cell<f64>>);

    impl TestClock {
        fn new() -> Self {
            Self(Rc::new(Cell::new(0.0)))
        }

        fn advance(&self, ms: f64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl Clock for TestClock {
        fn now_ms(&self) -> f64 {
            self.0.get()
        }
    }

    /// Settle delay is irrelevant against the in-memory source.
    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _d: std::time::Duration) {}
    }

    fn session(duration: f64) -> (Session<MockSource, TestClock>, TestClock) {
        let clock = TestClock::new();
        let s = Session::new(
            MockSource::new(1920, 1080, duration),
            clock.clone(),
            RenderConfig::default(),
            30,
        );
        (s, clock)
    }

    #[test]
    fn play_tick_pause_round_trip() {
        let (mut session, clock) = session(10.0);
        let mut sink = RecordingSink::default();

        assert_eq!(session.play(), Role::Playing);
        clock.advance(40.0);
        assert!(matches!(session.tick(&mut sink), TickOutcome::Rendered(_)));
        assert_eq!(sink.statuses.len(), 1);
        assert!(sink.statuses[0].contains("0:00 / 0:10"));

        assert_eq!(session.pause(), Role::Idle);
        assert!(!session.source().is_playing());
        clock.advance(40.0);
        assert_eq!(session.tick(&mut sink), TickOutcome::Idle);
    }

    #[test]
    fn ended_source_allows_replay_from_zero() {
        let (mut session, clock) = session(5.0);
        let mut sink = RecordingSink::default();

        session.play();
        session
            .source
            .pending
            .push(SourceEvent::PlaybackEnded);
        clock.advance(40.0);
        assert_eq!(session.tick(&mut sink), TickOutcome::Ended);
        assert_eq!(session.role(), Role::Idle);

        session.source.position = 5.0;
        session.play();
        assert_eq!(session.role(), Role::Playing);
        assert_eq!(session.source().position(), 0.0);
        assert!(session.source.seeks.contains(&0.0));
    }

    #[test]
    fn export_takes_over_and_releases_the_source() {
        let (mut session, _clock) = session(0.5);
        let mut display = RecordingSink::default();
        let mut sink = CapturingExportSink::default();

        session.play();
        let roles = Rc::new(Cell::new(Role::Idle));
        let seen = roles.clone();
        let summary = session
            .export(10, &mut sink, &NoSleep, &CancelToken::new(), |_| {
                seen.set(Role::Exporting);
            })
            .unwrap();
        assert_eq!(summary.captured, 5);
        assert_eq!(roles.get(), Role::Exporting);
        assert_eq!(session.role(), Role::Idle);
        assert!(!session.source().is_playing());

        // Stale live tick from before the export cannot render.
        assert_eq!(session.tick(&mut display), TickOutcome::Idle);
        assert!(display.frames.is_empty());
    }

    #[test]
    fn play_during_export_role_is_refused() {
        let (mut session, _clock) = session(1.0);
        session.role = Role::Exporting;
        assert_eq!(session.play(), Role::Exporting);
        assert!(!session.source().is_playing());
    }

    #[test]
    fn reset_restores_defaults_and_rewinds() {
        let (mut session, _clock) = session(10.0);
        session.config_mut().width = 240;
        session.config_mut().contrast = 2.5;
        session.set_target_fps(60);
        session.play();
        session.source.position = 7.0;

        session.reset();
        assert_eq!(session.role(), Role::Idle);
        assert_eq!(session.source().position(), 0.0);
        assert_eq!(session.config().width, crate::DEFAULT_WIDTH);
        assert_eq!(session.config().contrast, 1.2);
        assert_eq!(session.playback().pacing().target_fps(), crate::DEFAULT_FPS);
    }

    #[test]
    fn failed_tick_returns_session_to_idle() {
        let (mut session, clock) = session(10.0);
        let mut sink = RecordingSink::default();
        session.source.fail_read_at.push(0.0);

        session.play();
        clock.advance(40.0);
        assert!(matches!(session.tick(&mut sink), TickOutcome::Failed(_)));
        assert_eq!(session.role(), Role::Idle);
    }
}

use anyhow::Result;
use circle_raster::{Circle, Point, Surface};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::diff::{compute_diff, OverlapCount};
use crate::error::SessionError;
use crate::score::score;
use crate::stroke::StrokeRecorder;
use crate::target::{generate_target, Viewport, DEFAULT_FLOOR_FRACTION};

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Tolerance multiplier widening the acceptable score range.
    pub allowance: f64,
    /// Lower bound of the target radius draw, as a fraction of the smaller
    /// viewport dimension.
    pub floor_fraction: f32,
    /// Seed for the target RNG; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            allowance: 1.0,
            floor_fraction: DEFAULT_FLOOR_FRACTION,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Immutable record of one completed drawing pass. The stroke is copied
/// out of the recorder when the attempt finalizes, so later strokes never
/// mutate historical records.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub score: f64,
    pub stroke: Vec<Point>,
    pub target: Circle,
    pub counts: OverlapCount,
    pub diff_image: Surface,
}

/// Holds the last and best attempts. `best` is replaced only on a strictly
/// greater score, so ties keep the earlier attempt.
#[derive(Debug, Default)]
pub struct AttemptTracker {
    last: Option<Attempt>,
    best: Option<Attempt>,
}

impl AttemptTracker {
    pub fn record(&mut self, attempt: Attempt) {
        let best_score = self.best.as_ref().map(|a| a.score).unwrap_or(0.0);
        if attempt.score > best_score {
            info!(
                "new best score {:.2} (previous {:.2})",
                attempt.score, best_score
            );
            self.best = Some(attempt.clone());
        }
        self.last = Some(attempt);
    }

    pub fn last(&self) -> Option<&Attempt> {
        self.last.as_ref()
    }

    pub fn best(&self) -> Option<&Attempt> {
        self.best.as_ref()
    }
}

/// What a finished attempt hands back to the caller.
#[derive(Debug, Clone, Copy)]
pub struct ScoreOutcome {
    pub score: f64,
    pub counts: OverlapCount,
}

/// One drawing session: the active target, the stroke being recorded, the
/// scratch surface shared by the diff passes, and the last/best records.
///
/// All state is explicit here rather than ambient, so tests can drive a
/// session deterministically through a seeded config.
#[derive(Debug)]
pub struct Session {
    viewport: Viewport,
    config: SessionConfig,
    rng: StdRng,
    recorder: StrokeRecorder,
    target: Circle,
    scratch: Surface,
    tracker: AttemptTracker,
    scoring: bool,
}

impl Session {
    pub fn new(viewport: Viewport, config: SessionConfig) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let scratch = Surface::new(viewport.width, viewport.height)?;
        let target = generate_target(viewport, config.floor_fraction, &mut rng);
        debug!(
            "session opened: viewport {}x{}, first target r={}",
            viewport.width, viewport.height, target.radius
        );
        Ok(Session {
            viewport,
            config,
            rng,
            recorder: StrokeRecorder::new(),
            target,
            scratch,
            tracker: AttemptTracker::default(),
            scoring: false,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn allowance(&self) -> f64 {
        self.config.allowance
    }

    pub fn current_target(&self) -> Circle {
        self.target
    }

    pub fn last_attempt(&self) -> Option<&Attempt> {
        self.tracker.last()
    }

    pub fn best_attempt(&self) -> Option<&Attempt> {
        self.tracker.best()
    }

    /// Open a new attempt. Rejected while a previous attempt is still being
    /// scored or recorded; the caller serializes attempts.
    pub fn begin_attempt(&mut self) -> Result<(), SessionError> {
        if self.scoring {
            return Err(SessionError::SurfaceBusy);
        }
        if self.recorder.is_recording() {
            return Err(SessionError::AlreadyRecording);
        }
        self.recorder.begin();
        Ok(())
    }

    pub fn record_sample(&mut self, point: Point) {
        self.recorder.sample(point);
    }

    /// Close the open attempt and run it through the scoring pipeline.
    /// Never cancellable once started; degenerate strokes score low or
    /// zero rather than failing.
    pub fn complete_attempt(&mut self) -> Result<ScoreOutcome> {
        if self.scoring {
            return Err(SessionError::SurfaceBusy.into());
        }
        self.scoring = true;
        let result = self.run_scoring();
        self.scoring = false;
        result
    }

    fn run_scoring(&mut self) -> Result<ScoreOutcome> {
        self.recorder.end();
        let stroke = self.recorder.points().to_vec();
        let outcome = compute_diff(&mut self.scratch, &stroke, &self.target)?;
        let value = score(&self.target, &outcome.counts, self.config.allowance);
        debug!(
            "attempt scored {:.2} ({} samples, {} mismatch pixels)",
            value,
            stroke.len(),
            outcome.counts.total
        );
        self.tracker.record(Attempt {
            score: value,
            stroke,
            target: self.target,
            counts: outcome.counts,
            diff_image: outcome.image,
        });
        Ok(ScoreOutcome {
            score: value,
            counts: outcome.counts,
        })
    }

    /// Regenerate the target and drop transient stroke state. Last/best
    /// records persist across restarts.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        if self.scoring {
            return Err(SessionError::SurfaceBusy);
        }
        self.recorder.reset();
        self.target = generate_target(self.viewport, self.config.floor_fraction, &mut self.rng);
        debug!("session restarted: new target r={}", self.target.radius);
        Ok(())
    }

    /// Pointer adapter: only the primary button opens an attempt. A
    /// duplicate down event while already recording is ignored, since
    /// pointer streams are allowed to repeat it.
    pub fn pointer_down(&mut self, button: PointerButton) -> Result<(), SessionError> {
        if button != PointerButton::Primary || self.recorder.is_recording() {
            return Ok(());
        }
        self.begin_attempt()
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.record_sample(Point::new(x, y));
    }

    /// A primary-button release finishes and scores the attempt; any other
    /// button yields nothing.
    pub fn pointer_up(&mut self, button: PointerButton) -> Result<Option<ScoreOutcome>> {
        if button != PointerButton::Primary {
            return Ok(None);
        }
        self.complete_attempt().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(seed: u64) -> Session {
        Session::new(
            Viewport {
                width: 400,
                height: 400,
            },
            SessionConfig {
                seed: Some(seed),
                ..SessionConfig::default()
            },
        )
        .expect("session")
    }

    fn trace(session: &mut Session, radius_offset: f32, segments: usize) {
        let target = session.current_target();
        for i in 0..segments {
            let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
            let r = target.radius + radius_offset;
            session.pointer_move(target.x + r * angle.cos(), target.y + r * angle.sin());
        }
    }

    fn synthetic_attempt(score: f64) -> Attempt {
        Attempt {
            score,
            stroke: Vec::new(),
            target: Circle::new(0.0, 0.0, 1.0),
            counts: OverlapCount {
                inner: 0,
                outer: 0,
                total: 0,
            },
            diff_image: Surface::new(1, 1).expect("surface"),
        }
    }

    #[test]
    fn best_is_promoted_only_on_strictly_greater_scores() {
        let mut tracker = AttemptTracker::default();
        let mut observed = Vec::new();
        for value in [40.0, 70.0, 55.0, 90.0, 80.0] {
            tracker.record(synthetic_attempt(value));
            observed.push(tracker.best().expect("best present").score);
        }
        assert_eq!(observed, vec![40.0, 70.0, 70.0, 90.0, 90.0]);
        assert_eq!(tracker.last().expect("last present").score, 80.0);
    }

    #[test]
    fn a_tie_keeps_the_earlier_best() {
        let mut tracker = AttemptTracker::default();
        let mut first = synthetic_attempt(50.0);
        first.stroke = vec![Point::new(1.0, 1.0)];
        tracker.record(first);
        tracker.record(synthetic_attempt(50.0));
        assert_eq!(tracker.best().expect("best").stroke.len(), 1);
    }

    #[test]
    fn a_zero_score_never_becomes_best() {
        let mut tracker = AttemptTracker::default();
        tracker.record(synthetic_attempt(0.0));
        assert!(tracker.best().is_none());
        assert!(tracker.last().is_some());
    }

    #[test]
    fn begin_twice_is_rejected() {
        let mut session = session(1);
        session.begin_attempt().expect("first begin");
        assert_eq!(
            session.begin_attempt(),
            Err(SessionError::AlreadyRecording)
        );
    }

    #[test]
    fn secondary_button_does_not_drive_the_recorder() {
        let mut session = session(2);
        session.pointer_down(PointerButton::Secondary).expect("down");
        session.pointer_move(10.0, 10.0);
        let outcome = session
            .pointer_up(PointerButton::Secondary)
            .expect("up succeeds");
        assert!(outcome.is_none());
        assert!(session.last_attempt().is_none());
    }

    #[test]
    fn a_faithful_trace_scores_the_ceiling() {
        let mut session = session(3);
        session.pointer_down(PointerButton::Primary).expect("down");
        // one pixel wide of the target: a thin annulus of mismatch, well
        // inside the allowance, but never a zero total
        trace(&mut session, 1.0, 256);
        let outcome = session
            .pointer_up(PointerButton::Primary)
            .expect("up succeeds")
            .expect("primary release scores");
        assert_eq!(outcome.score, 100.0);
        assert_eq!(outcome.counts.total, outcome.counts.inner + outcome.counts.outer);
    }

    #[test]
    fn an_empty_stroke_scores_low_but_does_not_fail() {
        let mut session = session(4);
        let target = session.current_target();
        session.pointer_down(PointerButton::Primary).expect("down");
        let outcome = session
            .pointer_up(PointerButton::Primary)
            .expect("up succeeds")
            .expect("primary release scores");
        assert_eq!(outcome.counts.inner, 0);
        let area = std::f64::consts::PI * (target.radius as f64).powi(2);
        // pixel-center rasterization error grows with the perimeter
        let tolerance = target.radius as f64 * 4.0 + 8.0;
        assert!((outcome.counts.outer as f64 - area).abs() < tolerance);
        assert!(outcome.score < 100.0);
    }

    #[test]
    fn restart_regenerates_the_target_and_keeps_records() {
        let mut session = session(5);
        session.pointer_down(PointerButton::Primary).expect("down");
        trace(&mut session, 1.0, 128);
        session
            .pointer_up(PointerButton::Primary)
            .expect("up succeeds");
        let before = session.current_target();
        session.restart().expect("restart");
        // center never moves; only the radius can change
        assert_eq!(session.current_target().x, before.x);
        assert_eq!(session.current_target().y, before.y);
        assert!(session.last_attempt().is_some());
        assert!(session.best_attempt().is_some());
    }

    #[test]
    fn attempts_snapshot_the_stroke() {
        let mut session = session(6);
        session.pointer_down(PointerButton::Primary).expect("down");
        trace(&mut session, 0.0, 64);
        session
            .pointer_up(PointerButton::Primary)
            .expect("up succeeds");
        let recorded = session.last_attempt().expect("attempt").stroke.len();
        assert_eq!(recorded, 64);

        session.restart().expect("restart");
        session.pointer_down(PointerButton::Primary).expect("down");
        trace(&mut session, 5.0, 32);
        assert_eq!(session.last_attempt().expect("attempt").stroke.len(), 64);
    }

    #[test]
    fn finished_attempts_export_their_diff_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(8);
        session.pointer_down(PointerButton::Primary).expect("down");
        trace(&mut session, 1.0, 64);
        session
            .pointer_up(PointerButton::Primary)
            .expect("up succeeds");

        let path = dir.path().join("diff.png");
        session
            .last_attempt()
            .expect("attempt recorded")
            .diff_image
            .save_png(&path)
            .expect("save");
        assert!(path.exists());
    }

    #[test]
    fn sessions_with_equal_seeds_generate_equal_targets() {
        let a = session(9);
        let b = session(9);
        assert_eq!(a.current_target(), b.current_target());
    }
}

//! The tracing session: contour store, calibration and area estimate,
//! driven through an explicit state machine.
//!
//! ```text
//! Drawing ──closed──▶ Calibrating ──start──▶ Estimating ──finish──▶ Done
//!    ▲                     ▲                                          │
//!    │                     └──────────────── remeasure ───────────────┘
//!    └──────────── reset (remove last trace / clear) from any state
//! ```

use std::fmt;

use kurbo::Point;

use crate::calibration::{Calibration, ScaleRatio};
use crate::config::SessionConfig;
use crate::error::AreaError;
use crate::estimate::{AreaEstimate, AreaEstimator, AreaProgress, EstimationRun};
use crate::intersect::{self, Crossing};
use crate::trace::{ContourStore, Trace};

/// Where the session is in the draw → calibrate → estimate lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Drawing,
    Calibrating,
    Estimating,
    Done,
}

/// Inputs to [`SessionState::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ContourClosed,
    EstimationStarted,
    EstimationFinished,
    Remeasure,
    Reset,
}

impl SessionState {
    /// Pure transition function. Events that do not apply leave the state as is.
    pub fn next(self, event: SessionEvent) -> SessionState {
        use SessionEvent as E;
        use SessionState as S;
        match (self, event) {
            (_, E::Reset) => S::Drawing,
            (S::Drawing, E::ContourClosed) => S::Calibrating,
            (S::Calibrating | S::Done, E::EstimationStarted) => S::Estimating,
            (S::Estimating, E::EstimationFinished) => S::Done,
            (S::Done, E::Remeasure) => S::Calibrating,
            (state, _) => state,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Drawing => "drawing",
            SessionState::Calibrating => "calibrating",
            SessionState::Estimating => "estimating",
            SessionState::Done => "done",
        };
        f.write_str(name)
    }
}

/// One user's tracing session over one reference image.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    store: ContourStore,
    calibration: Calibration,
    closing: Option<Crossing>,
    estimate: Option<AreaEstimate>,
    run: Option<EstimationRun>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Drawing,
            store: ContourStore::new(),
            calibration: Calibration::new(),
            closing: None,
            estimate: None,
            run: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &ContourStore {
        &self.store
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// The segment pair whose crossing closed the contour.
    pub fn closing_crossing(&self) -> Option<Crossing> {
        self.closing
    }

    /// Latest area estimate: running while estimating, final once done.
    pub fn estimate(&self) -> Option<AreaEstimate> {
        self.estimate
    }

    /// Label text of every scale line, oldest first.
    pub fn scale_labels(&self) -> Vec<String> {
        self.calibration
            .lines()
            .iter()
            .map(|line| line.label_text(&self.config.unit))
            .collect()
    }

    // ── Contour store ─────────────────────────────────────

    /// Extend the trace being drawn. Only valid while drawing.
    pub fn add_point_to_active_trace(&mut self, point: Point) -> Result<(), AreaError> {
        self.expect_state(SessionState::Drawing, "draw")?;
        finite(point)?;
        self.store.add_point(point);
        Ok(())
    }

    /// Commit the trace being drawn. `false` if it had fewer than two
    /// points, or if the contour is already closed: closure detection
    /// never saw that stroke, so it is dropped instead.
    pub fn commit_active_trace(&mut self) -> bool {
        if self.state != SessionState::Drawing {
            let dropped = self.store.discard_active();
            if dropped > 0 {
                log::debug!("dropped {} points drawn after closure", dropped);
            }
            return false;
        }
        self.store.commit_active()
    }

    /// Drop the last committed trace and return to drawing.
    ///
    /// A no-op on an empty store.
    pub fn remove_last_trace(&mut self) -> Option<Trace> {
        let removed = self.store.remove_last()?;
        log::info!("removed last trace ({} points)", removed.points().len());
        self.reset();
        Some(removed)
    }

    /// Drop every trace and return to drawing.
    pub fn clear_all(&mut self) {
        self.store.clear();
        self.reset();
        log::info!("cleared session");
    }

    /// Calibration, estimate, in-flight run and closure go together.
    fn reset(&mut self) {
        self.calibration.clear();
        self.closing = None;
        self.estimate = None;
        self.run = None;
        self.state = self.state.next(SessionEvent::Reset);
    }

    // ── Closure ───────────────────────────────────────────

    /// Run closure detection over the committed traces (explicit confirm).
    ///
    /// On success the session moves on to calibration. Once closed, the
    /// contour stays closed until a reset and detection is not re-run.
    pub fn try_close_contour(&mut self) -> bool {
        if self.state != SessionState::Drawing {
            return self.closing.is_some();
        }
        match intersect::detect(&self.store, &self.config.detector) {
            Some(crossing) => {
                log::info!(
                    "contour closed: segment {} crosses segment {}",
                    crossing.first,
                    crossing.second
                );
                let dropped = self.store.discard_active();
                if dropped > 0 {
                    log::debug!("dropped {} uncommitted points", dropped);
                }
                self.closing = Some(crossing);
                self.state = self.state.next(SessionEvent::ContourClosed);
                true
            }
            None => {
                log::debug!("contour still open ({} traces)", self.store.traces().len());
                false
            }
        }
    }

    // ── Calibration ───────────────────────────────────────

    /// Two-click calibration: first click starts, second click ends the
    /// reference segment and returns its pixel length.
    pub fn calibration_click(&mut self, point: Point) -> Result<Option<f64>, AreaError> {
        finite(point)?;
        self.enter_calibration("measure")?;
        let len = self.calibration.click(point);
        if let Some(len) = len {
            log::info!("reference segment: {:.2} px", len);
        }
        Ok(len)
    }

    pub fn begin_calibration_segment(&mut self, point: Point) -> Result<(), AreaError> {
        finite(point)?;
        self.enter_calibration("measure")?;
        self.calibration.begin_segment(point);
        Ok(())
    }

    /// Returns the reference segment's pixel length.
    pub fn end_calibration_segment(&mut self, point: Point) -> Result<f64, AreaError> {
        self.expect_state(SessionState::Calibrating, "measure")?;
        finite(point)?;
        let len = self.calibration.end_segment(point)?;
        log::info!("reference segment: {:.2} px", len);
        Ok(len)
    }

    /// Set the scale ratio from the typed real-world length of the
    /// latest reference segment.
    ///
    /// Errors leave the session calibrating; the latest label shows the
    /// failure.
    pub fn submit_real_distance(&mut self, text: &str) -> Result<ScaleRatio, AreaError> {
        self.expect_state(SessionState::Calibrating, "set the scale")?;
        match self.calibration.submit_distance(text) {
            Ok(ratio) => {
                log::info!("scale set: {} {}/px", ratio, self.config.unit);
                Ok(ratio)
            }
            Err(e) => {
                log::warn!("scale not set: {}", e);
                Err(e)
            }
        }
    }

    /// Measuring again after a finished run discards its estimate.
    fn enter_calibration(&mut self, operation: &'static str) -> Result<(), AreaError> {
        match self.state {
            SessionState::Calibrating => Ok(()),
            SessionState::Done => {
                self.estimate = None;
                self.state = self.state.next(SessionEvent::Remeasure);
                Ok(())
            }
            state => Err(AreaError::UnexpectedState { operation, state }),
        }
    }

    fn expect_state(&self, expected: SessionState, operation: &'static str) -> Result<(), AreaError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(AreaError::UnexpectedState {
                operation,
                state: self.state,
            })
        }
    }

    // ── Estimation ────────────────────────────────────────

    /// Prepare a Monte Carlo run over the closed contour.
    ///
    /// Refuses without a non-zero scale ratio, then without a closed contour.
    pub fn start_area_estimation(&mut self) -> Result<(), AreaError> {
        let ratio = self
            .calibration
            .ratio()
            .filter(|ratio| ratio.value() > 0.0)
            .ok_or(AreaError::NoCalibration)?;
        if self.closing.is_none() || self.store.is_empty() {
            return Err(AreaError::EmptyContour);
        }
        if self.state == SessionState::Estimating {
            return Err(AreaError::UnexpectedState {
                operation: "start an estimation",
                state: self.state,
            });
        }

        let estimator = AreaEstimator::new(self.store.flattened(), ratio, &self.config.estimator)?;
        let bbox = estimator.bounding_box();
        log::info!(
            "estimating: {} samples in {} batches over {:.0}x{:.0} px box",
            self.config.estimator.total_samples,
            estimator.batch_count(),
            bbox.width(),
            bbox.height(),
        );
        let run = estimator.run();
        self.estimate = Some(run.estimate());
        self.run = Some(run);
        self.state = self.state.next(SessionEvent::EstimationStarted);
        Ok(())
    }

    /// Process one batch of the run in flight.
    ///
    /// `None` when no run is in flight. The shell may handle other
    /// commands (including a reset) between calls.
    pub fn step_area_estimation(&mut self) -> Option<AreaProgress> {
        let report = self.run.as_mut()?.next();
        match report {
            Some(progress) => {
                self.estimate = Some(progress.estimate);
                if progress.is_complete() {
                    self.run = None;
                    self.state = self.state.next(SessionEvent::EstimationFinished);
                    log::info!(
                        "estimated area: {:.2} {}² (± {:.2})",
                        progress.area(),
                        self.config.unit,
                        progress.estimate.standard_error(),
                    );
                }
                Some(progress)
            }
            None => {
                self.run = None;
                None
            }
        }
    }

    /// Run the whole estimation, calling `progress` after every batch.
    /// Returns the final real-world area.
    pub fn run_area_estimation<F>(&mut self, mut progress: F) -> Result<f64, AreaError>
    where
        F: FnMut(&AreaProgress),
    {
        self.start_area_estimation()?;
        while let Some(report) = self.step_area_estimation() {
            progress(&report);
        }
        self.estimate
            .map(|estimate| estimate.area())
            .ok_or(AreaError::EmptyContour)
    }
}

fn finite(point: Point) -> Result<(), AreaError> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(AreaError::NonFinitePoint {
            x: point.x,
            y: point.y,
        })
    }
}

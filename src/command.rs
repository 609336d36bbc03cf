//! Discrete commands a shell sends to a session.
//!
//! Raw input events (pointer drag/release/click, Enter, Delete, typed
//! text) map one-to-one onto [`Command`]s. Each command also has a
//! one-line text form, which the command-line driver reads from scripts.

use std::str::FromStr;

use kurbo::Point;

use crate::calibration::ScaleRatio;
use crate::error::AreaError;
use crate::estimate::AreaProgress;
use crate::session::{Session, SessionState};
use crate::trace::Trace;

/// One shell input, already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Pointer moved with the button held: extend the active trace.
    Point(Point),
    /// Pointer released: commit the active trace.
    Release,
    /// Enter: submit the typed distance if one is awaited, otherwise
    /// close the contour, or estimate once a scale is set.
    Confirm,
    /// Pointer pressed while calibrating: one reference endpoint.
    Click(Point),
    /// Typed real-world distance, followed by Enter.
    Distance(String),
    /// Run the area estimation to completion.
    Estimate,
    /// Delete: remove the last trace.
    Undo,
    /// Clear every trace.
    Clear,
}

/// What a command did, for the shell to display.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing visible changed.
    Unchanged,
    /// A trace was committed (`true`) or discarded as too short (`false`).
    Committed(bool),
    /// Closure detection ran; `true` if the contour is now closed.
    Closed(bool),
    /// First reference endpoint registered.
    MeasureStarted,
    /// Reference segment complete, with its pixel length.
    Measured(f64),
    /// Scale ratio set.
    Calibrated(ScaleRatio),
    /// Final estimated area in real-world square units.
    Area(f64),
    /// The last trace was removed.
    Removed(Trace),
    Cleared,
}

impl Session {
    /// Apply one command. `progress` is called per batch if the command
    /// runs an estimation.
    pub fn apply<F>(&mut self, command: Command, progress: F) -> Result<Outcome, AreaError>
    where
        F: FnMut(&AreaProgress),
    {
        match command {
            Command::Point(p) => {
                self.add_point_to_active_trace(p)?;
                Ok(Outcome::Unchanged)
            }
            Command::Release => Ok(Outcome::Committed(self.commit_active_trace())),
            Command::Confirm => {
                if self.calibration().is_awaiting_distance() {
                    // Enter with nothing typed.
                    self.submit_real_distance("").map(Outcome::Calibrated)
                } else if self.state() == SessionState::Drawing {
                    Ok(Outcome::Closed(self.try_close_contour()))
                } else if self.calibration().ratio().is_some() {
                    self.run_area_estimation(progress).map(Outcome::Area)
                } else {
                    Ok(Outcome::Closed(self.try_close_contour()))
                }
            }
            Command::Click(p) => match self.calibration_click(p)? {
                Some(len) => Ok(Outcome::Measured(len)),
                None => Ok(Outcome::MeasureStarted),
            },
            Command::Distance(text) => self.submit_real_distance(&text).map(Outcome::Calibrated),
            Command::Estimate => self.run_area_estimation(progress).map(Outcome::Area),
            Command::Undo => Ok(self
                .remove_last_trace()
                .map_or(Outcome::Unchanged, Outcome::Removed)),
            Command::Clear => {
                self.clear_all();
                Ok(Outcome::Cleared)
            }
        }
    }
}

impl FromStr for Command {
    type Err = AreaError;

    /// Parse the text form, e.g. `point 10 20` or `distance 12.5`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let unknown = || AreaError::UnknownCommand(line.to_string());

        let command = match word.to_ascii_lowercase().as_str() {
            "point" => Command::Point(parse_point(rest).ok_or_else(unknown)?),
            "click" => Command::Click(parse_point(rest).ok_or_else(unknown)?),
            "distance" => Command::Distance(rest.to_string()),
            "release" if rest.is_empty() => Command::Release,
            "confirm" if rest.is_empty() => Command::Confirm,
            "estimate" if rest.is_empty() => Command::Estimate,
            "undo" if rest.is_empty() => Command::Undo,
            "clear" if rest.is_empty() => Command::Clear,
            _ => return Err(unknown()),
        };
        Ok(command)
    }
}

/// Two whitespace-separated coordinates.
fn parse_point(text: &str) -> Option<Point> {
    let mut parts = text.split_whitespace();
    let x = parts.next()?.parse::<f64>().ok()?;
    let y = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Point::new(x, y))
}

/// Parse a script: one command per line; blank lines and `#` comments
/// are skipped. Returns `(line number, command)` pairs.
pub fn parse_script(text: &str) -> Result<Vec<(usize, Command)>, (usize, AreaError)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(n, line)| line.parse::<Command>().map(|cmd| (n, cmd)).map_err(|e| (n, e)))
        .collect()
}

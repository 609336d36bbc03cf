use thiserror::Error;

use crate::session::SessionState;

/// Errors that can occur while tracing, calibrating or estimating.
///
/// None of these are fatal to a session: every failure leaves the
/// session in a well-defined state (drawing or calibrating).
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AreaError {
    #[error("invalid distance input: {0:?}")]
    InvalidInput(String),

    #[error("reference segment has zero pixel length")]
    DegenerateCalibration,

    #[error("point ({x}, {y}) is not finite")]
    NonFinitePoint { x: f64, y: f64 },

    #[error("no closed contour to estimate")]
    EmptyContour,

    #[error("no non-zero scale ratio has been calibrated")]
    NoCalibration,

    #[error("no reference segment is awaiting a distance")]
    MissingScaleSegment,

    #[error("cannot {operation} while {state}")]
    UnexpectedState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
}

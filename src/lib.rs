//! contour-area: traced contour → estimated real-world area.
//!
//! A shell feeds pointer paths drawn over a reference image into a
//! [`Session`]. Once two segments cross the contour counts as closed;
//! the user then calibrates a reference segment of known length and the
//! enclosed area is estimated by Monte Carlo sampling, with a running
//! estimate reported after every batch.
//!
//! # Example
//!
//! ```
//! use contour_area::{kurbo::Point, EstimatorConfig, Session, SessionConfig};
//!
//! let config = SessionConfig {
//!     estimator: EstimatorConfig { total_samples: 100_000, ..EstimatorConfig::default() },
//!     ..SessionConfig::default()
//! };
//! let mut session = Session::new(config);
//! for stroke in [
//!     [(-10.0, 0.0), (100.0, 0.0), (100.0, 100.0)],
//!     [(100.0, 100.0), (0.0, 100.0), (0.0, -10.0)],
//! ] {
//!     for (x, y) in stroke {
//!         session.add_point_to_active_trace(Point::new(x, y))?;
//!     }
//!     session.commit_active_trace();
//! }
//! assert!(session.try_close_contour());
//!
//! session.calibration_click(Point::new(0.0, 0.0))?;
//! session.calibration_click(Point::new(0.0, 100.0))?;
//! session.submit_real_distance("2.5")?;
//!
//! let area = session.run_area_estimation(|p| {
//!     println!("{:>3.0}%  {:.2} km²", p.fraction_done() * 100.0, p.area());
//! })?;
//! assert!((area - 6.2).abs() < 0.1);
//! # Ok::<(), contour_area::AreaError>(())
//! ```

#![forbid(unsafe_code)]

mod calibration;
mod config;
mod geom;
mod intersect;
mod trace;

pub mod command;
pub mod error;
pub mod estimate;
pub mod session;

// Re-export kurbo so downstream users get the same Point/Rect types.
pub use kurbo;

pub use calibration::{parse_distance, Calibration, ScaleLabel, ScaleLine, ScaleRatio};
pub use command::{Command, Outcome};
pub use config::{DetectorConfig, EstimatorConfig, SampleMode, SessionConfig};
pub use error::AreaError;
pub use estimate::{AreaEstimate, AreaEstimator, AreaProgress, EstimateStatus, EstimationRun};
pub use geom::{bounding_box, orientation, point_in_polygon, segments_intersect};
pub use intersect::{detect as detect_crossing, Crossing};
pub use session::{Session, SessionEvent, SessionState};
pub use trace::{ContourStore, Trace};

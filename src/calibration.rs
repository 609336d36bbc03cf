//! Pixel-to-real-world calibration from one reference segment.
//!
//! The user clicks the two ends of a feature of known size, then types
//! its real length. The ratio `distance / pixel_length` (real units per
//! pixel) is the single active calibration until the contour is reset.

use std::fmt;

use kurbo::Point;

use crate::error::AreaError;

/// Real-world units per pixel.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScaleRatio(f64);

impl ScaleRatio {
    /// Ratio for a segment of `pixel_length` pixels measuring `distance` units.
    pub fn from_measurement(distance: f64, pixel_length: f64) -> Result<Self, AreaError> {
        if pixel_length <= 0.0 || !pixel_length.is_finite() {
            return Err(AreaError::DegenerateCalibration);
        }
        Ok(Self(distance / pixel_length))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert a pixel area to real-world square units.
    pub fn scale_area(self, area_px: f64) -> f64 {
        area_px * self.0 * self.0
    }
}

/// Text shown next to a scale line.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleLabel {
    /// Measured, awaiting a distance: shows the pixel length.
    Measured(f64),
    /// Calibrated: shows the resulting ratio.
    Ratio(ScaleRatio),
    /// The entered distance was rejected.
    Invalid,
}

/// A reference segment drawn by the user, with its label.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleLine {
    pub start: Point,
    pub end: Point,
    pub label: ScaleLabel,
}

impl ScaleLine {
    pub fn pixel_length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Midpoint of the segment, where a shell anchors the label.
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }

    /// Label text, with `unit` naming the real-world unit.
    pub fn label_text(&self, unit: &str) -> String {
        match &self.label {
            ScaleLabel::Measured(len) => format!("{:.2} px", len),
            ScaleLabel::Ratio(ratio) => format!("{:.3} {}/px", ratio.value(), unit),
            ScaleLabel::Invalid => "invalid input".to_string(),
        }
    }
}

/// Calibration state for the current contour.
#[derive(Debug, Clone, Default)]
pub struct Calibration {
    lines: Vec<ScaleLine>,
    pending_start: Option<Point>,
    awaiting_distance: bool,
    ratio: Option<ScaleRatio>,
}

impl Calibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two-click capture: the first click opens a segment, the second
    /// closes it and returns its pixel length.
    pub fn click(&mut self, point: Point) -> Option<f64> {
        match self.pending_start {
            None => {
                self.begin_segment(point);
                None
            }
            Some(_) => self.end_segment(point).ok(),
        }
    }

    /// Register the first endpoint of a reference segment.
    ///
    /// Starting a new segment abandons any measurement still awaiting
    /// a distance; its scale line is dropped.
    pub fn begin_segment(&mut self, point: Point) {
        if self.awaiting_distance {
            self.lines.pop();
            self.awaiting_distance = false;
        }
        self.pending_start = Some(point);
    }

    /// Register the second endpoint and record the scale line.
    ///
    /// Returns the segment's pixel length. The module then awaits a
    /// real-world distance for it.
    pub fn end_segment(&mut self, point: Point) -> Result<f64, AreaError> {
        let start = self.pending_start.take().ok_or(AreaError::MissingScaleSegment)?;
        let len = start.distance(point);
        self.lines.push(ScaleLine {
            start,
            end: point,
            label: ScaleLabel::Measured(len),
        });
        self.awaiting_distance = true;
        Ok(len)
    }

    /// Turn the typed distance for the latest segment into the active ratio.
    ///
    /// On a parse failure the latest label is marked invalid and the
    /// segment keeps awaiting a distance. A zero-length segment is
    /// abandoned and must be measured again.
    pub fn submit_distance(&mut self, text: &str) -> Result<ScaleRatio, AreaError> {
        if !self.awaiting_distance {
            return Err(AreaError::MissingScaleSegment);
        }
        let Some(line) = self.lines.last_mut() else {
            return Err(AreaError::MissingScaleSegment);
        };

        let distance = match parse_distance(text) {
            Ok(d) => d,
            Err(e) => {
                line.label = ScaleLabel::Invalid;
                return Err(e);
            }
        };

        match ScaleRatio::from_measurement(distance, line.pixel_length()) {
            Ok(ratio) => {
                line.label = ScaleLabel::Ratio(ratio);
                self.ratio = Some(ratio);
                self.awaiting_distance = false;
                Ok(ratio)
            }
            Err(e) => {
                line.label = ScaleLabel::Invalid;
                self.awaiting_distance = false;
                Err(e)
            }
        }
    }

    /// The active scale ratio, if one has been set.
    pub fn ratio(&self) -> Option<ScaleRatio> {
        self.ratio
    }

    pub fn lines(&self) -> &[ScaleLine] {
        &self.lines
    }

    pub fn pending_start(&self) -> Option<Point> {
        self.pending_start
    }

    pub fn is_awaiting_distance(&self) -> bool {
        self.awaiting_distance
    }

    /// Forget everything: lines, pending clicks and the ratio.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Parse a real-world distance: a finite, non-negative number.
pub fn parse_distance(text: &str) -> Result<f64, AreaError> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(d) if d.is_finite() && d >= 0.0 => Ok(d),
        _ => Err(AreaError::InvalidInput(trimmed.to_string())),
    }
}

impl fmt::Display for ScaleRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

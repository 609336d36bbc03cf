use kurbo::{Line, Point};

/// A committed polyline, in pixel coordinates, in drawing order.
///
/// Always holds at least two points: [`ContourStore::commit_active`]
/// refuses anything shorter.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    points: Vec<Point>,
}

impl Trace {
    /// Build a trace from drawn points. `None` if fewer than two.
    pub fn new(points: Vec<Point>) -> Option<Self> {
        (points.len() >= 2).then_some(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consecutive point pairs, in drawing order.
    pub fn segments(&self) -> impl Iterator<Item = Line> + '_ {
        self.points.windows(2).map(|w| Line::new(w[0], w[1]))
    }

    pub fn segment_count(&self) -> usize {
        self.points.len() - 1
    }
}

/// Committed traces plus the trace currently being drawn.
///
/// Append-only while drawing; the only mutations are
/// [`remove_last`](Self::remove_last) and [`clear`](Self::clear), plus
/// dropping an uncommitted stroke with [`discard_active`](Self::discard_active).
#[derive(Debug, Clone, Default)]
pub struct ContourStore {
    traces: Vec<Trace>,
    active: Vec<Point>,
}

impl ContourStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the in-progress trace (pointer drag).
    pub fn add_point(&mut self, point: Point) {
        self.active.push(point);
    }

    /// Move the in-progress trace into the store (pointer release).
    ///
    /// Returns `false` and discards the points if fewer than two were drawn.
    pub fn commit_active(&mut self) -> bool {
        let points = std::mem::take(&mut self.active);
        match Trace::new(points) {
            Some(trace) => {
                self.traces.push(trace);
                true
            }
            None => false,
        }
    }

    /// Drop the in-progress trace without committing it. Returns how many
    /// points were dropped.
    pub fn discard_active(&mut self) -> usize {
        std::mem::take(&mut self.active).len()
    }

    /// Drop the most recently committed trace. `None` if the store is empty.
    pub fn remove_last(&mut self) -> Option<Trace> {
        self.traces.pop()
    }

    /// Drop every trace, including the one being drawn.
    pub fn clear(&mut self) {
        self.traces.clear();
        self.active.clear();
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn active(&self) -> &[Point] {
        &self.active
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Every segment of every committed trace: trace order, then drawing order.
    pub fn segments(&self) -> impl Iterator<Item = Line> + '_ {
        self.traces.iter().flat_map(Trace::segments)
    }

    /// All committed points flattened into one ring, in drawing order.
    ///
    /// Separate traces are joined end to start, so several strokes act
    /// as one boundary.
    pub fn flattened(&self) -> Vec<Point> {
        self.traces
            .iter()
            .flat_map(|trace| trace.points().iter().copied())
            .collect()
    }
}

//! Closure detection: the drawn contour counts as closed as soon as any
//! two of its segments cross.
//!
//! Quadratic in the number of segments. Only run on an explicit confirm,
//! never per pointer move.

use kurbo::Line;

use crate::config::DetectorConfig;
use crate::geom::segments_intersect;
use crate::trace::ContourStore;

/// The first crossing pair found, as indices into [`ContourStore::segments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub first: usize,
    pub second: usize,
}

/// Find the first crossing among the store's committed segments.
pub fn detect(store: &ContourStore, config: &DetectorConfig) -> Option<Crossing> {
    let segments: Vec<Line> = store.segments().collect();
    let adjacent = if config.skip_adjacent {
        adjacency(store)
    } else {
        Vec::new()
    };
    first_crossing(&segments, |i| adjacent.get(i).copied().unwrap_or(false))
}

/// Scan all unordered pairs `(i, j)`, `i < j`, in order and stop at the
/// first crossing. `followed_by_next(i)` marks segment `i` as sharing its
/// end point with segment `i + 1`; such pairs are not tested.
fn first_crossing<F>(segments: &[Line], followed_by_next: F) -> Option<Crossing>
where
    F: Fn(usize) -> bool,
{
    for (i, a) in segments.iter().enumerate() {
        for (j, b) in segments.iter().enumerate().skip(i + 1) {
            if j == i + 1 && followed_by_next(i) {
                continue;
            }
            if segments_intersect(a.p0, a.p1, b.p0, b.p1) {
                return Some(Crossing { first: i, second: j });
            }
        }
    }
    None
}

/// For each segment, whether the next segment belongs to the same trace.
fn adjacency(store: &ContourStore) -> Vec<bool> {
    store
        .traces()
        .iter()
        .flat_map(|trace| {
            let n = trace.segment_count();
            (0..n).map(move |k| k + 1 < n)
        })
        .collect()
}

//! Seeded sampling inside a bounding box.
//!
//! A batch is cut into fixed-size chunks, each with its own RNG seeded
//! from the batch seed and the chunk index. Chunks can then be counted
//! on any number of rayon workers and still sum to the same total.

use kurbo::{Point, Rect};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::SampleMode;
use crate::geom::point_in_polygon;

/// Samples per independently seeded chunk.
pub const CHUNK_SIZE: u64 = 8192;

/// Range of one sample coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    /// Integer values in `[lo, hi]`.
    Lattice(i64, i64),
    /// Real values in `[lo, hi]`.
    Span(f64, f64),
    /// Zero-width range, or no lattice point inside it.
    Fixed(f64),
}

impl Axis {
    fn new(lo: f64, hi: f64, mode: SampleMode) -> Self {
        match mode {
            SampleMode::Integer => {
                let (a, b) = (lo.ceil(), hi.floor());
                if a <= b {
                    Axis::Lattice(a as i64, b as i64)
                } else {
                    Axis::Fixed(lo)
                }
            }
            SampleMode::Continuous if lo < hi => Axis::Span(lo, hi),
            SampleMode::Continuous => Axis::Fixed(lo),
        }
    }

    fn draw<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            Axis::Lattice(lo, hi) => rng.gen_range(lo..=hi) as f64,
            Axis::Span(lo, hi) if (hi - lo).is_finite() => rng.gen_range(lo..=hi),
            // Width overflows f64: interpolate instead.
            Axis::Span(lo, hi) => {
                let t: f64 = rng.gen_range(0.0..=1.0);
                (lo * (1.0 - t) + hi * t).clamp(lo, hi)
            }
            Axis::Fixed(v) => v,
        }
    }
}

/// Where sample points are drawn: a bounding box and a coordinate mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRegion {
    x: Axis,
    y: Axis,
}

impl SampleRegion {
    pub fn new(rect: Rect, mode: SampleMode) -> Self {
        Self {
            x: Axis::new(rect.x0, rect.x1, mode),
            y: Axis::new(rect.y0, rect.y1, mode),
        }
    }

    /// One uniform sample, inclusive of the box edges.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Point {
        let x = self.x.draw(rng);
        let y = self.y.draw(rng);
        Point::new(x, y)
    }
}

/// Seed for batch `batch` of a run seeded with `base`.
pub fn batch_seed(base: u64, batch: u32) -> u64 {
    base.wrapping_add(batch as u64)
}

/// Seed for chunk `chunk` of a batch (splitmix64 finalizer).
fn chunk_seed(batch_seed: u64, chunk: u64) -> u64 {
    let mut z = batch_seed ^ chunk.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Draw `samples` points from `region` and count those inside `ring`.
///
/// The count depends only on the arguments, never on `parallel` or on
/// the size of the rayon pool.
pub fn count_inside(
    ring: &[Point],
    region: &SampleRegion,
    samples: u64,
    seed: u64,
    parallel: bool,
) -> u64 {
    let chunks = samples.div_ceil(CHUNK_SIZE);
    let count_chunk = |chunk: u64| -> u64 {
        let len = CHUNK_SIZE.min(samples - chunk * CHUNK_SIZE);
        let mut rng = StdRng::seed_from_u64(chunk_seed(seed, chunk));
        let mut inside = 0;
        for _ in 0..len {
            if point_in_polygon(region.draw(&mut rng), ring) {
                inside += 1;
            }
        }
        inside
    };

    if parallel {
        (0..chunks).into_par_iter().map(count_chunk).sum()
    } else {
        (0..chunks).map(count_chunk).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]
    }

    #[test]
    fn integer_samples_stay_on_lattice_inside_box() {
        let region = SampleRegion::new(Rect::new(0.5, -2.0, 4.5, 2.0), SampleMode::Integer);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let p = region.draw(&mut rng);
            assert_eq!(p.x.fract(), 0.0);
            assert_eq!(p.y.fract(), 0.0);
            assert!((1.0..=4.0).contains(&p.x), "{:?}", p);
            assert!((-2.0..=2.0).contains(&p.y), "{:?}", p);
        }
    }

    #[test]
    fn continuous_samples_stay_inside_box() {
        let rect = Rect::new(-3.0, 10.0, 3.0, 12.5);
        let region = SampleRegion::new(rect, SampleMode::Continuous);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let p = region.draw(&mut rng);
            assert!(p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1);
        }
    }

    #[test]
    fn degenerate_axes_are_fixed() {
        let flat = SampleRegion::new(Rect::new(2.0, 5.0, 8.0, 5.0), SampleMode::Continuous);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(flat.draw(&mut rng).y, 5.0);

        // No integer between 0.2 and 0.7.
        let narrow = SampleRegion::new(Rect::new(0.2, 0.0, 0.7, 10.0), SampleMode::Integer);
        assert_eq!(narrow.draw(&mut rng).x, 0.2);
    }

    #[test]
    fn extreme_boxes_do_not_overflow() {
        let rect = Rect::new(-1e308, -1e308, 1e308, 1e308);
        let mut rng = StdRng::seed_from_u64(5);
        for mode in [SampleMode::Continuous, SampleMode::Integer] {
            let region = SampleRegion::new(rect, mode);
            for _ in 0..100 {
                let p = region.draw(&mut rng);
                assert!(p.is_finite(), "{:?}", p);
                assert!(p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1);
            }
        }
    }

    #[test]
    fn chunk_seeds_differ() {
        let seeds: Vec<u64> = (0..64).map(|c| chunk_seed(batch_seed(42, 3), c)).collect();
        let mut unique = seeds.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), seeds.len());
        assert_ne!(chunk_seed(batch_seed(42, 3), 0), chunk_seed(batch_seed(42, 4), 0));
    }

    #[test]
    fn parallel_and_sequential_counts_match() {
        let ring = square();
        let region = SampleRegion::new(Rect::new(-50.0, -50.0, 150.0, 150.0), SampleMode::Continuous);
        // Not a multiple of the chunk size, so the last chunk is short.
        let samples = CHUNK_SIZE * 5 + 123;
        let par = count_inside(&ring, &region, samples, 99, true);
        let seq = count_inside(&ring, &region, samples, 99, false);
        assert_eq!(par, seq);
        assert!(par > 0 && par < samples);
    }

    #[test]
    fn zero_samples_count_nothing() {
        let region = SampleRegion::new(Rect::new(0.0, 0.0, 100.0, 100.0), SampleMode::Integer);
        assert_eq!(count_inside(&square(), &region, 0, 1, true), 0);
    }
}

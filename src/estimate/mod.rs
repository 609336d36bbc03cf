//! Monte Carlo area estimation.
//!
//! 1. Flattened contour points become one even-odd ring
//! 2. Uniform samples are drawn in the ring's bounding box
//! 3. The inside fraction times the box area is the pixel area
//! 4. The pixel area times ratio² is the real-world area
//!
//! The sample budget is split into batches and the running estimate is
//! reported after each one, so a shell can show progress during a long run.

pub mod sampler;

use std::iter::FusedIterator;

use kurbo::{Point, Rect};

use crate::calibration::ScaleRatio;
use crate::config::EstimatorConfig;
use crate::error::AreaError;
use crate::geom::bounding_box;

use sampler::SampleRegion;

/// Running Monte Carlo counts and the quantities derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaEstimate {
    /// Samples classified inside the contour so far.
    pub inside: u64,
    /// Samples drawn so far.
    pub total: u64,
    /// Bounding-box area in square pixels.
    pub bbox_area: f64,
    /// Calibration the real-world area is computed with.
    pub ratio: ScaleRatio,
}

impl AreaEstimate {
    fn empty(bbox_area: f64, ratio: ScaleRatio) -> Self {
        Self {
            inside: 0,
            total: 0,
            bbox_area,
            ratio,
        }
    }

    /// Fraction of samples that fell inside. 0 before any sample.
    pub fn inside_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.inside as f64 / self.total as f64
        }
    }

    /// Estimated area in square pixels.
    pub fn area_px(&self) -> f64 {
        self.inside_fraction() * self.bbox_area
    }

    /// Estimated area in real-world square units.
    pub fn area(&self) -> f64 {
        self.ratio.scale_area(self.area_px())
    }

    /// Binomial standard error of [`area`](Self::area), in the same units.
    pub fn standard_error(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let p = self.inside_fraction();
        let se_px = self.bbox_area * (p * (1.0 - p) / self.total as f64).sqrt();
        self.ratio.scale_area(se_px)
    }
}

/// Whether a run still has batches left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateStatus {
    InProgress,
    Complete,
}

/// One progress report, emitted after each batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaProgress {
    /// Number of batches finished, starting at 1.
    pub batch: u32,
    pub batch_count: u32,
    pub estimate: AreaEstimate,
    pub status: EstimateStatus,
}

impl AreaProgress {
    /// Share of the batch schedule done, in (0, 1].
    pub fn fraction_done(&self) -> f64 {
        self.batch as f64 / self.batch_count as f64
    }

    pub fn area(&self) -> f64 {
        self.estimate.area()
    }

    pub fn is_complete(&self) -> bool {
        self.status == EstimateStatus::Complete
    }
}

/// A prepared estimation: ring, sample region and batch schedule.
#[derive(Debug, Clone)]
pub struct AreaEstimator {
    ring: Vec<Point>,
    bbox: Rect,
    region: SampleRegion,
    ratio: ScaleRatio,
    config: EstimatorConfig,
}

impl AreaEstimator {
    /// Prepare an estimation over `ring` (implicitly closed).
    pub fn new(
        ring: Vec<Point>,
        ratio: ScaleRatio,
        config: &EstimatorConfig,
    ) -> Result<Self, AreaError> {
        let bbox = bounding_box(ring.iter().copied()).ok_or(AreaError::EmptyContour)?;
        let mut config = config.clone();
        config.batch_count = config.batch_count.max(1);
        Ok(Self {
            region: SampleRegion::new(bbox, config.sampling),
            ring,
            bbox,
            ratio,
            config,
        })
    }

    pub fn bounding_box(&self) -> Rect {
        self.bbox
    }

    pub fn batch_count(&self) -> u32 {
        self.config.batch_count
    }

    /// Samples in batch `batch`. The remainder of the budget goes to the last one.
    pub fn batch_size(&self, batch: u32) -> u64 {
        let count = self.config.batch_count as u64;
        let base = self.config.total_samples / count;
        if batch + 1 == self.config.batch_count {
            base + self.config.total_samples % count
        } else {
            base
        }
    }

    /// Start the run. The returned iterator yields one report per batch.
    pub fn run(self) -> EstimationRun {
        let estimate = AreaEstimate::empty(self.bbox.area(), self.ratio);
        EstimationRun {
            estimator: self,
            next_batch: 0,
            estimate,
        }
    }

    /// Run every batch, calling `progress` after each, and return the final estimate.
    pub fn estimate_with<F>(self, mut progress: F) -> AreaEstimate
    where
        F: FnMut(&AreaProgress),
    {
        let mut run = self.run();
        for report in run.by_ref() {
            progress(&report);
        }
        run.estimate()
    }
}

/// An estimation in flight: a finite sequence of batch reports.
///
/// Dropping it between batches abandons the run with nothing left over.
#[derive(Debug, Clone)]
pub struct EstimationRun {
    estimator: AreaEstimator,
    next_batch: u32,
    estimate: AreaEstimate,
}

impl EstimationRun {
    /// Counts accumulated so far.
    pub fn estimate(&self) -> AreaEstimate {
        self.estimate
    }

    pub fn is_complete(&self) -> bool {
        self.next_batch >= self.estimator.batch_count()
    }
}

impl Iterator for EstimationRun {
    type Item = AreaProgress;

    fn next(&mut self) -> Option<AreaProgress> {
        if self.is_complete() {
            return None;
        }
        let batch = self.next_batch;
        let config = &self.estimator.config;
        let samples = self.estimator.batch_size(batch);
        let inside = sampler::count_inside(
            &self.estimator.ring,
            &self.estimator.region,
            samples,
            sampler::batch_seed(config.seed, batch),
            config.parallel,
        );

        self.estimate.inside += inside;
        self.estimate.total += samples;
        self.next_batch += 1;

        let status = if self.is_complete() {
            EstimateStatus::Complete
        } else {
            EstimateStatus::InProgress
        };
        log::debug!(
            "batch {}/{}: {} of {} inside, area {:.2} px²",
            self.next_batch,
            self.estimator.batch_count(),
            self.estimate.inside,
            self.estimate.total,
            self.estimate.area_px(),
        );

        Some(AreaProgress {
            batch: self.next_batch,
            batch_count: self.estimator.batch_count(),
            estimate: self.estimate,
            status,
        })
    }
}

impl FusedIterator for EstimationRun {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleMode;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn square() -> Vec<Point> {
        pts(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)])
    }

    fn unit_ratio() -> ScaleRatio {
        ScaleRatio::from_measurement(1.0, 1.0).unwrap()
    }

    fn config(total_samples: u64, batch_count: u32, sampling: SampleMode) -> EstimatorConfig {
        EstimatorConfig {
            total_samples,
            batch_count,
            sampling,
            ..EstimatorConfig::default()
        }
    }

    #[test]
    fn square_area_within_three_percent() {
        for mode in [SampleMode::Continuous, SampleMode::Integer] {
            let estimator =
                AreaEstimator::new(square(), unit_ratio(), &config(1_000_000, 100, mode)).unwrap();
            assert_eq!(estimator.bounding_box().area(), 10_000.0);
            let estimate = estimator.estimate_with(|_| {});
            assert_eq!(estimate.total, 1_000_000);
            let error = (estimate.area() - 10_000.0).abs() / 10_000.0;
            assert!(error < 0.03, "{:?}: area {}", mode, estimate.area());
        }
    }

    #[test]
    fn triangle_converges_to_half_the_box() {
        let triangle = pts(&[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        let estimator = AreaEstimator::new(
            triangle,
            unit_ratio(),
            &config(400_000, 20, SampleMode::Continuous),
        )
        .unwrap();
        let estimate = estimator.estimate_with(|_| {});
        let se = estimate.standard_error();
        assert!(se > 0.0 && se < 10.0, "se {}", se);
        assert!((estimate.area() - 5000.0).abs() < 5.0 * se, "area {}", estimate.area());
    }

    #[test]
    fn standard_error_shrinks_with_sqrt_n() {
        let triangle = pts(&[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        let se = |n: u64| {
            AreaEstimator::new(triangle.clone(), unit_ratio(), &config(n, 1, SampleMode::Continuous))
                .unwrap()
                .estimate_with(|_| {})
                .standard_error()
        };
        let ratio = se(10_000) / se(40_000);
        assert!((ratio - 2.0).abs() < 0.1, "ratio {}", ratio);
    }

    #[test]
    fn area_scales_with_calibration() {
        let ratio = ScaleRatio::from_measurement(1.0, 2.0).unwrap();
        let estimator =
            AreaEstimator::new(square(), ratio, &config(50_000, 5, SampleMode::Continuous)).unwrap();
        let estimate = estimator.estimate_with(|_| {});
        assert_eq!(estimate.area(), estimate.area_px() * 0.25);
    }

    #[test]
    fn reports_once_per_batch_then_completes() {
        let estimator =
            AreaEstimator::new(square(), unit_ratio(), &config(10_050, 10, SampleMode::Integer))
                .unwrap();
        assert_eq!(estimator.batch_size(0), 1005);
        assert_eq!(estimator.batch_size(9), 1005);

        let mut run = estimator.run();
        let reports: Vec<AreaProgress> = run.by_ref().collect();
        assert_eq!(reports.len(), 10);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.batch as usize, i + 1);
            assert_eq!(report.is_complete(), i == 9);
        }
        assert_eq!(reports[9].fraction_done(), 1.0);
        assert!(reports.windows(2).all(|w| w[0].estimate.total < w[1].estimate.total));
        assert_eq!(reports[9].estimate.total, 10_050);

        assert!(run.is_complete());
        assert!(run.next().is_none());
    }

    #[test]
    fn remainder_goes_to_last_batch() {
        let estimator =
            AreaEstimator::new(square(), unit_ratio(), &config(1_003, 4, SampleMode::Integer))
                .unwrap();
        let sizes: Vec<u64> = (0..4).map(|b| estimator.batch_size(b)).collect();
        assert_eq!(sizes, vec![250, 250, 250, 253]);
    }

    #[test]
    fn fixed_seed_runs_are_bit_identical() {
        let concave = pts(&[
            (0.0, 0.0),
            (30.0, 0.0),
            (30.0, 30.0),
            (20.0, 30.0),
            (20.0, 10.0),
            (10.0, 10.0),
            (10.0, 30.0),
            (0.0, 30.0),
        ]);
        let run = |parallel: bool| -> Vec<(u64, u64, u64)> {
            let cfg = EstimatorConfig {
                parallel,
                ..config(200_000, 8, SampleMode::Continuous)
            };
            AreaEstimator::new(concave.clone(), unit_ratio(), &cfg)
                .unwrap()
                .run()
                .map(|p| (p.estimate.inside, p.estimate.total, p.area().to_bits()))
                .collect()
        };
        let first = run(true);
        assert_eq!(first, run(true));
        assert_eq!(first, run(false));
    }

    #[test]
    fn different_seeds_give_different_counts() {
        let run = |seed: u64| {
            let cfg = EstimatorConfig {
                seed,
                ..config(100_000, 2, SampleMode::Continuous)
            };
            let triangle = pts(&[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
            AreaEstimator::new(triangle, unit_ratio(), &cfg)
                .unwrap()
                .estimate_with(|_| {})
                .inside
        };
        assert_ne!(run(1), run(2));
    }

    #[test]
    fn empty_ring_is_rejected() {
        assert_eq!(
            AreaEstimator::new(Vec::new(), unit_ratio(), &EstimatorConfig::default()).err(),
            Some(AreaError::EmptyContour)
        );
    }

    #[test]
    fn flat_contour_has_zero_area() {
        let line = pts(&[(0.0, 5.0), (50.0, 5.0), (100.0, 5.0)]);
        let estimate = AreaEstimator::new(line, unit_ratio(), &config(1_000, 2, SampleMode::Integer))
            .unwrap()
            .estimate_with(|_| {});
        assert_eq!(estimate.area(), 0.0);
        assert_eq!(estimate.total, 1_000);
    }
}

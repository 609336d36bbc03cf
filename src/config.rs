/// All session parameters in one struct.
/// Adjustable at startup from the command line; the session never
/// mutates it.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Monte Carlo sampling parameters.
    pub estimator: EstimatorConfig,
    /// Closure detection parameters.
    pub detector: DetectorConfig,
    /// Real-world unit name shown in scale labels (e.g. "km").
    pub unit: String,
}

/// Monte Carlo area estimation parameters.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Total number of sample points drawn over the whole run.
    pub total_samples: u64,
    /// Number of batches the budget is split into. A running estimate
    /// is reported after each batch. 100 = one report per 1% of samples.
    pub batch_count: u32,
    /// Base seed. Batch `b` is seeded with `seed + b`.
    pub seed: u64,
    /// Whether sample coordinates are integer pixels or real values.
    pub sampling: SampleMode,
    /// Classify chunks on the rayon pool. Results are identical either way.
    pub parallel: bool,
}

/// How sample coordinates are drawn inside the bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Integer pixel coordinates in `[ceil(min), floor(max)]`.
    Integer,
    /// Real coordinates in `[min, max]`.
    Continuous,
}

/// Closure detection parameters.
#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    /// Skip pairs of consecutive segments within the same trace.
    ///
    /// Consecutive segments share an endpoint, and the strict orientation
    /// test reports every left turn between them as a crossing. Off by
    /// default so closure detection enumerates every pair.
    pub skip_adjacent: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            detector: DetectorConfig::default(),
            unit: "km".to_string(),
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            total_samples: 10_000_000,
            batch_count: 100,
            seed: 0x5eed,
            sampling: SampleMode::Integer,
            parallel: true,
        }
    }
}

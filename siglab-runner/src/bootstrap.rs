//! Bootstrap confidence intervals for hit rate and expectancy.
//!
//! Plain resampling with replacement over trade indices, seeded for
//! reproducibility. Trade returns at a 4-bar horizon carry little serial
//! structure worth preserving, so no block scheme is used.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::backtest::SimulatedTrade;
use crate::metrics::{mean, percentile, BootstrapInterval};

/// Configuration for the bootstrap resampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Number of resamples (default 1000).
    pub samples: usize,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self { samples: 1000, seed: 42 }
    }
}

/// Resample the trade set and report the 2.5/97.5 percentile interval of
/// hit rate and expectancy. An empty trade set yields a zero interval.
pub fn bootstrap_interval(trades: &[SimulatedTrade], config: &BootstrapConfig) -> BootstrapInterval {
    let n = trades.len();
    if n == 0 || config.samples == 0 {
        return BootstrapInterval {
            samples: config.samples,
            ..BootstrapInterval::default()
        };
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut hit_rates = Vec::with_capacity(config.samples);
    let mut expectancies = Vec::with_capacity(config.samples);

    let mut sample_returns = Vec::with_capacity(n);
    for _ in 0..config.samples {
        sample_returns.clear();
        let mut hits = 0usize;
        for _ in 0..n {
            let t = &trades[rng.gen_range(0..n)];
            if t.net_value > 0.0 {
                hits += 1;
            }
            sample_returns.push(t.net_return);
        }
        hit_rates.push(hits as f64 / n as f64);
        expectancies.push(mean(&sample_returns));
    }

    hit_rates.sort_by(|a, b| a.total_cmp(b));
    expectancies.sort_by(|a, b| a.total_cmp(b));

    BootstrapInterval {
        samples: config.samples,
        hit_rate_low: percentile(&hit_rates, 0.025),
        hit_rate_high: percentile(&hit_rates, 0.975),
        expectancy_low: percentile(&expectancies, 0.025),
        expectancy_high: percentile(&expectancies, 0.975),
    }
}

use crate::config::ModelConfig;
use crate::engine::{SimError, check_params, simulate};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

/// Histogram bin of the empirical density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub left: f64,
    pub right: f64,
    pub value: f64,
}

/// Trial driver.
///
/// Runs trials with a fixed model configuration and accumulates their
/// outcomes into an append-only sample. Serializable so that a run can be
/// checkpointed and resumed with the same random stream.
#[derive(Serialize, Deserialize)]
pub struct Driver {
    model: ModelConfig,
    sample: Vec<f64>,
    sum: f64,
    rng: ChaCha12Rng,
}

impl Driver {
    /// Create a driver with an empty sample.
    ///
    /// # Errors
    /// Returns [`SimError::InvalidConfig`] if the model parameters are invalid.
    pub fn new(model: ModelConfig, rng: ChaCha12Rng) -> Result<Self, SimError> {
        check_params(model.n_nodes, model.n_inf_init)?;
        Ok(Self {
            model,
            sample: Vec::new(),
            sum: 0.0,
            rng,
        })
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    pub fn sample(&self) -> &[f64] {
        &self.sample
    }

    /// Run one trial and append its outcome to the sample.
    ///
    /// Returns the new sample size and the running mean of the sample.
    /// A failed trial leaves the sample untouched.
    pub fn run_trial(&mut self) -> Result<(usize, f64), SimError> {
        let trial = simulate(
            self.model.n_nodes,
            self.model.n_inf_init,
            self.model.max_steps,
            &mut self.rng,
        )?;
        log::debug!("trial finished after {} steps", trial.n_steps);

        self.sample.push(trial.frac_sus);
        self.sum += trial.frac_sus;

        Ok((self.sample.len(), self.mean()))
    }

    /// Arithmetic mean of the sample, NaN if it is empty.
    pub fn mean(&self) -> f64 {
        self.sum / self.sample.len() as f64
    }

    /// Compute the empirical density of the sample over `n_bins` equal-width
    /// bins spanning [0, 1].
    ///
    /// Bins are half-open except the last one, which also holds 1.0.
    pub fn density(&self, n_bins: usize) -> Result<Vec<Bin>, SimError> {
        if n_bins == 0 {
            return Err(SimError::InvalidConfig(
                "number of bins must be positive".to_string(),
            ));
        }
        if self.sample.is_empty() {
            return Err(SimError::EmptySample);
        }

        let edge = |i_bin: usize| i_bin as f64 / n_bins as f64;

        let mut counts = vec![0usize; n_bins];
        for &val in &self.sample {
            let mut i_bin = ((val * n_bins as f64) as usize).min(n_bins - 1);
            // Correct for rounding in the product so edges decide membership.
            if val < edge(i_bin) {
                i_bin -= 1;
            } else if i_bin + 1 < n_bins && val >= edge(i_bin + 1) {
                i_bin += 1;
            }
            counts[i_bin] += 1;
        }

        let n_vals = self.sample.len() as f64;
        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i_bin, count)| {
                let left = edge(i_bin);
                let right = edge(i_bin + 1);
                Bin {
                    left,
                    right,
                    value: count as f64 / (n_vals * (right - left)),
                }
            })
            .collect();

        Ok(bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn driver(n_nodes: usize, n_inf_init: usize, seed: u64) -> Driver {
        let model = ModelConfig {
            n_nodes,
            n_inf_init,
            ..ModelConfig::default()
        };
        Driver::new(model, ChaCha12Rng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn invalid_model() {
        for (n_nodes, n_inf_init) in [(1, 1), (10, 10), (10, 0)] {
            let model = ModelConfig {
                n_nodes,
                n_inf_init,
                ..ModelConfig::default()
            };
            let res = Driver::new(model, ChaCha12Rng::seed_from_u64(0));
            assert!(matches!(res, Err(SimError::InvalidConfig(_))));
        }
    }

    #[test]
    fn empty_sample() {
        let drv = driver(100, 10, 0);
        assert!(matches!(drv.density(100), Err(SimError::EmptySample)));
    }

    #[test]
    fn zero_bins() {
        let mut drv = driver(100, 10, 0);
        drv.run_trial().unwrap();
        assert!(matches!(drv.density(0), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn sample_append_and_running_mean() {
        let mut drv = driver(100, 10, 1);
        for k in 1..=300 {
            let (n_trials, mean) = drv.run_trial().unwrap();
            assert_eq!(n_trials, k);
            assert_eq!(drv.sample().len(), k);
            let exp_mean = drv.sample().iter().fold(0.0_f64, |acc, &val| acc + val) / k as f64;
            assert_eq!(mean, exp_mean);
        }
    }

    #[test]
    fn failed_trial_is_discarded() {
        let model = ModelConfig {
            n_nodes: 1000,
            n_inf_init: 1,
            max_steps: 1,
        };
        let mut drv = Driver::new(model, ChaCha12Rng::seed_from_u64(2)).unwrap();
        assert!(matches!(drv.run_trial(), Err(SimError::StepLimit { .. })));
        assert!(drv.sample().is_empty());
        assert!(matches!(drv.density(10), Err(SimError::EmptySample)));
    }

    #[test]
    fn density_normalization() {
        let mut drv = driver(100, 10, 3);
        for n_trials in [1, 10, 250] {
            while drv.sample().len() < n_trials {
                drv.run_trial().unwrap();
            }
            for n_bins in [1, 7, 100, 1000] {
                let bins = drv.density(n_bins).unwrap();
                assert_eq!(bins.len(), n_bins);
                assert_eq!(bins[0].left, 0.0);
                assert_eq!(bins[n_bins - 1].right, 1.0);
                let total: f64 = bins.iter().map(|b| b.value * (b.right - b.left)).sum();
                assert!((total - 1.0).abs() < 1e-9, "total is {total}");
            }
        }
    }

    #[test]
    fn density_bins() {
        let mut drv = driver(2, 1, 4);
        for _ in 0..100 {
            drv.run_trial().unwrap();
        }
        let n_half = drv.sample().iter().filter(|&&val| val == 0.5).count();

        let bins = drv.density(4).unwrap();
        assert_eq!(bins[0].value, (100 - n_half) as f64 / (100.0 * 0.25));
        assert_eq!(bins[1].value, 0.0);
        // 0.5 is the left edge of the third bin.
        assert_eq!(bins[2].value, n_half as f64 / (100.0 * 0.25));
        assert_eq!(bins[3].value, 0.0);
    }

    #[test]
    fn density_is_recomputable() {
        let mut drv = driver(50, 5, 5);
        for _ in 0..40 {
            drv.run_trial().unwrap();
        }
        assert_eq!(drv.density(100).unwrap(), drv.density(100).unwrap());
    }
}

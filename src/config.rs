use crate::engine::check_params;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Parameters of the contact process.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Number of individuals in the population.
    pub n_nodes: usize,
    /// Initial number of infectives.
    pub n_inf_init: usize,
    /// Maximum number of contact steps before a trial is abandoned.
    pub max_steps: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_nodes: 100,
            n_inf_init: 10,
            max_steps: 1_000_000_000,
        }
    }
}

/// Parameters controlling how many trials are run and what is written.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Number of trials run per frames file.
    pub trials_per_file: usize,
    /// Number of trials between density snapshots.
    pub trials_per_save: usize,
    /// Number of histogram bins over [0, 1].
    pub hist_bins: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            trials_per_file: 200,
            trials_per_save: 1,
            hist_bins: 100,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_params(self.model.n_nodes, self.model.n_inf_init)?;
        check_num(self.model.max_steps, 1..).context("invalid maximum number of steps")?;

        check_num(self.output.trials_per_file, 1..).context("invalid number of trials per file")?;
        check_num(self.output.trials_per_save, 1..=self.output.trials_per_file)
            .context("invalid number of trials per save")?;
        check_num(self.output.hist_bins, 1..100_000).context("invalid number of histogram bins")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

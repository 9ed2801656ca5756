use crate::config::Config;
use crate::driver::{Bin, Driver};
use crate::stats::{Accumulator, AccumulatorReport};
use anyhow::{Context, Result};
use rmp_serde::encode;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Summary of all the trials of a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct Report {
    pub frac_sus: AccumulatorReport,
    pub density: Vec<Bin>,
}

pub struct Analyzer {
    cfg: Config,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub fn analyze(&self, driver: &Driver) -> Result<Report> {
        let mut acc = Accumulator::new();
        for &val in driver.sample() {
            acc.add(val);
        }

        let density = driver
            .density(self.cfg.output.hist_bins)
            .context("failed to compute density")?;

        Ok(Report {
            frac_sus: acc.report(),
            density,
        })
    }

    pub fn save_report<P: AsRef<Path>>(&self, report: &Report, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write_named(&mut writer, report).context("failed to serialize report")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn report() {
        let cfg = Config::default();
        let mut driver =
            Driver::new(cfg.model.clone(), ChaCha12Rng::seed_from_u64(9)).unwrap();
        let analyzer = Analyzer::new(cfg);
        assert!(analyzer.analyze(&driver).is_err());

        let mut mean = 0.0;
        for _ in 0..50 {
            (_, mean) = driver.run_trial().unwrap();
        }
        let report = analyzer.analyze(&driver).unwrap();
        assert_eq!(report.frac_sus.n_vals, 50);
        assert!((report.frac_sus.mean - mean).abs() < 1e-12);
        assert!(report.frac_sus.std_dev >= 0.0);
        assert_eq!(report.density.len(), 100);
    }
}

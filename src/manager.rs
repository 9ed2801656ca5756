use crate::analysis::Analyzer;
use crate::config::Config;
use crate::driver::{Bin, Driver};
use crate::engine::SimError;
use anyhow::{Context, Result, bail};
use glob::glob;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Density snapshot written for an external renderer.
#[derive(Debug, Serialize, Deserialize)]
pub struct Frame {
    pub n_trials: usize,
    pub mean: f64,
    pub density: Vec<Bin>,
}

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn create_run(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let rng = ChaCha12Rng::try_from_os_rng().context("failed to seed rng")?;
        let mut driver =
            Driver::new(self.cfg.model.clone(), rng).context("failed to construct driver")?;

        self.run_trials(&mut driver, run_idx, 0)
    }

    pub fn resume_run(&self, run_idx: usize) -> Result<()> {
        let file_idx = self
            .count_frames_files(run_idx)
            .context("failed to count frames files")?;

        let checkpoint_file = self.checkpoint_file(run_idx);
        let mut driver = load_checkpoint(&checkpoint_file)
            .with_context(|| format!("failed to load {checkpoint_file:?}"))?;
        if driver.model() != &self.cfg.model {
            bail!("checkpoint config differs from the current config");
        }
        log::info!("loaded {checkpoint_file:?}");

        self.run_trials(&mut driver, run_idx, file_idx)
    }

    pub fn analyze_sim(&self) -> Result<()> {
        let analyzer = Analyzer::new(self.cfg.clone());

        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let checkpoint_file = self.checkpoint_file(run_idx);
            let driver = load_checkpoint(&checkpoint_file)
                .with_context(|| format!("failed to load {checkpoint_file:?}"))?;
            if driver.sample().is_empty() {
                log::warn!("run {run_idx} has no completed trials");
                continue;
            }

            let report = analyzer
                .analyze(&driver)
                .with_context(|| format!("failed to analyze run {run_idx}"))?;
            log::info!(
                "run {run_idx}: {} trials, mean {:.6} +/- {:.6}",
                report.frac_sus.n_vals,
                report.frac_sus.mean,
                report.frac_sus.sem
            );

            analyzer
                .save_report(&report, self.results_file(run_idx))
                .context("failed to save results")?;
        }

        Ok(())
    }

    pub fn export_run(&self, run_idx: usize) -> Result<()> {
        let checkpoint_file = self.checkpoint_file(run_idx);
        let driver = load_checkpoint(&checkpoint_file)
            .with_context(|| format!("failed to load {checkpoint_file:?}"))?;
        let density = driver
            .density(self.cfg.output.hist_bins)
            .with_context(|| format!("failed to compute density of run {run_idx}"))?;

        let density_file = self.density_file(run_idx);
        let file = File::create(&density_file)
            .with_context(|| format!("failed to create {density_file:?}"))?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "#n_trials: {}", driver.sample().len())?;
        writeln!(writer, "#mean: {:016.14}", driver.mean())?;
        writeln!(writer, "#            left            right          density")?;
        for bin in &density {
            writeln!(
                writer,
                " {:016.14} {:016.14} {:016.10}",
                bin.left, bin.right, bin.value
            )?;
        }
        writer.flush().context("failed to flush writer stream")?;
        log::info!("exported {density_file:?}");

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let run_dir = self.run_dir(run_idx);
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn run_trials(&self, driver: &mut Driver, run_idx: usize, file_idx: usize) -> Result<()> {
        let frames_file = self.frames_file(run_idx, file_idx);
        let file = File::create(&frames_file)
            .with_context(|| format!("failed to create {frames_file:?}"))?;
        let mut writer = BufWriter::new(file);

        let output = &self.cfg.output;
        for i_trial in 0..output.trials_per_file {
            match driver.run_trial() {
                Ok((n_trials, mean)) => log::info!("{n_trials}: {mean}"),
                Err(err @ SimError::StepLimit { .. }) => log::warn!("discarded trial: {err}"),
                Err(err) => return Err(err).context("failed to run trial"),
            }

            if (i_trial + 1) % output.trials_per_save != 0 || driver.sample().is_empty() {
                continue;
            }
            let frame = Frame {
                n_trials: driver.sample().len(),
                mean: driver.mean(),
                density: driver
                    .density(output.hist_bins)
                    .context("failed to compute density")?,
            };
            encode::write_named(&mut writer, &frame).context("failed to serialize frame")?;
        }

        writer.flush().context("failed to flush writer stream")?;

        save_checkpoint(driver, self.checkpoint_file(run_idx)).context("failed to save checkpoint")
    }

    fn count_run_dirs(&self) -> Result<usize> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .count();
        Ok(count)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn count_frames_files(&self, run_idx: usize) -> Result<usize> {
        let pattern = self.run_dir(run_idx).join("frames-*.msgpack");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob frames files")?
            .filter_map(Result::ok)
            .count();
        Ok(count)
    }

    fn checkpoint_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("checkpoint.msgpack")
    }

    fn frames_file(&self, run_idx: usize, file_idx: usize) -> PathBuf {
        self.run_dir(run_idx)
            .join(format!("frames-{file_idx:04}.msgpack"))
    }

    fn results_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("results.msgpack")
    }

    fn density_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("density.dat")
    }
}

fn save_checkpoint<P: AsRef<Path>>(driver: &Driver, file: P) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    encode::write(&mut writer, driver).context("failed to serialize driver")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Driver> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let mut reader = BufReader::new(file);
    let driver = decode::from_read(&mut reader).context("failed to deserialize driver")?;
    Ok(driver)
}

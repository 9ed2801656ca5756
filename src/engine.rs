use crate::model::Population;
use rand::prelude::*;
use rand_distr::Uniform;
use thiserror::Error;

/// Errors raised by the contact process and the trial driver.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("density requested before any trial has completed")]
    EmptySample,

    #[error("trial exceeded the limit of {max_steps} contact steps")]
    StepLimit { max_steps: u64 },
}

/// Result of a single completed trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    /// Fraction of the population that never heard the rumour.
    pub frac_sus: f64,
    /// Number of contact steps performed.
    pub n_steps: u64,
}

/// Check that `n_nodes` and `n_inf_init` describe a valid initial condition.
pub fn check_params(n_nodes: usize, n_inf_init: usize) -> Result<(), SimError> {
    if n_nodes < 2 {
        return Err(SimError::InvalidConfig(format!(
            "number of nodes must be at least 2, but is {n_nodes}"
        )));
    }
    if n_inf_init < 1 || n_inf_init >= n_nodes {
        return Err(SimError::InvalidConfig(format!(
            "initial number of infectives must be in the range 1..{n_nodes}, but is {n_inf_init}"
        )));
    }
    Ok(())
}

/// Run one trial of the rumour process and return its outcome.
///
/// The first `n_inf_init` individuals start infective. At every step a
/// caller and a receiver are drawn uniformly with replacement, so a caller
/// may contact itself (and is then removed). The trial stops as soon as
/// there are no infectives or no susceptibles left.
///
/// # Errors
/// Returns [`SimError::InvalidConfig`] before touching any state if the
/// parameters are invalid, and [`SimError::StepLimit`] if the trial has not
/// terminated after `max_steps` contacts.
pub fn simulate<R: Rng + ?Sized>(
    n_nodes: usize,
    n_inf_init: usize,
    max_steps: u64,
    rng: &mut R,
) -> Result<Trial, SimError> {
    check_params(n_nodes, n_inf_init)?;
    if max_steps == 0 {
        return Err(SimError::InvalidConfig(
            "maximum number of steps must be positive".to_string(),
        ));
    }

    let node_dist = Uniform::new(0, n_nodes)
        .map_err(|err| SimError::InvalidConfig(format!("invalid node range: {err}")))?;
    let mut pop = Population::new(n_nodes, n_inf_init);

    let mut n_steps = 0;
    while pop.is_live() {
        if n_steps == max_steps {
            return Err(SimError::StepLimit { max_steps });
        }
        let u = node_dist.sample(rng);
        let v = node_dist.sample(rng);
        pop.contact(u, v);
        n_steps += 1;
    }

    let (n_sus, n_inf, n_rem) = pop.counts();
    log::trace!("final counts: {n_sus} susceptible, {n_inf} infective, {n_rem} removed");

    Ok(Trial {
        frac_sus: pop.frac_sus(),
        n_steps,
    })
}

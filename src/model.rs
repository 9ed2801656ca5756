//! Population data types.

use serde::{Deserialize, Serialize};

/// State of a single individual with respect to the rumour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Has never heard the rumour.
    Susceptible,
    /// Knows the rumour and is still spreading it.
    Infective,
    /// Knows the rumour but has stopped spreading it.
    Removed,
}

/// Population of a single trial.
///
/// Keeps the status of every individual together with the number of
/// individuals in each status, so the termination check is constant time.
#[derive(Debug, Clone)]
pub struct Population {
    status_vec: Vec<Status>,
    n_sus: usize,
    n_inf: usize,
    n_rem: usize,
}

impl Population {
    /// Create a population of `n_nodes` individuals where the first
    /// `n_inf_init` are infective and the rest susceptible.
    ///
    /// The caller is responsible for `0 < n_inf_init < n_nodes`.
    pub fn new(n_nodes: usize, n_inf_init: usize) -> Self {
        let mut status_vec = vec![Status::Susceptible; n_nodes];
        status_vec[..n_inf_init].fill(Status::Infective);
        Self {
            status_vec,
            n_sus: n_nodes - n_inf_init,
            n_inf: n_inf_init,
            n_rem: 0,
        }
    }

    /// Apply the contact rule to caller `u` and receiver `v`.
    ///
    /// Only an infective caller has an effect: a susceptible receiver becomes
    /// infective, anyone else makes the caller lose interest.
    pub fn contact(&mut self, u: usize, v: usize) {
        if self.status_vec[u] != Status::Infective {
            return;
        }
        if self.status_vec[v] == Status::Susceptible {
            self.status_vec[v] = Status::Infective;
            self.n_sus -= 1;
            self.n_inf += 1;
        } else {
            self.status_vec[u] = Status::Removed;
            self.n_inf -= 1;
            self.n_rem += 1;
        }
    }

    /// Whether the trial is still running.
    pub fn is_live(&self) -> bool {
        self.n_inf > 0 && self.n_sus > 0
    }

    /// Fraction of the population that is still susceptible.
    pub fn frac_sus(&self) -> f64 {
        self.n_sus as f64 / self.n_nodes() as f64
    }

    pub fn n_nodes(&self) -> usize {
        self.status_vec.len()
    }

    #[cfg(test)]
    pub fn status(&self, i_node: usize) -> Status {
        self.status_vec[i_node]
    }

    /// Number of susceptible, infective and removed individuals.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.n_sus, self.n_inf, self.n_rem)
    }
}

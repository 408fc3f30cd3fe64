//! Options for walking a graph

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a walk is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One node at a time on the caller's thread
    Sequential,
    /// Every eligible node dispatched immediately
    Unbounded,
    /// At most this many callbacks in flight
    Bounded(usize),
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Sequential => write!(f, "sequential"),
            Strategy::Unbounded => write!(f, "unbounded"),
            Strategy::Bounded(jobs) => write!(f, "{jobs} jobs"),
        }
    }
}

/// Options for walking a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    /// Concurrency: `0` unbounded, `1` sequential, `N` at most N at once
    #[serde(alias = "concurrency")]
    pub jobs: usize,
}

impl WalkOptions {
    /// Options with the given job count
    pub fn with_jobs(jobs: usize) -> Self {
        Self { jobs }
    }

    /// The scheduling strategy these options select
    pub fn strategy(&self) -> Strategy {
        match self.jobs {
            0 => Strategy::Unbounded,
            1 => Strategy::Sequential,
            n => Strategy::Bounded(n),
        }
    }
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self { jobs: 4 }
    }
}

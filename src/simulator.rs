use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheTrait, GenericCache};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::stats::CacheStats;

/// A single decoded memory access
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Access {
    Read { address: u32 },
    Write { address: u32, value: u32 },
}

/// The simulator replays already decoded accesses against a configured cache and collects
/// results.
///
/// It supports calling simulate multiple times, and will update the time taken to simulate and the
/// results accordingly
#[derive(Debug)]
pub struct Simulator {
    cache: GenericCache,
    result: SimulationResult,
    simulation_time: Duration,
}

/// The result of a simulation. Can be serialised to JSON
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct SimulationResult {
    pub name: String,
    pub stats: CacheStats,
    pub invalid_lines: usize,
}

impl Simulator {
    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A cache configuration, usually resulting from parsing JSON
    ///
    /// returns: Result<Simulator, CacheError>
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let cache = config.build()?;
        let result = SimulationResult {
            name: config.name.clone(),
            stats: CacheStats::default(),
            invalid_lines: cache.invalid_line_count(),
        };
        Ok(Self {
            cache,
            result,
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Replays a stream of accesses in order
    ///
    /// Statistics accumulate across calls. The first access the cache rejects stops the replay
    /// with that error; accesses before it stay counted
    ///
    /// # Arguments
    ///
    /// * `accesses`: The accesses to perform
    ///
    /// returns: Result<&SimulationResult, CacheError>
    pub fn simulate<I>(&mut self, accesses: I) -> Result<&SimulationResult, CacheError>
    where
        I: IntoIterator<Item = Access>,
    {
        let start = Instant::now();
        let outcome = self.replay(accesses);
        self.simulation_time += start.elapsed();
        self.result.stats = *self.cache.stats();
        self.result.invalid_lines = self.cache.invalid_line_count();
        outcome?;
        debug!(
            "simulated {} accesses for {} in {:?}",
            self.result.stats.accesses(),
            self.result.name,
            self.simulation_time
        );
        Ok(&self.result)
    }

    fn replay<I>(&mut self, accesses: I) -> Result<(), CacheError>
    where
        I: IntoIterator<Item = Access>,
    {
        for access in accesses {
            match access {
                Access::Read { address } => {
                    self.cache.read(address)?;
                }
                Access::Write { address, value } => {
                    self.cache.write(address, value)?;
                }
            }
        }
        Ok(())
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    pub fn result(&self) -> &SimulationResult {
        &self.result
    }

    pub fn cache(&self) -> &GenericCache {
        &self.cache
    }

    /// Zeroes the statistics of the cache and the collected result, keeping its contents
    pub fn reset_stats(&mut self) {
        self.cache.reset_stats();
        self.result.stats = CacheStats::default();
    }
}

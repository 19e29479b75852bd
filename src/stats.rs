use std::fmt;

use serde::{Deserialize, Serialize};

/// Running access statistics for a cache. Can be serialised alongside simulation results
///
/// Every read is counted as exactly one of a read hit or a read miss, and likewise for writes, so
/// `reads == read_hits + read_misses` and `writes == write_hits + write_misses` always hold
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    reads: u64,
    writes: u64,
    read_hits: u64,
    read_misses: u64,
    write_hits: u64,
    write_misses: u64,
}

impl CacheStats {
    pub fn record_read(&mut self, hit: bool) {
        self.reads += 1;
        if hit {
            self.read_hits += 1;
        } else {
            self.read_misses += 1;
        }
    }

    pub fn record_write(&mut self, hit: bool) {
        self.writes += 1;
        if hit {
            self.write_hits += 1;
        } else {
            self.write_misses += 1;
        }
    }

    /// Zeroes every counter
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn read_hits(&self) -> u64 {
        self.read_hits
    }

    pub fn read_misses(&self) -> u64 {
        self.read_misses
    }

    pub fn write_hits(&self) -> u64 {
        self.write_hits
    }

    pub fn write_misses(&self) -> u64 {
        self.write_misses
    }

    pub fn accesses(&self) -> u64 {
        self.reads + self.writes
    }

    pub fn read_hit_rate(&self) -> f64 {
        percentage(self.read_hits, self.reads)
    }

    pub fn read_miss_rate(&self) -> f64 {
        percentage(self.read_misses, self.reads)
    }

    pub fn write_hit_rate(&self) -> f64 {
        percentage(self.write_hits, self.writes)
    }

    pub fn write_miss_rate(&self) -> f64 {
        percentage(self.write_misses, self.writes)
    }

    pub fn overall_hit_rate(&self) -> f64 {
        percentage(self.read_hits + self.write_hits, self.accesses())
    }

    pub fn overall_miss_rate(&self) -> f64 {
        percentage(self.read_misses + self.write_misses, self.accesses())
    }
}

/// `part` as a percentage of `total`, or 0 when nothing has been counted yet
fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reads: {} ({} hits, {} misses, {:.2}% hit rate)", self.reads, self.read_hits, self.read_misses, self.read_hit_rate())?;
        writeln!(f, "Writes: {} ({} hits, {} misses, {:.2}% hit rate)", self.writes, self.write_hits, self.write_misses, self.write_hit_rate())?;
        write!(f, "Overall: {:.2}% hits, {:.2}% misses", self.overall_hit_rate(), self.overall_miss_rate())
    }
}

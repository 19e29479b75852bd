use serde::Deserialize;

use crate::cache::{GenericCache, SetAssociativeCache};
use crate::error::CacheError;
use crate::geometry::check_power_of_two;
use crate::replacement_policies::{CounterScanLru, LeastRecentlyUsed};

/// A configuration for a single cache
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub name: String,
    pub size: u32,
    pub line_size: u32,
    pub kind: CacheKindConfig,
    #[serde(default = "ReplacementPolicyConfig::default")]
    pub replacement_policy: ReplacementPolicyConfig,
}

/// The kind of cache - direct, full, 2way, 4way, or 8way
#[derive(Debug, Copy, Clone, Deserialize)]
pub enum CacheKindConfig {
    #[serde(alias = "direct")]
    Direct,
    #[serde(alias = "full")]
    Full,
    #[serde(alias = "2way")]
    TwoWay,
    #[serde(alias = "4way")]
    FourWay,
    #[serde(alias = "8way")]
    EightWay,
}

/// The replacement policy - lru, or counter_scan_lru. Defaults to lru.
#[derive(Debug, Copy, Clone, Default, Deserialize)]
pub enum ReplacementPolicyConfig {
    #[default]
    #[serde(alias = "lru")]
    LeastRecentlyUsed,
    #[serde(alias = "counter_scan_lru")]
    CounterScanLru,
}

impl CacheConfig {
    /// Parses a configuration from JSON
    ///
    /// # Examples
    ///
    /// ```
    /// use setassoc::config::CacheConfig;
    /// let config = CacheConfig::from_json(r#"{"name": "L1", "size": 1024, "line_size": 64, "kind": "2way"}"#).unwrap();
    /// assert_eq!(config.associativity(), 2);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The number of ways per set this configuration describes
    ///
    /// A fully associative cache has one set holding every line. Should the line size not divide
    /// the cache size this yields a value the geometry check rejects
    pub fn associativity(&self) -> u32 {
        match self.kind {
            CacheKindConfig::Direct => 1,
            CacheKindConfig::Full => self.size.checked_div(self.line_size).unwrap_or(0),
            CacheKindConfig::TwoWay => 2,
            CacheKindConfig::FourWay => 4,
            CacheKindConfig::EightWay => 8,
        }
    }

    /// Creates a new cache from this configuration
    ///
    /// A fully associative cache derives its way count from the line size, so a bad line size is
    /// reported against the line size rather than the derived associativity
    pub fn build(&self) -> Result<GenericCache, CacheError> {
        if let CacheKindConfig::Full = self.kind {
            check_power_of_two("block size", self.line_size)?;
            if self.line_size > self.size {
                return Err(CacheError::TooFewLines { cache_size: self.size, associativity: 1, block_size: self.line_size });
            }
        }
        let ways = self.associativity();
        Ok(match self.replacement_policy {
            ReplacementPolicyConfig::LeastRecentlyUsed => {
                GenericCache::from(SetAssociativeCache::with_policy(self.size, ways, self.line_size, LeastRecentlyUsed)?)
            }
            ReplacementPolicyConfig::CounterScanLru => {
                GenericCache::from(SetAssociativeCache::with_policy(self.size, ways, self.line_size, CounterScanLru)?)
            }
        })
    }
}

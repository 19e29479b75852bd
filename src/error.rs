use thiserror::Error;

/// Everything that can go wrong when configuring or driving a cache
///
/// Hits and misses are both successful outcomes; errors only arise from bad parameters or from
/// touching a cache that has no storage
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("{parameter} must be non-zero")]
    ZeroParameter { parameter: &'static str },

    #[error("{parameter} must be a power of two, got {value}")]
    NotPowerOfTwo { parameter: &'static str, value: u32 },

    #[error("block size of {block_size} bytes cannot hold a {word_size} byte word")]
    BlockSmallerThanWord { block_size: u32, word_size: u32 },

    #[error("cache of {cache_size} bytes cannot hold {associativity} ways of {block_size} byte blocks")]
    TooFewLines {
        cache_size: u32,
        associativity: u32,
        block_size: u32,
    },

    #[error("cache storage has not been created")]
    Uninitialized,

    #[error("couldn't parse the cache configuration: {0}")]
    Config(#[from] serde_json::Error),
}

use log::{debug, info, trace, warn};

use crate::error::CacheError;
use crate::geometry::{AddressFields, CacheGeometry};
use crate::replacement_policies::{CounterScanLru, LeastRecentlyUsed, ReplacementPolicy};
use crate::stats::CacheStats;

/// A generic trait for caches
///
/// Lets callers drive any policy instantiation through one interface. [`GenericCache`] implements
/// it with explicit branches so the concrete caches can still be inlined
pub trait CacheTrait {
    /// Splits an address using the cache's current geometry
    fn address_fields(&self, addr: u32) -> Result<AddressFields, CacheError>;

    /// Reads the word at `addr`, updating recency and statistics on both hits and misses
    fn read(&mut self, addr: u32) -> Result<ReadOutcome, CacheError>;

    /// Writes `value` to the word at `addr`, returning true on a hit
    fn write(&mut self, addr: u32, value: u32) -> Result<bool, CacheError>;

    fn stats(&self) -> &CacheStats;

    fn reset_stats(&mut self);

    /// Gets the line size used by this cache
    fn block_size(&self) -> u32;

    /// Gets the number of lines not holding a block. Useful for analysing cache performance or
    /// debugging
    fn invalid_line_count(&self) -> usize;
}

/// Result of a read. A miss carries no value, as nothing behind the cache is simulated
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReadOutcome {
    Hit(u32),
    Miss,
}

impl ReadOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, ReadOutcome::Hit(_))
    }

    /// The word read, only available on a hit
    pub fn value(&self) -> Option<u32> {
        match self {
            ReadOutcome::Hit(value) => Some(*value),
            ReadOutcome::Miss => None,
        }
    }
}

/// A single way of a set. The data buffer is allocated once with the cache storage and reused for
/// every block the line holds
#[derive(Debug, Clone)]
pub struct CacheLine {
    pub(crate) tag: u32,
    pub(crate) data: Box<[u32]>,
    pub(crate) valid: bool,
    pub(crate) lru_counter: u32,
}

impl CacheLine {
    pub(crate) fn new(words: usize) -> Self {
        Self {
            tag: 0,
            data: vec![0; words].into_boxed_slice(),
            valid: false,
            lru_counter: 0,
        }
    }

    /// Returns the line to its freshly allocated state, keeping the buffer
    fn invalidate(&mut self) {
        self.tag = 0;
        self.valid = false;
        self.lru_counter = 0;
        self.data.fill(0);
    }

    /// The resident tag. Meaningless unless the line is valid
    pub fn tag(&self) -> u32 {
        self.tag
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// 0 is most recently used, larger is staler. Only meaningful for valid lines
    pub fn lru_counter(&self) -> u32 {
        self.lru_counter
    }
}

/// A set-associative cache of 32-bit words, parameterised by a replacement policy
///
/// Lines live in one flat vector, with set `s` occupying `s * associativity..(s + 1) *
/// associativity`, so a lookup only scans the ways of the target set.
///
/// A cache is either uninitialised, with no geometry or storage, or initialised from validated
/// base parameters. `Default` gives an uninitialised cache; reads and writes on it fail with
/// [`CacheError::Uninitialized`] until [`Self::create_cache`] succeeds. Changing a base parameter
/// releases the storage, so the cache never runs with derived parameters that are out of date.
///
/// Statistics survive [`Self::clear_cache`] and resizing; only [`Self::reset_stats`] zeroes them
#[derive(Debug, Default)]
pub struct SetAssociativeCache<R: ReplacementPolicy = LeastRecentlyUsed> {
    cache_size: u32,
    associativity: u32,
    block_size: u32,
    geometry: Option<CacheGeometry>,
    lines: Vec<CacheLine>,
    policy: R,
    stats: CacheStats,
}

impl SetAssociativeCache {
    /// Creates a cache using [`LeastRecentlyUsed`] replacement
    ///
    /// # Arguments
    ///
    /// * `cache_size`: Total capacity in bytes, a power of two
    /// * `associativity`: Ways per set, a power of two
    /// * `block_size`: Bytes per line, a power of two of at least one word
    ///
    /// returns: Result<SetAssociativeCache, CacheError>
    ///
    /// # Examples
    ///
    /// ```
    /// use setassoc::cache::{ReadOutcome, SetAssociativeCache};
    /// let mut cache = SetAssociativeCache::new(1024, 2, 64).unwrap();
    /// assert!(!cache.write(0x40, 7).unwrap());
    /// assert_eq!(cache.read(0x40).unwrap(), ReadOutcome::Hit(7));
    /// ```
    pub fn new(cache_size: u32, associativity: u32, block_size: u32) -> Result<Self, CacheError> {
        Self::with_policy(cache_size, associativity, block_size, LeastRecentlyUsed)
    }
}

impl<R: ReplacementPolicy> SetAssociativeCache<R> {
    /// Creates a cache with an explicit replacement policy
    pub fn with_policy(cache_size: u32, associativity: u32, block_size: u32, policy: R) -> Result<Self, CacheError> {
        let mut cache = Self {
            cache_size,
            associativity,
            block_size,
            geometry: None,
            lines: Vec::new(),
            policy,
            stats: CacheStats::default(),
        };
        cache.create_cache()?;
        Ok(cache)
    }

    pub fn set_cache_size(&mut self, cache_size: u32) {
        self.cache_size = cache_size;
        self.clear_cache();
    }

    pub fn set_associativity(&mut self, associativity: u32) {
        self.associativity = associativity;
        self.clear_cache();
    }

    pub fn set_block_size(&mut self, block_size: u32) {
        self.block_size = block_size;
        self.clear_cache();
    }

    pub fn cache_size(&self) -> u32 {
        self.cache_size
    }

    pub fn associativity(&self) -> u32 {
        self.associativity
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// The validated geometry, if storage currently exists
    pub fn geometry(&self) -> Option<&CacheGeometry> {
        self.geometry.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.geometry.is_some()
    }

    /// Validates the base parameters, derives the addressing parameters and allocates every line
    /// invalid and zero-filled. Any existing storage is released first, so on failure the cache is
    /// left uninitialised
    pub fn create_cache(&mut self) -> Result<(), CacheError> {
        self.clear_cache();
        let geometry = CacheGeometry::new(self.cache_size, self.associativity, self.block_size).map_err(|e| {
            warn!("rejected cache parameters: {e}");
            e
        })?;
        let words = geometry.words_per_block();
        self.lines = (0..geometry.line_count()).map(|_| CacheLine::new(words)).collect();
        info!(
            "created cache: {} bytes, {} sets of {} ways, {} byte blocks ({} tag, {} index, {} offset bits)",
            geometry.cache_size(),
            geometry.num_sets(),
            geometry.associativity(),
            geometry.block_size(),
            geometry.tag_bits(),
            geometry.index_bits(),
            geometry.offset_bits()
        );
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Releases every line and its buffer. The cache is uninitialised afterwards
    pub fn clear_cache(&mut self) {
        if self.geometry.take().is_some() {
            info!("released cache storage of {} lines", self.lines.len());
        }
        self.lines = Vec::new();
    }

    /// Replaces all three base parameters and rebuilds the storage
    pub fn resize(&mut self, cache_size: u32, associativity: u32, block_size: u32) -> Result<(), CacheError> {
        self.cache_size = cache_size;
        self.associativity = associativity;
        self.block_size = block_size;
        self.create_cache()
    }

    /// Marks every line invalid and zeroes its data, keeping the storage allocated
    pub fn invalidate_all(&mut self) {
        self.lines.iter_mut().for_each(CacheLine::invalidate);
        debug!("invalidated {} lines", self.lines.len());
    }

    /// Reads the word at `addr`
    ///
    /// On a hit the word is returned and the line becomes most recently used. On a miss a victim
    /// chosen by the policy is refilled with the new tag and zeroed data, and no value is produced
    pub fn read(&mut self, addr: u32) -> Result<ReadOutcome, CacheError> {
        let geometry = self.geometry.ok_or(CacheError::Uninitialized)?;
        let fields = geometry.decompose(addr);
        let set = set_of(&mut self.lines, &geometry, fields.set_index);
        let outcome = match find_way(set, fields.tag) {
            Some(way) => {
                let value = set[way].data[fields.word_offset as usize];
                self.policy.touch(set, way);
                trace!("read hit {addr:#010x} in set {} way {way}", fields.set_index);
                ReadOutcome::Hit(value)
            }
            None => {
                let way = fill(&mut self.policy, set, fields.tag);
                trace!("read miss {addr:#010x}, filled set {} way {way}", fields.set_index);
                ReadOutcome::Miss
            }
        };
        self.stats.record_read(outcome.is_hit());
        Ok(outcome)
    }

    /// Writes `value` to the word at `addr`, returning true on a hit
    ///
    /// On a miss the block is allocated in a victim way first, then written
    pub fn write(&mut self, addr: u32, value: u32) -> Result<bool, CacheError> {
        let geometry = self.geometry.ok_or(CacheError::Uninitialized)?;
        let fields = geometry.decompose(addr);
        let set = set_of(&mut self.lines, &geometry, fields.set_index);
        let (way, hit) = match find_way(set, fields.tag) {
            Some(way) => {
                self.policy.touch(set, way);
                (way, true)
            }
            None => (fill(&mut self.policy, set, fields.tag), false),
        };
        set[way].data[fields.word_offset as usize] = value;
        trace!(
            "write {} {addr:#010x} in set {} way {way}",
            if hit { "hit" } else { "miss" },
            fields.set_index
        );
        self.stats.record_write(hit);
        Ok(hit)
    }

    /// The ways of one set, or `None` if the cache is uninitialised or the set doesn't exist
    pub fn set_lines(&self, set_index: u32) -> Option<&[CacheLine]> {
        let geometry = self.geometry.as_ref()?;
        if set_index >= geometry.num_sets() {
            return None;
        }
        let ways = geometry.associativity() as usize;
        let start = set_index as usize * ways;
        Some(&self.lines[start..start + ways])
    }

    pub fn valid_line_count(&self) -> usize {
        self.lines.iter().filter(|line| line.valid).count()
    }

    pub fn invalid_line_count(&self) -> usize {
        self.lines.len() - self.valid_line_count()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        debug!("resetting statistics after {} accesses", self.stats.accesses());
        self.stats.reset();
    }

    pub fn read_hits(&self) -> u64 {
        self.stats.read_hits()
    }

    pub fn read_misses(&self) -> u64 {
        self.stats.read_misses()
    }

    pub fn write_hits(&self) -> u64 {
        self.stats.write_hits()
    }

    pub fn write_misses(&self) -> u64 {
        self.stats.write_misses()
    }

    pub fn read_hit_rate(&self) -> f64 {
        self.stats.read_hit_rate()
    }

    pub fn read_miss_rate(&self) -> f64 {
        self.stats.read_miss_rate()
    }

    pub fn write_hit_rate(&self) -> f64 {
        self.stats.write_hit_rate()
    }

    pub fn write_miss_rate(&self) -> f64 {
        self.stats.write_miss_rate()
    }

    pub fn overall_hit_rate(&self) -> f64 {
        self.stats.overall_hit_rate()
    }

    pub fn overall_miss_rate(&self) -> f64 {
        self.stats.overall_miss_rate()
    }
}

fn set_of<'a>(lines: &'a mut [CacheLine], geometry: &CacheGeometry, set_index: u32) -> &'a mut [CacheLine] {
    let ways = geometry.associativity() as usize;
    let start = set_index as usize * ways;
    &mut lines[start..start + ways]
}

fn find_way(set: &[CacheLine], tag: u32) -> Option<usize> {
    set.iter().position(|line| line.valid && line.tag == tag)
}

/// Installs `tag` in the way the policy gives up, returning that way
fn fill<R: ReplacementPolicy>(policy: &mut R, set: &mut [CacheLine], tag: u32) -> usize {
    let way = policy.victim(set);
    let line = &mut set[way];
    if line.valid {
        trace!("evicting tag {:#x} from way {way}", line.tag);
    }
    line.tag = tag;
    line.valid = true;
    line.data.fill(0);
    policy.touch(set, way);
    way
}

impl<R: ReplacementPolicy> CacheTrait for SetAssociativeCache<R> {
    fn address_fields(&self, addr: u32) -> Result<AddressFields, CacheError> {
        self.geometry.map(|geometry| geometry.decompose(addr)).ok_or(CacheError::Uninitialized)
    }

    fn read(&mut self, addr: u32) -> Result<ReadOutcome, CacheError> {
        Self::read(self, addr)
    }

    fn write(&mut self, addr: u32, value: u32) -> Result<bool, CacheError> {
        Self::write(self, addr, value)
    }

    fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn reset_stats(&mut self) {
        Self::reset_stats(self)
    }

    fn block_size(&self) -> u32 {
        self.block_size
    }

    fn invalid_line_count(&self) -> usize {
        Self::invalid_line_count(self)
    }
}

/// Enum for the cache instantiations the library can build from a configuration
///
/// Using trait objects would be less boilerplate, but explicitly branching on each
/// implementation lets the compiler see the concrete types and inline the policy
#[derive(Debug)]
pub enum GenericCache {
    LeastRecentlyUsed(SetAssociativeCache<LeastRecentlyUsed>),
    CounterScanLru(SetAssociativeCache<CounterScanLru>),
}

impl From<SetAssociativeCache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: SetAssociativeCache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<SetAssociativeCache<CounterScanLru>> for GenericCache {
    fn from(value: SetAssociativeCache<CounterScanLru>) -> Self {
        Self::CounterScanLru(value)
    }
}

impl CacheTrait for GenericCache {
    fn address_fields(&self, addr: u32) -> Result<AddressFields, CacheError> {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.address_fields(addr),
            GenericCache::CounterScanLru(c) => c.address_fields(addr),
        }
    }

    fn read(&mut self, addr: u32) -> Result<ReadOutcome, CacheError> {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.read(addr),
            GenericCache::CounterScanLru(c) => c.read(addr),
        }
    }

    fn write(&mut self, addr: u32, value: u32) -> Result<bool, CacheError> {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.write(addr, value),
            GenericCache::CounterScanLru(c) => c.write(addr, value),
        }
    }

    fn stats(&self) -> &CacheStats {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.stats(),
            GenericCache::CounterScanLru(c) => c.stats(),
        }
    }

    fn reset_stats(&mut self) {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.reset_stats(),
            GenericCache::CounterScanLru(c) => c.reset_stats(),
        }
    }

    fn block_size(&self) -> u32 {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.block_size(),
            GenericCache::CounterScanLru(c) => c.block_size(),
        }
    }

    fn invalid_line_count(&self) -> usize {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.invalid_line_count(),
            GenericCache::CounterScanLru(c) => c.invalid_line_count(),
        }
    }
}

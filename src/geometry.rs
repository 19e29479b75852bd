use crate::error::CacheError;

/// Size of a machine word in bytes. Blocks are addressed in whole words
pub const WORD_SIZE: u32 = 4;

/// Width of every simulated address in bits
pub const ADDRESS_WIDTH: u32 = 32;

/// The fields an address splits into for a given geometry
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AddressFields {
    pub tag: u32,
    pub set_index: u32,
    pub word_offset: u32,
}

/// Validated base parameters of a cache together with the parameters derived from them
///
/// A geometry can only be obtained through [`CacheGeometry::new`], so holding one means the base
/// parameters are non-zero powers of two and `num_sets * associativity * block_size == cache_size`
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CacheGeometry {
    cache_size: u32,
    associativity: u32,
    block_size: u32,
    num_sets: u32,
    index_bits: u32,
    offset_bits: u32,
    tag_bits: u32,
}

impl CacheGeometry {
    /// Validates the base parameters and computes the derived ones
    ///
    /// # Arguments
    ///
    /// * `cache_size`: Total capacity in bytes
    /// * `associativity`: Number of ways per set
    /// * `block_size`: Bytes per line, at least one word
    ///
    /// returns: Result<CacheGeometry, CacheError>
    pub fn new(cache_size: u32, associativity: u32, block_size: u32) -> Result<Self, CacheError> {
        check_power_of_two("cache size", cache_size)?;
        check_power_of_two("associativity", associativity)?;
        check_power_of_two("block size", block_size)?;
        if block_size < WORD_SIZE {
            return Err(CacheError::BlockSmallerThanWord { block_size, word_size: WORD_SIZE });
        }
        // Widened so huge associativities can't wrap around
        let set_bytes = block_size as u64 * associativity as u64;
        if set_bytes > cache_size as u64 {
            return Err(CacheError::TooFewLines { cache_size, associativity, block_size });
        }
        // Everything is a power of two, so the division is exact and the logs are trailing zeros
        let num_sets = (cache_size as u64 / set_bytes) as u32;
        let index_bits = num_sets.trailing_zeros();
        let offset_bits = block_size.trailing_zeros();
        Ok(Self {
            cache_size,
            associativity,
            block_size,
            num_sets,
            index_bits,
            offset_bits,
            tag_bits: ADDRESS_WIDTH - index_bits - offset_bits,
        })
    }

    /// Splits an address into its tag, set index and word offset
    pub fn decompose(&self, addr: u32) -> AddressFields {
        AddressFields {
            tag: addr >> (self.index_bits + self.offset_bits),
            set_index: (addr >> self.offset_bits) & (self.num_sets - 1),
            word_offset: (addr & (self.block_size - 1)) / WORD_SIZE,
        }
    }

    /// Builds the word-aligned address for a set of fields. Inverse of [`Self::decompose`] for
    /// fields that fit their bit widths
    pub fn compose(&self, tag: u32, set_index: u32, word_offset: u32) -> u32 {
        let set_index = set_index & (self.num_sets - 1);
        let byte_offset = word_offset.wrapping_mul(WORD_SIZE) & (self.block_size - 1);
        (tag << (self.index_bits + self.offset_bits)) | (set_index << self.offset_bits) | byte_offset
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

    pub fn num_sets(&self) -> u32 {
        self.num_sets
    }

    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    pub fn tag_bits(&self) -> u32 {
        self.tag_bits
    }

    /// Number of words held by a single line
    pub fn words_per_block(&self) -> usize {
        (self.block_size / WORD_SIZE) as usize
    }

    /// Total number of lines across every set
    pub fn line_count(&self) -> usize {
        self.num_sets as usize * self.associativity as usize
    }
}

pub(crate) fn check_power_of_two(parameter: &'static str, value: u32) -> Result<(), CacheError> {
    if value == 0 {
        Err(CacheError::ZeroParameter { parameter })
    } else if !value.is_power_of_two() {
        Err(CacheError::NotPowerOfTwo { parameter, value })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn derives_reference_parameters() {
        let geometry = CacheGeometry::new(1024, 2, 64).unwrap();
        assert_eq!(geometry.num_sets(), 8);
        assert_eq!(geometry.offset_bits(), 6);
        assert_eq!(geometry.index_bits(), 3);
        assert_eq!(geometry.tag_bits(), 23);
        assert_eq!(geometry.words_per_block(), 16);
        assert_eq!(geometry.line_count(), 16);
    }

    #[test]
    fn sets_ways_and_blocks_cover_the_cache() {
        for cache_shift in 2..=20u32 {
            for way_shift in 0..=cache_shift {
                for block_shift in 2..=cache_shift - way_shift {
                    let (size, ways, block) = (1 << cache_shift, 1 << way_shift, 1 << block_shift);
                    let geometry = CacheGeometry::new(size, ways, block).unwrap();
                    assert_eq!(geometry.num_sets() * ways * block, size);
                    assert_eq!(geometry.index_bits() + geometry.offset_bits() + geometry.tag_bits(), ADDRESS_WIDTH);
                }
            }
        }
    }

    #[test]
    fn splits_addresses() {
        let geometry = CacheGeometry::new(1024, 2, 64).unwrap();
        let low = geometry.decompose(0x0000_0000);
        let high = geometry.decompose(0x0000_0200);
        assert_eq!(low.set_index, 0);
        assert_eq!(high.set_index, 0);
        assert_ne!(low.tag, high.tag);
        assert_eq!(high.tag, 1);

        let fields = geometry.decompose(0xDEAD_BEEF);
        assert_eq!(fields.tag, 0xDEAD_BEEF >> 9);
        assert_eq!(fields.set_index, (0xDEAD_BEEF >> 6) & 7);
        assert_eq!(fields.word_offset, (0xDEAD_BEEF & 63) / 4);
        assert_eq!(geometry.compose(fields.tag, fields.set_index, fields.word_offset), 0xDEAD_BEEC);
    }

    #[test]
    fn rejects_zero_parameters() {
        assert!(matches!(
            CacheGeometry::new(0, 1, 4),
            Err(CacheError::ZeroParameter { parameter: "cache size" })
        ));
        assert!(matches!(
            CacheGeometry::new(64, 0, 4),
            Err(CacheError::ZeroParameter { parameter: "associativity" })
        ));
        assert!(matches!(
            CacheGeometry::new(64, 1, 0),
            Err(CacheError::ZeroParameter { parameter: "block size" })
        ));
    }

    #[test]
    fn rejects_non_powers_of_two() {
        assert!(matches!(
            CacheGeometry::new(1000, 2, 64),
            Err(CacheError::NotPowerOfTwo { value: 1000, .. })
        ));
        assert!(matches!(
            CacheGeometry::new(1024, 3, 64),
            Err(CacheError::NotPowerOfTwo { value: 3, .. })
        ));
        assert!(matches!(
            CacheGeometry::new(1024, 2, 48),
            Err(CacheError::NotPowerOfTwo { value: 48, .. })
        ));
    }

    #[test]
    fn rejects_blocks_that_do_not_fit() {
        assert!(matches!(
            CacheGeometry::new(1024, 2, 2),
            Err(CacheError::BlockSmallerThanWord { block_size: 2, .. })
        ));
        assert!(matches!(
            CacheGeometry::new(64, 4, 32),
            Err(CacheError::TooFewLines { .. })
        ));
        assert!(matches!(
            CacheGeometry::new(64, 1 << 31, 1 << 31),
            Err(CacheError::TooFewLines { .. })
        ));
    }
}

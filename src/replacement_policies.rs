use log::trace;

use crate::cache::CacheLine;

/// A generic trait for implementing replacement policies. Can be used to parameterise a
/// [`SetAssociativeCache`](crate::cache::SetAssociativeCache).
///
/// Policies see one set at a time, as a slice of its ways. Recency lives in each line's
/// `lru_counter`, so a policy needs no storage of its own sized to the cache
pub trait ReplacementPolicy {
    /// Updates recency after a hit or a fill of `way`
    ///
    /// The default resets the touched line's counter to 0 and ages every other valid line in the
    /// set by one. The line with the largest counter among valid lines is then the least recently
    /// used, though two lines can tie
    ///
    /// # Arguments
    ///
    /// * `set`: The ways of the set that was accessed
    /// * `way`: The way that was just hit or filled
    ///
    /// returns: ()
    fn touch(&mut self, set: &mut [CacheLine], way: usize) {
        for (index, line) in set.iter_mut().enumerate() {
            if index == way {
                line.lru_counter = 0;
            } else if line.valid {
                line.lru_counter = line.lru_counter.saturating_add(1);
            }
        }
    }

    /// Picks the way to refill on a miss
    ///
    /// Implementations should assume the returned way is replaced immediately afterwards
    ///
    /// # Arguments
    ///
    /// * `set`: The ways of the set that missed
    ///
    /// returns: usize
    fn victim(&mut self, set: &[CacheLine]) -> usize;
}

/// Least recently used replacement
///
/// Fills the lowest empty way of the set if there is one. Otherwise evicts the valid line with
/// the largest counter, preferring the lowest way on a tie. This is the default policy
#[derive(Debug, Default, Copy, Clone)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    fn victim(&mut self, set: &[CacheLine]) -> usize {
        match set.iter().position(|line| !line.valid) {
            Some(way) => way,
            None => oldest_valid_way(set),
        }
    }
}

/// Least recently used replacement with no preference for empty ways
///
/// The scan starts from way 0 with a threshold of 0 and only moves to another way when a valid
/// line's counter is strictly greater than the best seen so far. An empty way is therefore only
/// chosen when it is way 0 and no valid line has aged past 0, and a set with empty higher ways
/// can evict a resident line instead. In a cold set every fill lands in way 0 until something
/// else becomes valid, so the set behaves as direct mapped
#[derive(Debug, Default, Copy, Clone)]
pub struct CounterScanLru;

impl ReplacementPolicy for CounterScanLru {
    fn victim(&mut self, set: &[CacheLine]) -> usize {
        oldest_valid_way(set)
    }
}

fn oldest_valid_way(set: &[CacheLine]) -> usize {
    let mut victim = 0;
    let mut max_counter = 0;
    for (way, line) in set.iter().enumerate() {
        if line.valid && line.lru_counter > max_counter {
            max_counter = line.lru_counter;
            victim = way;
        }
    }
    trace!("victim way {victim} with counter {max_counter}");
    victim
}

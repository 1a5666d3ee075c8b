//! Random number source consumed by board generation.

use std::fmt;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Provider of uniformly distributed integers.
pub trait RandomSource: fmt::Debug {
    /// Returns an integer in `low..high_exclusive`, or `low` when the range is empty.
    fn random_int(&mut self, low: u32, high_exclusive: u32) -> u32;
}

impl RandomSource for ChaCha8Rng {
    fn random_int(&mut self, low: u32, high_exclusive: u32) -> u32 {
        if high_exclusive <= low {
            return low;
        }
        self.gen_range(low..high_exclusive)
    }
}

/// Removes and returns a uniformly chosen element, preserving the order of the rest.
pub fn take_random<T, R>(random: &mut R, items: &mut Vec<T>) -> Option<T>
where
    R: RandomSource + ?Sized,
{
    if items.is_empty() {
        return None;
    }
    let len = u32::try_from(items.len()).unwrap_or(u32::MAX);
    let index = random.random_int(0, len) as usize;
    Some(items.remove(index.min(items.len() - 1)))
}

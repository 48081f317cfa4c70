//! Monotonic sequence numbers for correlated requests.

use std::sync::atomic::{AtomicU32, Ordering};

/// Issues sequence numbers in `1..=0x7fff_ffff`, wrapping back to 1. Bit 31
/// is the response flag on the wire and never appears in an issued value.
#[derive(Debug)]
pub(crate) struct Sequence(AtomicU32);

impl Sequence {
    pub(crate) fn new() -> Sequence {
        Sequence(AtomicU32::new(1))
    }

    #[cfg(test)]
    fn starting_at(n: u32) -> Sequence {
        Sequence(AtomicU32::new(n))
    }

    /// Next sequence number. Safe to call from any task; each caller gets a
    /// distinct value until the 2^31 - 1 window wraps.
    pub(crate) fn next(&self) -> u32 {
        let step = |n: u32| Some(if n == 0x7fff_ffff { 1 } else { n + 1 });
        self.0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, step)
            .unwrap_or(1)
    }
}

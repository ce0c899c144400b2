//! Seeded random streams
//!
//! Every batch, scenario or run draws from a stream derived from a base seed
//! and a stream index. Two runs with the same base seed see identical
//! numbers regardless of how batches are scheduled.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Resolve an optional configured seed into a concrete base seed
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => StdRng::from_entropy().gen(),
    }
}

/// Derive the seed of stream `stream` from `base` (splitmix64 finalizer)
pub fn stream_seed(base: u64, stream: u64) -> u64 {
    let mut z = base
        .wrapping_add(stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Random generator for stream `stream` of `base`
pub fn stream_rng(base: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(stream_seed(base, stream))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_are_reproducible() {
        let mut a = stream_rng(42, 7);
        let mut b = stream_rng(42, 7);
        for _ in 0..100 {
            assert_eq!(a.gen::<u64>(), b.gen::<u64>());
        }
    }

    #[test]
    fn test_streams_differ_by_index() {
        assert_ne!(stream_seed(42, 0), stream_seed(42, 1));
        assert_ne!(stream_seed(42, 0), stream_seed(43, 0));
    }

    #[test]
    fn test_configured_seed_is_kept() {
        assert_eq!(resolve_seed(Some(9)), 9);
    }
}

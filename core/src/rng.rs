//! Random Number Generator.
//!
//! A PCG32 generator. Each room's sampling stream is keyed by the room index so that results do not depend on
//! which worker thread processes the room or in what order.

use crate::math::*;
use hexf::hexf32;

/// 32-bit precision value for 1 - epsilon.
pub const ONE_MINUS_EPSILON: Float = hexf32!("0x1.fffffep-1"); // 0.99999994

const PCG32_DEFAULT_STATE: u64 = 0x853c49e6748fea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e39cb94b95bdb;
const PCG32_MULT: u64 = 0x5851f42d4c957f2d;

/// Implements the pseudo-random number generator.
#[derive(Clone, Debug)]
pub struct RNG {
    state: u64,
    inc: u64,
}

impl Default for RNG {
    /// Return a new instance of `RNG` with default state and stream.
    fn default() -> Self {
        Self {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM,
        }
    }
}

impl RNG {
    /// Create a new `RNG` by seeding it with the given starting sequence.
    ///
    /// * `sequence_index` - The starting sequence to seed with.
    pub fn new(sequence_index: u64) -> Self {
        let mut ret = Self { state: 0, inc: 0 };
        ret.set_sequence(sequence_index);
        ret
    }

    /// Create the generator used to sample a room.
    ///
    /// * `room_index` - Index of the room being sampled.
    pub fn for_room(room_index: usize) -> Self {
        Self::new(room_index as u64)
    }

    /// Initialize the random number generator sequence.
    ///
    /// * `init_seq` - The starting sequence to seed with.
    #[inline(always)]
    fn set_sequence(&mut self, init_seq: u64) {
        self.state = 0;
        self.inc = init_seq.wrapping_shl(1) | 1;
        let _ = self.uniform_u32();
        self.state = self.state.wrapping_add(PCG32_DEFAULT_STATE);
        let _ = self.uniform_u32();
    }

    /// Returns a uniformly distributed u32 value.
    #[inline(always)]
    pub fn uniform_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);

        let xor_shifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xor_shifted.rotate_right(rot)
    }

    /// Returns a uniformly distributed value over the half open interval [0.0, 1.0).
    pub fn uniform_float(&mut self) -> Float {
        min(
            self.uniform_u32() as Float * hexf32!("0x1.0p-32") as Float,
            ONE_MINUS_EPSILON,
        )
    }

    /// Returns a uniformly distributed value over the half open interval [low, high).
    ///
    /// * `low`  - Lower bound.
    /// * `high` - Upper bound.
    pub fn uniform_range(&mut self, low: Float, high: Float) -> Float {
        lerp(self.uniform_float(), low, high)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_sequence_produces_same_values() {
        let mut a = RNG::for_room(42);
        let mut b = RNG::for_room(42);
        for _ in 0..1000 {
            assert_eq!(a.uniform_u32(), b.uniform_u32());
        }
    }

    #[test]
    fn different_sequences_diverge() {
        let mut a = RNG::for_room(1);
        let mut b = RNG::for_room(2);
        let same = (0..64).filter(|_| a.uniform_u32() == b.uniform_u32()).count();
        assert!(same < 4);
    }

    proptest! {
        #[test]
        fn uniform_float_is_in_unit_interval(seed in 0u64..10_000) {
            let mut rng = RNG::new(seed);
            for _ in 0..100 {
                let f = rng.uniform_float();
                prop_assert!((0.0..1.0).contains(&f));
            }
        }

        #[test]
        fn uniform_range_is_bounded(seed in 0u64..10_000, low in -100.0f32..0.0, high in 1.0f32..100.0) {
            let mut rng = RNG::new(seed);
            let f = rng.uniform_range(low, high);
            prop_assert!(f >= low - 1e-4 && f <= high + 1e-4);
        }
    }
}

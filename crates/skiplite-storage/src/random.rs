//! Seeded Park–Miller "minimal standard" generator.
//!
//! `seed = seed * 16807 mod (2^31 - 1)`. Cheap, reproducible, and good
//! enough for coin flips when drawing node levels. Any other
//! [`RngCore`] can be injected into the skip list instead.

use rand::{Error as RandError, RngCore, SeedableRng};

const MODULUS: u32 = 2_147_483_647; // 2^31 - 1
const MULTIPLIER: u64 = 16_807; // bits 14, 8, 7, 5, 2, 1, 0
const MAX_SKEW_LOG: u32 = 30;

/// Default seed used when none is configured
pub const DEFAULT_SEED: u32 = 0xdead_beef;

/// Linear congruential generator over `[1, 2^31 - 2]`.
#[derive(Debug, Clone)]
pub struct ParkMiller {
    seed: u32,
}

impl ParkMiller {
    /// Create a generator. Seeds 0 and 2^31-1 are degenerate and replaced by 1.
    pub fn new(seed: u32) -> Self {
        let mut seed = seed & MODULUS;
        if seed == 0 || seed == MODULUS {
            seed = 1;
        }
        Self { seed }
    }

    /// Advance and return the next state
    pub fn next(&mut self) -> u32 {
        let product = self.seed as u64 * MULTIPLIER;
        // product % M == (product >> 31) + (product & M) for M = 2^31 - 1
        let mut seed = ((product >> 31) + (product & MODULUS as u64)) as u32;
        if seed > MODULUS {
            seed -= MODULUS;
        }
        self.seed = seed;
        seed
    }

    /// Value in `[0, n - 1]`
    ///
    /// # Panics
    ///
    /// Panics if `n` is 0.
    pub fn uniform(&mut self, n: u32) -> u32 {
        assert!(n > 0, "uniform range must be non-empty");
        self.next() % n
    }

    /// True roughly once every `n` calls
    ///
    /// # Panics
    ///
    /// Panics if `n` is 0.
    pub fn one_in(&mut self, n: u32) -> bool {
        assert!(n > 0, "one_in needs a positive n");
        self.next() % n == 0
    }

    /// Value in `[0, 2^max_log - 1]`, biased towards small numbers.
    /// `max_log` is capped at 30.
    pub fn skewed(&mut self, max_log: u32) -> u32 {
        let bits = self.uniform(max_log.min(MAX_SKEW_LOG) + 1);
        self.uniform(1 << bits)
    }
}

impl Default for ParkMiller {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

// Raw states are 31 bits wide. rand's samplers expect every bit of a word
// to be uniform, so each word combines two states.
impl RngCore for ParkMiller {
    fn next_u32(&mut self) -> u32 {
        (self.next() << 1) ^ (self.next() >> 15)
    }

    fn next_u64(&mut self) -> u64 {
        ((self.next_u32() as u64) << 32) | self.next_u32() as u64
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for ParkMiller {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

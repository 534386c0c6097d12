//! Bloom filter guarding lookups against keys that were never inserted
//!
//! Five rolling string hashes are fed the key's [`Hash`] byte stream, so any
//! hashable key type works without first rendering it to a string. Bits are
//! only ever set: deleting a key from the store leaves its bits behind, which
//! raises the false-positive rate but can never produce a false negative.

use skiplite_core::MembershipFilter;
use std::hash::{Hash, Hasher};

/// Capacity used when none is configured
pub const DEFAULT_BLOOM_BITS: usize = 500_000;

/// Fixed-size bit array
#[derive(Debug, Clone)]
pub struct BitMap {
    words: Vec<u64>,
    ones: usize,
}

impl BitMap {
    /// Creates a map able to address bits `0..bits`
    pub fn new(bits: usize) -> Self {
        Self {
            words: vec![0; bits / 64 + 1],
            ones: 0,
        }
    }

    /// Sets a bit. Returns true if it was previously clear.
    pub fn set(&mut self, bit: usize) -> bool {
        let (word, mask) = (bit / 64, 1u64 << (bit % 64));
        if self.words[word] & mask != 0 {
            return false;
        }
        self.words[word] |= mask;
        self.ones += 1;
        true
    }

    /// Returns true if the bit is set
    pub fn test(&self, bit: usize) -> bool {
        self.words[bit / 64] & (1u64 << (bit % 64)) != 0
    }

    /// Number of set bits
    pub fn count(&self) -> usize {
        self.ones
    }
}

#[derive(Default)]
struct Bkdr(u64);

impl Hasher for Bkdr {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(131).wrapping_add(b as u64);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

#[derive(Default)]
struct Sdbm(u64);

impl Hasher for Sdbm {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(65_599).wrapping_add(b as u64);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

struct Rs {
    hash: u64,
    magic: u64,
}

impl Default for Rs {
    fn default() -> Self {
        Self {
            hash: 0,
            magic: 63_689,
        }
    }
}

impl Hasher for Rs {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.hash = self.hash.wrapping_mul(self.magic).wrapping_add(b as u64);
            self.magic = self.magic.wrapping_mul(378_551);
        }
    }

    fn finish(&self) -> u64 {
        self.hash
    }
}

#[derive(Default)]
struct Ap {
    hash: u64,
    pos: u64,
}

impl Hasher for Ap {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            let ch = b as u64;
            if self.pos & 1 == 0 {
                self.hash ^= (self.hash << 7) ^ ch ^ (self.hash >> 3);
            } else {
                self.hash ^= !((self.hash << 11) ^ ch ^ (self.hash >> 5));
            }
            self.pos += 1;
        }
    }

    fn finish(&self) -> u64 {
        self.hash
    }
}

struct Js(u64);

impl Default for Js {
    fn default() -> Self {
        Self(1_315_423_911)
    }
}

impl Hasher for Js {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= (self.0 << 5).wrapping_add(b as u64).wrapping_add(self.0 >> 2);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

fn digest<H: Hasher + Default, K: Hash + ?Sized>(key: &K) -> u64 {
    let mut hasher = H::default();
    key.hash(&mut hasher);
    hasher.finish()
}

/// Five-hash Bloom filter over a [`BitMap`]
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: BitMap,
    capacity: usize,
}

impl BloomFilter {
    /// Creates a filter of `capacity` bits.
    ///
    /// A capacity of 0 is bumped to 1; callers wanting no filter should use
    /// [`AcceptAll`] instead.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            bits: BitMap::new(capacity),
            capacity,
        }
    }

    /// Number of addressable bits
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn positions<K: Hash + ?Sized>(&self, key: &K) -> [usize; 5] {
        let cap = self.capacity as u64;
        [
            (digest::<Bkdr, _>(key) % cap) as usize,
            (digest::<Sdbm, _>(key) % cap) as usize,
            (digest::<Rs, _>(key) % cap) as usize,
            (digest::<Ap, _>(key) % cap) as usize,
            (digest::<Js, _>(key) % cap) as usize,
        ]
    }

    /// Records a key
    pub fn set<K: Hash + ?Sized>(&mut self, key: &K) {
        for bit in self.positions(key) {
            self.bits.set(bit);
        }
    }

    /// False means the key was never set; true may be a false positive
    pub fn may_contain<K: Hash + ?Sized>(&self, key: &K) -> bool {
        self.positions(key).iter().all(|&bit| self.bits.test(bit))
    }

    /// Number of set bits
    pub fn bits_set(&self) -> usize {
        self.bits.count()
    }
}

impl Default for BloomFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BLOOM_BITS)
    }
}

impl<K: Hash> MembershipFilter<K> for BloomFilter {
    fn insert(&mut self, key: &K) {
        self.set(key);
    }

    fn may_contain(&self, key: &K) -> bool {
        BloomFilter::may_contain(self, key)
    }

    fn bits_set(&self) -> usize {
        self.bits.count()
    }
}

/// Filter used when the membership tier is disabled. Never rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<K> MembershipFilter<K> for AcceptAll {
    fn insert(&mut self, _key: &K) {}

    fn may_contain(&self, _key: &K) -> bool {
        true
    }
}

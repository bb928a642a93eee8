//! Board RNG
//!
//! Xorshift128+ stream behind every random choice a board makes (base hue,
//! odd swatch position, shift direction). Sessions seed it from their id,
//! so a session id is enough to replay its boards.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Seed derivation domain.
const SESSION_SEED_DOMAIN: &[u8] = b"HUE_HUNTER_SEED_V1";

/// Xorshift128+ generator.
///
/// ```
/// use hue_hunter::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(7);
/// let mut b = DeterministicRng::new(7);
/// assert_eq!(a.next_hue(), b.next_hue());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    s0: u64,
    s1: u64,
}

impl DeterministicRng {
    /// Generator from a 64-bit seed, spread over both words with SplitMix64.
    pub fn new(seed: u64) -> Self {
        let mut mix = seed;
        Self::from_words(splitmix64(&mut mix), splitmix64(&mut mix))
    }

    /// Generator for a session, keyed by its id.
    pub fn for_session(session_id: &Uuid) -> Self {
        Self::new(derive_session_seed(session_id))
    }

    fn from_words(s0: u64, s1: u64) -> Self {
        // all-zero state is a fixed point
        if s0 | s1 == 0 {
            Self { s0: 1, s1: 1 }
        } else {
            Self { s0, s1 }
        }
    }

    /// Next raw 64-bit output.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let (a, b) = (self.s0, self.s1);
        let out = a.wrapping_add(b);
        let mixed = a ^ b;
        self.s0 = a.rotate_left(24) ^ mixed ^ (mixed << 16);
        self.s1 = mixed.rotate_left(37);
        out
    }

    /// Integer in `[0, bound)`; 0 when `bound` is 0.
    pub fn next_int(&mut self, bound: u32) -> u32 {
        if bound < 2 {
            return 0;
        }
        ((self.next_u64() >> 32) * u64::from(bound) >> 32) as u32
    }

    /// Float in `[0, 1)`.
    #[inline]
    pub fn next_unit(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (1u64 << 53) as f64;
        (self.next_u64() >> 11) as f64 * SCALE
    }

    /// +1.0 or -1.0 with equal odds.
    #[inline]
    pub fn next_sign(&mut self) -> f64 {
        if self.next_u64() >> 63 == 0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Whole-degree hue, 0..=359.
    pub fn next_hue(&mut self) -> f64 {
        f64::from(self.next_int(360))
    }

    /// Board position in `[0, len)`.
    pub fn next_index(&mut self, len: usize) -> usize {
        self.next_int(u32::try_from(len).unwrap_or(u32::MAX)) as usize
    }
}

fn splitmix64(x: &mut u64) -> u64 {
    *x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for a session: first 8 bytes of SHA-256(domain ‖ id), little endian.
pub fn derive_session_seed(session_id: &Uuid) -> u64 {
    let digest = Sha256::new()
        .chain_update(SESSION_SEED_DOMAIN)
        .chain_update(session_id.as_bytes())
        .finalize();
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(word)
}

//! Restricted-alphabet nonces
//!
//! Nonces only need to be unique, not secret, so a fast pseudo-random source
//! is used. Each 63-bit random word is sliced into 6-bit indices; indices that
//! fall outside the alphabet are skipped and the next slice of the same word
//! is tried before another word is drawn.

use rand::Rng;

/// Characters a nonce is drawn from
pub const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Bits needed to index the alphabet
const INDEX_BITS: u32 = 6;
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;
/// Indices that fit in one 63-bit word
const INDICES_PER_WORD: u32 = 63 / INDEX_BITS;

/// Generate a nonce of exactly `len` characters using the thread-local RNG
pub fn generate(len: usize) -> String {
    generate_with(&mut rand::rng(), len)
}

/// Generate a nonce of exactly `len` characters from the given RNG
///
/// Characters are filled from the last position backwards.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let mut out = vec![0u8; len];
    let mut remaining = len;
    let mut cache = draw(rng);
    let mut left_in_word = INDICES_PER_WORD;

    while remaining > 0 {
        if left_in_word == 0 {
            cache = draw(rng);
            left_in_word = INDICES_PER_WORD;
        }
        let idx = (cache & INDEX_MASK) as usize;
        if idx < ALPHABET.len() {
            remaining -= 1;
            out[remaining] = ALPHABET[idx];
        }
        cache >>= INDEX_BITS;
        left_in_word -= 1;
    }

    out.into_iter().map(char::from).collect()
}

fn draw<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.random::<u64>() >> 1
}

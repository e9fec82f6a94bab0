//! RNG module - uniform random piece selection
//!
//! Every spawn picks one of the seven kinds independently with probability 1/7.
//! There is no bag: repeats and droughts are part of the classic feel.
//!
//! The generator is a small seeded LCG so a game can be replayed from its seed.

use crate::types::PieceKind;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce a degenerate first draw
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Maps the full 32-bit draw with a multiply-shift so the result depends on
    /// the high bits; the low bits of an LCG cycle with short periods.
    pub fn next_range(&mut self, max: u32) -> u32 {
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Pick one of the seven kinds uniformly.
pub fn random_piece(rng: &mut SimpleRng) -> PieceKind {
    PieceKind::ALL[rng.next_range(PieceKind::ALL.len() as u32) as usize]
}

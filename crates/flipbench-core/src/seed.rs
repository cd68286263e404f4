//! Optimizer-proof accumulator seeding.
//!
//! The FMA kernel runs twelve parallel accumulation chains. If all twelve
//! start from the literal constant `0.0`, the optimizer can prove the
//! chains identical and merge them, and the "twelve independent chains"
//! being measured quietly become one. The seed must therefore be a value
//! the compiler cannot know at compile time — while still being exactly
//! `+0.0` at runtime so it does not perturb the arithmetic.
//!
//! The construction: a cycle-counter read (opaque to the compiler) scaled
//! by a zero routed through [`std::hint::black_box`]. The counter value is
//! a finite non-negative integer, so the product is exactly `+0.0`, but
//! neither factor can be constant-folded.

use std::hint::black_box;

use crate::cycles;

/// Produce one accumulator seed: exactly `+0.0`, provably unknowable at
/// compile time.
///
/// Each accumulator must call this independently. Copying one seed into
/// twelve accumulators reintroduces the very value-equality the
/// construction exists to hide.
#[inline(never)]
pub fn seed_value() -> f64 {
    cycles::read() as f64 * black_box(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_exactly_positive_zero() {
        for _ in 0..1000 {
            let s = seed_value();
            assert_eq!(s, 0.0);
            assert_eq!(s.to_bits(), 0, "seed must be +0.0, not -0.0");
        }
    }

    #[test]
    fn seeding_does_not_perturb_accumulation() {
        let mut acc = seed_value();
        for _ in 0..100 {
            acc += 1.5 * 2.0;
        }
        assert_eq!(acc, 300.0);
    }
}

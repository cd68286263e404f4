//! IEEE-754 bit-pattern construction for adversarial operands.
//!
//! A double is 1 sign bit, 11 exponent bits (biased), 52 mantissa bits.
//! The flips benchmark needs operands whose *bit patterns* are controlled,
//! not their rounded numeric values: filling the low mantissa bits with
//! ones pushes products toward subnormal results without changing the
//! operand's magnitude much. Masks that reach into the exponent field
//! produce values that are no longer well-formed normals — that is an
//! intentional sharp edge of the harness, left unguarded.

// f64 is IEEE-754 binary64 by language definition; the bit layout below
// depends on it being exactly 64 bits wide.
const _: () = assert!(size_of::<f64>() == 8);

/// Biased exponent shared by both canonical seeds: 0x3EF − 1023 = −16,
/// so both decode near 2⁻¹⁶ — comfortably normal, far from overflow.
const SEED_EXPONENT: u64 = 0x3EF;

/// Canonical seed with mantissa `0101…` (low bit of every pair set).
pub const SEED_EVEN: u64 = (SEED_EXPONENT << 52) | 0x5_5555_5555_5555;

/// Canonical seed with mantissa `1010…` (high bit of every pair set).
pub const SEED_ODD: u64 = (SEED_EXPONENT << 52) | 0xA_AAAA_AAAA_AAAA;

/// Mask with the lowest `n` bits set. `n == 0` yields `0`.
pub fn ones_mask(n: u32) -> u64 {
    debug_assert!(n <= 64, "ones_mask width out of range: {n}");
    if n == 0 { 0 } else { u64::MAX >> (64 - n) }
}

/// Mask with bits `[start, stop]` set, both ends inclusive.
///
/// Built as the intersection of two complementary [`ones_mask`] results.
pub fn range_mask(start: u32, stop: u32) -> u64 {
    assert!(
        start <= stop && stop < 64,
        "invalid bit range [{start}, {stop}]"
    );
    ones_mask(stop + 1) & !ones_mask(start)
}

/// OR `mask` into the bit representation of `x` and reinterpret.
///
/// This is a pure bit-level transform: no rounding, bit-for-bit lossless.
/// Masks confined to bits 0–51 perturb only the mantissa; anything higher
/// touches the exponent or sign and can leave the normal range entirely.
pub fn apply_mask(x: f64, mask: u64) -> f64 {
    f64::from_bits(x.to_bits() | mask)
}

/// Build an adversarial operand: a canonical seed with its lowest
/// `mask_size + 1` bits forced to one.
///
/// Small `mask_size` barely perturbs the seed; `mask_size = 52` pollutes
/// the whole mantissa (the stray bit 52 lands on an exponent bit that is
/// already set in [`SEED_EXPONENT`], so the magnitude is unchanged).
pub fn adversarial_operand(seed: u64, mask_size: u32) -> f64 {
    apply_mask(f64::from_bits(seed), range_mask(0, mask_size))
}

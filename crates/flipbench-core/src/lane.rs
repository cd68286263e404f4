//! Scalar / SIMD-width abstraction for the FMA kernel.
//!
//! The kernel is written once, generic over [`Lane`], and monomorphized
//! for scalar `f64` (width 1) and [`F64x4`] (width 4, the shape of a
//! 256-bit double-precision vector). Width selection happens before the
//! timed region ever starts; inside it there is no branching on width.
//!
//! `F64x4` is expressed as four per-lane `mul_add` calls on a 32-byte
//! aligned array rather than raw intrinsics: with FMA-capable codegen
//! (`-C target-cpu=native`) this lowers to a single `vfmadd` per call,
//! and it stays portable where AVX does not exist.

/// One operand/accumulator value at a fixed SIMD width.
pub trait Lane: Copy {
    /// Number of f64 lanes.
    const WIDTH: u64;

    /// Broadcast a scalar into every lane.
    fn splat(x: f64) -> Self;

    /// Fused multiply-add: `self * a + b`, one rounding per lane.
    fn mul_add(self, a: Self, b: Self) -> Self;

    /// Per-lane addition.
    fn add(self, other: Self) -> Self;

    /// Sum all lanes into one scalar.
    fn horizontal_sum(self) -> f64;
}

impl Lane for f64 {
    const WIDTH: u64 = 1;

    #[inline(always)]
    fn splat(x: f64) -> Self {
        x
    }

    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        f64::mul_add(self, a, b)
    }

    #[inline(always)]
    fn add(self, other: Self) -> Self {
        self + other
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f64 {
        self
    }
}

/// Four f64 lanes, aligned like a 256-bit vector register.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(align(32))]
pub struct F64x4(pub [f64; 4]);

impl Lane for F64x4 {
    const WIDTH: u64 = 4;

    #[inline(always)]
    fn splat(x: f64) -> Self {
        Self([x; 4])
    }

    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        Self([
            self.0[0].mul_add(a.0[0], b.0[0]),
            self.0[1].mul_add(a.0[1], b.0[1]),
            self.0[2].mul_add(a.0[2], b.0[2]),
            self.0[3].mul_add(a.0[3], b.0[3]),
        ])
    }

    #[inline(always)]
    fn add(self, other: Self) -> Self {
        Self([
            self.0[0] + other.0[0],
            self.0[1] + other.0[1],
            self.0[2] + other.0[2],
            self.0[3] + other.0[3],
        ])
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f64 {
        (self.0[0] + self.0[1]) + (self.0[2] + self.0[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_mul_add() {
        assert_eq!(2.0f64.mul_add(3.0, 4.0), 10.0);
        assert_eq!(<f64 as Lane>::splat(0.5).mul_add(0.5, 0.75), 1.0);
    }

    #[test]
    fn wide_splat_and_sum() {
        let v = F64x4::splat(1.5);
        assert_eq!(v.horizontal_sum(), 6.0);
    }

    #[test]
    fn wide_mul_add_per_lane() {
        let a = F64x4([1.0, 2.0, 3.0, 4.0]);
        let b = F64x4::splat(10.0);
        let c = F64x4::splat(0.5);
        assert_eq!(a.mul_add(b, c), F64x4([10.5, 20.5, 30.5, 40.5]));
    }

    #[test]
    fn widths() {
        assert_eq!(<f64 as Lane>::WIDTH, 1);
        assert_eq!(F64x4::WIDTH, 4);
    }
}

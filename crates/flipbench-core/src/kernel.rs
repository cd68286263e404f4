//! The timed kernel loops.
//!
//! Three kernels, one rule: between the start and stop reads there is
//! arithmetic and nothing else — no I/O, no allocation, no branching
//! beyond the loop itself. Timestamps and cycle reads are taken inside
//! each kernel function, immediately around its loop, so no caller can
//! accidentally put work inside the timed region.

use std::hint::black_box;

use crate::cycles;
use crate::lane::Lane;
use crate::seed::seed_value;
use crate::timing::{self, Timestamp};

/// Number of independent accumulation chains in the FMA kernel. Chosen to
/// exceed the FMA latency × issue-width product of current x86 cores, so
/// the pipeline always has independent work.
pub const FMA_CHAINS: u64 = 12;

/// Multiply-accumulate updates per accumulator per inner iteration in the
/// flips kernel. Unrolling amortizes loop overhead against the arithmetic
/// being measured; it does not change the semantics.
pub const FLIPS_UNROLL: u64 = 8;

/// Start/stop readings taken around one kernel invocation.
#[derive(Debug, Clone, Copy)]
pub struct KernelTiming {
    pub start: Timestamp,
    pub stop: Timestamp,
    pub cycles: u64,
}

impl KernelTiming {
    /// Elapsed wall-clock nanoseconds.
    pub fn duration_ns(&self) -> u64 {
        timing::duration_ns(self.start, self.stop)
    }
}

/// Flips kernel: denormal-flip sensitivity.
///
/// Two shared accumulators, `tab[0]` and `tab[3]`, each fed by a fixed
/// multiply of two other lanes. The accumulators are lanes of the operand
/// array itself, so their values drift across trials — deliberately: the
/// drift is part of what is being studied.
///
/// The caller checks finiteness of `tab[0]` and `tab[3]` after the trial;
/// this function only measures.
pub fn flips_kernel(tab: &mut [f64; 6], inner_iterations: u64) -> KernelTiming {
    let mut acc0 = tab[0];
    let (a0, b0) = (tab[1], tab[2]);
    let mut acc1 = tab[3];
    let (a1, b1) = (tab[4], tab[5]);

    let start = timing::now();
    let start_cycle = cycles::read();
    for _ in 0..inner_iterations {
        acc0 += a0 * b0;
        acc1 += a1 * b1;
        acc0 += a0 * b0;
        acc1 += a1 * b1;
        acc0 += a0 * b0;
        acc1 += a1 * b1;
        acc0 += a0 * b0;
        acc1 += a1 * b1;
        acc0 += a0 * b0;
        acc1 += a1 * b1;
        acc0 += a0 * b0;
        acc1 += a1 * b1;
        acc0 += a0 * b0;
        acc1 += a1 * b1;
        acc0 += a0 * b0;
        acc1 += a1 * b1;
    }
    let stop_cycle = cycles::read();
    let stop = timing::now();

    tab[0] = black_box(acc0);
    tab[3] = black_box(acc1);

    KernelTiming {
        start,
        stop,
        cycles: stop_cycle.wrapping_sub(start_cycle),
    }
}

/// FMA kernel: sustained-throughput measurement.
///
/// Twelve independent fused-multiply-add chains over two read-only operand
/// pairs. Each chain starts from its own [`seed_value`] call, so the
/// optimizer cannot prove any two chains equal and merge them. The
/// horizontal sum of all chains is returned; the caller keeps it alive
/// (via `black_box` or the record) so the loop has a live data dependency.
pub fn fma_kernel<V: Lane>(a0: V, b0: V, a1: V, b1: V, inner_iterations: u64) -> (f64, KernelTiming) {
    let mut c0 = V::splat(seed_value());
    let mut c1 = V::splat(seed_value());
    let mut c2 = V::splat(seed_value());
    let mut c3 = V::splat(seed_value());
    let mut c4 = V::splat(seed_value());
    let mut c5 = V::splat(seed_value());
    let mut c6 = V::splat(seed_value());
    let mut c7 = V::splat(seed_value());
    let mut c8 = V::splat(seed_value());
    let mut c9 = V::splat(seed_value());
    let mut c10 = V::splat(seed_value());
    let mut c11 = V::splat(seed_value());

    let start = timing::now();
    let start_cycle = cycles::read();
    for _ in 0..inner_iterations {
        c0 = a0.mul_add(b0, c0);
        c1 = a1.mul_add(b1, c1);
        c2 = a0.mul_add(b0, c2);
        c3 = a1.mul_add(b1, c3);
        c4 = a0.mul_add(b0, c4);
        c5 = a1.mul_add(b1, c5);
        c6 = a0.mul_add(b0, c6);
        c7 = a1.mul_add(b1, c7);
        c8 = a0.mul_add(b0, c8);
        c9 = a1.mul_add(b1, c9);
        c10 = a0.mul_add(b0, c10);
        c11 = a1.mul_add(b1, c11);
    }
    let stop_cycle = cycles::read();
    let stop = timing::now();

    let sum = c0
        .add(c1)
        .add(c2.add(c3))
        .add(c4.add(c5).add(c6.add(c7)))
        .add(c8.add(c9).add(c10.add(c11)))
        .horizontal_sum();

    (
        sum,
        KernelTiming {
            start,
            stop,
            cycles: stop_cycle.wrapping_sub(start_cycle),
        },
    )
}

/// Floating-point operations performed by one FMA-kernel invocation:
/// each fused multiply-add counts as 2 operations, across [`FMA_CHAINS`]
/// chains of `V::WIDTH` lanes.
pub fn fma_flop_count<V: Lane>(inner_iterations: u64) -> u64 {
    inner_iterations * 2 * FMA_CHAINS * V::WIDTH
}

/// Dense matrix-multiply kernel over three square column-major matrices:
/// `c += a · bᵀ`, both scalar multipliers 1.0. The multiply routine itself
/// is an opaque external collaborator with a known `2·n³` operation count.
///
/// `c` accumulates; callers pre-initialize it and own its drift across
/// repeated calls.
pub fn dgemm_kernel(size: usize, a: &[f64], b: &[f64], c: &mut [f64]) -> KernelTiming {
    assert_eq!(a.len(), size * size);
    assert_eq!(b.len(), size * size);
    assert_eq!(c.len(), size * size);

    let start = timing::now();
    let start_cycle = cycles::read();
    // SAFETY: all three buffers hold size*size elements; with column-major
    // strides (row 1, column `size`) every index stays in bounds, and `c`
    // does not alias `a` or `b` (distinct borrows).
    unsafe {
        matrixmultiply::dgemm(
            size,
            size,
            size,
            1.0,
            a.as_ptr(),
            1,
            size as isize,
            b.as_ptr(),
            size as isize,
            1,
            1.0,
            c.as_mut_ptr(),
            1,
            size as isize,
        );
    }
    let stop_cycle = cycles::read();
    let stop = timing::now();

    KernelTiming {
        start,
        stop,
        cycles: stop_cycle.wrapping_sub(start_cycle),
    }
}

/// Floating-point operations in one `size × size` matrix multiply with
/// accumulation.
pub fn dgemm_flop_count(size: usize) -> u64 {
    2 * (size as u64).pow(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lane::F64x4;

    #[test]
    fn flips_kernel_accumulates() {
        let mut tab = [0.0, 2.0, 3.0, 0.0, 0.5, 4.0];
        let timing = flips_kernel(&mut tab, 10);
        // 10 iterations × 8 unrolled updates of +6.0 and +2.0.
        assert_eq!(tab[0], 480.0);
        assert_eq!(tab[3], 160.0);
        // Operand lanes are untouched.
        assert_eq!(&tab[1..3], &[2.0, 3.0]);
        assert_eq!(&tab[4..6], &[0.5, 4.0]);
        assert!(timing.stop >= timing.start);
    }

    #[test]
    fn flips_kernel_drifts_across_trials() {
        let mut tab = [0.0, 1.0, 1.0, 0.0, 1.0, 1.0];
        flips_kernel(&mut tab, 5);
        let after_one = tab[0];
        flips_kernel(&mut tab, 5);
        assert_eq!(tab[0], 2.0 * after_one);
    }

    #[test]
    fn fma_kernel_scalar_sum() {
        // All chains start at +0.0; each sees `inner` FMAs of a*b.
        let (sum, timing) = fma_kernel::<f64>(2.0, 0.5, 3.0, 1.0, 100);
        // 6 chains accumulate 2.0*0.5, 6 chains accumulate 3.0*1.0.
        assert_eq!(sum, 6.0 * 100.0 * 1.0 + 6.0 * 100.0 * 3.0);
        assert!(timing.stop >= timing.start);
    }

    #[test]
    fn fma_kernel_wide_sum() {
        let a = F64x4::splat(1.0);
        let b = F64x4::splat(1.0);
        let (sum, _) = fma_kernel::<F64x4>(a, b, a, b, 10);
        // 12 chains × 10 iterations × 4 lanes × 1.0.
        assert_eq!(sum, 480.0);
    }

    #[test]
    fn fma_flop_counts() {
        assert_eq!(fma_flop_count::<f64>(1_000_000), 24_000_000);
        assert_eq!(fma_flop_count::<F64x4>(1_000_000), 96_000_000);
    }

    #[test]
    fn dgemm_flop_counts() {
        assert_eq!(dgemm_flop_count(512), 268_435_456);
        assert_eq!(dgemm_flop_count(2), 16);
    }

    #[test]
    fn dgemm_kernel_accumulates_a_bt() {
        // 2x2 column-major: a = [[1,2],[3,4]] stored [1,3,2,4].
        let a = vec![1.0, 3.0, 2.0, 4.0];
        // b = identity, so a · bᵀ = a.
        let b = vec![1.0, 0.0, 0.0, 1.0];
        let mut c = vec![10.0, 10.0, 10.0, 10.0];
        dgemm_kernel(2, &a, &b, &mut c);
        assert_eq!(c, vec![11.0, 13.0, 12.0, 14.0]);
    }

    #[test]
    fn dgemm_kernel_transposes_b() {
        // a = identity, so c += bᵀ.
        let a = vec![1.0, 0.0, 0.0, 1.0];
        // b column-major [[5,6],[7,8]] stored [5,6,7,8]:
        // b(0,0)=5 b(1,0)=6 b(0,1)=7 b(1,1)=8.
        let b = vec![5.0, 6.0, 7.0, 8.0];
        let mut c = vec![0.0; 4];
        dgemm_kernel(2, &a, &b, &mut c);
        // bᵀ(0,0)=5 bᵀ(1,0)=7 bᵀ(0,1)=6 bᵀ(1,1)=8, column-major.
        assert_eq!(c, vec![5.0, 7.0, 6.0, 8.0]);
    }
}

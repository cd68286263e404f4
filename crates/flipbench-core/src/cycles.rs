//! Free-running hardware cycle counter reads.
//!
//! On x86_64 this is `rdtsc`. The raw value is meaningless; only the
//! difference between two reads on the same logical CPU is, and even that
//! is best-effort — no serializing fences are issued and a context switch
//! between reads goes undetected. The harness records cycle deltas as a
//! secondary signal next to the wall clock, not as ground truth.

/// Read the cycle counter.
#[cfg(target_arch = "x86_64")]
pub fn read() -> u64 {
    // SAFETY: _rdtsc has no preconditions; it reads the time-stamp counter,
    // which is present on every x86_64 CPU.
    unsafe { core::arch::x86_64::_rdtsc() }
}

/// Fallback for non-x86_64 targets: nanoseconds since a process-local
/// epoch. Deltas remain meaningful; absolute values are not cycles.
#[cfg(not(target_arch = "x86_64"))]
pub fn read() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_advances() {
        let a = read();
        // Enough work that even a coarse fallback counter ticks.
        let mut x = 0u64;
        for i in 0..10_000u64 {
            x = x.wrapping_add(i).rotate_left(7);
        }
        std::hint::black_box(x);
        let b = read();
        assert!(b >= a);
    }
}

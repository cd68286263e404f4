//! # flipbench-core
//!
//! **Denormal floating-point values are a performance cliff. This crate
//! measures how far you fall.**
//!
//! `flipbench-core` is the measurement library behind the `flipbench` CLI.
//! It runs tight floating-point kernels under controlled IEEE-754 operand
//! bit-patterns and records wall-clock (nanosecond) and cycle-counter
//! timings for every trial:
//!
//! - **flips kernel** — two shared multiply-accumulate chains whose
//!   operands can be pushed toward subnormal territory bit by bit, to
//!   expose data-dependent slowdowns ("flips").
//! - **fma kernel** — twelve independent fused-multiply-add chains, scalar
//!   or 4-wide, measuring sustained FLOP throughput.
//! - **dgemm kernel** — an opaque dense matrix-multiply routine with a
//!   known `2·n³` operation count.
//!
//! ## Quick start
//!
//! ```no_run
//! use flipbench_core::driver::{run_flips, OperandMode, RunConfig};
//! use flipbench_core::sink::CsvSink;
//!
//! let config = RunConfig {
//!     trials: 100,
//!     inner_iterations: 1_000_000,
//!     mode: OperandMode::Adversarial,
//!     mask_size: 52,
//!     run_id: 0,
//! };
//! let mut sink = CsvSink::create("/tmp/flips.csv").unwrap();
//! run_flips(&config, &mut sink).unwrap();
//! ```
//!
//! ## Architecture
//!
//! Driver → (operands built once) → timed kernel invocations → one CSV
//! record per trial, flushed immediately.
//!
//! Every trial is timed by [`timing::now`] pairs taken immediately around
//! the kernel loop, with a best-effort cycle delta from [`cycles::read`].
//! Nothing blocks, allocates, or branches inside a timed region.

pub mod bitpattern;
pub mod cycles;
pub mod driver;
pub mod error;
pub mod kernel;
pub mod lane;
pub mod meta;
pub mod seed;
pub mod sink;
pub mod timing;

pub use bitpattern::{apply_mask, ones_mask, range_mask, SEED_EVEN, SEED_ODD};
pub use driver::{run_dgemm, run_flips, run_fma, OperandMode, RunConfig, TrialRecord};
pub use error::Error;
pub use lane::{F64x4, Lane};
pub use meta::{detect_machine_info, MachineInfo, RunMeta};
pub use sink::{CsvSink, RecordSink};
pub use timing::{duration_ns, Timestamp};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

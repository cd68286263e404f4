//! Measurement driver: repeated timed trials, one record each.
//!
//! A run is strictly sequential: trial `i` completes and its record is
//! flushed to the sink before trial `i+1` starts. Exactly `trials` records
//! are produced, or the run dies with a fatal error. Integrity checks run
//! *after* a trial's record is emitted, so an aborted run never swallows
//! the trial that triggered the abort.

use std::hint::black_box;
use std::str::FromStr;

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bitpattern::{adversarial_operand, SEED_EVEN, SEED_ODD};
use crate::error::Error;
use crate::kernel;
use crate::lane::Lane;
use crate::sink::RecordSink;
use crate::timing::{self, Timestamp};

/// How the operand lanes are initialized before the first trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperandMode {
    /// Six independent uniform values in [0, 1).
    Random,
    /// One uniform value in [0, 1) copied into all six lanes.
    Equal,
    /// Lanes built from the canonical seed bit-patterns with the
    /// configured mask size OR'd into their low bits.
    Adversarial,
}

impl FromStr for OperandMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "equal" => Ok(Self::Equal),
            "adversarial" | "adversary" => Ok(Self::Adversarial),
            other => Err(Error::Config(format!(
                "unknown mode '{other}', must be 'random', 'equal' or 'adversarial'"
            ))),
        }
    }
}

impl std::fmt::Display for OperandMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Equal => write!(f, "equal"),
            Self::Adversarial => write!(f, "adversarial"),
        }
    }
}

/// Configuration of one run, immutable for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of timed trials.
    pub trials: u64,
    /// Inner kernel-loop iterations per trial.
    pub inner_iterations: u64,
    /// Operand-initialization mode (flips kernel).
    pub mode: OperandMode,
    /// Highest seed bit forced to one in adversarial operands, 0–63.
    pub mask_size: u32,
    /// Caller-supplied tag copied into every record.
    pub run_id: i64,
}

impl RunConfig {
    fn validate(&self) -> Result<(), Error> {
        if self.mask_size > 63 {
            return Err(Error::Config(format!(
                "mask size {} out of range (0-63)",
                self.mask_size
            )));
        }
        Ok(())
    }
}

/// One trial's measurement, written once and never mutated.
#[derive(Debug, Clone, Copy)]
pub struct TrialRecord {
    pub start: Timestamp,
    pub stop: Option<Timestamp>,
    pub duration_ns: u64,
    pub cycles: Option<u64>,
    pub run_id: i64,
    pub metric: Option<f64>,
}

impl TrialRecord {
    /// Render as one CSV line. Optional fields are omitted, not left
    /// empty, so each kernel's files have a fixed column set.
    pub fn csv_line(&self) -> Result<String, Error> {
        let mut fields = vec![timing::format(self.start)?];
        if let Some(stop) = self.stop {
            fields.push(timing::format(stop)?);
        }
        fields.push(self.duration_ns.to_string());
        if let Some(cycles) = self.cycles {
            fields.push(cycles.to_string());
        }
        fields.push(self.run_id.to_string());
        if let Some(metric) = self.metric {
            fields.push(format!("{metric:e}"));
        }
        Ok(fields.join(","))
    }
}

fn build_flips_operands(config: &RunConfig) -> [f64; 6] {
    let mut tab = [0.0f64; 6];
    match config.mode {
        OperandMode::Random => {
            let mut rng = rand::rng();
            for lane in tab.iter_mut() {
                *lane = rng.random::<f64>();
            }
        }
        OperandMode::Equal => {
            let value = rand::rng().random::<f64>();
            tab.fill(value);
        }
        OperandMode::Adversarial => {
            for (i, lane) in tab.iter_mut().enumerate() {
                let seed = if i % 2 == 0 { SEED_EVEN } else { SEED_ODD };
                *lane = adversarial_operand(seed, config.mask_size);
            }
        }
    }
    tab
}

/// Run the flips kernel for `config.trials` trials.
///
/// Record layout: `start,duration_ns,run_id`.
///
/// The operand array doubles as accumulator storage (lanes 0 and 3), so
/// its values drift across trials. The final array is returned so callers
/// can inspect the drift.
pub fn run_flips<S: RecordSink>(config: &RunConfig, sink: &mut S) -> Result<[f64; 6], Error> {
    config.validate()?;
    let mut tab = build_flips_operands(config);
    info!(
        "flips run: {} trials x {} iterations, mode {}, id {}",
        config.trials, config.inner_iterations, config.mode, config.run_id
    );
    debug!("initial accumulators: {:e} {:e}", tab[0], tab[3]);

    for trial in 0..config.trials {
        let timing = kernel::flips_kernel(&mut tab, config.inner_iterations);
        let record = TrialRecord {
            start: timing.start,
            stop: None,
            duration_ns: timing.duration_ns(),
            cycles: None,
            run_id: config.run_id,
            metric: None,
        };
        sink.emit(&record.csv_line()?)?;
        // Emit first, then judge: the record of the offending trial must
        // exist before the run aborts.
        if !tab[0].is_finite() || !tab[3].is_finite() {
            return Err(Error::Measurement(format!(
                "accumulators non-finite after trial {trial}: {:e} {:e}",
                tab[0], tab[3]
            )));
        }
    }
    debug!("final accumulators: {:e} {:e}", tab[0], tab[3]);
    Ok(tab)
}

/// Run the FMA throughput kernel for `config.trials` trials at width `V`.
///
/// Record layout: `start,duration_ns,cycle_delta,run_id,flops`, with
/// throughput in floating-point operations per second.
pub fn run_fma<V: Lane, S: RecordSink>(config: &RunConfig, sink: &mut S) -> Result<(), Error> {
    config.validate()?;
    let a0 = V::splat(adversarial_operand(SEED_EVEN, config.mask_size));
    let b0 = V::splat(adversarial_operand(SEED_ODD, config.mask_size));
    let a1 = V::splat(adversarial_operand(SEED_ODD, config.mask_size));
    let b1 = V::splat(adversarial_operand(SEED_EVEN, config.mask_size));
    let nb_flop = kernel::fma_flop_count::<V>(config.inner_iterations);
    info!(
        "fma run: {} trials x {} iterations, width {}, {} flop/trial, id {}",
        config.trials,
        config.inner_iterations,
        V::WIDTH,
        nb_flop,
        config.run_id
    );

    for trial in 0..config.trials {
        let (sum, timing) = kernel::fma_kernel::<V>(a0, b0, a1, b1, config.inner_iterations);
        let duration_ns = timing.duration_ns();
        let flops = nb_flop as f64 / duration_ns as f64 * 1e9;
        let record = TrialRecord {
            start: timing.start,
            stop: None,
            duration_ns,
            cycles: Some(timing.cycles),
            run_id: config.run_id,
            metric: Some(flops),
        };
        sink.emit(&record.csv_line()?)?;
        if !sum.is_finite() {
            return Err(Error::Measurement(format!(
                "chain sum non-finite after trial {trial}: {sum:e}"
            )));
        }
        // Keep the horizontal sum live across trials.
        black_box(sum);
    }
    Ok(())
}

/// Run the dense matrix-multiply kernel for `trials` trials on square
/// matrices of rank `size`.
///
/// Record layout: `start,stop,duration_ns,cycle_delta,run_id,gflops`.
///
/// All three matrices are filled with the repeated byte 0x01 (a tiny
/// normal double, ≈7.75e-304), so the accumulated products underflow and
/// C barely drifts across trials.
pub fn run_dgemm<S: RecordSink>(
    trials: u64,
    size: usize,
    run_id: i64,
    sink: &mut S,
) -> Result<(), Error> {
    if size == 0 {
        return Err(Error::Config("matrix size must be non-zero".into()));
    }
    let element = f64::from_bits(0x0101_0101_0101_0101);
    let a = vec![element; size * size];
    let b = vec![element; size * size];
    let mut c = vec![element; size * size];
    let nb_flop = kernel::dgemm_flop_count(size);
    info!("dgemm run: {trials} trials, rank {size}, {nb_flop} flop/trial, id {run_id}");

    for _ in 0..trials {
        let timing = kernel::dgemm_kernel(size, &a, &b, &mut c);
        let duration_ns = timing.duration_ns();
        // flop per nanosecond is Gflop/s.
        let gflops = nb_flop as f64 / duration_ns as f64;
        let record = TrialRecord {
            start: timing.start,
            stop: Some(timing.stop),
            duration_ns,
            cycles: Some(timing.cycles),
            run_id,
            metric: Some(gflops),
        };
        sink.emit(&record.csv_line()?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lane::F64x4;
    use crate::sink::CsvSink;

    /// In-memory sink for driver tests.
    struct VecSink(Vec<String>);

    impl RecordSink for VecSink {
        fn emit(&mut self, line: &str) -> Result<(), Error> {
            self.0.push(line.to_string());
            Ok(())
        }
    }

    fn config(mode: OperandMode, mask_size: u32) -> RunConfig {
        RunConfig {
            trials: 5,
            inner_iterations: 100,
            mode,
            mask_size,
            run_id: 42,
        }
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("random".parse::<OperandMode>().unwrap(), OperandMode::Random);
        assert_eq!("equal".parse::<OperandMode>().unwrap(), OperandMode::Equal);
        assert_eq!(
            "adversarial".parse::<OperandMode>().unwrap(),
            OperandMode::Adversarial
        );
        // Legacy spelling.
        assert_eq!(
            "adversary".parse::<OperandMode>().unwrap(),
            OperandMode::Adversarial
        );
        assert!(matches!(
            "fast".parse::<OperandMode>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn mask_size_is_validated_before_any_trial() {
        let mut sink = VecSink(Vec::new());
        let bad = config(OperandMode::Adversarial, 64);
        let err = run_flips(&bad, &mut sink).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn flips_emits_exactly_trials_records() {
        let mut sink = VecSink(Vec::new());
        run_flips(&config(OperandMode::Random, 0), &mut sink).unwrap();
        assert_eq!(sink.0.len(), 5);
        for line in &sink.0 {
            // start,duration_ns,run_id
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 3);
            assert!(fields[1].parse::<u64>().is_ok());
            assert_eq!(fields[2], "42");
        }
    }

    #[test]
    fn start_timestamps_never_decrease() {
        let mut sink = VecSink(Vec::new());
        run_flips(&config(OperandMode::Equal, 0), &mut sink).unwrap();
        // The fixed-width local-time format orders lexicographically.
        let starts: Vec<&str> = sink.0.iter().map(|l| l.split(',').next().unwrap()).collect();
        for pair in starts.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn adversarial_full_mantissa_survives_ten_thousand_iterations() {
        let mut sink = VecSink(Vec::new());
        let config = RunConfig {
            trials: 1,
            inner_iterations: 10_000,
            mode: OperandMode::Adversarial,
            mask_size: 52,
            run_id: 0,
        };
        let tab = run_flips(&config, &mut sink).unwrap();
        assert!(tab[0].is_finite());
        assert!(tab[3].is_finite());
    }

    #[test]
    fn flips_accumulators_drift_across_trials() {
        let mut sink = VecSink(Vec::new());
        let config = config(OperandMode::Equal, 0);
        let tab = run_flips(&config, &mut sink).unwrap();
        let initial = tab[1];
        // trials x iterations x unroll updates of lane1*lane2 on top of
        // the initial lane value.
        let updates = (config.trials * config.inner_iterations * kernel::FLIPS_UNROLL) as f64;
        let expected = initial + updates * initial * initial;
        assert!((tab[0] - expected).abs() <= expected.abs() * 1e-9);
    }

    #[test]
    fn fma_records_scalar() {
        let mut sink = VecSink(Vec::new());
        run_fma::<f64, _>(&config(OperandMode::Adversarial, 0), &mut sink).unwrap();
        assert_eq!(sink.0.len(), 5);
        for line in &sink.0 {
            // start,duration_ns,cycles,run_id,flops
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 5);
            assert!(fields[1].parse::<u64>().is_ok());
            assert!(fields[2].parse::<u64>().is_ok());
            assert_eq!(fields[3], "42");
            // Scientific notation metric.
            assert!(fields[4].contains('e'));
        }
    }

    #[test]
    fn fma_wide_runs() {
        let mut sink = VecSink(Vec::new());
        run_fma::<F64x4, _>(&config(OperandMode::Adversarial, 52), &mut sink).unwrap();
        assert_eq!(sink.0.len(), 5);
    }

    #[test]
    fn dgemm_records() {
        let mut sink = VecSink(Vec::new());
        run_dgemm(3, 16, -7, &mut sink).unwrap();
        assert_eq!(sink.0.len(), 3);
        for line in &sink.0 {
            // start,stop,duration_ns,cycles,run_id,gflops
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 6);
            assert_eq!(fields[4], "-7");
        }
    }

    #[test]
    fn dgemm_rejects_zero_size() {
        let mut sink = VecSink(Vec::new());
        assert!(matches!(
            run_dgemm(1, 0, 0, &mut sink),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn drives_a_real_csv_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trial.csv");
        let mut sink = CsvSink::create(&path).unwrap();
        run_flips(&config(OperandMode::Random, 0), &mut sink).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 5);
    }

    #[test]
    fn throughput_derivation_matches_known_scenario() {
        // 1M iterations, scalar: 24M flop; at 800_000 ns that is 30 Gflop/s.
        let nb_flop = kernel::fma_flop_count::<f64>(1_000_000);
        assert_eq!(nb_flop, 24_000_000);
        let throughput = nb_flop as f64 / 800_000.0 * 1e9;
        assert!((throughput - 3.0e10).abs() < 1.0);
    }

    #[test]
    fn gflops_derivation_matches_known_scenario() {
        let nb_flop = kernel::dgemm_flop_count(512);
        assert_eq!(nb_flop, 268_435_456);
        let gflops = nb_flop as f64 / 2_000_000.0;
        assert!((gflops - 134.217728).abs() < 1e-9);
    }
}

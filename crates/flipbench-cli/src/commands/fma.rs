//! `flipbench fma` — sustained FMA throughput measurement.

use std::path::Path;

use flipbench_core::driver::{run_fma, OperandMode, RunConfig};
use flipbench_core::lane::{F64x4, Lane};
use flipbench_core::meta::RunMeta;
use flipbench_core::sink::CsvSink;

use super::fail;

pub fn run(output: &str, trials: u64, inner_iterations: u64, run_id: i64, wide: bool, mask_size: u32) {
    let config = RunConfig {
        trials,
        inner_iterations,
        // The FMA kernel always takes bit-pattern operands; the mask size
        // decides how adversarial they are.
        mode: OperandMode::Adversarial,
        mask_size,
        run_id,
    };

    let mut sink = match CsvSink::create(output) {
        Ok(sink) => sink,
        Err(err) => fail(&err),
    };
    let meta = RunMeta::new("fma", trials, inner_iterations, run_id).and_then(|mut meta| {
        meta.mask_size = Some(mask_size);
        meta.lanes = Some(if wide { F64x4::WIDTH } else { <f64 as Lane>::WIDTH });
        meta.write_sidecar(Path::new(output)).map(|()| meta)
    });
    if let Err(err) = meta {
        fail(&err);
    }

    // Width is a monomorphization choice; the branch happens once, out
    // here, never inside a timed region.
    let result = if wide {
        run_fma::<F64x4, _>(&config, &mut sink)
    } else {
        run_fma::<f64, _>(&config, &mut sink)
    };
    if let Err(err) = result {
        fail(&err);
    }
}

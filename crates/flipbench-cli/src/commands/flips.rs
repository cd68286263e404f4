//! `flipbench flips` — denormal-flip sensitivity measurement.

use std::path::Path;

use flipbench_core::driver::{run_flips, OperandMode, RunConfig};
use flipbench_core::meta::RunMeta;
use flipbench_core::sink::CsvSink;

use super::fail;

pub fn run(output: &str, mode: &str, trials: u64, inner_iterations: u64, run_id: i64, mask_size: u32) {
    let mode: OperandMode = match mode.parse() {
        Ok(mode) => mode,
        Err(err) => fail(&err),
    };
    let config = RunConfig {
        trials,
        inner_iterations,
        mode,
        mask_size,
        run_id,
    };

    let mut sink = match CsvSink::create(output) {
        Ok(sink) => sink,
        Err(err) => fail(&err),
    };
    let meta = RunMeta::new("flips", trials, inner_iterations, run_id).and_then(|mut meta| {
        meta.mode = Some(mode.to_string());
        if mode == OperandMode::Adversarial {
            meta.mask_size = Some(mask_size);
        }
        meta.write_sidecar(Path::new(output)).map(|()| meta)
    });
    if let Err(err) = meta {
        fail(&err);
    }

    match run_flips(&config, &mut sink) {
        Ok(tab) => {
            // The drifted accumulators are part of the result.
            println!("{:e} {:e}", tab[0], tab[3]);
        }
        Err(err) => fail(&err),
    }
}

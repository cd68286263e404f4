//! `flipbench dgemm` — dense matrix-multiply throughput measurement.

use std::path::Path;

use flipbench_core::driver::run_dgemm;
use flipbench_core::meta::RunMeta;
use flipbench_core::sink::CsvSink;

use super::fail;

pub fn run(output: &str, trials: u64, size: usize, run_id: i64) {
    let mut sink = match CsvSink::create(output) {
        Ok(sink) => sink,
        Err(err) => fail(&err),
    };
    let meta = RunMeta::new("dgemm", trials, size as u64, run_id)
        .and_then(|meta| meta.write_sidecar(Path::new(output)).map(|()| meta));
    if let Err(err) = meta {
        fail(&err);
    }

    if let Err(err) = run_dgemm(trials, size, run_id, &mut sink) {
        fail(&err);
    }
}

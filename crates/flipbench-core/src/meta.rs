//! Run metadata sidecar.
//!
//! Timing numbers without the machine they came from are hard to compare
//! months later. Next to every CSV the harness writes `<output>.meta.json`
//! describing the kernel, its parameters, the machine, and the start time.
//! The sidecar is written before the first trial; it never changes after.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::timing;

/// Machine information captured at run start (best-effort).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineInfo {
    pub os: String,
    pub arch: String,
    pub cpu: String,
    pub cores: usize,
}

/// Detect machine information.
pub fn detect_machine_info() -> MachineInfo {
    MachineInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: detect_cpu().unwrap_or_else(|| "unknown".to_string()),
        cores: std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    }
}

/// CPU model name (best-effort).
fn detect_cpu() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo").ok().and_then(|s| {
            s.lines()
                .find(|l| l.starts_with("model name"))
                .map(|l| l.split(':').nth(1).unwrap_or("").trim().to_string())
        })
    }
    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("sysctl")
            .arg("-n")
            .arg("machdep.cpu.brand_string")
            .output()
            .ok()?;
        let s = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if s.is_empty() { None } else { Some(s) }
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

/// Metadata for one run, serialized as `<output>.meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    /// Kernel name: "flips", "fma" or "dgemm".
    pub kernel: String,
    pub trials: u64,
    /// Inner iterations (arithmetic kernels) or matrix rank (dgemm).
    pub size: u64,
    /// Operand-initialization mode, flips kernel only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Adversarial mask size, where applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_size: Option<u32>,
    /// SIMD lanes per operation, fma kernel only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lanes: Option<u64>,
    pub run_id: i64,
    pub started_at: String,
    pub machine: MachineInfo,
    pub flipbench_version: String,
}

impl RunMeta {
    /// Build metadata stamped with the current time and machine.
    pub fn new(kernel: &str, trials: u64, size: u64, run_id: i64) -> Result<Self, Error> {
        Ok(Self {
            kernel: kernel.to_string(),
            trials,
            size,
            mode: None,
            mask_size: None,
            lanes: None,
            run_id,
            started_at: timing::format(timing::now())?,
            machine: detect_machine_info(),
            flipbench_version: crate::VERSION.to_string(),
        })
    }

    /// Write the sidecar next to `csv_path` as `<csv_path>.meta.json`.
    pub fn write_sidecar(&self, csv_path: &Path) -> Result<(), Error> {
        let mut sidecar = csv_path.as_os_str().to_owned();
        sidecar.push(".meta.json");
        let file = File::create(&sidecar)?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, self)
            .map_err(|err| Error::Io(std::io::Error::other(err)))?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_info_is_populated() {
        let info = detect_machine_info();
        assert!(!info.os.is_empty());
        assert!(!info.arch.is_empty());
        assert!(info.cores >= 1);
    }

    #[test]
    fn sidecar_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("run.csv");
        let mut meta = RunMeta::new("fma", 100, 1_000_000, 3).unwrap();
        meta.lanes = Some(4);
        meta.write_sidecar(&csv).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("run.csv.meta.json")).unwrap();
        let parsed: RunMeta = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.kernel, "fma");
        assert_eq!(parsed.trials, 100);
        assert_eq!(parsed.lanes, Some(4));
        assert_eq!(parsed.flipbench_version, crate::VERSION);
    }

    #[test]
    fn optional_fields_are_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("run.csv");
        let meta = RunMeta::new("dgemm", 10, 512, 0).unwrap();
        meta.write_sidecar(&csv).unwrap();
        let raw = std::fs::read_to_string(dir.path().join("run.csv.meta.json")).unwrap();
        assert!(!raw.contains("mask_size"));
        assert!(!raw.contains("\"mode\""));
    }
}

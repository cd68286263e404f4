//! CLI for flipbench — denormal flip and FLOP throughput micro-benchmarks.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "flipbench")]
#[command(about = "flipbench — measure floating-point performance cliffs near denormals")]
#[command(version = flipbench_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Denormal-flip sensitivity: two shared multiply-accumulate chains
    /// over a six-lane operand array that drifts across trials
    Flips {
        /// Output CSV path
        output: String,

        /// Operand initialization: random, equal, or adversarial
        mode: String,

        /// Number of timed trials (outer loop)
        trials: u64,

        /// Kernel iterations per trial (inner loop)
        inner_iterations: u64,

        /// Run identifier copied into every record
        run_id: i64,

        /// Highest seed bit forced to one in adversarial operands (0-63)
        #[arg(long, default_value = "52")]
        mask_size: u32,
    },

    /// Sustained FMA throughput: twelve independent fused-multiply-add
    /// chains, scalar or 4-wide
    Fma {
        /// Output CSV path
        output: String,

        /// Number of timed trials (outer loop)
        trials: u64,

        /// Kernel iterations per trial (inner loop)
        inner_iterations: u64,

        /// Run identifier copied into every record
        run_id: i64,

        /// Use the 4-wide (256-bit) kernel instead of scalar
        #[arg(long)]
        wide: bool,

        /// Highest seed bit forced to one in the operands (0-63)
        #[arg(long, default_value = "0")]
        mask_size: u32,
    },

    /// Dense matrix-multiply throughput via an external dgemm routine
    /// (known 2·n³ operation count)
    Dgemm {
        /// Output CSV path
        output: String,

        /// Number of timed trials
        trials: u64,

        /// Matrix rank (square matrices)
        size: usize,

        /// Run identifier copied into every record
        run_id: i64,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Flips {
            output,
            mode,
            trials,
            inner_iterations,
            run_id,
            mask_size,
        } => commands::flips::run(&output, &mode, trials, inner_iterations, run_id, mask_size),
        Commands::Fma {
            output,
            trials,
            inner_iterations,
            run_id,
            wide,
            mask_size,
        } => commands::fma::run(&output, trials, inner_iterations, run_id, wide, mask_size),
        Commands::Dgemm {
            output,
            trials,
            size,
            run_id,
        } => commands::dgemm::run(&output, trials, size, run_id),
    }
}

pub mod dgemm;
pub mod flips;
pub mod fma;

use flipbench_core::Error;

/// Report a fatal error and terminate.
///
/// Configuration errors exit 1 (original input was bad); measurement
/// failures exit 2 so scripted sweeps can tell "fix the arguments" apart
/// from "distrust this machine/operand combination".
pub fn fail(err: &Error) -> ! {
    eprintln!("Error: {err}");
    let code = match err {
        Error::Config(_) => 1,
        Error::Measurement(_) | Error::Io(_) => 2,
    };
    std::process::exit(code);
}

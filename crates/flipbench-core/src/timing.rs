//! Wall-clock timestamping for timed regions.
//!
//! Trials are timed with `CLOCK_REALTIME` rather than a monotonic clock:
//! the measured durations are short and the records need wall-clock start
//! times that can be correlated with external monitoring (frequency,
//! temperature) captured on the same machine. A backward clock adjustment
//! mid-trial would corrupt one duration; that risk is accepted.

use std::mem;

use crate::error::Error;

// The libc crate does not declare `tzset` for unix targets; bind the C
// library symbol directly.
unsafe extern "C" {
    fn tzset();
}

/// A point in wall-clock time with nanosecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    sec: i64,
    nsec: u32,
}

impl Timestamp {
    /// Whole nanoseconds since the epoch.
    fn as_nanos(self) -> u64 {
        self.sec as u64 * 1_000_000_000 + u64::from(self.nsec)
    }
}

/// Read the current wall-clock time.
pub fn now() -> Timestamp {
    let mut tp = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: clock_gettime writes a timespec through a valid pointer.
    // CLOCK_REALTIME is always available; the call cannot fail here.
    unsafe {
        libc::clock_gettime(libc::CLOCK_REALTIME, &mut tp);
    }
    Timestamp {
        sec: tp.tv_sec as i64,
        nsec: tp.tv_nsec as u32,
    }
}

/// Nanoseconds elapsed between `start` and `stop`.
///
/// Callers guarantee `stop >= start` within a trial; passing them reversed
/// is a caller bug and traps in debug builds.
pub fn duration_ns(start: Timestamp, stop: Timestamp) -> u64 {
    debug_assert!(stop >= start, "stop timestamp precedes start");
    stop.as_nanos() - start.as_nanos()
}

/// Render a timestamp as local time, `YYYY-MM-DD HH:MM:SS.nnnnnnnnn`.
///
/// Every record carries at least one formatted timestamp, so a formatting
/// failure (timezone lookup) is a measurement-integrity failure, not
/// something to paper over with a placeholder.
pub fn format(ts: Timestamp) -> Result<String, Error> {
    let time: libc::time_t = ts.sec as libc::time_t;
    // SAFETY: tm is plain-old-data; a zeroed value is a valid out-param
    // for localtime_r, which either fills it or returns null.
    let tm = unsafe {
        tzset();
        let mut tm: libc::tm = mem::zeroed();
        if libc::localtime_r(&time, &mut tm).is_null() {
            return Err(Error::Measurement(format!(
                "cannot render timestamp {} as local time",
                ts.sec
            )));
        }
        tm
    };
    Ok(format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:09}",
        tm.tm_year + 1900,
        tm.tm_mon + 1,
        tm.tm_mday,
        tm.tm_hour,
        tm.tm_min,
        tm.tm_sec,
        ts.nsec
    ))
}

//! Timestamp conventions
//!
//! The engine itself never reads a clock: every time-dependent operation
//! takes an explicit `UnixTimestamp` supplied by the execution environment.
//! The helper here is for hosts and tests.

use chrono::Utc;

/// Seconds since the Unix epoch.
pub type UnixTimestamp = i64;

/// Current wall-clock time in seconds. Host/test convenience only.
pub fn now() -> UnixTimestamp {
    Utc::now().timestamp()
}

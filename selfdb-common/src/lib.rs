#![warn(rust_2018_idioms)]

#[macro_use]
extern crate slog_scope;

pub mod logging;
mod metrics;

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;

pub use metrics::{metrics_from_opts, MetricError, Metrics};

// Header names must be lower case per the RFC to minimize mismatches.
pub static X_LAST_MODIFIED: &str = "x-last-modified";
pub static X_TOTAL_COUNT: &str = "x-total-count";
pub static X_REQUEST_ID: &str = "x-request-id";

/// Constant-time byte comparison, used wherever a request-supplied secret
/// is checked against a configured one (anon key, inter-service API key).
pub fn constant_time_eq_bytes(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// HKDF expansion to 32 bytes, used to derive the ticket-signing secret
/// from the configured master secret.
pub fn hkdf_expand_32(info: &[u8], salt: Option<&[u8]>, key: &[u8]) -> Result<[u8; 32], String> {
    let mut result = [0u8; 32];
    let hkdf = Hkdf::<Sha256>::new(salt, key);
    hkdf.expand(info, &mut result)
        .map_err(|e| format!("HKDF error: {:?}", e))?;
    Ok(result)
}

#[macro_export]
macro_rules! from_error {
    ($from:ty, $to:ty, $to_kind:expr) => {
        impl From<$from> for $to {
            fn from(inner: $from) -> $to {
                $to_kind(inner).into()
            }
        }
    };
}

#[macro_export]
macro_rules! impl_fmt_display {
    ($error:ty, $kind:ty) => {
        impl fmt::Display for $error {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.kind, formatter)
            }
        }
    };
}

/// Implemented by every crate-local error type so the top-level `ApiError`
/// can decide whether to report it to Sentry and what metric to bump.
pub trait ReportableError: fmt::Debug {
    fn is_sentry_event(&self) -> bool {
        true
    }
    fn metric_label(&self) -> Option<&str> {
        None
    }
    fn backtrace(&self) -> Option<&backtrace::Backtrace> {
        None
    }
}

/// Types that can represent "something unexpected happened" without a more
/// specific variant.
pub trait InternalError {
    fn internal_error(message: String) -> Self;
}

pub use backtrace;

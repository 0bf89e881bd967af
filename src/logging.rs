//! Logging initializer for host binaries (§2a-O).
//!
//! Mirrors the pack's own `tracing-subscriber` `EnvFilter` setup: a host
//! calls [`init`] once at startup; the library itself never installs a
//! subscriber, since it may be embedded in a host that already has one.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a `tracing-subscriber` `fmt` layer filtered by `RUST_LOG`
/// (defaulting to `info` when unset). Safe to call at most once per process;
/// a second call is a no-op (the global default subscriber is already set).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// Like [`init`], but writes through a non-blocking `tracing-appender` file
/// sink under `dir/file_name` instead of stdout, for long sweep runs a host
/// wants to leave logging in the background. The returned guard must be kept
/// alive for the duration of the process; dropping it flushes and stops the
/// writer thread.
pub fn init_with_file(dir: impl AsRef<Path>, file_name: &str) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    match fmt().with_env_filter(filter).with_writer(writer).try_init() {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

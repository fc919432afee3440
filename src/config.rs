//! Compile-time configuration constants, overridable by environment variable
//! or CLI flag.
//!
//! Mirrors the teacher crate's `config.rs` pattern (`const` default plus an
//! env-var override consulted once at startup) rather than a config file or
//! global singleton struct.

use std::env;

/// Default VBlock size in megabytes. Overridable via `SEQZIP_VB_SIZE_MB` or
/// the `-B#` CLI flag.
pub const VB_SIZE_MB_DEFAULT: usize = 8;

/// Smallest VBlock size accepted.
pub const VB_SIZE_MB_MIN: usize = 1;

/// Largest VBlock size accepted.
pub const VB_SIZE_MB_MAX: usize = 2048;

/// Default worker count. 0 means "auto-detect from available parallelism".
/// Overridable via `SEQZIP_NB_WORKERS` or `-T#`.
pub const NB_WORKERS_DEFAULT: usize = 0;

/// Maximum number of compression worker threads selectable at runtime.
pub const NB_WORKERS_MAX: usize = 200;

/// Size of the prefix sample the codec selector draws from a context's
/// stream before trying candidate codecs (see [`crate::codec::selector`]).
pub const CODEC_SAMPLE_BYTES: usize = 48 * 1024;

/// Number of in-flight VBs the dispatcher allows beyond `nb_workers`
/// (`READY_TO_COMPUTE` + `PROCESSED` queue depth). Bounds memory use.
pub const DISPATCHER_QUEUE_SLACK: usize = 2;

/// Returns `nb_workers` resolved from (in priority order) an explicit CLI
/// value, the `SEQZIP_NB_WORKERS` env var, or available parallelism.
pub fn resolve_nb_workers(cli_value: Option<usize>) -> usize {
    if let Some(v) = cli_value {
        return v.clamp(1, NB_WORKERS_MAX);
    }
    if let Some(v) = env_usize("SEQZIP_NB_WORKERS") {
        return v.clamp(1, NB_WORKERS_MAX);
    }
    crate::util::count_cores().clamp(1, NB_WORKERS_MAX)
}

/// Returns the VBlock size in bytes resolved the same way as
/// [`resolve_nb_workers`].
pub fn resolve_vb_size_bytes(cli_mb: Option<usize>) -> usize {
    let mb = cli_mb
        .or_else(|| env_usize("SEQZIP_VB_SIZE_MB"))
        .unwrap_or(VB_SIZE_MB_DEFAULT)
        .clamp(VB_SIZE_MB_MIN, VB_SIZE_MB_MAX);
    mb * 1024 * 1024
}

fn env_usize(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nb_workers_explicit_wins() {
        assert_eq!(resolve_nb_workers(Some(3)), 3);
    }

    #[test]
    fn nb_workers_clamped() {
        assert_eq!(resolve_nb_workers(Some(9999)), NB_WORKERS_MAX);
        assert_eq!(resolve_nb_workers(Some(0)), 1);
    }

    #[test]
    fn vb_size_resolves_default() {
        assert_eq!(
            resolve_vb_size_bytes(None),
            VB_SIZE_MB_DEFAULT * 1024 * 1024
        );
    }

    #[test]
    fn vb_size_explicit_wins() {
        assert_eq!(resolve_vb_size_bytes(Some(16)), 16 * 1024 * 1024);
    }
}

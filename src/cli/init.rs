//! Startup resolution shared by every subcommand: worker count, VBlock size,
//! and the display level controlling progress output, mirroring the
//! teacher's plain `eprintln!`-based reporting rather than a logging crate
//! (neither `log` nor `tracing` is part of this stack).

use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Prints a progress line to stderr unless `--quiet` was passed.
#[macro_export]
macro_rules! progress {
    ($($arg:tt)*) => {
        if !$crate::cli::init::is_quiet() {
            eprintln!($($arg)*);
        }
    };
}

pub struct ResolvedConfig {
    pub nb_workers: usize,
    pub vb_size_bytes: usize,
}

pub fn resolve(threads: usize, vb_size_mb: Option<usize>) -> ResolvedConfig {
    let cli_threads = if threads == 0 { None } else { Some(threads) };
    ResolvedConfig {
        nb_workers: crate::config::resolve_nb_workers(cli_threads),
        vb_size_bytes: crate::config::resolve_vb_size_bytes(vb_size_mb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_uses_explicit_threads() {
        let cfg = resolve(4, Some(16));
        assert_eq!(cfg.nb_workers, 4);
        assert_eq!(cfg.vb_size_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn resolve_falls_back_to_auto_detect() {
        let cfg = resolve(0, None);
        assert!(cfg.nb_workers >= 1);
    }
}

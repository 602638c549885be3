//! Colorized, leveled console logger installed behind the `log` facade,
//! plus a `ScopedTimer` RAII helper for perf-style log lines.
//!
//! Grounded in the teacher crate's `log::Log` plumbing (idempotent
//! `init_logger`, debug/release level split) and in the original
//! reference implementation's mutex-guarded, ANSI-colored console logger.
//! There is no FFI boundary here, so (unlike the teacher) there is no
//! secondary sink to forward log lines to — just the console.

use log::{Level, Log, Metadata, Record};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

const RESET: &str = "\x1b[0m";
const GREY: &str = "\x1b[1;30m";
const RED: &str = "\x1b[1;31m";
const GREEN: &str = "\x1b[1;32m";
const YELLOW: &str = "\x1b[1;33m";
const BLUE: &str = "\x1b[1;34m";
const PURPLE: &str = "\x1b[1;35m";
const CYAN: &str = "\x1b[1;36m";

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if cfg!(debug_assertions) {
            metadata.level() <= Level::Debug
        } else {
            metadata.level() <= Level::Info
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let (color, label) = match record.level() {
            Level::Error => (RED, "ERROR"),
            Level::Warn => (YELLOW, "WARN "),
            Level::Info => (BLUE, "INFO "),
            Level::Debug => (CYAN, "DEBUG"),
            Level::Trace => (GREY, "TRACE"),
        };
        println!(
            "{GREY}[{}]{RESET} {color}[{label}]{RESET} {}",
            now_hms_millis(),
            record.args()
        );
    }

    fn flush(&self) {}
}

pub(crate) fn now_hms_millis() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs_today = now.as_secs() % 86_400;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs_today / 3600,
        (secs_today % 3600) / 60,
        secs_today % 60,
        now.subsec_millis()
    )
}

static LOGGER: ConsoleLogger = ConsoleLogger;
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Install the global logger. Idempotent — a second call is a silent no-op.
pub fn init() {
    if INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(level));
}

/// Logs `"<name> took <elapsed> ms"` at PERF-equivalent (info) level when
/// dropped. Mirrors the original `ScopedTimer`'s RAII perf logging without
/// needing a dedicated log level.
pub struct ScopedTimer {
    name: &'static str,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        println!(
            "{GREY}[{}]{RESET} {PURPLE}[PERF ]{RESET} {} took {:.3} ms",
            now_hms_millis(),
            self.name,
            elapsed.as_secs_f64() * 1000.0
        );
    }
}

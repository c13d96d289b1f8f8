use std::io::Write;

use env_logger::{Builder, Target};
use log::{LevelFilter, debug};

/// Installs the process logger on stderr so command output on stdout stays
/// clean. `RUST_LOG` directives are applied on top of `level`.
///
/// The logger can only be installed once; later calls just move the global
/// level, which is how the binding layer changes verbosity at runtime.
pub fn init_logger(level: LevelFilter) {
    let installed = Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}: {}",
                buf.timestamp_seconds(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .is_ok();

    if !installed {
        log::set_max_level(level);
        debug!("Log level changed to {}", level);
    }
}

pub fn parse_level(level: &str) -> Option<LevelFilter> {
    let lvl = match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => return None,
    };
    Some(lvl)
}

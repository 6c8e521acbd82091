//! Logging setup.
//!
//! The library only emits through the [`log`] facade. Binaries call
//! [`init_logger`] once at startup to print those records to stderr via
//! `env_logger`.

/// Install `env_logger` as the global logger.
///
/// `RUST_LOG` wins when it is set; otherwise `default_filter` (e.g.
/// `"info"` or `"pixel_cannon=debug"`) is used. Calling this a second time,
/// or after another logger was installed, only prints a warning.
pub fn init_logger(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let result = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();

    if result.is_err() {
        eprintln!("[pixel-cannon] Warning: a logger is already set.");
    }
}

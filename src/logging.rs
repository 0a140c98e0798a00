use env_logger::{Builder, Env, Target};

/// Initialize logging.
///
/// RUST_LOG takes precedence when set; otherwise the configured level
/// applies. Timestamps at seconds precision, output on stderr.
pub fn init(level: &str) {
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .target(Target::Stderr)
        .init();
}

//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

use crate::LogFormat;

/// Initialize tracing/logging with an explicit filter directive and format.
///
/// An unparseable directive falls back to `info`. Safe to call multiple
/// times (subsequent calls are no-ops).
pub fn init_with(directive: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));
    install(filter, format);
}

fn install(filter: EnvFilter, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_with_bad_directive_is_a_no_op() {
        init_with("franchiseops=[", LogFormat::Json);
        init_with("debug", LogFormat::Pretty);
    }
}

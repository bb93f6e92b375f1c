use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Maps a configured level onto one `EnvFilter` accepts, falling back to info
fn normalize_level(level: &str) -> (&'static str, bool) {
    let lowered = level.trim().to_lowercase();
    match LEVELS.iter().copied().find(|known| *known == lowered) {
        Some(known) => (known, true),
        None => ("info", false),
    }
}

/// Installs the global subscriber; `RUST_LOG` takes precedence over `level`
pub fn init_logging(level: &str) {
    let (directive, recognised) = normalize_level(level);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true)
        .with_filter(filter);

    tracing_subscriber::registry().with(stdout_layer).init();

    if !recognised {
        tracing::warn!("Invalid log level '{}', defaulting to 'info'", level);
    }
}

//! Log filter selection for the binary.

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_DIRECTIVES: &str = "carry_rnn=info";

/// Filter from `RUST_LOG`, falling back to `DEFAULT_DIRECTIVES`.
pub fn env_filter() -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

/// User directives replace the default entirely; they are never merged.
pub fn filter_from(directives: Option<&str>) -> EnvFilter {
    match directives {
        Some(d) if !d.trim().is_empty() => {
            EnvFilter::try_new(d).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
        }
        _ => EnvFilter::new(DEFAULT_DIRECTIVES),
    }
}

//! Process-wide tracing setup shared by the binaries.

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{DEFAULT_DIRECTIVE, LogFormat, env_filter};

/// Initialize logging filtered by `RUST_LOG` (default `info`), formatted per
/// `LOG_FORMAT` (`json` unless set to `pretty`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    let format = std::env::var("LOG_FORMAT")
        .map(|v| LogFormat::parse(&v))
        .unwrap_or_default();
    self::tracing::init(format);
}

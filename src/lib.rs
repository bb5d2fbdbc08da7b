//! trat: offline chat translation dispatch core.
//! Script-based direction detection, a two-tier translation cache and an
//! engine dispatcher with output validation and corrupted-model recovery.

pub mod config;
pub mod language;
pub mod metrics;
pub mod translate;

pub use config::{ConfigError, DispatchConfig};
pub use language::SupportedLanguage;
pub use metrics::MetricsSnapshot;
pub use translate::{
    CacheStats, Direction, LanguagePair, TranslateError, TranslationCache, TranslationRequest,
    TranslationService,
};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `trat=debug` filter. Calling it twice is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trat=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}

//! Telemetry Module
//!
//! Installs the tracing subscriber for applications and tests embedding the cache.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "prono_cache=info";

/// Initializes a tracing subscriber with an env filter and fmt layer.
///
/// Defaults to `prono_cache=info`, overridable with `RUST_LOG`. Returns false
/// if a global subscriber was already installed, so it is safe to call more
/// than once.
pub fn init_tracing() -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

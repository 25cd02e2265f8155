// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod state;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::{Settings, WatcherProfile};
pub use crate::ingest::{RunReport, Watcher};
pub use crate::notify::{Notifier, TelegramNotifier};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter; `LOG_FORMAT=json` switches to structured output. Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_watcher=info,watch=info,warn"));

    let json = std::env::var(ENV_LOG_FORMAT)
        .ok()
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

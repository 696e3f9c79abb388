use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV_VAR: &str = "HORDE_CONFIG";
const TICKS_ENV_VAR: &str = "HORDE_TICKS";
const DEFAULT_DEMO_TICKS: u64 = 3_000;

pub(crate) struct AppWiring {
    /// JSON overrides for the simulation config; defaults apply when unset.
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) ticks: u64,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Horde Startup ===");

    AppWiring {
        config_path: std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
        ticks: parse_ticks(std::env::var(TICKS_ENV_VAR).ok().as_deref()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_ticks(raw: Option<&str>) -> u64 {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return DEFAULT_DEMO_TICKS;
    };
    match raw.parse::<u64>() {
        Ok(ticks) if ticks > 0 => ticks,
        _ => {
            warn!(
                var = TICKS_ENV_VAR,
                value = raw,
                fallback = DEFAULT_DEMO_TICKS,
                "invalid_tick_count"
            );
            DEFAULT_DEMO_TICKS
        }
    }
}

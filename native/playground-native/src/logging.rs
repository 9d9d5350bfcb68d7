use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "playground_native=info";

/// Install a fmt subscriber for hosts that embed the pipeline.
///
/// `RUST_LOG` wins over `default_filter`. Returns `false` when a global
/// subscriber is already installed.
pub fn init(default_filter: Option<&str>) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_FILTER)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

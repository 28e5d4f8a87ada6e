use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_VAR: &str = "SNOWFLAKE_LAYER_LOG";

static INIT: Once = Once::new();

/// Install a stderr subscriber the first time the layer is entered.
///
/// A host process that already set a global subscriber keeps it; events from
/// the layer then go wherever the host sends them.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_FILTER_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    });
}

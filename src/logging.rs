//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default `info` level. JSON output is meant for
/// hosted deployments where logs are shipped to an aggregator.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    // A subscriber may already be installed (tests, embedding hosts).
    let result = if json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        tracing::debug!("logging already initialised: {}", e);
    }
}

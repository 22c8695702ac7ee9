//! Logging setup.
//!
//! stdout only. `RUST_LOG` wins when set; otherwise the level from
//! `[logging] level` in beacon.toml is used.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(true);

    // try_init: a second init (tests, embedding) is not an error worth dying over
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .try_init();
}

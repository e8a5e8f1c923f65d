use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset: the service crate and HTTP traces at
/// `info`, database driver chatter only from `warn`.
pub fn default_directives(service_crate: &str) -> String {
    format!("info,{service_crate}=info,tower_http=info,sea_orm=warn,sqlx=warn")
}

/// Install the JSON stdout subscriber for `service_crate` (its Rust crate
/// name, e.g. `otpgate_auth`). `RUST_LOG` overrides the default filter.
///
/// Only the first call installs anything.
pub fn init_tracing(service_crate: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_crate)));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false),
        )
        .try_init();
}

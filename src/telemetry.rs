use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError};

const DEFAULT_FILTER: &str = "info,bess_optimizer=info";

/// Install a JSON subscriber filtered by `RUST_LOG` for applications embedding
/// the optimizer. Fails if a global subscriber is already set.
pub fn init_tracing() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
}

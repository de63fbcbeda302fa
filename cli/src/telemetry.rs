use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default;
/// `log` records from the persistence layer are forwarded.
pub fn init(json: bool) -> anyhow::Result<()> {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_target(true).with_writer(std::io::stderr)));

    tracing_log::LogTracer::init().context("Failed to forward log records")?;
    tracing::subscriber::set_global_default(subscriber).context("Failed to install tracing subscriber")?;
    Ok(())
}

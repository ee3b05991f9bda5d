use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

/// This object initialises the stdout tracer for a component.
/// The filter is read from `RUST_LOG`, falling back to `default_level`.
pub struct TracerEngine {
    service_name: String,
}

impl TracerEngine {
    /// Initialises the stdout tracer for the crate
    /// #Arguments
    /// * `service_name` - The name of the component, recorded at start-up.
    /// * `default_level` - The level used when `RUST_LOG` is absent or invalid.
    /// #Returns
    /// An instance of TracerEngine
    pub fn new(service_name: &str, default_level: LevelFilter) -> Self {
        let stdout_tracer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

        let log_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let subscriber =
            tracing_subscriber::Registry::default().with(stdout_tracer.with_filter(log_filter));

        // A second initialisation (e.g. from tests) keeps the existing subscriber
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("Global subscriber already set");
        }
        tracing::info!("Starting {service_name}");

        Self {
            service_name: service_name.to_owned(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// Should be called at the start of each component
#[macro_export]
macro_rules! init_tracer {
    ($level:expr) => {
        $crate::tracer::TracerEngine::new(env!("CARGO_BIN_NAME"), $level)
    };
}

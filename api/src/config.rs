use once_cell::sync::Lazy;
use tracing::warn;
use validation::EngineConfig;

static ENGINE: Lazy<EngineConfig> = Lazy::new(|| {
    EngineConfig::from_env().unwrap_or_else(|err| {
        warn!("Falling back to default validation configuration: {}", err);
        EngineConfig::default()
    })
});

/// Process-wide validation settings, read from the environment once
pub fn engine() -> &'static EngineConfig {
    &ENGINE
}

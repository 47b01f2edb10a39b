use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub business_rules: BusinessRules,
}

/// Product-level tunables. Hold TTL must be long enough to finish a
/// payment form but short enough to avoid inventory starvation; sweep
/// cadence trades inventory lock-up against write load. Neither is a
/// constant baked into the engine.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_hold_ttl_minutes")]
    pub hold_ttl_minutes: i64,
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

fn default_hold_ttl_minutes() -> i64 {
    15
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file (not checked in)
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of SHUTTERBOOK)
            // Eg. `SHUTTERBOOK__SERVER__PORT=8080` would set the server port
            .add_source(config::Environment::with_prefix("SHUTTERBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

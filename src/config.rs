use std::path::PathBuf;

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: String,
    pub static_dir: PathBuf,
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

impl Settings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Defaults, then an optional `events.toml` next to the binary's working directory, then the
/// environment (`DB_PATH`, `STATIC_DIR`, `HOST`, `PORT`), with `.env` loaded first.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    dotenv::dotenv().ok();
    config::Config::builder()
        .set_default("db_path", "events.db")?
        .set_default("static_dir", "static")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", "8080")?
        .add_source(config::File::with_name("events").required(false))
        .add_source(config::Environment::default())
        .build()?
        .try_deserialize::<Settings>()
}

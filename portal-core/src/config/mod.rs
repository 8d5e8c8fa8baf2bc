use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;

/// Load layered settings: an optional `<file_stem>.{yaml,toml,json}` file,
/// then `APP_`-prefixed environment variables using `__` as the nesting
/// separator (e.g. `APP_AUTH_SERVICE__URL`).
///
/// A `.env` file in the working directory is read first if present.
pub fn load_layered<T: DeserializeOwned>(file_stem: &str) -> Result<T, ConfigError> {
    dotenvy::dotenv().ok();

    let settings = Config::builder()
        .add_source(File::with_name(file_stem).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<T>()
}

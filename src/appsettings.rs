use config::{Config, ConfigError, Environment, File};
use pillminder_models::settings::Settings;

/// Reads `appsettings` and `appsettings.local` from the working directory,
/// then `APP_*` environment variables, e.g. `APP_STORE__PATH`.
pub fn load() -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name("appsettings").required(false))
        .add_source(File::with_name("appsettings.local").required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

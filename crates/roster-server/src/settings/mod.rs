use std::env;
use std::fmt;

use tracing::warn;

use crate::config::RosterConfig;

mod env_config;

pub struct Settings {
    pub config: RosterConfig,
    pub password_pepper: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("config", &self.config)
            .field("password_pepper", &"[redacted]")
            .finish()
    }
}

impl Settings {
    #[must_use]
    pub fn from_env() -> Self {
        let config_path =
            env::var("ROSTER_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        let mut config = env_config::load_config(&config_path);
        env_config::apply_database_env_overrides(&mut config);
        env_config::apply_images_env_overrides(&mut config);

        let password_pepper = match env_config::load_secret_env_or_file(
            "ROSTER_PASSWORD_PEPPER",
            "ROSTER_PASSWORD_PEPPER_FILE",
        ) {
            Ok(Some(value)) => value,
            Ok(None) => String::new(),
            Err(err) => {
                warn!(event = "config_invalid", field = "ROSTER_PASSWORD_PEPPER", error = %err);
                String::new()
            }
        };

        Self {
            config,
            password_pepper,
        }
    }
}

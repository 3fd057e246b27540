use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    /// Pending requests older than this many hours are swept to Expired.
    pub request_expiration_hours: i64,

    /// Cron expression driving the expiry sweep.
    pub expiry_sweep_schedule: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        let request_expiration_hours = config.get("request_expiration_hours").unwrap_or(24);
        if request_expiration_hours <= 0 {
            return Err(config::ConfigError::Message(
                "request_expiration_hours must be positive".to_string(),
            ));
        }

        Ok(Self {
            database_url: config.get("database_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,
            request_expiration_hours,
            expiry_sweep_schedule: config
                .get("expiry_sweep_schedule")
                .unwrap_or_else(|_| "0 0 * * * *".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_expiration_hours_is_rejected() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/roomgate");
        std::env::set_var("PORT", "8080");

        for bad in ["0", "-24"] {
            std::env::set_var("REQUEST_EXPIRATION_HOURS", bad);
            let err = Config::from_env().expect_err("non-positive hours must be rejected");
            assert!(err.to_string().contains("request_expiration_hours"));
        }

        std::env::set_var("REQUEST_EXPIRATION_HOURS", "24");
        let config = Config::from_env().expect("positive hours must be accepted");
        assert_eq!(config.request_expiration_hours, 24);

        std::env::remove_var("REQUEST_EXPIRATION_HOURS");
    }
}

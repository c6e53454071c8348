use crate::error::AppError;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server configuration
    pub http_port: u16,

    // Auth
    pub jwt_secret: String,

    // Moderation policy
    pub prohibited_terms_path: String,
    pub report_alert_threshold: i32,

    // Service configuration
    pub service_name: String,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Config("JWT_SECRET must be set".to_string()))?;

        Ok(Self {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8087".to_string())
                .parse()
                .unwrap_or(8087),
            jwt_secret,
            prohibited_terms_path: env::var("PROHIBITED_TERMS_PATH")
                .unwrap_or_else(|_| "data/prohibited_terms.txt".to_string()),
            report_alert_threshold: env::var("REPORT_ALERT_THRESHOLD")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "listing-service".to_string()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        env::set_var("JWT_SECRET", "test-secret");
        let config = Config::from_env().unwrap();
        assert_eq!(config.http_port, 8087);
        assert_eq!(config.report_alert_threshold, 3);
        assert_eq!(config.service_name, "listing-service");
    }
}

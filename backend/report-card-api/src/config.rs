use config::ConfigError;
use serde::{de::DeserializeOwned, Deserialize};
use std::env;

use crate::services::report_card::{
    grading::{Palette, DEFAULT_HIGHLIGHT_SCORE, DEFAULT_PASSING_SCORE},
    pagination::PageMetrics,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
        }
    }
}

/// Business rules and presentation defaults for generated documents.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub passing_score: f32,
    pub highlight_score: f32,
    pub default_locale: String,
    pub max_batch_size: usize,
    pub page: PageMetrics,
    pub palette: Palette,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            passing_score: DEFAULT_PASSING_SCORE,
            highlight_score: DEFAULT_HIGHLIGHT_SCORE,
            default_locale: "en".to_string(),
            max_batch_size: 50,
            page: PageMetrics::default(),
            palette: Palette::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        // Root .env first (two levels up), then the local one
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/<env>.toml, then APP_ overrides (APP_REPORT__PASSING_SCORE=12)
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config = Self::from_settings(&settings)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads every key with its fallback; missing keys keep their defaults.
    pub fn from_settings(settings: &config::Config) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let host = settings
            .get_string("server.host")
            .or_else(|_| env::var("HOST"))
            .unwrap_or(defaults.server.host);

        let port = match settings.get_int("server.port") {
            Ok(port) => u16::try_from(port)
                .map_err(|_| ConfigError::Message(format!("server.port {port} is out of range")))?,
            Err(_) => env::var("PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.server.port),
        };

        let passing_score = settings
            .get_float("report.passing_score")
            .map(|v| v as f32)
            .unwrap_or(defaults.report.passing_score);

        let highlight_score = settings
            .get_float("report.highlight_score")
            .map(|v| v as f32)
            .unwrap_or(defaults.report.highlight_score);

        let default_locale = settings
            .get_string("report.default_locale")
            .unwrap_or(defaults.report.default_locale);

        let max_batch_size = settings
            .get_int("report.max_batch_size")
            .ok()
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(defaults.report.max_batch_size);

        Ok(Config {
            server: ServerConfig { host, port },
            report: ReportConfig {
                passing_score,
                highlight_score,
                default_locale,
                max_batch_size,
                page: section_or_default(settings, "report.page")?,
                palette: section_or_default(settings, "report.palette")?,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let report = &self.report;
        if !(0.0..=20.0).contains(&report.passing_score) {
            return Err(ConfigError::Message(format!(
                "report.passing_score must be within [0, 20], got {}",
                report.passing_score
            )));
        }
        if report.highlight_score < report.passing_score {
            return Err(ConfigError::Message(
                "report.highlight_score must not be below report.passing_score".to_string(),
            ));
        }
        if report.max_batch_size == 0 {
            return Err(ConfigError::Message(
                "report.max_batch_size must be at least 1".to_string(),
            ));
        }

        let page = &report.page;
        if page.usable_width() <= 0.0 {
            return Err(ConfigError::Message(
                "report.page margins leave no usable width".to_string(),
            ));
        }
        if page.content_bottom() <= page.content_top() {
            return Err(ConfigError::Message(
                "report.page margins leave no usable height".to_string(),
            ));
        }
        Ok(())
    }
}

fn section_or_default<T>(settings: &config::Config, key: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    match settings.get::<T>(key) {
        Ok(value) => Ok(value),
        Err(ConfigError::NotFound(_)) => Ok(T::default()),
        Err(err) => Err(err),
    }
}

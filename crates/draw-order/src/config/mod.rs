use crate::workflows::draw::{UnbucketedPolicy, DEFAULT_ALM_WEIGHT, DEFAULT_NEAR_WINDOW_DAYS};
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_UTC_OFFSET: &str = "+05:30";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub ranking: RankingDefaults,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            ranking: RankingDefaults::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Fallback ranking parameters used when a request or command omits them.
#[derive(Debug, Clone)]
pub struct RankingDefaults {
    pub near_window_days: u32,
    pub alm_weight: f64,
    pub unbucketed: UnbucketedPolicy,
    /// Fixed offset whose calendar date counts as "today".
    pub utc_offset: FixedOffset,
}

impl Default for RankingDefaults {
    fn default() -> Self {
        Self {
            near_window_days: DEFAULT_NEAR_WINDOW_DAYS,
            alm_weight: DEFAULT_ALM_WEIGHT,
            unbucketed: UnbucketedPolicy::default(),
            utc_offset: parse_utc_offset(DEFAULT_UTC_OFFSET)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl RankingDefaults {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let near_window_days = match env::var("DRAW_NEAR_WINDOW_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|days| (1..=30).contains(days))
                .ok_or(ConfigError::InvalidNearWindow(raw))?,
            Err(_) => defaults.near_window_days,
        };

        let alm_weight = match env::var("DRAW_ALM_WEIGHT") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|weight| weight.is_finite() && *weight >= 0.0)
                .ok_or(ConfigError::InvalidAlmWeight(raw))?,
            Err(_) => defaults.alm_weight,
        };

        let unbucketed = match env::var("DRAW_UNBUCKETED_POLICY") {
            Ok(raw) => UnbucketedPolicy::parse(&raw).ok_or(ConfigError::InvalidUnbucketed(raw))?,
            Err(_) => defaults.unbucketed,
        };

        let utc_offset = match env::var("DRAW_UTC_OFFSET") {
            Ok(raw) => parse_utc_offset(&raw).ok_or(ConfigError::InvalidUtcOffset(raw))?,
            Err(_) => defaults.utc_offset,
        };

        Ok(Self {
            near_window_days,
            alm_weight,
            unbucketed,
            utc_offset,
        })
    }

    /// Calendar date at the configured offset.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }
}

/// Parses `±HH:MM` (or `Z`) into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    trimmed.parse::<FixedOffset>().ok()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNearWindow(String),
    InvalidAlmWeight(String),
    InvalidUnbucketed(String),
    InvalidUtcOffset(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNearWindow(raw) => write!(
                f,
                "DRAW_NEAR_WINDOW_DAYS must be a whole number between 1 and 30 (got '{raw}')"
            ),
            ConfigError::InvalidAlmWeight(raw) => write!(
                f,
                "DRAW_ALM_WEIGHT must be a non-negative number (got '{raw}')"
            ),
            ConfigError::InvalidUnbucketed(raw) => write!(
                f,
                "DRAW_UNBUCKETED_POLICY must be one of zero, neutral, clamp (got '{raw}')"
            ),
            ConfigError::InvalidUtcOffset(raw) => {
                write!(f, "DRAW_UTC_OFFSET must look like +05:30 (got '{raw}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "DRAW_NEAR_WINDOW_DAYS",
            "DRAW_ALM_WEIGHT",
            "DRAW_UNBUCKETED_POLICY",
            "DRAW_UTC_OFFSET",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.ranking.near_window_days, 10);
        assert_eq!(config.ranking.alm_weight, 3.0);
        assert_eq!(config.ranking.unbucketed, UnbucketedPolicy::Zero);
        assert_eq!(config.ranking.utc_offset.local_minus_utc(), 19_800);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_ranking_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DRAW_NEAR_WINDOW_DAYS", "21");
        env::set_var("DRAW_ALM_WEIGHT", "0");
        env::set_var("DRAW_UNBUCKETED_POLICY", "Neutral");
        env::set_var("DRAW_UTC_OFFSET", "-04:00");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.ranking.near_window_days, 21);
        assert_eq!(config.ranking.alm_weight, 0.0);
        assert_eq!(config.ranking.unbucketed, UnbucketedPolicy::NeutralBucket);
        assert_eq!(config.ranking.utc_offset.local_minus_utc(), -4 * 3600);
        reset_env();
    }

    #[test]
    fn rejects_out_of_range_window() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DRAW_NEAR_WINDOW_DAYS", "45");
        let error = AppConfig::load().expect_err("window above 30 rejected");
        assert!(matches!(error, ConfigError::InvalidNearWindow(ref raw) if raw == "45"));
        reset_env();
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("Z").map(|o| o.local_minus_utc()), Some(0));
        assert_eq!(parse_utc_offset(" utc ").map(|o| o.local_minus_utc()), Some(0));
        assert_eq!(
            parse_utc_offset("+05:45").map(|o| o.local_minus_utc()),
            Some(5 * 3600 + 45 * 60)
        );
        assert_eq!(
            parse_utc_offset("-04:00").map(|o| o.local_minus_utc()),
            Some(-4 * 3600)
        );
        assert!(parse_utc_offset("05:30").is_none());
        assert!(parse_utc_offset("IST").is_none());
        assert!(parse_utc_offset("+25:00").is_none());
    }
}

use crate::error::{Error, Result};
use faststr::FastStr;
use std::{str::FromStr, time::Duration};
use tracing_subscriber::filter::LevelFilter;

const API_ROOT: &str = "CONSOLE_API_ROOT";
const API_TOKEN: &str = "CONSOLE_API_TOKEN";
const REFRESH_TIME_BASE_MS: &str = "CONSOLE_REFRESH_TIME_BASE_MS";
const HTTP_CONNECT_TIMEOUT_SECS: &str = "CONSOLE_HTTP_CONNECT_TIMEOUT_SECS";
const HTTP_TIMEOUT_SECS: &str = "CONSOLE_HTTP_TIMEOUT_SECS";
const LOG_LEVEL: &str = "CONSOLE_LOG_LEVEL";
const LOG_TARGET: &str = "CONSOLE_LOG_TARGET";

pub const DEFAULT_REFRESH_TIME_BASE: Duration = Duration::from_millis(1000);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Falls back to DEBUG in debug builds and INFO otherwise.
    pub level:       Option<LevelFilter>,
    pub with_target: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_root:          FastStr,
    pub api_token:         Option<FastStr>,
    /// Unit every polling interval is derived from.
    pub refresh_time_base: Duration,
    pub connect_timeout:   Duration,
    pub request_timeout:   Duration,
    pub log:               LogConfig,
}

impl Config {
    pub fn new(api_root: impl Into<FastStr>) -> Self {
        Self {
            api_root:          api_root.into(),
            api_token:         None,
            refresh_time_base: DEFAULT_REFRESH_TIME_BASE,
            connect_timeout:   DEFAULT_CONNECT_TIMEOUT,
            request_timeout:   DEFAULT_REQUEST_TIMEOUT,
            log:               LogConfig::default(),
        }
    }

    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_root = lookup(API_ROOT)
            .filter(|v| !v.trim().is_empty())
            .ok_or(Error::MissingVar(API_ROOT))?;

        let mut config = Self::new(api_root.trim_end_matches('/').to_owned());
        config.api_token = lookup(API_TOKEN)
            .filter(|v| !v.is_empty())
            .map(FastStr::from);

        if let Some(ms) = parse_var::<u64, _>(&lookup, REFRESH_TIME_BASE_MS)? {
            if ms == 0 {
                return Err(Error::InvalidVar {
                    name:  REFRESH_TIME_BASE_MS,
                    value: "0".into(),
                });
            }
            config.refresh_time_base = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, HTTP_CONNECT_TIMEOUT_SECS)? {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, HTTP_TIMEOUT_SECS)? {
            config.request_timeout = Duration::from_secs(secs);
        }
        config.log.level = parse_var::<LevelFilter, _>(&lookup, LOG_LEVEL)?;
        config.log.with_target = parse_var::<bool, _>(&lookup, LOG_TARGET)?.unwrap_or_default();

        Ok(config)
    }

    /// Polling interval for a service that refreshes every `multiplier` base units.
    #[inline]
    pub fn refresh_every(&self, multiplier: u32) -> Duration {
        self.refresh_time_base * multiplier.max(1)
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidVar {
                name,
                value: raw.into(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[(API_ROOT, "https://console.local/api/v2/")]))
            .unwrap();
        assert_eq!(config.api_root.as_str(), "https://console.local/api/v2");
        assert!(config.api_token.is_none());
        assert_eq!(config.refresh_time_base, DEFAULT_REFRESH_TIME_BASE);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert!(config.log.level.is_none());
    }

    #[test]
    fn test_missing_api_root() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::MissingVar(API_ROOT)));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (API_ROOT, "http://localhost:8080/api"),
            (API_TOKEN, "secret"),
            (REFRESH_TIME_BASE_MS, "250"),
            (HTTP_TIMEOUT_SECS, "5"),
            (LOG_LEVEL, "warn"),
        ]))
        .unwrap();
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.refresh_time_base, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.log.level, Some(LevelFilter::WARN));
        assert_eq!(config.refresh_every(10), Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_numbers() {
        let err = Config::from_lookup(lookup(&[
            (API_ROOT, "http://localhost"),
            (REFRESH_TIME_BASE_MS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidVar { name: REFRESH_TIME_BASE_MS, .. }));

        let err = Config::from_lookup(lookup(&[
            (API_ROOT, "http://localhost"),
            (REFRESH_TIME_BASE_MS, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidVar { .. }));
    }

    #[test]
    fn test_refresh_every_never_zero() {
        let config = Config::new("http://localhost");
        assert_eq!(config.refresh_every(0), config.refresh_time_base);
    }
}

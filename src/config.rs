//! Server configuration from environment variables

use axum::http::{header, HeaderValue, Method};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_REAP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (REGEXDUEL_ADDR)
    pub addr: SocketAddr,
    /// Browser origins allowed by CORS (REGEXDUEL_ALLOWED_ORIGINS, `*` for any)
    pub allowed_origins: AllowedOrigins,
    /// Challenge catalog file; built-in catalog when unset (REGEXDUEL_CHALLENGES)
    pub challenge_catalog: Option<PathBuf>,
    /// Evict rooms idle this long; disabled when unset or 0 (REGEXDUEL_ROOM_IDLE_SECS)
    pub room_idle_timeout: Option<Duration>,
    /// How often to look for idle rooms (REGEXDUEL_REAP_INTERVAL_SECS)
    pub reap_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            allowed_origins: AllowedOrigins::List(vec![DEFAULT_ORIGIN.to_string()]),
            challenge_catalog: None,
            room_idle_timeout: None,
            reap_interval: Duration::from_secs(DEFAULT_REAP_INTERVAL_SECS),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_secs(key: &str) -> Option<u64> {
    let raw = env_var(key)?;
    match raw.parse() {
        Ok(secs) => Some(secs),
        Err(_) => {
            tracing::warn!("{} must be a number of seconds, ignoring {:?}", key, raw);
            None
        }
    }
}

impl ServerConfig {
    /// Load config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let addr = match env_var("REGEXDUEL_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid REGEXDUEL_ADDR {:?}, using {}", raw, defaults.addr);
                defaults.addr
            }),
            None => defaults.addr,
        };

        let allowed_origins = match env_var("REGEXDUEL_ALLOWED_ORIGINS") {
            Some(raw) if raw == "*" => AllowedOrigins::Any,
            Some(raw) => AllowedOrigins::List(
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            None => defaults.allowed_origins,
        };

        let room_idle_timeout = env_secs("REGEXDUEL_ROOM_IDLE_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let reap_interval = env_secs("REGEXDUEL_REAP_INTERVAL_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.reap_interval);

        Self {
            addr,
            allowed_origins,
            challenge_catalog: env_var("REGEXDUEL_CHALLENGES").map(PathBuf::from),
            room_idle_timeout,
            reap_interval,
        }
    }

    pub fn cors_layer(&self) -> CorsLayer {
        match &self.allowed_origins {
            AllowedOrigins::Any => CorsLayer::permissive(),
            AllowedOrigins::List(origins) => {
                let origins: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|origin| match HeaderValue::from_str(origin) {
                        Ok(value) => Some(value),
                        Err(_) => {
                            tracing::warn!("Skipping invalid CORS origin {:?}", origin);
                            None
                        }
                    })
                    .collect();

                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([
                        header::ORIGIN,
                        header::CONTENT_TYPE,
                        header::ACCEPT,
                        header::AUTHORIZATION,
                    ])
                    .expose_headers([header::CONTENT_LENGTH])
                    .allow_credentials(true)
            }
        }
    }
}

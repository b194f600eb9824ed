//! Process configuration read from the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use vapers_observability::LogFormat;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_CHAT_VENTAS_PATH: &str = "/webhook/chat-ventas";
pub const DEFAULT_SUMMARY_EMAIL_PATH: &str = "/webhook/resumen-7dias-email";
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

fn invalid(var: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        reason: reason.into(),
    }
}

/// Automation webhook settings (n8n).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Empty when no webhook host is configured; proxy calls then fail with 500.
    pub base_url: String,
    pub chat_ventas_path: String,
    pub summary_email_path: String,
    pub auth_header: Option<(String, String)>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub webhooks: WebhookConfig,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            cors_allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            webhooks: WebhookConfig {
                base_url: String::new(),
                chat_ventas_path: DEFAULT_CHAT_VENTAS_PATH.to_string(),
                summary_email_path: DEFAULT_SUMMARY_EMAIL_PATH.to_string(),
                auth_header: None,
                timeout: Duration::from_secs(DEFAULT_WEBHOOK_TIMEOUT_SECS),
            },
            log_format: LogFormat::Json,
        }
    }
}

impl ApiConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unset or blank variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match var("PORT") {
            Some(v) => v.parse::<u16>().map_err(|e| invalid("PORT", e.to_string()))?,
            None => defaults.port,
        };

        let bind_addr = match var("BIND_ADDR") {
            Some(v) => v.parse::<IpAddr>().map_err(|e| invalid("BIND_ADDR", e.to_string()))?,
            None => defaults.bind_addr,
        };

        let cors_allowed_origins = match var("CORS_ALLOWED_ORIGINS") {
            Some(v) => parse_origins(&v)?,
            None => defaults.cors_allowed_origins,
        };

        let base_url = var("N8N_BASE_URL").unwrap_or_default();
        if !base_url.is_empty() && !is_http_url(&base_url) {
            return Err(invalid("N8N_BASE_URL", "must start with http:// or https://"));
        }

        let auth_header = match (var("N8N_AUTH_HEADER"), var("N8N_AUTH_VALUE")) {
            (Some(name), Some(value)) => Some((name, value)),
            _ => None,
        };

        let timeout = match var("WEBHOOK_TIMEOUT_SECS") {
            Some(v) => {
                let secs = v
                    .parse::<u64>()
                    .map_err(|e| invalid("WEBHOOK_TIMEOUT_SECS", e.to_string()))?;
                if secs == 0 {
                    return Err(invalid("WEBHOOK_TIMEOUT_SECS", "must be positive"));
                }
                Duration::from_secs(secs)
            }
            None => defaults.webhooks.timeout,
        };

        let log_format = match var("LOG_FORMAT") {
            Some(v) => v.parse::<LogFormat>().map_err(|e| invalid("LOG_FORMAT", e.to_string()))?,
            None => defaults.log_format,
        };

        Ok(Self {
            bind_addr,
            port,
            cors_allowed_origins,
            webhooks: WebhookConfig {
                base_url,
                chat_ventas_path: webhook_path(
                    var("N8N_CHAT_VENTAS_PATH"),
                    DEFAULT_CHAT_VENTAS_PATH,
                ),
                summary_email_path: webhook_path(
                    var("N8N_SUMMARY_EMAIL_PATH"),
                    DEFAULT_SUMMARY_EMAIL_PATH,
                ),
                auth_header,
                timeout,
            },
            log_format,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            if is_http_url(o) {
                Ok(o.trim_end_matches('/').to_string())
            } else {
                Err(invalid("CORS_ALLOWED_ORIGINS", format!("not an http(s) origin: {o}")))
            }
        })
        .collect()
}

fn webhook_path(value: Option<String>, default: &str) -> String {
    match value {
        Some(p) if p.starts_with('/') => p,
        Some(p) => format!("/{p}"),
        None => default.to_string(),
    }
}

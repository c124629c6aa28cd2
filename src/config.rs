// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment (and an optional `.env`
//! file) once at startup. Both secrets, the token signing secret and the
//! field-encryption passphrase, are read here and never again.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATABASE_PATH` | redb database file | `data/loan_admin.redb` |
//! | `JWT_SECRET` | HS256 signing secret (at least 32 bytes) | Required |
//! | `TOKEN_TTL_SECS` | Access token validity window | `14400` |
//! | `ENCRYPTION_KEY` | Passphrase for SSN field encryption | Required |
//! | `DECISION_SERVICE_HOST` | Decision engine base URL | Required |
//! | `DECISION_SERVICE_API_TOKEN` | Decision engine `Api-Token` | Optional |
//! | `LOCATION_SERVICE_HOST` | Location service base URL | Required |
//! | `LOCATION_SERVICE_API_TOKEN` | Location service `Api-Token` | Optional |
//! | `SEED_ADMIN_EMAIL` | Bootstrap admin email | Optional |
//! | `SEED_ADMIN_PASSWORD` | Bootstrap admin password | Optional |
//! | `RUN_SSN_MIGRATION` | Encrypt legacy plaintext SSNs at startup | `true` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const TOKEN_TTL_ENV: &str = "TOKEN_TTL_SECS";
pub const ENCRYPTION_KEY_ENV: &str = "ENCRYPTION_KEY";
pub const DECISION_HOST_ENV: &str = "DECISION_SERVICE_HOST";
pub const DECISION_TOKEN_ENV: &str = "DECISION_SERVICE_API_TOKEN";
pub const LOCATION_HOST_ENV: &str = "LOCATION_SERVICE_HOST";
pub const LOCATION_TOKEN_ENV: &str = "LOCATION_SERVICE_API_TOKEN";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";
pub const RUN_SSN_MIGRATION_ENV: &str = "RUN_SSN_MIGRATION";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_PATH: &str = "data/loan_admin.redb";

/// Access tokens are valid for four hours.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// HS256 keys shorter than this are rejected at startup.
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost(#[from] std::net::AddrParseError),
}

/// Logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Top-level configuration for the service.
#[derive(Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_path: PathBuf,
    pub auth: AuthSettings,
    pub encryption_key: String,
    pub decision_service: ServiceEndpoint,
    pub location_service: ServiceEndpoint,
    pub seed_admin: Option<SeedAdmin>,
    pub run_ssn_migration: bool,
    pub log_format: LogFormat,
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
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Token signing settings.
#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

/// Base URL and optional `Api-Token` for an external JSON service.
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    pub host: Url,
    pub api_token: Option<String>,
}

/// Credentials for the admin account created on first boot.
#[derive(Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let host = env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match env::var(PORT_ENV) {
            Ok(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let database_path = env::var(DATABASE_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE_PATH));

        let jwt_secret = required(JWT_SECRET_ENV)?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: JWT_SECRET_ENV,
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
            });
        }

        let token_ttl = match env::var(TOKEN_TTL_ENV) {
            Ok(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    name: TOKEN_TTL_ENV,
                    reason: e.to_string(),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_TOKEN_TTL,
        };

        let encryption_key = required(ENCRYPTION_KEY_ENV)?;

        let decision_service = endpoint(DECISION_HOST_ENV, DECISION_TOKEN_ENV)?;
        let location_service = endpoint(LOCATION_HOST_ENV, LOCATION_TOKEN_ENV)?;

        let seed_admin = match (
            optional(SEED_ADMIN_EMAIL_ENV),
            optional(SEED_ADMIN_PASSWORD_ENV),
        ) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            _ => None,
        };

        let run_ssn_migration = optional(RUN_SSN_MIGRATION_ENV)
            .map(|v| parse_bool(&v))
            .unwrap_or(true);

        let log_format = optional(LOG_FORMAT_ENV)
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        Ok(Self {
            server: ServerConfig { host, port },
            database_path,
            auth: AuthSettings {
                jwt_secret,
                token_ttl,
            },
            encryption_key,
            decision_service,
            location_service,
            seed_admin,
            run_ssn_migration,
            log_format,
        })
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("server", &self.server)
            .field("database_path", &self.database_path)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.auth.token_ttl)
            .field("encryption_key", &"<redacted>")
            .field("decision_service", &self.decision_service.host.as_str())
            .field("location_service", &self.location_service.host.as_str())
            .field("seed_admin", &self.seed_admin.as_ref().map(|s| &s.email))
            .field("run_ssn_migration", &self.run_ssn_migration)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn endpoint(host_env: &'static str, token_env: &str) -> Result<ServiceEndpoint, ConfigError> {
    let raw = required(host_env)?;
    let host = Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        name: host_env,
        reason: e.to_string(),
    })?;
    Ok(ServiceEndpoint {
        host,
        api_token: optional(token_env),
    })
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::admission::{AdmissionConfig, LookupFailurePolicy, TeacherSource};

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

/// Where course schedules come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionMode {
    /// Remote course registry; teacher assignment is taken from the registry.
    Registry,
    /// Built-in course table; teacher assignment is taken from the request.
    Standalone,
}

impl AdmissionMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "registry" | "remote" => Ok(Self::Registry),
            "standalone" | "offline" => Ok(Self::Standalone),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

fn parse_policy(value: &str) -> Result<LookupFailurePolicy, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "skip" | "lenient" => Ok(LookupFailurePolicy::Skip),
        "reject" | "strict" => Ok(LookupFailurePolicy::Reject),
        other => Err(ConfigError::InvalidPolicy(other.to_string())),
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub upstream: UpstreamConfig,
    pub admission: AdmissionSettings,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_mode(None)
    }

    /// Like [`AppConfig::load`], with `mode` taking precedence over `ADMISSION_MODE`.
    pub fn load_with_mode(mode: Option<AdmissionMode>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3003".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let course_service_url = env::var("COURSE_SERVICE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        let auth_service_url = env::var("AUTH_SERVICE_URL")
            .or_else(|_| env::var("API_GATEWAY_URL"))
            .unwrap_or_else(|_| "http://localhost:3000/api".to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = env::var("LOOKUP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidTimeout)?;

        let mode = match mode {
            Some(mode) => mode,
            None => AdmissionMode::parse(
                &env::var("ADMISSION_MODE").unwrap_or_else(|_| "registry".to_string()),
            )?,
        };
        let lookup_failure_policy = parse_policy(
            &env::var("CONFLICT_LOOKUP_POLICY").unwrap_or_else(|_| "skip".to_string()),
        )?;
        if mode == AdmissionMode::Registry && course_service_url.is_none() {
            return Err(ConfigError::MissingCourseServiceUrl);
        }

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<usize>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or(ConfigError::InvalidPoolSize)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            upstream: UpstreamConfig {
                course_service_url,
                auth_service_url,
                lookup_timeout: Duration::from_secs(timeout_secs),
            },
            admission: AdmissionSettings {
                mode,
                lookup_failure_policy,
            },
            store: StoreConfig { max_connections },
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

/// Base URLs and timeouts for the course registry and auth service.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub course_service_url: Option<String>,
    pub auth_service_url: String,
    pub lookup_timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct AdmissionSettings {
    pub mode: AdmissionMode,
    pub lookup_failure_policy: LookupFailurePolicy,
}

impl AdmissionSettings {
    pub fn engine_config(&self) -> AdmissionConfig {
        let teacher_source = match self.mode {
            AdmissionMode::Registry => TeacherSource::Registry,
            AdmissionMode::Standalone => TeacherSource::Request,
        };
        AdmissionConfig {
            teacher_source,
            lookup_failure_policy: self.lookup_failure_policy,
        }
    }
}

/// Enrollment store sizing.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    pub max_connections: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout,
    InvalidPoolSize,
    InvalidMode(String),
    InvalidPolicy(String),
    MissingCourseServiceUrl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "LOOKUP_TIMEOUT_SECS must be a positive number of seconds")
            }
            ConfigError::InvalidPoolSize => {
                write!(f, "DB_MAX_CONNECTIONS must be a positive integer")
            }
            ConfigError::InvalidMode(value) => write!(
                f,
                "ADMISSION_MODE '{value}' is not one of 'registry' or 'standalone'"
            ),
            ConfigError::InvalidPolicy(value) => write!(
                f,
                "CONFLICT_LOOKUP_POLICY '{value}' is not one of 'skip' or 'reject'"
            ),
            ConfigError::MissingCourseServiceUrl => {
                write!(f, "COURSE_SERVICE_URL is required in registry mode")
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

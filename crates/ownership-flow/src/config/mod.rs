use crate::workflows::ownership::TransitionPolicy;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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

    /// Production degrades undefined transitions to the dashboard; every other
    /// environment surfaces them as errors.
    pub const fn transition_policy(self) -> TransitionPolicy {
        match self {
            Self::Production => TransitionPolicy::Lenient,
            Self::Development | Self::Test => TransitionPolicy::Strict,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub workflow: WorkflowConfig,
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

        let workflow = WorkflowConfig {
            submission_latency: Duration::from_millis(millis_var(
                "APP_SUBMISSION_LATENCY_MS",
                DEFAULT_SUBMISSION_LATENCY_MS,
            )?),
            document_preparation: Duration::from_millis(millis_var(
                "APP_DOCUMENT_PREPARATION_MS",
                DEFAULT_DOCUMENT_PREPARATION_MS,
            )?),
            two_way_match: bool_var("APP_TWO_WAY_MATCH", false)?,
            prefill_csv: env::var("APP_PREFILL_CSV")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            transition_policy: environment.transition_policy(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            workflow,
        })
    }
}

const DEFAULT_SUBMISSION_LATENCY_MS: u64 = 2000;
const DEFAULT_DOCUMENT_PREPARATION_MS: u64 = 2000;

fn millis_var(variable: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { variable }),
        Err(_) => Ok(default),
    }
}

fn bool_var(variable: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(variable) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { variable }),
        },
        Err(_) => Ok(default),
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

/// Knobs for the verification workflow sessions.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Delay between a business/document submit intent and its resolution.
    pub submission_latency: Duration,
    /// Delay before an e-signature document is ready to sign.
    pub document_preparation: Duration,
    /// Default for `two_way_match_enabled` on newly created sessions.
    pub two_way_match: bool,
    /// Optional CSV file replacing the built-in prefill seed.
    pub prefill_csv: Option<PathBuf>,
    pub transition_policy: TransitionPolicy,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            submission_latency: Duration::from_millis(DEFAULT_SUBMISSION_LATENCY_MS),
            document_preparation: Duration::from_millis(DEFAULT_DOCUMENT_PREPARATION_MS),
            two_way_match: false,
            prefill_csv: None,
            transition_policy: TransitionPolicy::Strict,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
    InvalidBool { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must be an IP address or 'localhost'")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer (milliseconds)")
            }
            ConfigError::InvalidBool { variable } => {
                write!(f, "{variable} must be one of true/false/1/0/yes/no/on/off")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidBool { .. } => None,
        }
    }
}

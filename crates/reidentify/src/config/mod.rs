use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::requests::UnknownStatusPolicy;
use crate::store::CollectionNames;

const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = [
    "http://localhost:5173",
    "https://sonafaculty-dashboard.netlify.app",
];

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
    pub store: StoreConfig,
    pub cors: CorsConfig,
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .or_else(|_| env::var("APP_PORT"))
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let store = StoreConfig {
            uri: env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database: env::var("MONGO_DATABASE").unwrap_or_else(|_| "studentidreq".to_string()),
            print_database: env::var("MONGO_PRINT_DATABASE")
                .unwrap_or_else(|_| "printidreq".to_string()),
            collections: CollectionNames::default(),
            transactional: parse_flag("MONGO_TRANSACTIONS", false)?,
        };

        let allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(raw) => parse_origins(&raw)?,
            Err(_) => DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|origin| origin.to_string())
                .collect(),
        };

        let unknown_status = match env::var("UNKNOWN_STATUS_POLICY") {
            Ok(raw) => UnknownStatusPolicy::parse(&raw)
                .ok_or(ConfigError::InvalidPolicy { value: raw })?,
            Err(_) => UnknownStatusPolicy::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            store,
            cors: CorsConfig { allowed_origins },
            workflow: WorkflowConfig { unknown_status },
        })
    }
}

fn parse_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name, value: raw }),
    }
}

fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(bad) = origins
        .iter()
        .find(|origin| !(origin.starts_with("http://") || origin.starts_with("https://")))
    {
        return Err(ConfigError::InvalidOrigin {
            value: bad.clone(),
        });
    }

    Ok(origins)
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
    pub ansi: bool,
}

/// MongoDB connection and addressing.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    /// Database holding the approved (print) queue.
    pub print_database: String,
    pub collections: CollectionNames,
    /// Run copy-then-delete inside a session transaction. Needs a replica set.
    pub transactional: bool,
}

/// Browser origins allowed to call the API.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkflowConfig {
    pub unknown_status: UnknownStatusPolicy,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { name: &'static str, value: String },
    InvalidPolicy { value: String },
    InvalidOrigin { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be a boolean, got '{value}'")
            }
            ConfigError::InvalidPolicy { value } => write!(
                f,
                "UNKNOWN_STATUS_POLICY must be 'reject' or 'discard', got '{value}'"
            ),
            ConfigError::InvalidOrigin { value } => write!(
                f,
                "CORS_ALLOWED_ORIGINS entries must start with http:// or https://, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidPolicy { .. }
            | ConfigError::InvalidOrigin { .. } => None,
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
        for name in [
            "APP_ENV",
            "APP_HOST",
            "PORT",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "MONGO_URI",
            "MONGO_DATABASE",
            "MONGO_PRINT_DATABASE",
            "MONGO_TRANSACTIONS",
            "CORS_ALLOWED_ORIGINS",
            "UNKNOWN_STATUS_POLICY",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.store.uri, "mongodb://localhost:27017");
        assert_eq!(config.store.database, "studentidreq");
        assert_eq!(config.store.print_database, "printidreq");
        assert!(!config.store.transactional);
        assert_eq!(config.cors.allowed_origins, DEFAULT_ALLOWED_ORIGINS);
        assert_eq!(
            config.workflow.unknown_status,
            UnknownStatusPolicy::Reject
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 5000));
        reset_env();
    }

    #[test]
    fn port_prefers_port_over_app_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "7000");
        assert_eq!(AppConfig::load().expect("config loads").server.port, 7000);
        env::set_var("PORT", "8080");
        assert_eq!(AppConfig::load().expect("config loads").server.port, 8080);
        reset_env();
    }

    #[test]
    fn rejects_invalid_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        env::set_var("PORT", "not-a-port");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidPort)));
        reset_env();

        env::set_var("MONGO_TRANSACTIONS", "sometimes");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFlag {
                name: "MONGO_TRANSACTIONS",
                ..
            })
        ));
        reset_env();

        env::set_var("UNKNOWN_STATUS_POLICY", "ignore");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidPolicy { .. })
        ));
        reset_env();

        env::set_var("CORS_ALLOWED_ORIGINS", "localhost:5173");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidOrigin { .. })
        ));
        reset_env();
    }

    #[test]
    fn reads_store_and_workflow_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("MONGO_URI", "mongodb://db.internal:27017/?replicaSet=rs0");
        env::set_var("MONGO_TRANSACTIONS", "true");
        env::set_var(
            "CORS_ALLOWED_ORIGINS",
            "https://a.example.org, https://b.example.org,",
        );
        env::set_var("UNKNOWN_STATUS_POLICY", "discard");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert!(!config.telemetry.ansi);
        assert!(config.store.transactional);
        assert_eq!(
            config.store.uri,
            "mongodb://db.internal:27017/?replicaSet=rs0"
        );
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example.org", "https://b.example.org"]
        );
        assert_eq!(
            config.workflow.unknown_status,
            UnknownStatusPolicy::Discard
        );
        reset_env();
    }
}

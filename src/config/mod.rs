use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub query: QueryConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub default_page: u64,
    pub default_limit: u64,
    /// Hard cap applied to the `limit` directive. `None` leaves it unbounded.
    pub max_limit: Option<u64>,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Query
        override_from_env("QUERY_DEFAULT_LIMIT", &mut self.query.default_limit);
        if let Ok(v) = env::var("QUERY_MAX_LIMIT") {
            self.query.max_limit = v.parse().ok();
        }
        override_from_env("QUERY_DEBUG_LOGGING", &mut self.query.debug_logging);

        // Store
        override_from_env("STORE_BACKEND", &mut self.database.backend);
        if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        override_from_env("DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections);
        override_from_env("DATABASE_CONNECTION_TIMEOUT", &mut self.database.connection_timeout);

        // HTTP; PORT is the conventional fallback for hosted deployments
        override_from_env("PORT", &mut self.api.port);
        override_from_env("CATALOG_API_PORT", &mut self.api.port);
        override_from_env("API_ENABLE_REQUEST_LOGGING", &mut self.api.enable_request_logging);
        override_from_env("API_MAX_REQUEST_SIZE_BYTES", &mut self.api.max_request_size_bytes);

        // Security
        if let Ok(origins) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(secret) = env::var("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        override_from_env("JWT_EXPIRES_IN_HOURS", &mut self.security.jwt_expiry_hours);

        self
    }

    /// Local defaults: in-memory store, unbounded page size, a throwaway JWT secret
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            query: QueryConfig {
                default_page: 1,
                default_limit: 100,
                max_limit: None,
                debug_logging: true,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec![],
                jwt_secret: "development-only-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7,
            },
        }
    }

    /// Postgres-backed; `JWT_SECRET` must come from the environment
    pub fn staging() -> Self {
        let base = Self::development();
        Self {
            environment: Environment::Staging,
            query: QueryConfig {
                max_limit: Some(500),
                debug_logging: false,
                ..base.query
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                max_connections: 20,
                connection_timeout: 10,
                ..base.database
            },
            api: ApiConfig {
                max_request_size_bytes: 5 * 1024 * 1024,
                ..base.api
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
        }
    }

    pub fn production() -> Self {
        let staging = Self::staging();
        Self {
            environment: Environment::Production,
            query: QueryConfig {
                max_limit: Some(1000),
                ..staging.query
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                ..staging.database
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024,
                ..staging.api
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                ..staging.security
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// Replace `target` with the parsed variable; unset or unparsable values keep it
fn override_from_env<T: FromStr>(key: &str, target: &mut T) {
    if let Some(value) = env::var(key).ok().and_then(|v| v.trim().parse().ok()) {
        *target = value;
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::access::{
    GuardRoutes, PermissionError, PermissionTable, UnconfiguredPolicy, DEFAULT_LANDING_PATH,
    DEFAULT_LOGIN_PATH,
};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::session::DEFAULT_STORAGE_NAMESPACE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub guard: GuardConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    pub login_path: String,
    pub default_path: String,
    pub history_capacity: usize,
    pub unconfigured_policy: UnconfiguredPolicy,
    pub permissions_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// None keeps sessions in memory only
    pub storage_dir: Option<PathBuf>,
    pub namespace: String,
    pub cookie_name: String,
    /// Upper bound on clients the host keeps in memory
    pub max_clients: usize,
    pub client_idle_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("BACKOFFICE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("BACKOFFICE_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Guard overrides
        if let Some(v) = lookup("GUARD_LOGIN_PATH") {
            self.guard.login_path = v;
        }
        if let Some(v) = lookup("GUARD_DEFAULT_PATH") {
            self.guard.default_path = v;
        }
        if let Some(v) = lookup("GUARD_HISTORY_CAPACITY") {
            self.guard.history_capacity = v.parse().unwrap_or(self.guard.history_capacity);
        }
        if let Some(v) = lookup("GUARD_UNCONFIGURED_POLICY") {
            match v.parse() {
                Ok(policy) => self.guard.unconfigured_policy = policy,
                Err(e) => tracing::warn!("Ignoring GUARD_UNCONFIGURED_POLICY: {}", e),
            }
        }
        if let Some(v) = lookup("GUARD_PERMISSIONS_FILE") {
            self.guard.permissions_file = Some(PathBuf::from(v)).filter(|p| !p.as_os_str().is_empty());
        }

        // Session overrides
        if let Some(v) = lookup("SESSION_STORAGE_DIR") {
            self.session.storage_dir = Some(PathBuf::from(v)).filter(|p| !p.as_os_str().is_empty());
        }
        if let Some(v) = lookup("SESSION_NAMESPACE") {
            self.session.namespace = v;
        }
        if let Some(v) = lookup("SESSION_COOKIE_NAME") {
            self.session.cookie_name = v;
        }
        if let Some(v) = lookup("SESSION_MAX_CLIENTS") {
            self.session.max_clients = v.parse().unwrap_or(self.session.max_clients);
        }
        if let Some(v) = lookup("SESSION_CLIENT_IDLE_MINUTES") {
            self.session.client_idle_minutes = v.parse().unwrap_or(self.session.client_idle_minutes);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    pub fn guard_routes(&self) -> GuardRoutes {
        GuardRoutes {
            login_path: self.guard.login_path.clone(),
            default_path: self.guard.default_path.clone(),
        }
    }

    /// Builtin table plus the optional overrides file
    pub fn permission_table(&self) -> Result<PermissionTable, PermissionError> {
        let table = PermissionTable::builtin(self.guard.unconfigured_policy);
        match &self.guard.permissions_file {
            Some(path) => table.with_overrides_file(path),
            None => Ok(table),
        }
    }

    fn guard_defaults(unconfigured_policy: UnconfiguredPolicy) -> GuardConfig {
        GuardConfig {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            default_path: DEFAULT_LANDING_PATH.to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            unconfigured_policy,
            permissions_file: None,
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            guard: Self::guard_defaults(UnconfiguredPolicy::Allow),
            session: SessionConfig {
                storage_dir: None,
                namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
                cookie_name: "bo_session".to_string(),
                max_clients: 1_000,
                client_idle_minutes: 30,
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            guard: Self::guard_defaults(UnconfiguredPolicy::Allow),
            session: SessionConfig {
                storage_dir: Some(PathBuf::from("/var/lib/backoffice/sessions")),
                namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
                cookie_name: "bo_session".to_string(),
                max_clients: 10_000,
                client_idle_minutes: 60,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            guard: Self::guard_defaults(UnconfiguredPolicy::Deny),
            session: SessionConfig {
                storage_dir: Some(PathBuf::from("/var/lib/backoffice/sessions")),
                namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
                cookie_name: "bo_session".to_string(),
                max_clients: 10_000,
                client_idle_minutes: 60,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 8,
                enable_cors: false,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

// Global singleton config for the binaries - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Env var the hosting platform uses to hand the app registration secret to the process.
pub const PLATFORM_CLIENT_SECRET_ENV: &str = "MICROSOFT_PROVIDER_AUTHENTICATION_SECRET";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub crm: CrmConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub service: ServiceKind,
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CrmConfig {
    pub backend: CrmBackend,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub dataverse_url: Option<String>,
    pub dataverse_scope: Option<String>,
    pub authority_host: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl CrmConfig {
    /// Scope requested in the on-behalf-of exchange; falls back to `{dataverse_url}/.default`.
    pub fn effective_scope(&self) -> Option<String> {
        let explicit = self.dataverse_scope.as_ref().filter(|scope| !scope.trim().is_empty());
        if let Some(scope) = explicit {
            return Some(scope.clone());
        }
        self.dataverse_url
            .as_ref()
            .map(|url| format!("{}/.default", url.trim_end_matches('/')))
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Lead,
    Opportunity,
    Quote,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 3] = [Self::Lead, Self::Opportunity, Self::Quote];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Opportunity => "opportunity",
            Self::Quote => "quote",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Lead => "Lead",
            Self::Opportunity => "Opportunity",
            Self::Quote => "Quote",
        }
    }

    /// Only the opportunity tools reach the CRM.
    pub fn uses_crm(&self) -> bool {
        matches!(self, Self::Opportunity)
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrmBackend {
    Dataverse,
    Mock,
}

impl CrmBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dataverse => "dataverse",
            Self::Mock => "mock",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub service: Option<ServiceKind>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub crm_backend: Option<CrmBackend>,
    pub crm_tenant_id: Option<String>,
    pub crm_client_id: Option<String>,
    pub crm_client_secret: Option<String>,
    pub crm_dataverse_url: Option<String>,
    pub crm_dataverse_scope: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                service: ServiceKind::Opportunity,
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            crm: CrmConfig {
                backend: CrmBackend::Mock,
                tenant_id: None,
                client_id: None,
                client_secret: None,
                dataverse_url: None,
                dataverse_scope: None,
                authority_host: "https://login.microsoftonline.com".to_string(),
                api_version: "v9.2".to_string(),
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for ServiceKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lead" => Ok(Self::Lead),
            "opportunity" => Ok(Self::Opportunity),
            "quote" => Ok(Self::Quote),
            other => Err(ConfigError::Validation(format!(
                "unsupported service `{other}` (expected lead|opportunity|quote)"
            ))),
        }
    }
}

impl std::str::FromStr for CrmBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dataverse" => Ok(Self::Dataverse),
            "mock" => Ok(Self::Mock),
            other => Err(ConfigError::Validation(format!(
                "unsupported crm backend `{other}` (expected dataverse|mock)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("salesdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(service) = server.service {
                self.server.service = service;
            }
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(crm) = patch.crm {
            if let Some(backend) = crm.backend {
                self.crm.backend = backend;
            }
            if let Some(tenant_id) = crm.tenant_id {
                self.crm.tenant_id = Some(tenant_id);
            }
            if let Some(client_id) = crm.client_id {
                self.crm.client_id = Some(client_id);
            }
            if let Some(client_secret_value) = crm.client_secret {
                self.crm.client_secret = Some(secret_value(client_secret_value));
            }
            if let Some(dataverse_url) = crm.dataverse_url {
                self.crm.dataverse_url = Some(dataverse_url);
            }
            if let Some(dataverse_scope) = crm.dataverse_scope {
                self.crm.dataverse_scope = Some(dataverse_scope);
            }
            if let Some(authority_host) = crm.authority_host {
                self.crm.authority_host = authority_host;
            }
            if let Some(api_version) = crm.api_version {
                self.crm.api_version = api_version;
            }
            if let Some(timeout_secs) = crm.timeout_secs {
                self.crm.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SALESDESK_SERVER_SERVICE") {
            self.server.service = value.parse()?;
        }
        if let Some(value) = read_env("SALESDESK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SALESDESK_SERVER_PORT") {
            self.server.port = parse_u16("SALESDESK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("SALESDESK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("SALESDESK_CRM_BACKEND") {
            self.crm.backend = value.parse()?;
        }
        if let Some(value) = read_env("SALESDESK_CRM_TENANT_ID") {
            self.crm.tenant_id = Some(value);
        }
        if let Some(value) = read_env("SALESDESK_CRM_CLIENT_ID") {
            self.crm.client_id = Some(value);
        }
        let client_secret = read_env("SALESDESK_CRM_CLIENT_SECRET")
            .or_else(|| read_env(PLATFORM_CLIENT_SECRET_ENV));
        if let Some(value) = client_secret {
            self.crm.client_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("SALESDESK_CRM_DATAVERSE_URL") {
            self.crm.dataverse_url = Some(value);
        }
        if let Some(value) = read_env("SALESDESK_CRM_DATAVERSE_SCOPE") {
            self.crm.dataverse_scope = Some(value);
        }
        if let Some(value) = read_env("SALESDESK_CRM_AUTHORITY_HOST") {
            self.crm.authority_host = value;
        }
        if let Some(value) = read_env("SALESDESK_CRM_API_VERSION") {
            self.crm.api_version = value;
        }
        if let Some(value) = read_env("SALESDESK_CRM_TIMEOUT_SECS") {
            self.crm.timeout_secs = parse_u64("SALESDESK_CRM_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("SALESDESK_LOGGING_LEVEL").or_else(|| read_env("SALESDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SALESDESK_LOGGING_FORMAT").or_else(|| read_env("SALESDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(service) = overrides.service {
            self.server.service = service;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }

        if let Some(backend) = overrides.crm_backend {
            self.crm.backend = backend;
        }
        if let Some(tenant_id) = overrides.crm_tenant_id {
            self.crm.tenant_id = Some(tenant_id);
        }
        if let Some(client_id) = overrides.crm_client_id {
            self.crm.client_id = Some(client_id);
        }
        if let Some(client_secret) = overrides.crm_client_secret {
            self.crm.client_secret = Some(secret_value(client_secret));
        }
        if let Some(dataverse_url) = overrides.crm_dataverse_url {
            self.crm.dataverse_url = Some(dataverse_url);
        }
        if let Some(dataverse_scope) = overrides.crm_dataverse_scope {
            self.crm.dataverse_scope = Some(dataverse_scope);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        if self.server.service.uses_crm() {
            validate_crm(&self.crm)?;
        }
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("salesdesk.toml"), PathBuf::from("config/salesdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_crm(crm: &CrmConfig) -> Result<(), ConfigError> {
    if crm.timeout_secs == 0 || crm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "crm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if crm.backend == CrmBackend::Mock {
        return Ok(());
    }

    require_present("crm.tenant_id", crm.tenant_id.as_deref())?;
    require_present("crm.client_id", crm.client_id.as_deref())?;

    let secret_missing = crm
        .client_secret
        .as_ref()
        .map(|value| value.expose_secret().trim().is_empty())
        .unwrap_or(true);
    if secret_missing {
        return Err(ConfigError::Validation(format!(
            "crm.client_secret is required for the dataverse backend \
             (or set {PLATFORM_CLIENT_SECRET_ENV})"
        )));
    }

    require_present("crm.dataverse_url", crm.dataverse_url.as_deref())?;
    require_http_url("crm.dataverse_url", crm.dataverse_url.as_deref().unwrap_or_default())?;
    require_http_url("crm.authority_host", &crm.authority_host)?;

    Ok(())
}

fn require_present(key: &str, value: Option<&str>) -> Result<(), ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "{key} is required for the dataverse backend"
        ))),
    }
}

fn require_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return Ok(());
    }
    Err(ConfigError::Validation(format!("{key} must start with http:// or https://")))
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    crm: Option<CrmPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    service: Option<ServiceKind>,
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CrmPatch {
    backend: Option<CrmBackend>,
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    dataverse_url: Option<String>,
    dataverse_scope: Option<String>,
    authority_host: Option<String>,
    api_version: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        AppConfig, ConfigError, ConfigOverrides, CrmBackend, LoadOptions, LogFormat, ServiceKind,
        PLATFORM_CLIENT_SECRET_ENV,
    };

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ENV_KEYS: &[&str] = &[
        "SALESDESK_SERVER_SERVICE",
        "SALESDESK_SERVER_PORT",
        "SALESDESK_CRM_BACKEND",
        "SALESDESK_CRM_TENANT_ID",
        "SALESDESK_CRM_CLIENT_ID",
        "SALESDESK_CRM_CLIENT_SECRET",
        "SALESDESK_CRM_DATAVERSE_URL",
        "SALESDESK_CRM_DATAVERSE_SCOPE",
        "SALESDESK_LOG_LEVEL",
        "SALESDESK_LOG_FORMAT",
        "SALESDESK_LOGGING_LEVEL",
        "SALESDESK_LOGGING_FORMAT",
        PLATFORM_CLIENT_SECRET_ENV,
        "TEST_DATAVERSE_SECRET",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars() {
        for var in ENV_KEYS {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn dataverse_overrides() -> ConfigOverrides {
        ConfigOverrides {
            crm_backend: Some(CrmBackend::Dataverse),
            crm_tenant_id: Some("tenant-1".to_string()),
            crm_client_id: Some("client-1".to_string()),
            crm_client_secret: Some("secret-value".to_string()),
            crm_dataverse_url: Some("https://org.crm4.dynamics.com".to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn defaults_load_without_file_or_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.server.service == ServiceKind::Opportunity,
            "default service is opportunity",
        )?;
        ensure(config.crm.backend == CrmBackend::Mock, "default backend is mock")?;
        ensure(config.server.port == 8080, "default port is 8080")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "default format is compact")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("TEST_DATAVERSE_SECRET", "from-env-secret");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("salesdesk.toml");
            fs::write(
                &path,
                r#"
[crm]
backend = "dataverse"
tenant_id = "tenant-from-file"
client_id = "client-from-file"
client_secret = "${TEST_DATAVERSE_SECRET}"
dataverse_url = "https://org.crm4.dynamics.com/"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let secret =
                config.crm.client_secret.as_ref().map(|value| value.expose_secret().to_string());
            ensure(
                secret.as_deref() == Some("from-env-secret"),
                "client secret should be interpolated from environment",
            )?;
            ensure(
                config.crm.effective_scope().as_deref()
                    == Some("https://org.crm4.dynamics.com/.default"),
                "scope should default to the dataverse url",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("SALESDESK_SERVER_SERVICE", "quote");
        env::set_var("SALESDESK_SERVER_PORT", "9090");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("salesdesk.toml");
            fs::write(
                &path,
                r#"
[server]
service = "lead"
port = 7070

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.server.service == ServiceKind::Quote,
                "env service should win over file",
            )?;
            ensure(config.server.port == 9090, "env port should win over file")?;
            ensure(config.logging.level == "debug", "override log level should win")
        })();

        clear_vars();
        result
    }

    #[test]
    fn platform_secret_variable_is_accepted() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var(PLATFORM_CLIENT_SECRET_ENV, "platform-secret");

        let result = (|| -> Result<(), String> {
            let mut overrides = dataverse_overrides();
            overrides.crm_client_secret = None;
            let config = AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() })
                .map_err(|err| format!("config load failed: {err}"))?;
            let secret =
                config.crm.client_secret.as_ref().map(|value| value.expose_secret().to_string());
            ensure(secret.as_deref() == Some("platform-secret"), "platform secret should be used")
        })();

        clear_vars();
        result
    }

    #[test]
    fn dataverse_backend_requires_credentials() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let error = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                crm_backend: Some(CrmBackend::Dataverse),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }) {
            Ok(_) => {
                return Err("expected validation failure but config load succeeded".to_string())
            }
            Err(error) => error,
        };

        let mentions_tenant = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("crm.tenant_id")
        );
        ensure(mentions_tenant, "validation failure should mention crm.tenant_id")
    }

    #[test]
    fn services_without_crm_skip_dataverse_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                service: Some(ServiceKind::Lead),
                crm_backend: Some(CrmBackend::Dataverse),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.server.service == ServiceKind::Lead, "lead service should load")
    }

    #[test]
    fn invalid_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("SALESDESK_SERVER_PORT", "not-a-port");

        let result = AppConfig::load(LoadOptions::default());
        clear_vars();

        let rejected = matches!(
            result,
            Err(ConfigError::InvalidEnvOverride { ref key, .. }) if key == "SALESDESK_SERVER_PORT"
        );
        ensure(rejected, "invalid port should be rejected")
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let options = LoadOptions { overrides: dataverse_overrides(), ..LoadOptions::default() };
        let config =
            AppConfig::load(options).map_err(|err| format!("config load failed: {err}"))?;
        let debug = format!("{config:?}");

        ensure(!debug.contains("secret-value"), "debug output should not contain the client secret")
    }
}

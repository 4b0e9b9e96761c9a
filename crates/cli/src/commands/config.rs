use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use salesdesk_core::config::{AppConfig, LoadOptions, PLATFORM_CLIENT_SECRET_ENV};
use toml::Value;

const UNSET: &str = "<unset>";

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

impl Field {
    fn new(key: &'static str, env_keys: &'static [&'static str], value: impl Into<String>) -> Self {
        Self { key, env_keys, value: value.into() }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let optional = |value: Option<&String>| value.cloned().unwrap_or_else(|| UNSET.to_string());

    vec![
        Field::new("server.service", &["SALESDESK_SERVER_SERVICE"], config.server.service.as_str()),
        Field::new(
            "server.bind_address",
            &["SALESDESK_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        Field::new("server.port", &["SALESDESK_SERVER_PORT"], config.server.port.to_string()),
        Field::new(
            "server.graceful_shutdown_secs",
            &["SALESDESK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        Field::new("crm.backend", &["SALESDESK_CRM_BACKEND"], config.crm.backend.as_str()),
        Field::new(
            "crm.tenant_id",
            &["SALESDESK_CRM_TENANT_ID"],
            optional(config.crm.tenant_id.as_ref()),
        ),
        Field::new(
            "crm.client_id",
            &["SALESDESK_CRM_CLIENT_ID"],
            optional(config.crm.client_id.as_ref()),
        ),
        Field::new(
            "crm.client_secret",
            &["SALESDESK_CRM_CLIENT_SECRET", PLATFORM_CLIENT_SECRET_ENV],
            if config.crm.client_secret.is_some() { "<redacted>" } else { UNSET },
        ),
        Field::new(
            "crm.dataverse_url",
            &["SALESDESK_CRM_DATAVERSE_URL"],
            optional(config.crm.dataverse_url.as_ref()),
        ),
        Field::new(
            "crm.dataverse_scope",
            &["SALESDESK_CRM_DATAVERSE_SCOPE"],
            config.crm.effective_scope().unwrap_or_else(|| UNSET.to_string()),
        ),
        Field::new(
            "crm.authority_host",
            &["SALESDESK_CRM_AUTHORITY_HOST"],
            config.crm.authority_host.clone(),
        ),
        Field::new(
            "crm.api_version",
            &["SALESDESK_CRM_API_VERSION"],
            config.crm.api_version.clone(),
        ),
        Field::new(
            "crm.timeout_secs",
            &["SALESDESK_CRM_TIMEOUT_SECS"],
            config.crm.timeout_secs.to_string(),
        ),
        Field::new(
            "logging.level",
            &["SALESDESK_LOGGING_LEVEL", "SALESDESK_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        Field::new(
            "logging.format",
            &["SALESDESK_LOGGING_FORMAT", "SALESDESK_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("salesdesk.toml"), PathBuf::from("config/salesdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::contains_path;

    #[test]
    fn nested_keys_are_found() {
        let doc: toml::Value = "[crm]\nbackend = \"mock\"\n".parse().expect("toml should parse");

        assert!(contains_path(&doc, "crm.backend"));
        assert!(!contains_path(&doc, "crm.tenant_id"));
        assert!(!contains_path(&doc, "server.port"));
    }
}

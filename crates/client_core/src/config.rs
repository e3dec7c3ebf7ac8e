use std::{collections::HashMap, fs};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::warn;
use url::Url;

const SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    pub api_base_url: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".into(),
        }
    }
}

/// Defaults, then `client.toml` (`api_base_url = "..."`), then
/// `COLETA_API_URL` / `APP__API_BASE_URL`.
pub fn load_client_settings() -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_settings(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("COLETA_API_URL") {
        settings.api_base_url = v;
    }
    if let Ok(v) = std::env::var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    settings
}

fn apply_file_settings(settings: &mut ClientSettings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        warn!(file = SETTINGS_FILE, "ignoring unparsable client settings file");
        return;
    };
    if let Some(v) = file_cfg.get("api_base_url") {
        settings.api_base_url = v.clone();
    }
}

/// Parses and normalises an API base url: http(s) only, no trailing slash.
pub fn validated_base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim()).with_context(|| format!("invalid api base url '{raw}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("api base url must use http or https, got '{}'", parsed.scheme());
    }
    if parsed.host_str().is_none() {
        bail!("api base url '{raw}' has no host");
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash() {
        assert_eq!(
            validated_base_url("http://127.0.0.1:5000/").expect("url"),
            "http://127.0.0.1:5000"
        );
        assert_eq!(
            validated_base_url(" https://coleta.example.com/api/ ").expect("url"),
            "https://coleta.example.com/api"
        );
    }

    #[test]
    fn file_settings_override_defaults() {
        let mut settings = ClientSettings::default();
        apply_file_settings(&mut settings, r#"api_base_url = "http://coleta.local:8080""#);
        assert_eq!(settings.api_base_url, "http://coleta.local:8080");
    }

    #[test]
    fn unparsable_file_keeps_defaults() {
        let mut settings = ClientSettings::default();
        apply_file_settings(&mut settings, "api_base_url = [not toml");
        assert_eq!(settings.api_base_url, ClientSettings::default().api_base_url);
    }

    #[test]
    fn rejects_non_http_schemes_and_garbage() {
        assert!(validated_base_url("ftp://example.com").is_err());
        assert!(validated_base_url("not a url").is_err());
    }
}

use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, Context, Result};
use url::Url;

pub const SETTINGS_FILE: &str = "evaluator.toml";
pub const RECENT_HISTORY_LIMIT: usize = 5;
pub const HISTORY_PAGE_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    /// Rows shown under the upload form and refreshed after each submission.
    pub recent_history_limit: usize,
    /// Rows loaded by the full history screen.
    pub history_page_limit: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            recent_history_limit: RECENT_HISTORY_LIMIT,
            history_page_limit: HISTORY_PAGE_LIMIT,
        }
    }
}

/// Defaults, then `evaluator.toml` in the working directory, then the
/// environment.
pub fn load_settings() -> Result<ClientSettings> {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, Path::new(SETTINGS_FILE))?;
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.base_url = normalize_base_url(&settings.base_url)?;
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, path: &Path) -> Result<()> {
    let Ok(raw) = fs::read_to_string(path) else {
        return Ok(());
    };
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;

    if let Some(v) = file_cfg.get("base_url").and_then(toml::Value::as_str) {
        settings.base_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("recent_history_limit").and_then(as_limit) {
        settings.recent_history_limit = v;
    }
    if let Some(v) = file_cfg.get("history_page_limit").and_then(as_limit) {
        settings.history_page_limit = v;
    }
    Ok(())
}

fn as_limit(value: &toml::Value) -> Option<usize> {
    match value {
        toml::Value::Integer(n) => usize::try_from(*n).ok().filter(|n| *n > 0),
        toml::Value::String(s) => parse_limit(s),
        _ => None,
    }
}

fn parse_limit(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn apply_env(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("EVALUATOR_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = var("APP__BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = var("APP__RECENT_HISTORY_LIMIT").as_deref().and_then(parse_limit) {
        settings.recent_history_limit = v;
    }
    if let Some(v) = var("APP__HISTORY_PAGE_LIMIT").as_deref().and_then(parse_limit) {
        settings.history_page_limit = v;
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(anyhow!("evaluation service base url is empty"));
    }
    let parsed =
        Url::parse(trimmed).with_context(|| format!("invalid evaluation service url '{trimmed}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!(
            "evaluation service url must use http or https, got '{}'",
            parsed.scheme()
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

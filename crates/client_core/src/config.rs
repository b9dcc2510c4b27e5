use std::{fs, path::Path, str::FromStr, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use shared::domain::UiLanguage;
use tracing::warn;
use url::Url;

use crate::responses::HiddenFollowUpPolicy;

pub const DEFAULT_SETTINGS_FILE: &str = "advisor.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub rec_schemes_path: String,
    pub questions_path: String,
    pub check_schemes_path: String,
    pub recommend_crop_path: String,
    pub location: String,
    pub language: UiLanguage,
    pub top_k: u32,
    pub request_timeout_secs: u64,
    pub hidden_follow_ups: HiddenFollowUpPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            rec_schemes_path: "rec_schemes".into(),
            questions_path: "questions".into(),
            check_schemes_path: "check_schemes".into(),
            recommend_crop_path: "recommend-crop".into(),
            location: String::new(),
            language: UiLanguage::English,
            top_k: 3,
            request_timeout_secs: 30,
            hidden_follow_ups: HiddenFollowUpPolicy::SubmitAsStored,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url '{}'", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("base_url must use http or https, got '{}'", url.scheme());
        }
        if self.top_k == 0 {
            bail!("top_k must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        for (name, path) in [
            ("rec_schemes_path", &self.rec_schemes_path),
            ("questions_path", &self.questions_path),
            ("check_schemes_path", &self.check_schemes_path),
            ("recommend_crop_path", &self.recommend_crop_path),
        ] {
            if path.trim_matches('/').is_empty() {
                bail!("{name} must not be empty");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    rec_schemes_path: Option<String>,
    questions_path: Option<String>,
    check_schemes_path: Option<String>,
    recommend_crop_path: Option<String>,
    location: Option<String>,
    language: Option<String>,
    top_k: Option<u32>,
    request_timeout_secs: Option<u64>,
    hidden_follow_ups: Option<HiddenFollowUpPolicy>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file at `path` if it exists, then `APP__*`
/// variables looked up through `env`.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(err) => warn!("config: ignoring unreadable {}: {err}", path.display()),
        }
    }

    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__LOCATION") {
        settings.location = v;
    }
    if let Some(v) = env("APP__LANGUAGE") {
        override_parsed(&mut settings.language, "APP__LANGUAGE", &v);
    }
    if let Some(v) = env("APP__TOP_K") {
        override_parsed(&mut settings.top_k, "APP__TOP_K", &v);
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        override_parsed(&mut settings.request_timeout_secs, "APP__REQUEST_TIMEOUT_SECS", &v);
    }
    if let Some(v) = env("APP__HIDDEN_FOLLOW_UPS") {
        override_parsed(&mut settings.hidden_follow_ups, "APP__HIDDEN_FOLLOW_UPS", &v);
    }

    settings
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.base_url {
        settings.base_url = v;
    }
    if let Some(v) = file_cfg.rec_schemes_path {
        settings.rec_schemes_path = v;
    }
    if let Some(v) = file_cfg.questions_path {
        settings.questions_path = v;
    }
    if let Some(v) = file_cfg.check_schemes_path {
        settings.check_schemes_path = v;
    }
    if let Some(v) = file_cfg.recommend_crop_path {
        settings.recommend_crop_path = v;
    }
    if let Some(v) = file_cfg.location {
        settings.location = v;
    }
    if let Some(v) = file_cfg.language {
        override_parsed(&mut settings.language, "language", &v);
    }
    if let Some(v) = file_cfg.top_k {
        settings.top_k = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.hidden_follow_ups {
        settings.hidden_follow_ups = v;
    }
}

fn override_parsed<T>(slot: &mut T, key: &str, raw: &str)
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(err) => warn!("config: ignoring {key}={raw:?}: {err}"),
    }
}

use async_trait::async_trait;
use shared::{domain::UiLanguage, protocol::RecommendSchemesRequest};
use tokio::sync::Mutex;

use crate::{config::Settings, dictation::TranscriptSink};

/// The free-text scheme query and the context sent along with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryForm {
    text: String,
    location: String,
    language: UiLanguage,
    top_k: u32,
}

impl QueryForm {
    pub fn new(location: impl Into<String>, language: UiLanguage, top_k: u32) -> Self {
        Self {
            text: String::new(),
            location: location.into(),
            language,
            top_k: top_k.max(1),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.location.clone(), settings.language, settings.top_k)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn language(&self) -> UiLanguage {
        self.language
    }

    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    /// Keeps the state from a reverse-geocoded place name such as
    /// "Pune, Maharashtra, India": the second-to-last comma-separated part,
    /// or nothing when the name has fewer than two parts.
    pub fn set_location_from_place(&mut self, place: &str) {
        let parts: Vec<&str> = place.split(',').map(str::trim).collect();
        self.location = match parts.len() {
            0 | 1 => String::new(),
            n => parts[n - 2].to_string(),
        };
    }

    pub fn set_language(&mut self, language: UiLanguage) {
        self.language = language;
    }

    pub fn set_top_k(&mut self, top_k: u32) {
        self.top_k = top_k.max(1);
    }

    pub fn to_request(&self) -> RecommendSchemesRequest {
        RecommendSchemesRequest {
            location: self.location.clone(),
            query: self.text.clone(),
            top_k: self.top_k,
            language: self.language,
        }
    }
}

/// A [`QueryForm`] shared between the typing surface and dictation.
pub struct SharedQueryForm {
    inner: Mutex<QueryForm>,
}

impl SharedQueryForm {
    pub fn new(form: QueryForm) -> Self {
        Self {
            inner: Mutex::new(form),
        }
    }

    pub async fn snapshot(&self) -> QueryForm {
        self.inner.lock().await.clone()
    }

    pub async fn update<R>(&self, apply: impl FnOnce(&mut QueryForm) -> R) -> R {
        let mut form = self.inner.lock().await;
        apply(&mut form)
    }
}

#[async_trait]
impl TranscriptSink for SharedQueryForm {
    async fn replace_transcript(&self, text: &str) {
        self.inner.lock().await.set_text(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_from_place_keeps_state_component() {
        let mut form = QueryForm::new("", UiLanguage::English, 3);

        form.set_location_from_place("Pune, Maharashtra, India");
        assert_eq!(form.location(), "Maharashtra");

        form.set_location_from_place("Amritsar ,  Punjab");
        assert_eq!(form.location(), "Amritsar");

        form.set_location_from_place("India");
        assert_eq!(form.location(), "");
    }

    #[test]
    fn top_k_never_drops_below_one() {
        let mut form = QueryForm::new("", UiLanguage::English, 0);
        assert_eq!(form.top_k(), 1);
        form.set_top_k(5);
        assert_eq!(form.top_k(), 5);
        form.set_top_k(0);
        assert_eq!(form.top_k(), 1);
    }

    #[test]
    fn request_carries_every_field() {
        let mut form = QueryForm::new("Tamil Nadu", UiLanguage::Tamil, 4);
        form.set_text("drip irrigation subsidy");

        let request = form.to_request();
        assert_eq!(request.location, "Tamil Nadu");
        assert_eq!(request.query, "drip irrigation subsidy");
        assert_eq!(request.top_k, 4);
        assert_eq!(request.language, UiLanguage::Tamil);
    }

    #[tokio::test]
    async fn transcript_replaces_form_text() {
        let shared = SharedQueryForm::new(QueryForm::new("", UiLanguage::Hindi, 3));
        shared.update(|form| form.set_text("typed")).await;

        shared.replace_transcript("dictated words").await;
        assert_eq!(shared.snapshot().await.text(), "dictated words");
    }
}

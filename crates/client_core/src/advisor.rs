use std::sync::Arc;

use shared::{domain::UiLanguage, protocol::SchemeRecommendations};
use speech_capture::CaptureConnector;
use tracing::info;

use crate::{
    config::Settings,
    dictation::{DictationChange, DictationController, UnavailableCapture},
    form::{QueryForm, SharedQueryForm},
    session::{Completion, EligibilitySession, SessionError},
    transport::{HttpSchemeService, SchemeService},
};

/// One advisory screen: the query form, dictation into it, and the
/// eligibility session it submits to.
pub struct SchemeAdvisor {
    form: Arc<SharedQueryForm>,
    dictation: Arc<DictationController>,
    session: Arc<EligibilitySession>,
}

impl SchemeAdvisor {
    pub fn new(
        settings: &Settings,
        service: Arc<dyn SchemeService>,
        capture: Arc<dyn CaptureConnector>,
    ) -> Self {
        let form = Arc::new(SharedQueryForm::new(QueryForm::from_settings(settings)));
        let dictation = DictationController::new(capture, form.clone());
        let session = EligibilitySession::new(service, settings.hidden_follow_ups);
        Self {
            form,
            dictation,
            session,
        }
    }

    /// HTTP backend from `settings`, no speech capture.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let service = HttpSchemeService::from_settings(settings)?;
        Ok(Self::new(
            settings,
            Arc::new(service),
            Arc::new(UnavailableCapture),
        ))
    }

    pub fn form(&self) -> &Arc<SharedQueryForm> {
        &self.form
    }

    pub fn dictation(&self) -> &Arc<DictationController> {
        &self.dictation
    }

    pub fn session(&self) -> &Arc<EligibilitySession> {
        &self.session
    }

    pub async fn set_query_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.form.update(|form| form.set_text(text)).await;
    }

    pub async fn set_location(&self, location: impl Into<String>) {
        let location = location.into();
        self.form.update(|form| form.set_location(location)).await;
    }

    pub async fn set_location_from_place(&self, place: &str) {
        self.form
            .update(|form| form.set_location_from_place(place))
            .await;
    }

    pub async fn set_language(&self, language: UiLanguage) {
        self.form.update(|form| form.set_language(language)).await;
    }

    pub async fn set_top_k(&self, top_k: u32) {
        self.form.update(|form| form.set_top_k(top_k)).await;
    }

    /// Starts or stops dictation in the form's current language.
    pub async fn toggle_dictation(&self) -> DictationChange {
        let language = self.form.snapshot().await.language();
        self.dictation.toggle(language).await
    }

    /// Stops any running dictation, then submits the form as it stands.
    pub async fn submit_query(&self) -> Result<Completion<SchemeRecommendations>, SessionError> {
        if self.dictation.stop().await == DictationChange::Stopped {
            info!("dictation stopped for query submission");
        }
        let request = self.form.snapshot().await.to_request();
        self.session.submit_query(request).await
    }
}

#[cfg(test)]
#[path = "tests/advisor_tests.rs"]
mod tests;

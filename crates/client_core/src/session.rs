
use std::{collections::HashSet, sync::Arc};

use shared::{
    domain::{Answer, UiLanguage},
    protocol::{
        CheckSchemesRequest, QuestionSchema, QuestionsRequest, RecommendSchemesRequest,
        ResponseTree, SchemeRecommendations, Verdict,
    },
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::{
    notices::{Notice, NoticeKind},
    responses::{self, HiddenFollowUpPolicy, SchemeSection},
    transport::{SchemeService, ServiceError},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    #[default]
    Idle,
    SchemesListed,
    QuestionsLoading,
    QuestionsReady,
    Submitting,
    VerdictReady,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOperation {
    SubmitQuery,
    CheckEligibility,
    EditResponses,
    SubmitEligibility,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub operation: SessionOperation,
    pub notice: Notice,
    pub detail: String,
    pub resume_phase: SessionPhase,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T> {
    Applied(T),
    /// A newer query started while the request was in flight.
    Superseded,
    /// The same request was already in flight.
    Ignored,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("query text is empty")]
    EmptyQuery,
    #[error("{operation:?} is not allowed while the session is {phase:?}")]
    InvalidTransition {
        operation: SessionOperation,
        phase: SessionPhase,
    },
    #[error("no recommended schemes to check eligibility for")]
    NoSchemes,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub token: u64,
    pub phase: SessionPhase,
    pub language: UiLanguage,
    pub schemes: Option<SchemeRecommendations>,
    pub schema: Option<QuestionSchema>,
    pub responses: Option<ResponseTree>,
    pub verdict: Option<Verdict>,
    pub failure: Option<SessionFailure>,
}

impl SessionSnapshot {
    /// The phase the session acts as: an `Error` behaves like the phase it
    /// resumes to.
    pub fn stable_phase(&self) -> SessionPhase {
        match (&self.phase, &self.failure) {
            (SessionPhase::Error, Some(failure)) => failure.resume_phase,
            (phase, _) => *phase,
        }
    }

    pub fn follow_up_visible(&self, scheme: &str, question: &str) -> bool {
        self.responses
            .as_ref()
            .is_some_and(|tree| responses::follow_up_visible(tree, scheme, question))
    }

    pub fn questionnaire(&self) -> Vec<SchemeSection> {
        match (&self.schema, &self.responses) {
            (Some(schema), Some(tree)) => responses::render_view(schema, tree),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged(SessionPhase),
    SchemesListed(SchemeRecommendations),
    QuestionsReady(QuestionSchema),
    ResponsesUpdated(ResponseTree),
    VerdictReady(Verdict),
    Notice(Notice),
}

#[derive(Default)]
struct SessionState {
    snapshot: SessionSnapshot,
    in_flight: HashSet<SessionOperation>,
}

pub struct EligibilitySession {
    service: Arc<dyn SchemeService>,
    hidden_follow_ups: HiddenFollowUpPolicy,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl EligibilitySession {
    pub fn new(service: Arc<dyn SchemeService>, hidden_follow_ups: HiddenFollowUpPolicy) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            service,
            hidden_follow_ups,
            inner: Mutex::new(SessionState::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot.clone()
    }

    pub async fn follow_up_visible(&self, scheme: &str, question: &str) -> bool {
        self.inner
            .lock()
            .await
            .snapshot
            .follow_up_visible(scheme, question)
    }

    pub async fn submit_query(
        &self,
        request: RecommendSchemesRequest,
    ) -> Result<Completion<SchemeRecommendations>, SessionError> {
        let query = request.query.trim().to_string();
        if query.is_empty() {
            debug!("rejecting empty scheme query");
            self.emit(SessionEvent::Notice(Notice::localized(
                NoticeKind::EmptyQuery,
                request.language,
            )));
            return Err(SessionError::EmptyQuery);
        }
        let request = RecommendSchemesRequest { query, ..request };

        let token = {
            let mut state = self.inner.lock().await;
            let token = state.snapshot.token + 1;
            state.snapshot = SessionSnapshot {
                token,
                language: request.language,
                ..SessionSnapshot::default()
            };
            state.in_flight.clear();
            state.in_flight.insert(SessionOperation::SubmitQuery);
            token
        };
        self.emit(SessionEvent::PhaseChanged(SessionPhase::Idle));
        info!(session = token, language = %request.language, "requesting scheme recommendations");

        let result = self.service.recommend_schemes(&request).await;

        let mut state = self.inner.lock().await;
        if state.snapshot.token != token {
            info!(session = token, "dropping recommendations for superseded query");
            return Ok(Completion::Superseded);
        }
        state.in_flight.remove(&SessionOperation::SubmitQuery);
        match result {
            Ok(schemes) => {
                state.snapshot.schemes = Some(schemes.clone());
                state.snapshot.phase = SessionPhase::SchemesListed;
                drop(state);
                info!(session = token, count = schemes.len(), "schemes listed");
                self.emit(SessionEvent::PhaseChanged(SessionPhase::SchemesListed));
                self.emit(SessionEvent::SchemesListed(schemes.clone()));
                Ok(Completion::Applied(schemes))
            }
            Err(err) => Err(self.fail(state, SessionOperation::SubmitQuery, SessionPhase::Idle, err)),
        }
    }

    pub async fn check_eligibility(&self) -> Result<Completion<QuestionSchema>, SessionError> {
        let (token, request, resume_phase) = {
            let mut state = self.inner.lock().await;
            if state.in_flight.contains(&SessionOperation::CheckEligibility) {
                debug!("questions already loading");
                return Ok(Completion::Ignored);
            }
            let stable = state.snapshot.stable_phase();
            if !matches!(
                stable,
                SessionPhase::SchemesListed | SessionPhase::QuestionsReady | SessionPhase::VerdictReady
            ) {
                return Err(SessionError::InvalidTransition {
                    operation: SessionOperation::CheckEligibility,
                    phase: state.snapshot.phase,
                });
            }
            let schemes = match &state.snapshot.schemes {
                Some(schemes) if !schemes.is_empty() => schemes.clone(),
                _ => return Err(SessionError::NoSchemes),
            };
            state.in_flight.insert(SessionOperation::CheckEligibility);
            state.snapshot.phase = SessionPhase::QuestionsLoading;
            state.snapshot.failure = None;
            let request = QuestionsRequest {
                rec_scheme: schemes,
                language: state.snapshot.language,
            };
            (state.snapshot.token, request, stable)
        };
        self.emit(SessionEvent::PhaseChanged(SessionPhase::QuestionsLoading));
        info!(session = token, "requesting eligibility questions");

        let result = self.service.fetch_questions(&request).await;

        let mut state = self.inner.lock().await;
        if state.snapshot.token != token {
            info!(session = token, "dropping questions for superseded query");
            return Ok(Completion::Superseded);
        }
        state.in_flight.remove(&SessionOperation::CheckEligibility);
        match result {
            Ok(schema) => {
                let tree = responses::initialize_responses(&schema);
                state.snapshot.schema = Some(schema.clone());
                state.snapshot.responses = Some(tree.clone());
                state.snapshot.verdict = None;
                state.snapshot.phase = SessionPhase::QuestionsReady;
                drop(state);
                self.emit(SessionEvent::PhaseChanged(SessionPhase::QuestionsReady));
                self.emit(SessionEvent::QuestionsReady(schema.clone()));
                self.emit(SessionEvent::ResponsesUpdated(tree));
                Ok(Completion::Applied(schema))
            }
            Err(err) => Err(self.fail(state, SessionOperation::CheckEligibility, resume_phase, err)),
        }
    }

    /// Returns whether the tree changed. Unknown keys leave it untouched.
    pub async fn set_answer(
        &self,
        scheme: &str,
        question: &str,
        value: Answer,
    ) -> Result<bool, SessionError> {
        self.edit_responses(|tree| responses::set_answer(tree, scheme, question, value))
            .await
    }

    pub async fn set_follow_up_answer(
        &self,
        scheme: &str,
        question: &str,
        follow_up: &str,
        value: Answer,
    ) -> Result<bool, SessionError> {
        self.edit_responses(|tree| {
            responses::set_follow_up_answer(tree, scheme, question, follow_up, value)
        })
        .await
    }

    // Edits reduce from the tree held under the lock, so concurrent edits
    // apply in the order they acquire it and none is lost.
    async fn edit_responses(
        &self,
        apply: impl FnOnce(&ResponseTree) -> ResponseTree,
    ) -> Result<bool, SessionError> {
        let mut state = self.inner.lock().await;
        let invalid = SessionError::InvalidTransition {
            operation: SessionOperation::EditResponses,
            phase: state.snapshot.phase,
        };
        if state.snapshot.stable_phase() != SessionPhase::QuestionsReady {
            return Err(invalid);
        }
        let Some(current) = state.snapshot.responses.as_ref() else {
            return Err(invalid);
        };

        let next = apply(current);
        if &next == current {
            return Ok(false);
        }
        state.snapshot.responses = Some(next.clone());
        drop(state);
        self.emit(SessionEvent::ResponsesUpdated(next));
        Ok(true)
    }

    pub async fn submit_eligibility(&self) -> Result<Completion<Verdict>, SessionError> {
        let (token, request) = {
            let mut state = self.inner.lock().await;
            if state.in_flight.contains(&SessionOperation::SubmitEligibility) {
                debug!("eligibility check already in flight");
                return Ok(Completion::Ignored);
            }
            let invalid = SessionError::InvalidTransition {
                operation: SessionOperation::SubmitEligibility,
                phase: state.snapshot.phase,
            };
            if state.snapshot.stable_phase() != SessionPhase::QuestionsReady {
                return Err(invalid);
            }
            let (Some(schema), Some(tree)) = (&state.snapshot.schema, &state.snapshot.responses)
            else {
                return Err(invalid);
            };
            let request = CheckSchemesRequest {
                exp_qa: schema.clone(),
                user_qa: responses::submission_view(tree, self.hidden_follow_ups),
            };
            state.in_flight.insert(SessionOperation::SubmitEligibility);
            state.snapshot.phase = SessionPhase::Submitting;
            state.snapshot.failure = None;
            (state.snapshot.token, request)
        };
        self.emit(SessionEvent::PhaseChanged(SessionPhase::Submitting));
        info!(session = token, policy = %self.hidden_follow_ups, "submitting eligibility answers");

        let result = self.service.check_schemes(&request).await;

        let mut state = self.inner.lock().await;
        if state.snapshot.token != token {
            info!(session = token, "dropping verdict for superseded query");
            return Ok(Completion::Superseded);
        }
        state.in_flight.remove(&SessionOperation::SubmitEligibility);
        match result {
            Ok(verdict) => {
                state.snapshot.verdict = Some(verdict.clone());
                state.snapshot.responses = None;
                state.snapshot.phase = SessionPhase::VerdictReady;
                drop(state);
                self.emit(SessionEvent::PhaseChanged(SessionPhase::VerdictReady));
                self.emit(SessionEvent::VerdictReady(verdict.clone()));
                Ok(Completion::Applied(verdict))
            }
            Err(err) => Err(self.fail(
                state,
                SessionOperation::SubmitEligibility,
                SessionPhase::QuestionsReady,
                err,
            )),
        }
    }

    fn fail(
        &self,
        mut state: MutexGuard<'_, SessionState>,
        operation: SessionOperation,
        resume_phase: SessionPhase,
        err: ServiceError,
    ) -> SessionError {
        let kind = match operation {
            SessionOperation::SubmitQuery => NoticeKind::RecommendationFailed,
            SessionOperation::CheckEligibility => NoticeKind::QuestionsFailed,
            SessionOperation::EditResponses | SessionOperation::SubmitEligibility => {
                NoticeKind::EligibilityFailed
            }
        };
        let notice = Notice::localized(kind, state.snapshot.language);
        warn!(
            session = state.snapshot.token,
            ?operation,
            endpoint = %err.endpoint(),
            error = %err,
            "backend request failed"
        );
        state.snapshot.phase = SessionPhase::Error;
        state.snapshot.failure = Some(SessionFailure {
            operation,
            notice: notice.clone(),
            detail: err.to_string(),
            resume_phase,
        });
        drop(state);
        self.emit(SessionEvent::PhaseChanged(SessionPhase::Error));
        self.emit(SessionEvent::Notice(notice));
        SessionError::Service(err)
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;

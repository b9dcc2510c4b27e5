//! Test doubles shared by the controller tests.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::json;
use shared::protocol::{
    CheckSchemesRequest, QuestionSchema, QuestionsRequest, RecommendSchemesRequest,
    SchemeRecommendation, SchemeRecommendations, Verdict,
};
use speech_capture::{
    CaptureConnector, CaptureError, CaptureEvent, CaptureOptions, CaptureSegment, OpenedSegment,
};
use tokio::sync::{broadcast, oneshot, Mutex, Notify};

use crate::{
    dictation::TranscriptSink,
    transport::{Endpoint, SchemeService, ServiceError},
};

pub const SCHEME_A: &str = "PM-Kisan Samman Nidhi";
pub const SCHEME_B: &str = "Kisan Credit Card";
pub const Q1: &str = "Is the applicant a landholding farmer?";
pub const Q2: &str = "Is the applicant Below Poverty Line (BPL)?";
pub const Q2A: &str = "Is the applicant between 18 and 60 years of age?";
pub const Q3: &str = "Does the applicant hold a bank account?";

pub fn recommendations() -> SchemeRecommendations {
    SchemeRecommendations(
        [
            (
                SCHEME_A.to_string(),
                SchemeRecommendation::new("Income support for farmers", "https://pmkisan.gov.in"),
            ),
            (
                SCHEME_B.to_string(),
                SchemeRecommendation::new("Short-term crop credit", "https://www.nabard.org"),
            ),
        ]
        .into_iter()
        .collect(),
    )
}

pub fn schema() -> QuestionSchema {
    serde_json::from_value(json!({
        SCHEME_A: {
            Q1: {"answer": "Yes"},
            Q2: {"answer": "Yes", "follow_ups": {Q2A: "Yes"}}
        },
        SCHEME_B: {
            Q3: {"answer": "Yes"}
        }
    }))
    .expect("schema fixture")
}

pub fn verdict() -> Verdict {
    serde_json::from_value(json!({SCHEME_A: "Yes", SCHEME_B: "No"})).expect("verdict fixture")
}

pub fn backend_error(endpoint: Endpoint) -> ServiceError {
    ServiceError::Backend {
        endpoint,
        message: "database connection not available".into(),
    }
}

/// A gate holds one call of an endpoint until the test releases it.
#[derive(Default)]
pub struct Gate {
    receiver: Mutex<Option<oneshot::Receiver<()>>>,
    pub entered: Notify,
}

impl Gate {
    pub async fn close(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.receiver.lock().await = Some(rx);
        tx
    }

    async fn pass(&self) {
        self.entered.notify_one();
        let receiver = self.receiver.lock().await.take();
        if let Some(receiver) = receiver {
            let _ = receiver.await;
        }
    }
}

/// Scripted backend: queued results are returned first, fixtures after.
#[derive(Default)]
pub struct ScriptedService {
    pub recommend_results: Mutex<VecDeque<Result<SchemeRecommendations, ServiceError>>>,
    pub question_results: Mutex<VecDeque<Result<QuestionSchema, ServiceError>>>,
    pub check_results: Mutex<VecDeque<Result<Verdict, ServiceError>>>,
    pub recommend_requests: Mutex<Vec<RecommendSchemesRequest>>,
    pub question_requests: Mutex<Vec<QuestionsRequest>>,
    pub check_requests: Mutex<Vec<CheckSchemesRequest>>,
    pub recommend_gate: Gate,
    pub questions_gate: Gate,
    pub check_gate: Gate,
}

#[async_trait]
impl SchemeService for ScriptedService {
    async fn recommend_schemes(
        &self,
        request: &RecommendSchemesRequest,
    ) -> Result<SchemeRecommendations, ServiceError> {
        self.recommend_requests.lock().await.push(request.clone());
        self.recommend_gate.pass().await;
        let queued = self.recommend_results.lock().await.pop_front();
        queued.unwrap_or_else(|| Ok(recommendations()))
    }

    async fn fetch_questions(
        &self,
        request: &QuestionsRequest,
    ) -> Result<QuestionSchema, ServiceError> {
        self.question_requests.lock().await.push(request.clone());
        self.questions_gate.pass().await;
        let queued = self.question_results.lock().await.pop_front();
        queued.unwrap_or_else(|| Ok(schema()))
    }

    async fn check_schemes(&self, request: &CheckSchemesRequest) -> Result<Verdict, ServiceError> {
        self.check_requests.lock().await.push(request.clone());
        self.check_gate.pass().await;
        let queued = self.check_results.lock().await.pop_front();
        queued.unwrap_or_else(|| Ok(verdict()))
    }
}

pub struct ScriptedSegment {
    pub events_tx: broadcast::Sender<CaptureEvent>,
    pub stop_calls: Mutex<u32>,
}

impl ScriptedSegment {
    pub fn emit(&self, event: CaptureEvent) {
        let _ = self.events_tx.send(event);
    }
}

#[async_trait]
impl CaptureSegment for ScriptedSegment {
    async fn stop(&self) -> Result<(), CaptureError> {
        *self.stop_calls.lock().await += 1;
        Ok(())
    }
}

/// Opens a fresh [`ScriptedSegment`] per call, or fails with `open_error`.
/// Each open pops one entry of `emit_during_open` and sends it before returning.
#[derive(Default)]
pub struct ScriptedConnector {
    pub unavailable: bool,
    pub open_error: Mutex<Option<CaptureError>>,
    pub emit_during_open: Mutex<VecDeque<Vec<CaptureEvent>>>,
    pub options_seen: Mutex<Vec<CaptureOptions>>,
    pub segments: Mutex<Vec<Arc<ScriptedSegment>>>,
}

impl ScriptedConnector {
    pub async fn open_calls(&self) -> usize {
        self.options_seen.lock().await.len()
    }

    pub async fn segment(&self, index: usize) -> Arc<ScriptedSegment> {
        Arc::clone(&self.segments.lock().await[index])
    }
}

#[async_trait]
impl CaptureConnector for ScriptedConnector {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    async fn open(&self, options: CaptureOptions) -> Result<OpenedSegment, CaptureError> {
        self.options_seen.lock().await.push(options);
        if let Some(err) = self.open_error.lock().await.clone() {
            return Err(err);
        }
        let (events_tx, events) = broadcast::channel(32);
        let segment = Arc::new(ScriptedSegment {
            events_tx,
            stop_calls: Mutex::new(0),
        });
        self.segments.lock().await.push(Arc::clone(&segment));

        let early = self.emit_during_open.lock().await.pop_front();
        for event in early.unwrap_or_default() {
            segment.emit(event);
        }
        Ok(OpenedSegment {
            segment: segment as Arc<dyn CaptureSegment>,
            events,
        })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub texts: Mutex<Vec<String>>,
}

#[async_trait]
impl TranscriptSink for RecordingSink {
    async fn replace_transcript(&self, text: &str) {
        self.texts.lock().await.push(text.to_string());
    }
}

/// Waits for the first event matching `predicate`, skipping the rest.
pub async fn next_matching<E: Clone>(
    events: &mut broadcast::Receiver<E>,
    predicate: impl Fn(&E) -> bool,
) -> E {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(err) => panic!("event stream failed: {err}"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::UiLanguage;
use speech_capture::{
    CaptureConnector, CaptureError, CaptureEvent, CaptureOptions, CaptureSegment, OpenedSegment,
    RecognitionResult, SpeechLanguage,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::notices::{Notice, NoticeKind};

#[async_trait]
pub trait TranscriptSink: Send + Sync {
    async fn replace_transcript(&self, text: &str);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DictationState {
    #[default]
    Stopped,
    Listening,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationChange {
    Started,
    Stopped,
    AlreadyListening,
    AlreadyStopped,
    Unavailable,
    PermissionDenied,
    Failed(CaptureError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationEvent {
    StateChanged(DictationState),
    TranscriptUpdated(String),
    SegmentRestarted { restarts: u64 },
    Notice(Notice),
}

#[derive(Debug, Default)]
pub struct UnavailableCapture;

#[async_trait]
impl CaptureConnector for UnavailableCapture {
    fn is_available(&self) -> bool {
        false
    }

    async fn open(&self, _options: CaptureOptions) -> Result<OpenedSegment, CaptureError> {
        Err(CaptureError::Unavailable)
    }
}

struct ActiveSegment {
    segment: Arc<dyn CaptureSegment>,
    event_task: JoinHandle<()>,
}

#[derive(Default)]
struct DictationInner {
    state: DictationState,
    language: UiLanguage,
    transcript: String,
    // Bumped on every open and on stop; segment tasks compare against it.
    segment_seq: u64,
    restarts: u64,
    active: Option<ActiveSegment>,
}

pub struct DictationController {
    connector: Arc<dyn CaptureConnector>,
    sink: Arc<dyn TranscriptSink>,
    inner: Mutex<DictationInner>,
    events: broadcast::Sender<DictationEvent>,
}

impl DictationController {
    pub fn new(connector: Arc<dyn CaptureConnector>, sink: Arc<dyn TranscriptSink>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            connector,
            sink,
            inner: Mutex::new(DictationInner::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DictationEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> DictationState {
        self.inner.lock().await.state
    }

    pub async fn transcript(&self) -> String {
        self.inner.lock().await.transcript.clone()
    }

    pub async fn start(self: &Arc<Self>, language: UiLanguage) -> DictationChange {
        if !self.connector.is_available() {
            info!("dictation: capture unavailable, start ignored");
            return self.report_capture_error(CaptureError::Unavailable, language);
        }

        let mut inner = self.inner.lock().await;
        if inner.state == DictationState::Listening {
            debug!("dictation: already listening");
            return DictationChange::AlreadyListening;
        }
        inner.language = language;

        match self.open_segment(&mut inner).await {
            Ok(()) => {
                inner.state = DictationState::Listening;
                drop(inner);
                info!(language = %language, "dictation: listening");
                let _ = self
                    .events
                    .send(DictationEvent::StateChanged(DictationState::Listening));
                DictationChange::Started
            }
            Err(err) => {
                drop(inner);
                self.report_capture_error(err, language)
            }
        }
    }

    pub async fn stop(&self) -> DictationChange {
        let mut inner = self.inner.lock().await;
        if inner.state == DictationState::Stopped {
            return DictationChange::AlreadyStopped;
        }
        inner.state = DictationState::Stopped;
        inner.segment_seq += 1;
        let active = inner.active.take();
        drop(inner);

        if let Some(active) = active {
            active.event_task.abort();
            if let Err(err) = active.segment.stop().await {
                warn!(error = %err, "dictation: failed to stop capture segment");
            }
        }

        info!("dictation: stopped");
        let _ = self
            .events
            .send(DictationEvent::StateChanged(DictationState::Stopped));
        DictationChange::Stopped
    }

    pub async fn toggle(self: &Arc<Self>, language: UiLanguage) -> DictationChange {
        let listening = self.state().await == DictationState::Listening;
        if listening {
            self.stop().await
        } else {
            self.start(language).await
        }
    }

    async fn open_segment(self: &Arc<Self>, inner: &mut DictationInner) -> Result<(), CaptureError> {
        let options = CaptureOptions::continuous(SpeechLanguage::for_ui_language(inner.language));
        let OpenedSegment { segment, events } = self.connector.open(options).await?;
        inner.segment_seq += 1;
        let event_task = self.spawn_segment_event_task(inner.segment_seq, events);
        inner.active = Some(ActiveSegment {
            segment,
            event_task,
        });
        Ok(())
    }

    fn spawn_segment_event_task(
        self: &Arc<Self>,
        seq: u64,
        mut events: broadcast::Receiver<CaptureEvent>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(CaptureEvent::Results(results)) => {
                        controller.on_results(seq, &results).await;
                    }
                    Ok(CaptureEvent::SegmentEnded) | Err(broadcast::error::RecvError::Closed) => {
                        controller.on_segment_ended(seq).await;
                        break;
                    }
                    Ok(CaptureEvent::Failed(err)) => {
                        if controller.on_capture_failed(seq, err).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "dictation: capture events lagged");
                    }
                }
            }
        })
    }

    async fn on_results(&self, seq: u64, results: &[RecognitionResult]) {
        let text: String = results
            .iter()
            .map(|result| result.transcript.as_str())
            .collect();
        {
            let mut inner = self.inner.lock().await;
            if inner.state != DictationState::Listening || inner.segment_seq != seq {
                return;
            }
            inner.transcript.clone_from(&text);
        }
        self.sink.replace_transcript(&text).await;
        let _ = self.events.send(DictationEvent::TranscriptUpdated(text));
    }

    async fn on_segment_ended(self: &Arc<Self>, seq: u64) {
        let mut inner = self.inner.lock().await;
        if inner.state != DictationState::Listening || inner.segment_seq != seq {
            debug!("dictation: segment ended after stop");
            return;
        }
        // This task belongs to the finished segment; dropping its handle detaches it.
        inner.active = None;

        match self.open_segment(&mut inner).await {
            Ok(()) => {
                inner.restarts += 1;
                let restarts = inner.restarts;
                drop(inner);
                debug!(restarts, "dictation: reopened capture segment");
                let _ = self
                    .events
                    .send(DictationEvent::SegmentRestarted { restarts });
            }
            Err(err) => {
                inner.state = DictationState::Stopped;
                let language = inner.language;
                drop(inner);
                warn!(error = %err, "dictation: could not reopen capture segment");
                let _ = self
                    .events
                    .send(DictationEvent::StateChanged(DictationState::Stopped));
                self.report_capture_error(err, language);
            }
        }
    }

    /// Returns true when the failure ended the dictation session.
    async fn on_capture_failed(&self, seq: u64, err: CaptureError) -> bool {
        if !err.is_terminal() {
            debug!(error = %err, "dictation: recoverable capture error");
            return false;
        }

        let mut inner = self.inner.lock().await;
        if inner.state != DictationState::Listening || inner.segment_seq != seq {
            return true;
        }
        inner.state = DictationState::Stopped;
        inner.segment_seq += 1;
        let language = inner.language;
        let active = inner.active.take();
        drop(inner);

        if let Some(active) = active {
            let _ = active.segment.stop().await;
        }
        let _ = self
            .events
            .send(DictationEvent::StateChanged(DictationState::Stopped));
        self.report_capture_error(err, language);
        true
    }

    fn report_capture_error(&self, err: CaptureError, language: UiLanguage) -> DictationChange {
        let kind = match &err {
            CaptureError::Unavailable => NoticeKind::DictationUnavailable,
            CaptureError::PermissionDenied => NoticeKind::MicrophoneDenied,
            _ => {
                warn!(error = %err, "dictation: capture failed");
                return DictationChange::Failed(err);
            }
        };
        let _ = self
            .events
            .send(DictationEvent::Notice(Notice::localized(kind, language)));
        match err {
            CaptureError::Unavailable => DictationChange::Unavailable,
            _ => DictationChange::PermissionDenied,
        }
    }
}

#[cfg(test)]
#[path = "tests/dictation_tests.rs"]
mod tests;

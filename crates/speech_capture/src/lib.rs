use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::UiLanguage;
use thiserror::Error;
use tokio::sync::broadcast;

/// Recognition languages the capture platform is asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SpeechLanguage {
    #[default]
    EnUs,
    HiIn,
    TaIn,
    TeIn,
    PaIn,
    MrIn,
}

impl SpeechLanguage {
    pub fn tag(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::HiIn => "hi-IN",
            Self::TaIn => "ta-IN",
            Self::TeIn => "te-IN",
            Self::PaIn => "pa-IN",
            Self::MrIn => "mr-IN",
        }
    }

    /// Interface languages without a recognition model use `en-US`.
    pub fn for_ui_language(language: UiLanguage) -> Self {
        match language {
            UiLanguage::Hindi => Self::HiIn,
            UiLanguage::Tamil => Self::TaIn,
            UiLanguage::Telugu => Self::TeIn,
            UiLanguage::Punjabi => Self::PaIn,
            UiLanguage::Marathi => Self::MrIn,
            _ => Self::EnUs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    pub language: SpeechLanguage,
    pub continuous: bool,
    pub interim_results: bool,
}

impl CaptureOptions {
    pub fn continuous(language: SpeechLanguage) -> Self {
        Self {
            language,
            continuous: true,
            interim_results: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn finalized(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Every result the segment currently holds, interim and final, in order.
    Results(Vec<RecognitionResult>),
    /// The platform closed the segment on its own (silence, time limit) or in
    /// response to `stop`.
    SegmentEnded,
    Failed(CaptureError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("speech capture is not available on this platform")]
    Unavailable,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("no speech detected")]
    NoSpeech,
    #[error("speech capture failed: {0}")]
    Platform(String),
}

impl CaptureError {
    /// Errors after which reopening a segment would fail the same way.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unavailable | Self::PermissionDenied)
    }
}

#[async_trait]
pub trait CaptureSegment: Send + Sync {
    async fn stop(&self) -> Result<(), CaptureError>;
}

/// A segment handed out by `open`. `events` is subscribed before capture
/// starts, so it holds everything the segment emits, including an end or a
/// failure that happens while `open` is still running.
pub struct OpenedSegment {
    pub segment: Arc<dyn CaptureSegment>,
    pub events: broadcast::Receiver<CaptureEvent>,
}

#[async_trait]
pub trait CaptureConnector: Send + Sync {
    fn is_available(&self) -> bool;
    async fn open(&self, options: CaptureOptions) -> Result<OpenedSegment, CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_ui_language_to_a_supported_tag() {
        assert_eq!(SpeechLanguage::for_ui_language(UiLanguage::Hindi).tag(), "hi-IN");
        assert_eq!(SpeechLanguage::for_ui_language(UiLanguage::Marathi).tag(), "mr-IN");
        assert_eq!(SpeechLanguage::for_ui_language(UiLanguage::Punjabi).tag(), "pa-IN");
        assert_eq!(SpeechLanguage::for_ui_language(UiLanguage::Bengali).tag(), "en-US");
        assert_eq!(SpeechLanguage::for_ui_language(UiLanguage::English).tag(), "en-US");
    }

    #[test]
    fn only_permission_and_availability_errors_are_terminal() {
        assert!(CaptureError::PermissionDenied.is_terminal());
        assert!(CaptureError::Unavailable.is_terminal());
        assert!(!CaptureError::NoSpeech.is_terminal());
        assert!(!CaptureError::Platform("network".into()).is_terminal());
    }
}

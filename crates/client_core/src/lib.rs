pub mod advisor;
pub mod config;
pub mod crop;
pub mod dictation;
pub mod form;
pub mod notices;
pub mod responses;
pub mod session;
pub mod transport;

pub use advisor::SchemeAdvisor;
pub use config::{load_settings, load_settings_from, Settings, DEFAULT_SETTINGS_FILE};
pub use crop::{plan_crop, CropFormError, CropPlanError, CropPlanForm};
pub use dictation::{
    DictationChange, DictationController, DictationEvent, DictationState, TranscriptSink,
    UnavailableCapture,
};
pub use form::{QueryForm, SharedQueryForm};
pub use notices::{Notice, NoticeKind};
pub use responses::{HiddenFollowUpPolicy, QuestionView, SchemeSection};
pub use session::{
    Completion, EligibilitySession, SessionError, SessionEvent, SessionFailure, SessionOperation,
    SessionPhase, SessionSnapshot,
};
pub use transport::{
    CropPlanService, Endpoint, EndpointPaths, HttpSchemeService, SchemeService, ServiceError,
};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::domain::{Answer, UiLanguage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeRecommendation {
    #[serde(rename = "Reason", default)]
    pub reason: String,
    #[serde(rename = "URL", default)]
    pub url: String,
    /// Anything else the backend attached; sent back untouched with the
    /// eligibility-schema request.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchemeRecommendation {
    pub fn new(reason: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            url: url.into(),
            extra: Map::new(),
        }
    }
}

/// Scheme name -> recommendation, as returned by the recommendation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemeRecommendations(pub BTreeMap<String, SchemeRecommendation>);

impl SchemeRecommendations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemeRecommendation)> {
        self.0.iter()
    }
}

/// One eligibility question as delivered by the backend.
///
/// `answer` and the follow-up values are the backend's expected answers. They
/// are opaque here and only echoed back in `exp_qa`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
    #[serde(
        default,
        rename = "follow_ups",
        alias = "followUps",
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_ups: Option<BTreeMap<String, Value>>,
}

impl QuestionSpec {
    pub fn follow_up_texts(&self) -> impl Iterator<Item = &String> {
        self.follow_ups.iter().flat_map(|follow_ups| follow_ups.keys())
    }
}

pub type SchemeQuestions = BTreeMap<String, QuestionSpec>;

/// Scheme -> question text -> spec. Read-only once received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionSchema(pub BTreeMap<String, SchemeQuestions>);

impl QuestionSchema {
    pub fn schemes(&self) -> impl Iterator<Item = (&String, &SchemeQuestions)> {
        self.0.iter()
    }

    pub fn question(&self, scheme: &str, question: &str) -> Option<&QuestionSpec> {
        self.0.get(scheme)?.get(question)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub answer: Answer,
    #[serde(
        default,
        rename = "follow_ups",
        alias = "followUps",
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_ups: Option<BTreeMap<String, Answer>>,
}

impl QuestionResponse {
    pub fn follow_up(&self, follow_up: &str) -> Option<Answer> {
        self.follow_ups.as_ref()?.get(follow_up).copied()
    }
}

pub type SchemeResponses = BTreeMap<String, QuestionResponse>;

/// Scheme -> question text -> the user's current answers.
///
/// Scheme branches sit behind `Arc`, so cloning a tree shares every branch and
/// [`ResponseTree::scheme_mut`] copies only the branch being written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseTree(BTreeMap<String, Arc<SchemeResponses>>);

impl ResponseTree {
    pub fn insert_scheme(&mut self, scheme: impl Into<String>, responses: SchemeResponses) {
        self.0.insert(scheme.into(), Arc::new(responses));
    }

    pub fn schemes(&self) -> impl Iterator<Item = (&String, &SchemeResponses)> {
        self.0.iter().map(|(name, responses)| (name, responses.as_ref()))
    }

    /// Shared handle to a scheme branch, for callers that care about identity.
    pub fn scheme_branch(&self, scheme: &str) -> Option<&Arc<SchemeResponses>> {
        self.0.get(scheme)
    }

    /// Copy-on-write access: a branch still shared with another tree is cloned
    /// before the reference is handed out.
    pub fn scheme_mut(&mut self, scheme: &str) -> Option<&mut SchemeResponses> {
        self.0.get_mut(scheme).map(Arc::make_mut)
    }

    pub fn question(&self, scheme: &str, question: &str) -> Option<&QuestionResponse> {
        self.0.get(scheme)?.get(question)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Eligibility outcome for one scheme. The backend answers "Yes"/"No"; any
/// other value is kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum VerdictStatus {
    Eligible,
    NotEligible,
    Other(Value),
}

impl VerdictStatus {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eligible => f.write_str("eligible"),
            Self::NotEligible => f.write_str("not eligible"),
            Self::Other(Value::String(raw)) => f.write_str(raw),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for VerdictStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Eligible => serializer.serialize_str("Yes"),
            Self::NotEligible => serializer.serialize_str("No"),
            Self::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for VerdictStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str() {
            Some("Yes") => Self::Eligible,
            Some("No") => Self::NotEligible,
            _ => Self::Other(value),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Verdict(pub BTreeMap<String, VerdictStatus>);

impl Verdict {
    pub fn iter(&self) -> impl Iterator<Item = (&String, &VerdictStatus)> {
        self.0.iter()
    }

    pub fn get(&self, scheme: &str) -> Option<&VerdictStatus> {
        self.0.get(scheme)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendSchemesRequest {
    pub location: String,
    pub query: String,
    pub top_k: u32,
    pub language: UiLanguage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionsRequest {
    pub rec_scheme: SchemeRecommendations,
    pub language: UiLanguage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSchemesRequest {
    pub exp_qa: QuestionSchema,
    pub user_qa: ResponseTree,
}

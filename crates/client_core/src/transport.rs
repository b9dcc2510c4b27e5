//! HTTP access to the recommendation backend.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    crop::{CropPlanRequest, CropPlanResponse},
    error::ApiError,
    protocol::{
        CheckSchemesRequest, QuestionSchema, QuestionsRequest, RecommendSchemesRequest,
        SchemeRecommendations, Verdict,
    },
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Settings;

const ERROR_BODY_EXCERPT_CHARS: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    RecommendSchemes,
    Questions,
    CheckSchemes,
    RecommendCrop,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecommendSchemes => f.write_str("rec_schemes"),
            Self::Questions => f.write_str("questions"),
            Self::CheckSchemes => f.write_str("check_schemes"),
            Self::RecommendCrop => f.write_str("recommend_crop"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{endpoint} request timed out")]
    Timeout { endpoint: Endpoint },
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },
    #[error("{endpoint} returned a malformed body: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
    #[error("{endpoint} reported an error: {message}")]
    Backend { endpoint: Endpoint, message: String },
}

impl ServiceError {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Timeout { endpoint }
            | Self::Transport { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Decode { endpoint, .. }
            | Self::Backend { endpoint, .. } => *endpoint,
        }
    }

    fn from_reqwest(endpoint: Endpoint, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { endpoint }
        } else {
            Self::Transport { endpoint, source }
        }
    }
}

/// The three backend calls the eligibility flow depends on.
#[async_trait]
pub trait SchemeService: Send + Sync {
    async fn recommend_schemes(
        &self,
        request: &RecommendSchemesRequest,
    ) -> Result<SchemeRecommendations, ServiceError>;
    async fn fetch_questions(
        &self,
        request: &QuestionsRequest,
    ) -> Result<QuestionSchema, ServiceError>;
    async fn check_schemes(&self, request: &CheckSchemesRequest) -> Result<Verdict, ServiceError>;
}

#[async_trait]
pub trait CropPlanService: Send + Sync {
    async fn recommend_crop(
        &self,
        request: &CropPlanRequest,
    ) -> Result<CropPlanResponse, ServiceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPaths {
    pub rec_schemes: String,
    pub questions: String,
    pub check_schemes: String,
    pub recommend_crop: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            rec_schemes: settings.rec_schemes_path,
            questions: settings.questions_path,
            check_schemes: settings.check_schemes_path,
            recommend_crop: settings.recommend_crop_path,
        }
    }
}

/// Credentialed JSON client: cookies set by the backend are replayed on
/// later calls, and every request carries an explicit timeout.
pub struct HttpSchemeService {
    http: Client,
    base_url: String,
    paths: EndpointPaths,
}

impl HttpSchemeService {
    pub fn new(
        base_url: impl Into<String>,
        paths: EndpointPaths,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            paths,
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let paths = EndpointPaths {
            rec_schemes: settings.rec_schemes_path.clone(),
            questions: settings.questions_path.clone(),
            check_schemes: settings.check_schemes_path.clone(),
            recommend_crop: settings.recommend_crop_path.clone(),
        };
        Ok(Self::new(
            settings.base_url.clone(),
            paths,
            settings.request_timeout(),
        )?)
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        let path = match endpoint {
            Endpoint::RecommendSchemes => &self.paths.rec_schemes,
            Endpoint::Questions => &self.paths.questions,
            Endpoint::CheckSchemes => &self.paths.check_schemes,
            Endpoint::RecommendCrop => &self.paths.recommend_crop,
        };
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post<B, T>(&self, endpoint: Endpoint, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint_url(endpoint);
        debug!(%endpoint, %url, "posting request");

        let res = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ServiceError::from_reqwest(endpoint, source))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|source| ServiceError::from_reqwest(endpoint, source))?;

        if !status.is_success() {
            warn!(%endpoint, status = status.as_u16(), "backend returned failure status");
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|value| ApiError::from_detail_body(&value));
            let body = match detail {
                Some(detail) => detail.error,
                None => text,
            };
            return Err(ServiceError::Status {
                endpoint,
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_EXCERPT_CHARS).collect(),
            });
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|source| ServiceError::Decode { endpoint, source })?;
        if let Some(api_error) = ApiError::from_body(&value) {
            warn!(%endpoint, message = %api_error.error, "backend reported in-band error");
            return Err(ServiceError::Backend {
                endpoint,
                message: api_error.error,
            });
        }
        serde_json::from_value(value).map_err(|source| ServiceError::Decode { endpoint, source })
    }
}

#[async_trait]
impl SchemeService for HttpSchemeService {
    async fn recommend_schemes(
        &self,
        request: &RecommendSchemesRequest,
    ) -> Result<SchemeRecommendations, ServiceError> {
        self.post(Endpoint::RecommendSchemes, request).await
    }

    async fn fetch_questions(
        &self,
        request: &QuestionsRequest,
    ) -> Result<QuestionSchema, ServiceError> {
        self.post(Endpoint::Questions, request).await
    }

    async fn check_schemes(&self, request: &CheckSchemesRequest) -> Result<Verdict, ServiceError> {
        self.post(Endpoint::CheckSchemes, request).await
    }
}

#[async_trait]
impl CropPlanService for HttpSchemeService {
    async fn recommend_crop(
        &self,
        request: &CropPlanRequest,
    ) -> Result<CropPlanResponse, ServiceError> {
        self.post(Endpoint::RecommendCrop, request).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

use std::future::Future;
use std::time::Duration;

use lexipic_types::{
    ImageOptions, Language, PictogramResult, Resolution, STATIC_BASE, image_url_with_base,
};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::cancel::CancelToken;

pub const DEFAULT_API_BASE: &str = "https://api.arasaac.org/api/pictograms";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup cancelled")]
    Cancelled,
    #[error("pictogram service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("pictogram service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid pictogram payload: {0}")]
    Decode(reqwest::Error),
}

impl LookupError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LookupError::Cancelled)
    }
}

/// Pictogram catalog search.
///
/// A query with no hits is `Ok(vec![])`; only transport or server faults and
/// cancellation are errors.
pub trait PictogramLookup: Send + Sync + 'static {
    fn lookup(
        &self,
        language: Language,
        query: &str,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<Vec<PictogramResult>, LookupError>> + Send;
}

/// HTTP client for the ARASAAC `bestsearch` endpoint.
#[derive(Clone, Debug)]
pub struct ArasaacClient {
    http: reqwest::Client,
    api_base: String,
    static_base: String,
}

#[derive(Deserialize)]
struct ApiPictogram {
    #[serde(rename = "_id")]
    id: u64,
    #[serde(default)]
    keywords: Vec<ApiKeyword>,
    #[serde(default)]
    desc: Option<String>,
}

#[derive(Deserialize)]
struct ApiKeyword {
    #[serde(default)]
    keyword: String,
}

impl ArasaacClient {
    pub fn new(
        api_base: impl Into<String>,
        static_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            static_base: static_base.into(),
        })
    }

    pub fn with_defaults() -> Result<Self, LookupError> {
        Self::new(DEFAULT_API_BASE, STATIC_BASE, DEFAULT_TIMEOUT)
    }

    pub fn static_base(&self) -> &str {
        &self.static_base
    }

    fn search_url(&self, language: Language, query: &str) -> String {
        format!(
            "{}/{}/bestsearch/{}",
            self.api_base,
            language,
            urlencoding::encode(query)
        )
    }

    async fn fetch(
        &self,
        language: Language,
        query: &str,
    ) -> Result<Vec<PictogramResult>, LookupError> {
        let url = self.search_url(language, query);
        debug!("GET {url}");
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let items: Vec<ApiPictogram> = response.json().await.map_err(LookupError::Decode)?;
        Ok(items
            .into_iter()
            .map(|item| PictogramResult {
                id: item.id,
                image_url: image_url_with_base(
                    &self.static_base,
                    item.id,
                    Resolution::R500,
                    &ImageOptions::default(),
                ),
                search_text: query.to_string(),
                keywords: item.keywords.into_iter().map(|k| k.keyword).collect(),
                description: item.desc,
            })
            .collect())
    }
}

impl PictogramLookup for ArasaacClient {
    fn lookup(
        &self,
        language: Language,
        query: &str,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<Vec<PictogramResult>, LookupError>> + Send {
        async move {
            let trimmed = query.trim();
            if trimmed.is_empty() {
                return Ok(Vec::new());
            }
            if cancel.is_cancelled() {
                return Err(LookupError::Cancelled);
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(LookupError::Cancelled),
                result = self.fetch(language, trimmed) => result,
            }
        }
    }
}

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use lexipic_matcher::DEFAULT_LIMIT;
use lexipic_types::{
    Action, ImageOptions, InferenceResult, Language, Resolution, image_url_with_base,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::inflight::InFlight;
use crate::lookup::PictogramLookup;
use crate::pipeline::Translator;

pub const MAX_INFER_LIMIT: usize = 10;

pub struct AppState<L> {
    pub translator: Arc<Translator<L>>,
    pub inflight: InFlight,
    pub static_base: String,
    pub disable_cache: bool,
}

impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            translator: Arc::clone(&self.translator),
            inflight: self.inflight.clone(),
            static_base: self.static_base.clone(),
            disable_cache: self.disable_cache,
        }
    }
}

#[derive(Deserialize)]
pub struct InferQuery {
    pub message: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct TranslateRequest {
    pub message: String,
    pub language: Option<String>,
    pub session: Option<String>,
}

#[derive(Deserialize)]
pub struct ImageQuery {
    pub resolution: Option<u32>,
    pub plural: Option<bool>,
    pub no_color: Option<bool>,
    pub action: Option<String>,
    pub hair: Option<String>,
    pub skin: Option<String>,
}

#[derive(Serialize)]
pub struct InferResponse {
    message: String,
    tokens: Vec<String>,
    matches: Vec<InferenceResult>,
    queries: Vec<String>,
}

#[derive(Serialize)]
pub struct CancelResponse {
    cancelled: bool,
}

#[derive(Serialize)]
pub struct ImageUrlResponse {
    url: String,
}

#[derive(Serialize)]
pub struct CategoriesResponse {
    categories: Vec<CategoryEntry>,
}

#[derive(Serialize)]
struct CategoryEntry {
    name: String,
    phrases: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router<L: PictogramLookup>(state: AppState<L>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/infer", get(infer::<L>))
        .route("/v1/translate", post(translate::<L>))
        .route("/v1/translate/{session}", delete(cancel_translate::<L>))
        .route("/v1/pictograms/{id}/image-url", get(image_url::<L>))
        .route("/v1/categories", get(categories::<L>))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn infer<L: PictogramLookup>(
    State(state): State<AppState<L>>,
    Query(params): Query<InferQuery>,
) -> Result<Response, ApiError> {
    let message = params
        .message
        .ok_or_else(|| ApiError::bad_request("message is required"))?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_INFER_LIMIT {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {MAX_INFER_LIMIT}"
        )));
    }

    let matcher = state.translator.matcher();
    let matches = matcher.infer(&message, limit);
    let response = InferResponse {
        tokens: matcher.tokenize(&message),
        queries: lexipic_matcher::build_search_queries(&matches),
        matches,
        message,
    };
    Ok(cached(&state, "public, max-age=300", Json(response)))
}

async fn translate<L: PictogramLookup>(
    State(state): State<AppState<L>>,
    request: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }
    let language = match request.language.as_deref() {
        None => Language::default(),
        Some(code) => Language::from_code(code)
            .ok_or_else(|| ApiError::bad_request(format!("unsupported language {code:?}")))?,
    };

    let translation = match request.session.as_deref() {
        Some(session) => {
            let pass = state.inflight.begin(session);
            debug!("translate pass started for session {session}");
            state
                .translator
                .translate(language, &request.message, pass.token())
                .await
        }
        None => {
            state
                .translator
                .translate(language, &request.message, &CancelToken::never())
                .await
        }
    };
    Ok(Json(translation).into_response())
}

/// Cancel the running pass of a session; it answers with status `cancelled`.
async fn cancel_translate<L: PictogramLookup>(
    State(state): State<AppState<L>>,
    Path(session): Path<String>,
) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.inflight.cancel(&session),
    })
}

async fn image_url<L: PictogramLookup>(
    State(state): State<AppState<L>>,
    Path(id): Path<u64>,
    Query(params): Query<ImageQuery>,
) -> Result<Response, ApiError> {
    let resolution = match params.resolution {
        None => Resolution::default(),
        Some(px) => Resolution::from_pixels(px).ok_or_else(|| {
            ApiError::bad_request("resolution must be one of 300, 500 or 2500")
        })?,
    };
    let action = match params.action.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(Action::parse(raw).ok_or_else(|| {
            ApiError::bad_request("action must be past or future")
        })?),
    };
    let options = ImageOptions {
        action,
        hair_color: params.hair,
        skin_color: params.skin,
        plural: params.plural.unwrap_or(false),
        no_color: params.no_color.unwrap_or(false),
    };
    let response = ImageUrlResponse {
        url: image_url_with_base(&state.static_base, id, resolution, &options),
    };
    Ok(cached(&state, "public, max-age=86400, immutable", Json(response)))
}

async fn categories<L: PictogramLookup>(State(state): State<AppState<L>>) -> Response {
    let corpus = state.translator.matcher().corpus();
    let categories = corpus
        .categories()
        .into_iter()
        .map(|name| CategoryEntry {
            name: name.to_string(),
            phrases: corpus
                .samples_in_category(name)
                .map(|sample| sample.phrase.clone())
                .collect(),
        })
        .collect();
    cached(
        &state,
        "public, max-age=3600",
        Json(CategoriesResponse { categories }),
    )
}

fn cached<L>(state: &AppState<L>, policy: &'static str, body: impl IntoResponse) -> Response {
    if state.disable_cache {
        return body.into_response();
    }
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static(policy))],
        body,
    )
        .into_response()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
        }
    }
}

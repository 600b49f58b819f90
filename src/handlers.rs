use crate::config::Config;
use crate::detail::{render_detail, DetailView, SocietyHandoff, NO_DATA_MESSAGE};
use crate::errors::AppError;
use crate::models::PlaceDraft;
use crate::places_client::PlacesClient;
use crate::search::{
    run_search, SearchFailure, SearchOutcome, SearchState, SocietyRow, NOT_FOUND_MESSAGE,
};
use crate::submission::{run_submission, SubmissionForm, SubmissionOutcome, DEFAULT_NOTICE_SECS};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// In-flight entries expire after this many request timeouts.
const IN_FLIGHT_TTL_TIMEOUTS: u64 = 10;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the remote places store.
    pub places: PlacesClient,
    /// Detail hand-offs issued by searches.
    /// Key: detail token, Value: the society as it was listed.
    pub handoffs: Cache<String, SocietyHandoff>,
    /// Place names with a submission in progress.
    /// Key: place name as sent to the store, Value: unix timestamp when it started.
    pub submissions_in_flight: Cache<String, i64>,
}

impl AppState {
    /// Builds the state with caches sized from `config`.
    pub fn new(config: Config, places: PlacesClient) -> Self {
        let handoffs = Cache::builder()
            .time_to_live(Duration::from_secs(config.handoff_ttl_secs))
            .max_capacity(50_000)
            .build();

        // Submissions release their own entry; the TTL only clears one whose
        // task was lost.
        let submissions_in_flight = Cache::builder()
            .time_to_live(Duration::from_secs(
                config
                    .request_timeout_secs
                    .saturating_mul(IN_FLIGHT_TTL_TIMEOUTS),
            ))
            .max_capacity(10_000)
            .build();

        Self {
            config,
            places,
            handoffs,
            submissions_in_flight,
        }
    }
}

/// Routes for the three views. Health is mounted separately.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/search", get(search_place))
        .route("/api/societies/:token", get(society_detail))
        .route("/api/submissions", post(submit_place))
        .route("/api/submissions/draft", get(empty_draft))
        .route("/api/submissions/in-flight", get(submission_status))
}

/// Health check endpoint.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "neighborfit",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub place: String,
}

/// A results row plus the token that opens its detail view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRow {
    #[serde(flatten)]
    pub row: SocietyRow,
    pub detail_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    pub place: String,
    pub societies: Vec<SearchRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// GET /api/search?place=
///
/// Looks the place up and lists its societies. Each row carries a detail
/// token valid for the hand-off TTL.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `params` - Query parameters holding the place name.
///
/// # Returns
///
/// * `Response` - 200 with the results, 404 when the place is unknown, 400 for
///   an empty name, 502/503 when the store fails or cannot be reached.
pub async fn search_place(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    tracing::info!("GET /api/search - place: {:?}", params.place);

    let mut search = SearchState::new();
    search.set_place(params.place);
    search.commit_place();

    match run_search(&state.places, &mut search).await {
        SearchOutcome::Found(place) => {
            let mut rows = Vec::with_capacity(place.societies.len());
            for (index, society) in place.societies.iter().enumerate() {
                let token = Uuid::new_v4().to_string();
                if let Some(handoff) = SocietyHandoff::from_place(&place, index) {
                    state.handoffs.insert(token.clone(), handoff).await;
                }
                rows.push(SearchRow {
                    row: SocietyRow::from(society),
                    detail_token: token,
                });
            }

            tracing::info!("Listed {} societies for '{}'", rows.len(), place.name);
            let message = search.empty_text().map(|_| NOT_FOUND_MESSAGE);
            Json(SearchView {
                place: place.name,
                societies: rows,
                message,
            })
            .into_response()
        }
        SearchOutcome::NotFound => {
            message_response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
        }
        SearchOutcome::Failed(SearchFailure::EmptyPlace) => {
            AppError::BadRequest(SearchFailure::EmptyPlace.message().to_string()).into_response()
        }
        SearchOutcome::Failed(failure) => {
            let status = match failure {
                SearchFailure::Network => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            };
            message_response(status, failure.message())
        }
    }
}

/// GET /api/societies/:token
///
/// Renders a society handed off by an earlier search. Unknown or expired
/// tokens get the "no data" view; the store is never consulted.
pub async fn society_detail(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Response {
    let handoff = state.handoffs.get(&token).await;
    match render_detail(handoff.as_ref()) {
        DetailView::Society(detail) => Json(detail).into_response(),
        DetailView::NoData => {
            tracing::info!("No hand-off for detail token {}", token);
            message_response(StatusCode::NOT_FOUND, NO_DATA_MESSAGE)
        }
    }
}

/// GET /api/submissions/draft
///
/// An empty form: no place name and one empty society.
pub async fn empty_draft() -> Json<PlaceDraft> {
    Json(PlaceDraft::default())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAccepted {
    pub outcome: SubmissionOutcome,
    pub notice: Option<crate::models::SuccessNotice>,
    pub form: PlaceDraft,
}

/// Key a draft is guarded under: the place name exactly as the store will see it.
///
/// Blank names fail validation before any request, so they are not guarded.
fn in_flight_key(draft: &PlaceDraft) -> Option<String> {
    if draft.place_name.trim().is_empty() {
        None
    } else {
        Some(draft.place_name.clone())
    }
}

/// Holds a place's in-flight entry until the submission ends.
///
/// `release` clears it before the response is built. If the task unwinds
/// instead, `Drop` clears it in the background.
struct InFlightGuard {
    cache: Cache<String, i64>,
    key: Option<String>,
}

impl InFlightGuard {
    async fn release(mut self) {
        if let Some(key) = self.key.take() {
            self.cache.invalidate(&key).await;
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        let cache = self.cache.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move { cache.invalidate(&key).await });
        }
    }
}

/// POST /api/submissions
///
/// Runs the submission flow for the posted draft.
///
/// The flow runs in its own task, so a client that disconnects does not cut a
/// batch of appends short, and the place is released as soon as it finishes.
///
/// # Returns
///
/// * `Result<Response, AppError>` - 201 with the reset form and the success
///   notice, or the failure with the draft echoed back unchanged. A second
///   submission for a place that is still being submitted gets 409.
pub async fn submit_place(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<PlaceDraft>,
) -> Result<Response, AppError> {
    tracing::info!(
        "POST /api/submissions - place: {:?}, {} societies",
        draft.place_name,
        draft.societies.len()
    );

    let mut guard = None;
    if let Some(key) = in_flight_key(&draft) {
        let now = chrono::Utc::now().timestamp();
        let entry = state
            .submissions_in_flight
            .entry(key.clone())
            .or_insert_with(async move { now })
            .await;
        if !entry.is_fresh() {
            tracing::warn!(
                "⏭ Submission for {:?} rejected - another started {} seconds ago",
                key,
                now - entry.into_value()
            );
            return Err(AppError::Conflict(
                "A submission for this place is already in progress.".to_string(),
            ));
        }
        guard = Some(InFlightGuard {
            cache: state.submissions_in_flight.clone(),
            key: Some(key),
        });
    }

    let notice_ttl = i64::try_from(state.config.success_notice_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or_else(|| chrono::Duration::seconds(DEFAULT_NOTICE_SECS));
    let places = state.places.clone();

    let task = tokio::spawn(async move {
        let mut form = SubmissionForm::with_draft(draft, notice_ttl);
        let result = run_submission(&places, &mut form).await;
        if let Some(guard) = guard {
            guard.release().await;
        }
        (form, result)
    });
    let (form, result) = task
        .await
        .map_err(|e| AppError::InternalError(format!("Submission task failed: {}", e)))?;

    let response = match result {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(SubmissionAccepted {
                outcome,
                notice: form.notice().cloned(),
                form: form.draft().clone(),
            }),
        )
            .into_response(),
        Err(failure) => {
            let status = match failure.error.root() {
                AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AppError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            };
            let details = match failure.error.root() {
                AppError::Validation(issues) => json!(issues),
                _ => serde_json::Value::Null,
            };
            (
                status,
                Json(json!({
                    "error": failure.notice(),
                    "stage": failure.stage,
                    "appended": failure.appended,
                    "details": details,
                    "form": form.draft(),
                })),
            )
                .into_response()
        }
    };

    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct InFlightParams {
    #[serde(default)]
    pub place: String,
}

/// Whether a place has a submission running; drives the disabled submit button.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InFlightView {
    pub place: String,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
}

/// GET /api/submissions/in-flight?place=
///
/// The place name is matched exactly as it will be submitted.
pub async fn submission_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InFlightParams>,
) -> Json<InFlightView> {
    let started_at = state.submissions_in_flight.get(&params.place).await;
    Json(InFlightView {
        place: params.place,
        loading: started_at.is_some(),
        started_at,
    })
}

fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

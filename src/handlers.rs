use crate::catalog::Catalog;
use crate::config::Config;
use crate::datasets;
use crate::errors::AppError;
use crate::models::*;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    Json,
};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Sample data the API serves.
    pub catalog: Arc<Catalog>,
    /// Entitled payloads keyed by `"{dataset}:{plan}"`.
    /// Leads keys also carry the catalog revision they were built from, so a
    /// lead change makes every older leads entry unreachable.
    pub payload_cache: Cache<String, serde_json::Value>,
}

impl AppState {
    pub fn new(config: Config, catalog: Catalog) -> Self {
        let payload_cache = Cache::builder()
            .time_to_live(Duration::from_secs(300))
            .max_capacity(1_000)
            .build();

        Self {
            config,
            catalog: Arc::new(catalog),
            payload_cache,
        }
    }
}

/// The caller's plan, read from the `x-plan` header.
///
/// A missing header resolves to `starter`; an unknown value is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerPlan(pub Plan);

#[async_trait]
impl<S> FromRequestParts<S> for CallerPlan
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(PLAN_HEADER) else {
            return Ok(CallerPlan(Plan::Starter));
        };
        let raw = value
            .to_str()
            .map_err(|_| AppError::BadRequest(format!("{} header is not valid text", PLAN_HEADER)))?;
        raw.parse::<Plan>()
            .map(CallerPlan)
            .map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

/// Returns the cached entitled payload for `(dataset, plan)`, building it on
/// a miss.
async fn cached_payload<T, F, Fut>(
    state: &AppState,
    dataset: DatasetId,
    plan: Plan,
    build: F,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let key = format!("{}:{}", dataset, plan);

    if let Some(payload) = cache_lookup(state, &key).await {
        return Ok(payload);
    }

    let payload = build().await?;
    cache_store(state, key, &payload).await?;
    Ok(payload)
}

fn leads_cache_key(plan: Plan, revision: u64) -> String {
    format!("{}:{}@{}", DatasetId::Leads, plan, revision)
}

async fn cache_lookup<T: DeserializeOwned>(state: &AppState, key: &str) -> Option<T> {
    let cached = state.payload_cache.get(key).await?;
    match serde_json::from_value(cached) {
        Ok(payload) => {
            tracing::debug!("Payload cache hit for {}", key);
            Some(payload)
        }
        Err(_) => {
            tracing::warn!("Discarding unreadable cached payload for {}", key);
            state.payload_cache.invalidate(key).await;
            None
        }
    }
}

async fn cache_store<T: Serialize>(
    state: &AppState,
    key: String,
    payload: &T,
) -> Result<(), AppError> {
    let value = serde_json::to_value(payload)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize {}: {}", key, e)))?;
    state.payload_cache.insert(key, value).await;
    Ok(())
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "oregon-smb-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/test
///
/// Smoke endpoint for checking the envelope wiring from a client.
pub async fn api_test() -> Json<ApiEnvelope<serde_json::Value>> {
    Json(ApiEnvelope::ok(json!({ "name": "this works" })))
}

/// GET /api/leads
///
/// Full leads for plans with lead detail unlocked; redacted teasers otherwise.
pub async fn get_leads(
    State(state): State<Arc<AppState>>,
    CallerPlan(plan): CallerPlan,
) -> Result<Json<ApiEnvelope<LeadsPayload>>, AppError> {
    tracing::info!("GET /api/leads - plan: {}", plan);

    let current = leads_cache_key(plan, state.catalog.leads_revision().await);
    if let Some(payload) = cache_lookup::<LeadsPayload>(&state, &current).await {
        return Ok(Json(ApiEnvelope::ok(payload)));
    }

    // Stored under the snapshot's own revision, which may be newer than
    // `current` but never older.
    let (revision, leads) = state.catalog.leads_snapshot().await;
    let payload = datasets::leads_for(plan, &leads)?;
    cache_store(&state, leads_cache_key(plan, revision), &payload).await?;

    Ok(Json(ApiEnvelope::ok(payload)))
}

/// PATCH /api/leads/:id
///
/// Changes a lead's pipeline status. Requires lead detail to be unlocked.
pub async fn update_lead_status(
    State(state): State<Arc<AppState>>,
    CallerPlan(plan): CallerPlan,
    Path(id): Path<u32>,
    Json(update): Json<LeadStatusUpdate>,
) -> Result<Json<ApiEnvelope<Lead>>, AppError> {
    tracing::info!(
        "PATCH /api/leads/{} - plan: {}, status: {}",
        id,
        plan,
        update.status.label()
    );

    datasets::can_manage_leads(plan)?;

    let lead = state
        .catalog
        .set_lead_status(id, update.status)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Lead with id {} not found", id)))?;

    tracing::info!("✓ Lead {} moved to {}", id, lead.status.label());
    Ok(Json(ApiEnvelope::ok(lead)))
}

/// GET /api/seo
///
/// Returns only the caller's own plan report.
pub async fn get_seo(
    State(state): State<Arc<AppState>>,
    CallerPlan(plan): CallerPlan,
) -> Result<Json<ApiEnvelope<PlanSeoReport>>, AppError> {
    tracing::info!("GET /api/seo - plan: {}", plan);

    let payload = cached_payload(&state, DatasetId::Seo, plan, || async {
        datasets::seo_for(plan, &state.catalog.seo).map_err(AppError::from)
    })
    .await?;

    Ok(Json(ApiEnvelope::ok(payload)))
}

/// GET /api/keywords
pub async fn get_keywords(
    State(state): State<Arc<AppState>>,
    CallerPlan(plan): CallerPlan,
) -> Result<Json<ApiEnvelope<Vec<KeywordSample>>>, AppError> {
    tracing::info!("GET /api/keywords - plan: {}", plan);

    let payload = cached_payload(&state, DatasetId::Keywords, plan, || async {
        datasets::keywords_for(plan, &state.catalog.keywords).map_err(AppError::from)
    })
    .await?;

    Ok(Json(ApiEnvelope::ok(payload)))
}

/// GET /api/ai-logs
pub async fn get_ai_logs(
    State(state): State<Arc<AppState>>,
    CallerPlan(plan): CallerPlan,
) -> Result<Json<ApiEnvelope<AiLogsPayload>>, AppError> {
    tracing::info!("GET /api/ai-logs - plan: {}", plan);

    let payload = cached_payload(&state, DatasetId::AiLogs, plan, || async {
        datasets::ai_logs_for(plan, &state.catalog.ai_logs, state.catalog.ai_usage)
            .map_err(AppError::from)
    })
    .await?;

    Ok(Json(ApiEnvelope::ok(payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    async fn extract(header: Option<&str>) -> Result<CallerPlan, AppError> {
        let mut builder = Request::builder().uri("/api/leads");
        if let Some(value) = header {
            builder = builder.header(PLAN_HEADER, HeaderValue::from_str(value).unwrap());
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CallerPlan::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_leads_built_before_a_change_are_never_served_after_it() {
        let state = Arc::new(AppState::new(Config::default(), Catalog::sample()));

        // A slow read takes its snapshot, then a status change lands, then the
        // slow read stores what it built.
        let (revision, before) = state.catalog.leads_snapshot().await;
        state
            .catalog
            .set_lead_status(3, LeadStatus::Won)
            .await
            .unwrap();
        let stale = datasets::leads_for(Plan::Scale, &before).unwrap();
        cache_store(&state, leads_cache_key(Plan::Scale, revision), &stale)
            .await
            .unwrap();

        let Json(envelope) = get_leads(State(Arc::clone(&state)), CallerPlan(Plan::Scale))
            .await
            .unwrap();
        match envelope.data {
            Some(LeadsPayload::Full { leads, .. }) => {
                let lead = leads.iter().find(|lead| lead.id == 3).unwrap();
                assert_eq!(lead.status, LeadStatus::Won);
            }
            other => panic!("expected full leads, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_plan_header_is_starter() {
        assert_eq!(extract(None).await.unwrap(), CallerPlan(Plan::Starter));
    }

    #[tokio::test]
    async fn test_plan_header_is_parsed() {
        assert_eq!(extract(Some("scale")).await.unwrap(), CallerPlan(Plan::Scale));
    }

    #[tokio::test]
    async fn test_unknown_plan_header_is_rejected() {
        assert!(matches!(
            extract(Some("platinum")).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_health() {
        let (status, Json(body)) = health().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}

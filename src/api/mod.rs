use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::Local;
use serde::Serialize;
use serde_json::{Value, json};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::{
    EscapadasConfig,
    accounting::{UsageLedger, UsageTotals},
    config::OutputConfig,
    llm::{GeminiImageClient, OpenAiClient},
    models::{AuditReport, ContactList, TripRequest},
    output::{ArtifactWriter, ImageReport, WrittenArtifacts},
    pipeline::{Stage, StageWarning, TripPlanner},
    validation::{FieldError, TripForm},
};

/// Shared, read-only server state. Every request builds its own clients
/// and ledger.
#[derive(Clone)]
pub struct AppState {
    config: Arc<EscapadasConfig>,
}

impl AppState {
    pub fn new(config: EscapadasConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

type ApiError = (StatusCode, Json<Value>);

#[derive(Serialize)]
pub struct ValidatedTrip {
    pub trip: TripRequest,
    pub duration_days: i64,
    pub summary: String,
}

impl From<TripRequest> for ValidatedTrip {
    fn from(trip: TripRequest) -> Self {
        Self {
            duration_days: trip.duration_days(),
            summary: trip.to_string(),
            trip,
        }
    }
}

#[derive(Serialize)]
pub struct PlanResponse {
    #[serde(flatten)]
    pub trip: ValidatedTrip,
    pub intake: Value,
    pub itinerary: Option<String>,
    pub audit: AuditReport,
    pub places: Vec<String>,
    pub key_points: Vec<String>,
    pub contacts: ContactList,
    pub images: Vec<ImageReport>,
    pub files: Vec<PathBuf>,
    pub warnings: Vec<StageWarning>,
    pub usage: UsageTotals,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trips/validate", post(validate_trip))
        .route("/trips/plan", post(plan_trip))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

fn rejected(errors: Vec<FieldError>) -> ApiError {
    info!(errors = errors.len(), "Trip form rejected");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "errors": errors })),
    )
}

async fn validate_trip(Json(form): Json<TripForm>) -> Result<Json<ValidatedTrip>, ApiError> {
    let trip = form.validate().map_err(rejected)?;
    Ok(Json(trip.into()))
}

async fn plan_trip(
    State(state): State<AppState>,
    Json(form): Json<TripForm>,
) -> Result<Json<PlanResponse>, ApiError> {
    let trip = form.validate().map_err(rejected)?;
    let config = &state.config;

    let text = OpenAiClient::new(&config.text_model).map_err(|e| {
        warn!(error = %e, "Cannot build text model client");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": e.user_message() })),
        )
    })?;
    let images = GeminiImageClient::optional(&config.image_model);

    let mut ledger = UsageLedger::new(config.pricing);
    let outcome = TripPlanner::new(text, images).plan(&trip, &mut ledger).await;

    let output = config.output.clone();
    let (outcome, ledger, written) = tokio::task::spawn_blocking(move || {
        let written = match request_directory(&output.directory) {
            Ok(directory) => {
                let output = OutputConfig { directory, ..output };
                ArtifactWriter::new(&output).write_all(&outcome, &ledger)
            }
            Err(e) => {
                warn!(error = %e, "Cannot create request output directory");
                WrittenArtifacts {
                    warnings: vec![StageWarning::new(
                        Stage::Output,
                        format!("could not create output directory: {e}"),
                    )],
                    ..WrittenArtifacts::default()
                }
            }
        };
        (outcome, ledger, written)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Artifact writer task failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "artifact writing failed" })),
        )
    })?;

    let warnings = outcome
        .warnings
        .into_iter()
        .chain(written.warnings)
        .collect();

    Ok(Json(PlanResponse {
        trip: trip.into(),
        intake: outcome.intake,
        itinerary: outcome.itinerary,
        audit: outcome.audit,
        places: outcome.places,
        key_points: outcome.key_points,
        contacts: outcome.contacts,
        images: written.images,
        files: written.files,
        warnings,
        usage: ledger.totals(),
    }))
}

/// Fresh `<base>/<timestamp>-<random>` directory owned by one request.
/// Creation is exclusive, so two requests never end up sharing it.
fn request_directory(base: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(base)?;
    let stamp = Local::now().format("%Y%m%d-%H%M%S-").to_string();
    let directory = tempfile::Builder::new()
        .prefix(&stamp)
        .rand_bytes(6)
        .tempdir_in(base)?;
    Ok(directory.keep())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn form_body(overrides: &[(&str, &str)]) -> String {
        let mut form = json!({
            "destination": "Bariloche",
            "transport": "3",
            "people": "2",
            "start_date": "01/07/2025",
            "arrival_time": "1300",
            "end_date": "07/07/2025",
            "return_time": "0830",
            "budget": "medium",
            "mode": "relax",
            "season": "high"
        });
        for (key, value) in overrides {
            form[*key] = json!(value);
        }
        form.to_string()
    }

    async fn post_json(app: Router, uri: &str, body: String) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(AppState::new(EscapadasConfig::default()));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_validate_accepts_valid_form() {
        let app = router(AppState::new(EscapadasConfig::default()));
        let (status, body) = post_json(app, "/trips/validate", form_body(&[])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["duration_days"], 7);
        assert_eq!(body["trip"]["destination"], "Bariloche");
        assert_eq!(body["trip"]["transport_mode"], "plane");
        assert!(body["summary"].as_str().unwrap().contains("Temporada: ALTA"));
    }

    #[tokio::test]
    async fn test_validate_reports_every_violation() {
        let app = router(AppState::new(EscapadasConfig::default()));
        let (status, body) = post_json(
            app,
            "/trips/validate",
            form_body(&[
                ("destination", " "),
                ("people", "0"),
                ("arrival_time", "2500"),
                ("mode", "family"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(
            fields,
            vec!["destination", "people", "arrival_time", "children_under_12"]
        );
    }

    #[tokio::test]
    async fn test_plan_without_api_keys_is_unavailable() {
        let mut config = EscapadasConfig::default();
        config.text_model.base_url = "http://127.0.0.1:9".to_string();
        config.text_model.api_key = None;
        // SAFETY: only this test touches the variable
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
        }
        let app = router(AppState::new(config));
        let (status, body) = post_json(app, "/trips/plan", form_body(&[])).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("Configuration error"));
    }

    #[tokio::test]
    async fn test_plan_without_image_key_still_runs_text_stages() {
        let mut server = mockito::Server::new_async().await;
        let chat = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{"message": {"role": "assistant", "content": "{}"}}],
                    "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
                })
                .to_string(),
            )
            .expect_at_least(2)
            .create_async()
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let mut config = EscapadasConfig::default();
        config.text_model.api_key = Some("k".to_string());
        config.text_model.base_url = server.url();
        config.text_model.max_retries = 0;
        config.image_model.api_key = None;
        config.output.directory = dir.path().to_path_buf();
        // SAFETY: only this test touches the variable
        unsafe {
            std::env::remove_var("GOOGLE_API_KEY");
        }

        let app = router(AppState::new(config));
        let (status, body) = post_json(app, "/trips/plan", form_body(&[])).await;

        chat.assert_async().await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["itinerary"], "{}");
        let images = body["images"].as_array().unwrap();
        assert_eq!(images.len(), 2);
        for image in images {
            assert_eq!(image["status"], "missing");
            assert!(image["reason"].as_str().unwrap().contains("GOOGLE_API_KEY"));
        }
        assert_eq!(body["usage"]["total_tokens"], 45);
    }

    #[test]
    fn test_request_directories_are_never_shared() {
        let base = tempfile::TempDir::new().unwrap();
        let nested = base.path().join("salida");

        let first = request_directory(&nested).unwrap();
        let second = request_directory(&nested).unwrap();

        assert_ne!(first, second);
        assert!(first.is_dir() && second.is_dir());
        assert!(first.starts_with(&nested));
    }

    #[tokio::test]
    async fn test_plan_rejects_invalid_form_before_calling_models() {
        let app = router(AppState::new(EscapadasConfig::default()));
        let (status, _) = post_json(
            app,
            "/trips/plan",
            form_body(&[("end_date", "01/07/2025"), ("return_time", "1300")]),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

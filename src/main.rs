use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_core::letter::render_referral_letter;
use clinic_core::{
    schema_variant_from_env_value, AnyEntity, ClinicStore, CoreConfig, EntityKind,
    IngestService, Referral, DEFAULT_DATA_DIR,
};
use clinic_types::RecordId;

type ApiError = (StatusCode, String);

/// Application state shared across REST API handlers
///
/// Holds the record store populated at startup. Handlers only use the store's
/// query surface (list, add, find, delete, update).
#[derive(Clone)]
struct AppState {
    store: Arc<ClinicStore>,
}

#[derive(serde::Serialize)]
struct HealthRes {
    status: &'static str,
}

/// Main entry point for the clinic records server
///
/// Loads every source file from the data directory into memory, then serves
/// the records over HTTP. A source that fails to load is logged and skipped.
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: directory holding the source files (default: "data")
/// - `CLINIC_SCHEMA_VARIANT`: "basic" or "extended" (default: "extended")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_run=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let variant = schema_variant_from_env_value(std::env::var("CLINIC_SCHEMA_VARIANT").ok())?;
    let cfg = Arc::new(CoreConfig::new(PathBuf::from(data_dir), variant)?);

    tracing::info!(
        "++ Loading records from {} ({} layout)",
        cfg.data_dir().display(),
        cfg.schema_variant()
    );
    let store = Arc::new(ClinicStore::new());
    IngestService::new(Arc::clone(&cfg)).load_all(&store);

    let app = router(AppState { store });

    tracing::info!("++ Starting clinic REST on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/records/:kind", get(list_records).post(add_record))
        .route(
            "/records/:kind/:id",
            get(find_record).put(update_record).delete(delete_record),
        )
        .route("/referrals/:id/letter", get(referral_letter))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_kind(raw: &str) -> Result<EntityKind, ApiError> {
    raw.parse()
        .map_err(|e: clinic_core::ClinicError| (StatusCode::NOT_FOUND, e.to_string()))
}

fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    RecordId::new(raw).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

/// Builds an entity of `kind` from a request body and checks its identifier.
fn entity_from_body(kind: EntityKind, body: serde_json::Value) -> Result<AnyEntity, ApiError> {
    let entity =
        AnyEntity::from_json(kind, body).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    parse_id(entity.primary_id())?;
    Ok(entity)
}

async fn health() -> Json<HealthRes> {
    Json(HealthRes { status: "ok" })
}

/// List every record of a kind, in insertion order
async fn list_records(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<AnyEntity>>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.store.all_records(kind)))
}

/// Add a record; duplicates of an existing identifier are accepted
async fn add_record(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<AnyEntity>), ApiError> {
    let kind = parse_kind(&kind)?;
    let entity = entity_from_body(kind, body)?;
    state.store.add_record(entity.clone());
    Ok((StatusCode::CREATED, Json(entity)))
}

async fn find_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<AnyEntity>, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    state
        .store
        .find_record(kind, id.as_str())
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no {kind} with id {id}")))
}

/// Replace every record with this identifier by the request body
///
/// Responds 200 when something was replaced and 201 when the body was simply
/// inserted.
async fn update_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<AnyEntity>), ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    let entity = entity_from_body(kind, body)?;

    let status = if state.store.update_record(id.as_str(), entity.clone()) {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(entity)))
}

/// Delete every record with this identifier
async fn delete_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    if state.store.delete_record(kind, id.as_str()) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("no {kind} with id {id}")))
    }
}

/// Render the referral letter for a referral as plain text
async fn referral_letter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let referral = state
        .store
        .find_by_key::<Referral>(id.as_str())
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no referral with id {id}")))?;

    let text = render_referral_letter(&referral, chrono::Utc::now());
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use clinic_core::Patient;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app_with(store: ClinicStore) -> (Router, Arc<ClinicStore>) {
        let store = Arc::new(store);
        let app = router(AppState {
            store: Arc::clone(&store),
        });
        (app, store)
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, String) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn patient(id: &str, first_name: &str) -> Patient {
        Patient {
            patient_id: id.into(),
            first_name: first_name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = app_with(ClinicStore::new());
        let (status, body) = send(app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn lists_records_in_insertion_order() {
        let store = ClinicStore::new();
        store.add(patient("P1", "John"));
        store.add(patient("P2", "Jane"));
        let (app, _) = app_with(store);

        let (status, body) = send(app, Method::GET, "/records/patients", None).await;

        assert_eq!(status, StatusCode::OK);
        let records: Vec<Value> = serde_json::from_str(&body).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r["patient_id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
    }

    #[tokio::test]
    async fn unknown_kind_is_not_found() {
        let (app, _) = app_with(ClinicStore::new());
        let (status, _) = send(app, Method::GET, "/records/wards", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn add_then_find() {
        let (app, store) = app_with(ClinicStore::new());

        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/records/clinician",
            Some(json!({"clinician_id": "C1", "last_name": "Okafor"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(store.count(EntityKind::Clinician), 1);

        let (status, body) = send(app, Method::GET, "/records/clinician/C1", None).await;
        assert_eq!(status, StatusCode::OK);
        let record: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(record["last_name"], "Okafor");
    }

    #[tokio::test]
    async fn add_rejects_blank_identifier_and_unknown_fields() {
        let (app, store) = app_with(ClinicStore::new());

        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/records/patient",
            Some(json!({"patient_id": "  ", "first_name": "Ann"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app,
            Method::POST,
            "/records/patient",
            Some(json!({"patient_id": "P1", "shoe_size": "9"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(store.count(EntityKind::Patient), 0);
    }

    #[tokio::test]
    async fn find_missing_record_is_not_found() {
        let (app, _) = app_with(ClinicStore::new());
        let (status, _) = send(app, Method::GET, "/records/patient/P404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_all_matches() {
        let store = ClinicStore::new();
        store.add(patient("P1", "John"));
        store.add(patient("P1", "Johnny"));
        store.add(patient("P2", "Jane"));
        let (app, store) = app_with(store);

        let (status, _) = send(app.clone(), Method::DELETE, "/records/patient/P1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(store.all::<Patient>(), vec![patient("P2", "Jane")]);

        let (status, _) = send(app, Method::DELETE, "/records/patient/P1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_replaces_or_inserts() {
        let store = ClinicStore::new();
        store.add(patient("P1", "John"));
        let (app, store) = app_with(store);

        let (status, _) = send(
            app.clone(),
            Method::PUT,
            "/records/patient/P1",
            Some(json!({"patient_id": "P1", "first_name": "Jon"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.all::<Patient>(), vec![patient("P1", "Jon")]);

        let (status, _) = send(
            app,
            Method::PUT,
            "/records/patient/P7",
            Some(json!({"patient_id": "P7", "first_name": "Eve"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(store.count(EntityKind::Patient), 2);
    }

    #[tokio::test]
    async fn referral_letter_is_plain_text() {
        let store = ClinicStore::new();
        store.add(Referral {
            referral_id: "R1".into(),
            urgency: "Routine".into(),
            clinical_summary: "Knee pain".into(),
            ..Default::default()
        });
        let (app, _) = app_with(store);

        let (status, body) = send(app.clone(), Method::GET, "/referrals/R1/letter", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("REFERRAL LETTER"));
        assert!(body.contains("Urgency: Routine"));

        let (status, _) = send(app, Method::GET, "/referrals/R2/letter", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

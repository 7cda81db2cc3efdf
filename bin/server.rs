// Rollcall - REST API Server
//
// Thin HTTP wiring over the role-gated operations. Identity verification
// lives upstream: requests arrive with `x-reg-no` / `x-role` headers
// already verified by the auth layer, and this server only turns them into
// a claim for the core to check per operation.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use rollcall::{
    api, setup_database, AuthClaim, Config, Role, SessionDescriptor,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Error wrapper mapping the core taxonomy onto HTTP statuses
struct ApiError(rollcall::Error);

impl From<rollcall::Error> for ApiError {
    fn from(err: rollcall::Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            "validation" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "forbidden" => StatusCode::FORBIDDEN,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "success": false,
            "kind": self.0.kind(),
            "message": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Pull the externally verified claim out of the request headers
fn claim_from_headers(headers: &HeaderMap) -> Result<AuthClaim, ApiError> {
    let reg_no = headers
        .get("x-reg-no")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    let role = headers
        .get("x-role")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| match v.to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            _ => None,
        });

    match (reg_no, role) {
        (Some(reg_no), Some(role)) => Ok(AuthClaim {
            reg_no: reg_no.to_string(),
            role,
        }),
        _ => Err(ApiError(rollcall::Error::Forbidden(
            "Missing or invalid identity claim".to_string(),
        ))),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

#[derive(Deserialize)]
struct GenerateQrRequest {
    subject: String,
    #[serde(rename = "className")]
    class_name: String,
}

/// POST /api/generate-qr - Issue today's session token (teacher only)
async fn generate_qr(
    headers: HeaderMap,
    Json(req): Json<GenerateQrRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claim = claim_from_headers(&headers)?;
    let token = api::issue_session_token(&claim, &req.subject, &req.class_name)?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(token))))
}

/// POST /api/attendance - Check in with a scanned descriptor (student only)
async fn mark_attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(descriptor): Json<SessionDescriptor>,
) -> Result<impl IntoResponse, ApiError> {
    let claim = claim_from_headers(&headers)?;

    let conn = state.db.lock().unwrap();
    let record = api::check_in(&conn, &claim, &descriptor)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

/// GET /api/attendance/:reg_no - Per-subject summary (student, self only)
async fn get_student_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(reg_no): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let claim = claim_from_headers(&headers)?;

    let conn = state.db.lock().unwrap();
    let summary = api::student_summary(&conn, &claim, &reg_no)?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(summary))))
}

#[derive(Deserialize)]
struct RosterQuery {
    #[serde(rename = "className")]
    class_name: Option<String>,
    date: Option<NaiveDate>,
}

/// GET /api/attendance/class/:subject - Present-list for a session (teacher only)
async fn get_class_roster(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(subject): Path<String>,
    Query(query): Query<RosterQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let claim = claim_from_headers(&headers)?;

    let (class_name, date) = match (query.class_name, query.date) {
        (Some(class_name), Some(date)) => (class_name, date),
        _ => {
            return Err(ApiError(rollcall::Error::Validation(
                "Please provide date and class name".to_string(),
            )))
        }
    };

    let conn = state.db.lock().unwrap();
    let roster = api::class_roster(&conn, &claim, &subject, &class_name, date)?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(roster))))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load();

    let conn = Connection::open(&config.db_path).expect("Failed to open database");
    setup_database(&conn).expect("Failed to initialize schema");
    info!("database opened: {}", config.db_path);

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/generate-qr", post(generate_qr))
        .route("/attendance", post(mark_attendance))
        .route("/attendance/:reg_no", get(get_student_summary))
        .route("/attendance/class/:subject", get(get_class_roster))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!("rollcall server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use shared::{
    domain::{Appointment, AppointmentId, CollectionPoint},
    error::{ApiError, ErrorCode},
    protocol::{
        ApiEnvelope, CreateAppointmentResponse, StatusResponse, APPOINTMENTS_ROUTE,
        COLLECTION_POINTS_ROUTE, STATUS_SUCCESS,
    },
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

mod api;
mod app_state;
mod config;

use api::{ApiContext, CreateAppointmentBody, UpdateStatusBody};
use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

type HttpResult<T> = Result<(StatusCode, Json<T>), (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "scheduling api listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(COLLECTION_POINTS_ROUTE, get(http_list_collection_points))
        .route(
            APPOINTMENTS_ROUTE,
            get(http_list_appointments).post(http_create_appointment),
        )
        .route("/agendamentos/:id", put(http_update_appointment))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        warn!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

async fn http_list_collection_points(
    State(state): State<Arc<AppState>>,
) -> HttpResult<ApiEnvelope<Vec<CollectionPoint>>> {
    let points = api::list_collection_points(&state.api)
        .await
        .map_err(reject)?;
    Ok((StatusCode::OK, Json(ApiEnvelope::success(points))))
}

async fn http_list_appointments(
    State(state): State<Arc<AppState>>,
) -> HttpResult<ApiEnvelope<Vec<Appointment>>> {
    let appointments = api::list_appointments(&state.api).await.map_err(reject)?;
    let total = appointments.len();
    Ok((
        StatusCode::OK,
        Json(ApiEnvelope::success(appointments).with_total(total)),
    ))
}

async fn http_create_appointment(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateAppointmentBody>>,
) -> HttpResult<CreateAppointmentResponse> {
    let Some(Json(body)) = body else {
        return Err(reject(ApiError::new(
            ErrorCode::Validation,
            "No valid JSON data provided.",
        )));
    };

    let created = api::create_appointment(&state.api, body)
        .await
        .map_err(|err| {
            warn!(code = ?err.code, message = %err.message, "appointment rejected");
            reject(err)
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAppointmentResponse {
            status: STATUS_SUCCESS.to_string(),
            mensagem: Some("Appointment created successfully!".to_string()),
            id_agendamento: Some(created.id),
            novo_agendamento: Some(created.into()),
        }),
    ))
}

async fn http_update_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Option<Json<UpdateStatusBody>>,
) -> HttpResult<StatusResponse> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let id = AppointmentId(id);
    let status = api::update_appointment_status(&state.api, id, body)
        .await
        .map_err(reject)?;
    info!(appointment_id = id.0, %status, "appointment status updated");

    Ok((
        StatusCode::OK,
        Json(StatusResponse::success(format!(
            "Status of appointment {id} updated to '{status}'."
        ))),
    ))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

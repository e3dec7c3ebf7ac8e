use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{Appointment, AppointmentId, CollectionPoint, CollectionPointId, UserId},
    error::{ApiError, ErrorCode},
};
use storage::{NewStoredAppointment, Storage, StorageError};
use tracing::warn;

const PICKUP_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Body accepted by `POST /agendamentos`. Only the user, date and category
/// are mandatory; the remaining fields are stored when present.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateAppointmentBody {
    pub usuario_id: Option<i64>,
    pub ponto_coleta_id: Option<i64>,
    pub data_retirada: Option<String>,
    pub tipo_lixo: Option<String>,
    pub endereco_coleta: Option<String>,
    pub ponto_referencia: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateStatusBody {
    pub status: Option<String>,
}

pub async fn list_collection_points(ctx: &ApiContext) -> Result<Vec<CollectionPoint>, ApiError> {
    ctx.storage
        .list_collection_points()
        .await
        .map_err(storage_failure)
}

pub async fn list_appointments(ctx: &ApiContext) -> Result<Vec<Appointment>, ApiError> {
    ctx.storage.list_appointments().await.map_err(storage_failure)
}

pub async fn create_appointment(
    ctx: &ApiContext,
    body: CreateAppointmentBody,
) -> Result<Appointment, ApiError> {
    let user_id = body
        .usuario_id
        .ok_or_else(|| missing_field("usuario_id"))?;
    let pickup_date = non_blank(body.data_retirada).ok_or_else(|| missing_field("data_retirada"))?;
    let waste_category = non_blank(body.tipo_lixo).ok_or_else(|| missing_field("tipo_lixo"))?;

    if NaiveDate::parse_from_str(&pickup_date, PICKUP_DATE_FORMAT).is_err() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("Field 'data_retirada' must be a YYYY-MM-DD date, got '{pickup_date}'."),
        ));
    }

    let new = NewStoredAppointment {
        user_id: UserId(user_id),
        collection_point_id: body.ponto_coleta_id.map(CollectionPointId),
        pickup_date,
        waste_category,
        address: non_blank(body.endereco_coleta),
        landmark: non_blank(body.ponto_referencia),
    };

    ctx.storage
        .create_appointment(&new)
        .await
        .map_err(|err| match err {
            StorageError::Integrity(message) => ApiError::new(
                ErrorCode::Conflict,
                format!("Integrity error while creating appointment: {message}"),
            ),
            other => storage_failure(other),
        })
}

/// Returns the status that was stored.
pub async fn update_appointment_status(
    ctx: &ApiContext,
    id: AppointmentId,
    body: UpdateStatusBody,
) -> Result<String, ApiError> {
    let status = non_blank(body.status).ok_or_else(|| {
        ApiError::new(
            ErrorCode::Validation,
            "The 'status' field is required for an update.",
        )
    })?;

    let updated = ctx
        .storage
        .update_appointment_status(id, &status)
        .await
        .map_err(storage_failure)?;
    if !updated {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            format!("Appointment with ID {id} not found."),
        ));
    }
    Ok(status)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn missing_field(field: &str) -> ApiError {
    ApiError::new(
        ErrorCode::Validation,
        format!("Required field '{field}' not provided."),
    )
}

fn storage_failure(err: StorageError) -> ApiError {
    warn!(error = %err, "storage operation failed");
    ApiError::new(ErrorCode::Internal, format!("Database error: {err}"))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;

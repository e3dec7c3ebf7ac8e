use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Appointment, AppointmentId, CollectionPoint},
    protocol::{
        appointment_route, ApiEnvelope, CreateAppointmentRequest, CreateAppointmentResponse,
        StatusResponse, UpdateStatusRequest, APPOINTMENTS_ROUTE, COLLECTION_POINTS_ROUTE,
    },
};
use thiserror::Error;
use tracing::{debug, warn};

pub mod config;
pub mod controller;
pub mod form;
pub mod render;
pub mod view;

pub use controller::{
    AlwaysConfirm, AppointmentListController, BucketCounts, ConfirmationPrompt, ControllerEvent,
    SubmitOutcome, TransitionOutcome,
};
pub use form::{AppointmentForm, FormError, NewAppointment};
pub use view::{
    AppointmentCard, BucketContent, BucketView, CardProvenance, DirectoryFailure,
    DirectorySelector, Notice, NoticeKind, Panel, SelectorOption, SyncFailure, ViewModel,
};

/// Failure talking to the scheduling API. Transport failures mean the server
/// could not be reached; everything else is an application-level answer.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("api rejected request (http {status}): {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response body (http {status}): {reason}")]
    Decode { status: u16, reason: String },
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Message suitable for showing to a user; the server's own wording when
    /// it supplied one.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "could not reach the server".to_string(),
            Self::Api { message, .. } => message.clone(),
            Self::Decode { reason, .. } => format!("unexpected response ({reason})"),
        }
    }
}

const UNKNOWN_API_ERROR: &str = "unknown error";

#[async_trait]
pub trait SchedulingApi: Send + Sync {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, ClientError>;
    async fn list_collection_points(&self) -> Result<Vec<CollectionPoint>, ClientError>;
    /// Succeeds only for an HTTP 201 carrying a success status.
    async fn create_appointment(
        &self,
        request: &CreateAppointmentRequest,
    ) -> Result<CreateAppointmentResponse, ClientError>;
    async fn update_status(
        &self,
        id: AppointmentId,
        status: &str,
    ) -> Result<StatusResponse, ClientError>;
}

pub struct HttpSchedulingClient {
    http: Client,
    base_url: String,
}

impl HttpSchedulingClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<(StatusCode, T), ClientError> {
    let status = response.status();
    let body = response.text().await?;
    match serde_json::from_str::<T>(&body) {
        Ok(parsed) => Ok((status, parsed)),
        Err(_) if !status.is_success() => {
            let trimmed = body.trim();
            Err(ClientError::Api {
                status: status.as_u16(),
                message: if trimmed.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or(UNKNOWN_API_ERROR)
                        .to_string()
                } else {
                    trimmed.to_string()
                },
            })
        }
        Err(err) => Err(ClientError::Decode {
            status: status.as_u16(),
            reason: err.to_string(),
        }),
    }
}

fn api_failure(status: StatusCode, mensagem: Option<String>) -> ClientError {
    ClientError::Api {
        status: status.as_u16(),
        message: mensagem.unwrap_or_else(|| UNKNOWN_API_ERROR.to_string()),
    }
}

fn unwrap_listing<T>(status: StatusCode, envelope: ApiEnvelope<Vec<T>>) -> Result<Vec<T>, ClientError> {
    if !status.is_success() || !envelope.is_success() {
        return Err(api_failure(status, envelope.mensagem));
    }
    envelope.dados.ok_or_else(|| ClientError::Api {
        status: status.as_u16(),
        message: "response did not include any data".to_string(),
    })
}

#[async_trait]
impl SchedulingApi for HttpSchedulingClient {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, ClientError> {
        let response = self.http.get(self.url(APPOINTMENTS_ROUTE)).send().await?;
        let (status, envelope) = read_json::<ApiEnvelope<Vec<Appointment>>>(response).await?;
        let appointments = unwrap_listing(status, envelope)?;
        debug!(count = appointments.len(), "fetched appointments");
        Ok(appointments)
    }

    async fn list_collection_points(&self) -> Result<Vec<CollectionPoint>, ClientError> {
        let response = self
            .http
            .get(self.url(COLLECTION_POINTS_ROUTE))
            .send()
            .await?;
        let (status, envelope) = read_json::<ApiEnvelope<Vec<CollectionPoint>>>(response).await?;
        unwrap_listing(status, envelope)
    }

    async fn create_appointment(
        &self,
        request: &CreateAppointmentRequest,
    ) -> Result<CreateAppointmentResponse, ClientError> {
        let response = self
            .http
            .post(self.url(APPOINTMENTS_ROUTE))
            .json(request)
            .send()
            .await?;
        let (status, body) = read_json::<CreateAppointmentResponse>(response).await?;
        if status != StatusCode::CREATED || !body.is_success() {
            warn!(http_status = status.as_u16(), "appointment creation rejected");
            return Err(api_failure(status, body.mensagem));
        }
        Ok(body)
    }

    async fn update_status(
        &self,
        id: AppointmentId,
        status: &str,
    ) -> Result<StatusResponse, ClientError> {
        let response = self
            .http
            .put(self.url(&appointment_route(id)))
            .json(&UpdateStatusRequest {
                status: status.to_string(),
            })
            .send()
            .await?;
        let (http_status, body) = read_json::<StatusResponse>(response).await?;
        if !http_status.is_success() || !body.is_success() {
            return Err(api_failure(http_status, body.mensagem));
        }
        Ok(body)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

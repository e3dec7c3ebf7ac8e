use serde::{Deserialize, Serialize};

use crate::domain::{Appointment, AppointmentId, CollectionPointId, UserId};

pub const STATUS_SUCCESS: &str = "sucesso";
pub const STATUS_FAILURE: &str = "erro";

pub const APPOINTMENTS_ROUTE: &str = "/agendamentos";
pub const COLLECTION_POINTS_ROUTE: &str = "/pontos";

pub fn appointment_route(id: AppointmentId) -> String {
    format!("{APPOINTMENTS_ROUTE}/{}", id.0)
}

/// Common response shape: `{status, dados?, mensagem?, total?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dados: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mensagem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(dados: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            dados: Some(dados),
            mensagem: None,
            total: None,
        }
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub usuario_id: UserId,
    pub ponto_coleta_id: CollectionPointId,
    pub data_retirada: String,
    pub tipo_lixo: String,
    pub endereco_coleta: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ponto_referencia: Option<String>,
}

/// Partial record a server may echo back after creation. Every field is
/// optional because older servers only return the id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedAppointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AppointmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_retirada: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_lixo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endereco_coleta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ponto_referencia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ponto_coleta_id: Option<CollectionPointId>,
}

impl From<Appointment> for CreatedAppointment {
    fn from(value: Appointment) -> Self {
        Self {
            id: Some(value.id),
            status: Some(value.status),
            data_retirada: Some(value.data_retirada),
            tipo_lixo: Some(value.tipo_lixo),
            endereco_coleta: value.endereco_coleta,
            ponto_referencia: value.ponto_referencia,
            usuario_id: value.usuario_id,
            ponto_coleta_id: value.ponto_coleta_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mensagem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_agendamento: Option<AppointmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub novo_agendamento: Option<CreatedAppointment>,
}

impl CreateAppointmentResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mensagem: Option<String>,
}

impl StatusResponse {
    pub fn success(mensagem: impl Into<String>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            mensagem: Some(mensagem.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

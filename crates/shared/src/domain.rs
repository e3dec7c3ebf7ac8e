use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(CollectionPointId);
id_newtype!(AppointmentId);

/// Marker the service uses for appointments still awaiting pickup confirmation.
pub const PENDING_MARKER: &str = "pendente";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
}

impl AppointmentStatus {
    /// Any status containing "pendente" (in any case) is pending; everything
    /// else, including "concluido" or free text, counts as confirmed.
    pub fn classify(raw: &str) -> Self {
        if raw.to_lowercase().contains(PENDING_MARKER) {
            Self::Pending
        } else {
            Self::Confirmed
        }
    }

    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Pending => PENDING_MARKER,
            Self::Confirmed => "Confirmado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub status: String,
    #[serde(default)]
    pub data_retirada: String,
    #[serde(default)]
    pub tipo_lixo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endereco_coleta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ponto_referencia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nome_usuario: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_usuario: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ponto_coleta_id: Option<CollectionPointId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nome_ponto_coleta: Option<String>,
}

impl Appointment {
    pub fn classification(&self) -> AppointmentStatus {
        AppointmentStatus::classify(&self.status)
    }

    pub fn is_pending(&self) -> bool {
        self.classification() == AppointmentStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionPoint {
    pub id: CollectionPointId,
    pub nome: String,
    pub endereco: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horario_func: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_case_insensitive_substring() {
        for raw in ["PENDENTE", "Pendente", "pendente - atraso", "  pendente"] {
            assert_eq!(AppointmentStatus::classify(raw), AppointmentStatus::Pending, "{raw}");
        }
        for raw in ["Confirmado", "concluido", "", "pend"] {
            assert_eq!(AppointmentStatus::classify(raw), AppointmentStatus::Confirmed, "{raw}");
        }
    }

    #[test]
    fn appointment_tolerates_missing_resolved_fields() {
        let appointment: Appointment = serde_json::from_value(serde_json::json!({
            "id": 3,
            "status": "pendente",
            "data_retirada": "2025-11-15",
            "tipo_lixo": "Monitor e CPU",
            "nome_usuario": "Aline Dev",
            "email_usuario": "aline@exemplo.com"
        }))
        .expect("json");

        assert_eq!(appointment.id, AppointmentId(3));
        assert!(appointment.is_pending());
        assert!(appointment.usuario_id.is_none());
        assert!(appointment.endereco_coleta.is_none());
    }
}

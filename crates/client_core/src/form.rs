//! Scheduling form as typed by the user, and its client-side validation.

use shared::{
    domain::{CollectionPointId, UserId},
    protocol::CreateAppointmentRequest,
};
use thiserror::Error;

/// Raw field values. Nothing here is trusted until [`AppointmentForm::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentForm {
    pub user_id: String,
    pub collection_point_id: String,
    pub waste_category: String,
    pub pickup_date: String,
    pub address: String,
    pub landmark: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub user_id: UserId,
    pub collection_point_id: CollectionPointId,
    pub pickup_date: String,
    pub waste_category: String,
    pub address: String,
    pub landmark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("user id must be a positive integer, got '{0}'")]
    InvalidUserId(String),
    #[error("collection point id must be a positive integer, got '{0}'")]
    InvalidCollectionPoint(String),
    #[error("required field '{0}' is empty")]
    MissingField(&'static str),
}

fn positive_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

fn required(raw: &str, field: &'static str) -> Result<String, FormError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(FormError::MissingField(field));
    }
    Ok(value.to_string())
}

impl AppointmentForm {
    pub fn validate(&self) -> Result<NewAppointment, FormError> {
        let user_id = positive_id(&self.user_id)
            .ok_or_else(|| FormError::InvalidUserId(self.user_id.clone()))?;
        let collection_point_id = positive_id(&self.collection_point_id)
            .ok_or_else(|| FormError::InvalidCollectionPoint(self.collection_point_id.clone()))?;
        let pickup_date = required(&self.pickup_date, "pickup_date")?;
        let waste_category = required(&self.waste_category, "waste_category")?;
        let address = required(&self.address, "address")?;
        let landmark = Some(self.landmark.trim().to_string()).filter(|v| !v.is_empty());

        Ok(NewAppointment {
            user_id: UserId(user_id),
            collection_point_id: CollectionPointId(collection_point_id),
            pickup_date,
            waste_category,
            address,
            landmark,
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl NewAppointment {
    pub fn to_request(&self) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            usuario_id: self.user_id,
            ponto_coleta_id: self.collection_point_id,
            data_retirada: self.pickup_date.clone(),
            tipo_lixo: self.waste_category.clone(),
            endereco_coleta: self.address.clone(),
            ponto_referencia: self.landmark.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> AppointmentForm {
        AppointmentForm {
            user_id: "1".into(),
            collection_point_id: "2".into(),
            waste_category: "Monitor e CPU".into(),
            pickup_date: "2025-11-15".into(),
            address: "Rua A, 10".into(),
            landmark: String::new(),
        }
    }

    #[test]
    fn accepts_complete_form_without_landmark() {
        let valid = filled().validate().expect("valid");
        assert_eq!(valid.user_id, UserId(1));
        assert_eq!(valid.collection_point_id, CollectionPointId(2));
        assert!(valid.landmark.is_none());
        assert!(valid.to_request().ponto_referencia.is_none());
    }

    #[test]
    fn rejects_non_numeric_and_non_positive_ids() {
        for raw in ["abc", "0", "-3", "", "1.5"] {
            let mut form = filled();
            form.user_id = raw.into();
            assert_eq!(
                form.validate(),
                Err(FormError::InvalidUserId(raw.to_string())),
                "{raw}"
            );
        }

        let mut form = filled();
        form.collection_point_id = String::new();
        assert!(matches!(
            form.validate(),
            Err(FormError::InvalidCollectionPoint(_))
        ));
    }

    #[test]
    fn rejects_blank_required_text() {
        let mut form = filled();
        form.address = "   ".into();
        assert_eq!(form.validate(), Err(FormError::MissingField("address")));

        let mut form = filled();
        form.pickup_date.clear();
        assert_eq!(form.validate(), Err(FormError::MissingField("pickup_date")));
    }

    #[test]
    fn clear_resets_every_field() {
        let mut form = filled();
        form.landmark = "Perto da praça".into();
        form.clear();
        assert_eq!(form, AppointmentForm::default());
    }
}

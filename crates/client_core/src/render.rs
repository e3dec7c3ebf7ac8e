//! Pure presentation helpers: view model in, display strings out.

use chrono::NaiveDate;
use shared::domain::{AppointmentId, AppointmentStatus, CollectionPoint};

use crate::view::{
    AppointmentCard, BucketContent, BucketView, CardProvenance, DirectoryFailure,
    DirectorySelector, NoticeKind, SyncFailure, ViewModel,
};

const ADDRESS_PREVIEW_CHARS: usize = 30;
const ADDRESS_FALLBACK: &str = "Not provided";

/// `2025-11-15` becomes `15/11/2025`; anything else is returned unchanged.
pub fn format_pickup_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn collection_point_label(point: &CollectionPoint) -> String {
    let preview: String = point.endereco.chars().take(ADDRESS_PREVIEW_CHARS).collect();
    format!("{} ({preview}...)", point.nome)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardAction {
    ConfirmPickup { id: AppointmentId },
}

impl CardAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConfirmPickup { .. } => "Confirm pickup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCard {
    pub badge: String,
    pub lines: Vec<String>,
    pub action: Option<CardAction>,
}

pub fn appointment_card(card: &AppointmentCard) -> RenderedCard {
    let appointment = &card.appointment;
    let mut lines = vec![
        format!(
            "ID {} | Date: {}",
            appointment.id,
            format_pickup_date(&appointment.data_retirada)
        ),
        format!("Waste: {}", appointment.tipo_lixo),
        format!(
            "Address: {}",
            appointment
                .endereco_coleta
                .as_deref()
                .filter(|address| !address.is_empty())
                .unwrap_or(ADDRESS_FALLBACK)
        ),
    ];

    if let Some(landmark) = appointment.ponto_referencia.as_deref().filter(|v| !v.is_empty()) {
        lines.push(format!("Landmark: {landmark}"));
    }

    if let Some(company) = appointment.nome_ponto_coleta.as_deref() {
        lines.push(format!("Company: {company}"));
    } else if let Some(point_id) = appointment.ponto_coleta_id {
        lines.push(format!("Collection point ID: {point_id}"));
    }

    if let Some(name) = appointment.nome_usuario.as_deref() {
        let email = appointment.email_usuario.as_deref().unwrap_or("-");
        lines.push(format!("User: {name} ({email})"));
    } else if let Some(user_id) = appointment.usuario_id {
        lines.push(format!("User ID: {user_id}"));
    }

    let action = appointment.is_pending().then_some(CardAction::ConfirmPickup {
        id: appointment.id,
    });

    RenderedCard {
        badge: appointment.status.to_uppercase(),
        lines,
        action,
    }
}

pub fn bucket_placeholder(status: AppointmentStatus, content: &BucketContent) -> Option<String> {
    match content {
        BucketContent::Cards(_) => None,
        BucketContent::Loading => Some("Loading...".to_string()),
        BucketContent::Empty => Some(match status {
            AppointmentStatus::Pending => "🎉 No pending appointments at the moment!".to_string(),
            AppointmentStatus::Confirmed => {
                "No completed or confirmed appointments.".to_string()
            }
        }),
        BucketContent::Failed(SyncFailure::Api(message)) => Some(format!("API error: {message}")),
        BucketContent::Failed(SyncFailure::Connection) => {
            Some("Could not connect to the API to list appointments.".to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOption {
    pub value: Option<i64>,
    pub label: String,
    pub disabled: bool,
}

fn disabled_option(label: &str) -> RenderedOption {
    RenderedOption {
        value: None,
        label: label.to_string(),
        disabled: true,
    }
}

pub fn directory_options(selector: &DirectorySelector) -> Vec<RenderedOption> {
    match selector {
        DirectorySelector::Loading => vec![disabled_option("Loading companies...")],
        DirectorySelector::Failed(DirectoryFailure::Api) => {
            vec![disabled_option("Error loading companies.")]
        }
        DirectorySelector::Failed(DirectoryFailure::Connection) => {
            vec![disabled_option("Connection error with the collection point API.")]
        }
        DirectorySelector::Ready(options) => std::iter::once(RenderedOption {
            value: None,
            label: "Select a company".to_string(),
            disabled: false,
        })
        .chain(options.iter().map(|option| RenderedOption {
            value: Some(option.id.0),
            label: option.label.clone(),
            disabled: false,
        }))
        .collect(),
    }
}

fn render_bucket(out: &mut String, title: &str, status: AppointmentStatus, bucket: &BucketView) {
    out.push_str(&format!("== {title} ({}) ==\n", bucket.count));
    if let Some(placeholder) = bucket_placeholder(status, &bucket.content) {
        out.push_str(&format!("  {placeholder}\n"));
        return;
    }
    for card in bucket.cards() {
        let rendered = appointment_card(card);
        let marker = match card.provenance {
            CardProvenance::Optimistic => " (just created)",
            CardProvenance::Reconciled => "",
        };
        out.push_str(&format!("  [{}]{marker}\n", rendered.badge));
        for line in &rendered.lines {
            out.push_str(&format!("    {line}\n"));
        }
        if let Some(action) = &rendered.action {
            out.push_str(&format!("    -> {}\n", action.label()));
        }
    }
}

/// Plain-text rendering of both buckets, for terminals and logs.
pub fn render_buckets(view: &ViewModel) -> String {
    let mut out = String::new();
    render_bucket(&mut out, "Pending", AppointmentStatus::Pending, &view.pending);
    render_bucket(
        &mut out,
        "Confirmed",
        AppointmentStatus::Confirmed,
        &view.confirmed,
    );
    out
}

pub fn render_directory(view: &ViewModel) -> String {
    directory_options(&view.directory)
        .iter()
        .map(|option| match option.value {
            Some(id) => format!("  {id:>4}  {}\n", option.label),
            None => format!("        {}\n", option.label),
        })
        .collect()
}

pub fn render_notice(view: &ViewModel) -> Option<String> {
    view.notice.as_ref().map(|notice| match notice.kind {
        NoticeKind::Success => format!("OK: {}", notice.text),
        NoticeKind::Error => format!("ERROR: {}", notice.text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{Appointment, CollectionPointId, UserId};

    fn base_appointment() -> Appointment {
        Appointment {
            id: AppointmentId(7),
            status: "pendente".into(),
            data_retirada: "2025-11-15".into(),
            tipo_lixo: "Monitor e CPU".into(),
            endereco_coleta: None,
            ponto_referencia: None,
            usuario_id: Some(UserId(1)),
            nome_usuario: None,
            email_usuario: None,
            ponto_coleta_id: Some(CollectionPointId(2)),
            nome_ponto_coleta: None,
        }
    }

    fn card(appointment: Appointment) -> AppointmentCard {
        AppointmentCard {
            appointment,
            provenance: CardProvenance::Reconciled,
        }
    }

    #[test]
    fn formats_iso_dates_and_passes_through_the_rest() {
        assert_eq!(format_pickup_date("2025-11-15"), "15/11/2025");
        assert_eq!(format_pickup_date("15/11/2025"), "15/11/2025");
        assert_eq!(format_pickup_date("amanhã"), "amanhã");
        assert_eq!(format_pickup_date(""), "");
    }

    #[test]
    fn label_truncates_address_on_char_boundaries() {
        let point = CollectionPoint {
            id: CollectionPointId(2),
            nome: "Ecoponto Central".into(),
            endereco: "Av. Queiroz, 500, Vila Assunção, São Paulo".into(),
            latitude: None,
            longitude: None,
            horario_func: None,
        };
        assert_eq!(
            collection_point_label(&point),
            "Ecoponto Central (Av. Queiroz, 500, Vila Assunçã...)"
        );
    }

    #[test]
    fn unresolved_card_falls_back_to_ids() {
        let rendered = appointment_card(&card(base_appointment()));
        assert_eq!(rendered.badge, "PENDENTE");
        assert_eq!(rendered.lines[0], "ID 7 | Date: 15/11/2025");
        assert!(rendered.lines.contains(&"Address: Not provided".to_string()));
        assert!(rendered.lines.contains(&"Collection point ID: 2".to_string()));
        assert!(rendered.lines.contains(&"User ID: 1".to_string()));
        assert_eq!(
            rendered.action,
            Some(CardAction::ConfirmPickup { id: AppointmentId(7) })
        );
    }

    #[test]
    fn resolved_card_shows_names_and_no_action_once_confirmed() {
        let mut appointment = base_appointment();
        appointment.status = "Confirmado".into();
        appointment.nome_usuario = Some("Aline Dev".into());
        appointment.email_usuario = Some("aline@exemplo.com".into());
        appointment.nome_ponto_coleta = Some("Ecoponto Central".into());
        appointment.ponto_referencia = Some("Perto da praça".into());

        let rendered = appointment_card(&card(appointment));
        assert!(rendered.lines.contains(&"Company: Ecoponto Central".to_string()));
        assert!(rendered
            .lines
            .contains(&"User: Aline Dev (aline@exemplo.com)".to_string()));
        assert!(rendered.lines.contains(&"Landmark: Perto da praça".to_string()));
        assert!(rendered.action.is_none());
    }

    #[test]
    fn directory_failures_have_distinct_disabled_placeholders() {
        let loading = directory_options(&DirectorySelector::Loading);
        let api = directory_options(&DirectorySelector::Failed(DirectoryFailure::Api));
        let connection =
            directory_options(&DirectorySelector::Failed(DirectoryFailure::Connection));
        for options in [&loading, &api, &connection] {
            assert_eq!(options.len(), 1);
            assert!(options[0].disabled);
        }
        assert_ne!(loading[0].label, api[0].label);
        assert_ne!(api[0].label, connection[0].label);
    }
}

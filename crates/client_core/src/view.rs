//! View model owned by the controller. Every transition here is synchronous
//! and network-free; the controller decides when to apply them.

use std::time::{Duration, Instant};

use shared::domain::{
    Appointment, AppointmentId, AppointmentStatus, CollectionPoint, CollectionPointId,
};

use crate::{form::AppointmentForm, render::collection_point_label};

pub const NOTICE_LIFETIME: Duration = Duration::from_secs(5);

/// Where a card's data came from. A full fetch always replaces every card
/// with `Reconciled` ones, so an `Optimistic` card lives until the next sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardProvenance {
    Optimistic,
    Reconciled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentCard {
    pub appointment: Appointment,
    pub provenance: CardProvenance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncFailure {
    Api(String),
    Connection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BucketContent {
    Loading,
    Cards(Vec<AppointmentCard>),
    Empty,
    Failed(SyncFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketView {
    pub content: BucketContent,
    pub count: usize,
}

impl Default for BucketView {
    fn default() -> Self {
        Self {
            content: BucketContent::Loading,
            count: 0,
        }
    }
}

impl BucketView {
    fn from_appointments(appointments: Vec<Appointment>) -> Self {
        let count = appointments.len();
        let content = if appointments.is_empty() {
            BucketContent::Empty
        } else {
            BucketContent::Cards(
                appointments
                    .into_iter()
                    .map(|appointment| AppointmentCard {
                        appointment,
                        provenance: CardProvenance::Reconciled,
                    })
                    .collect(),
            )
        };
        Self { content, count }
    }

    pub fn cards(&self) -> &[AppointmentCard] {
        match &self.content {
            BucketContent::Cards(cards) => cards,
            _ => &[],
        }
    }

    pub fn contains(&self, id: AppointmentId) -> bool {
        self.cards().iter().any(|card| card.appointment.id == id)
    }

    fn prepend(&mut self, card: AppointmentCard) {
        match &mut self.content {
            BucketContent::Cards(cards) => cards.insert(0, card),
            other => *other = BucketContent::Cards(vec![card]),
        }
        self.count += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryFailure {
    Api,
    Connection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOption {
    pub id: CollectionPointId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DirectorySelector {
    #[default]
    Loading,
    Ready(Vec<SelectorOption>),
    Failed(DirectoryFailure),
}

impl DirectorySelector {
    pub fn from_points(points: &[CollectionPoint]) -> Self {
        Self::Ready(
            points
                .iter()
                .map(|point| SelectorOption {
                    id: point.id,
                    label: collection_point_label(point),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub shown_at: Instant,
    /// Distinguishes notices with identical text; assigned by the view model.
    pub serial: u64,
}

impl Notice {
    pub fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            shown_at: Instant::now(),
            serial: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub pending: BucketView,
    pub confirmed: BucketView,
    pub directory: DirectorySelector,
    pub notice: Option<Notice>,
    /// At most one panel is expanded at a time.
    pub active_panel: Option<Panel>,
    pub form: AppointmentForm,
    pub notices_shown: u64,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            pending: BucketView::default(),
            confirmed: BucketView::default(),
            directory: DirectorySelector::default(),
            notice: None,
            active_panel: Some(Panel::Pending),
            form: AppointmentForm::default(),
            notices_shown: 0,
        }
    }
}

impl ViewModel {
    pub fn bucket(&self, status: AppointmentStatus) -> &BucketView {
        match status {
            AppointmentStatus::Pending => &self.pending,
            AppointmentStatus::Confirmed => &self.confirmed,
        }
    }

    pub fn begin_sync(&mut self) {
        self.pending = BucketView::default();
        self.confirmed = BucketView::default();
    }

    /// Replaces both buckets with the partition of a full fetch, keeping
    /// server order inside each bucket.
    pub fn apply_snapshot(&mut self, appointments: Vec<Appointment>) {
        let (pending, confirmed): (Vec<_>, Vec<_>) =
            appointments.into_iter().partition(Appointment::is_pending);
        self.pending = BucketView::from_appointments(pending);
        self.confirmed = BucketView::from_appointments(confirmed);
    }

    pub fn apply_sync_failure(&mut self, failure: SyncFailure) {
        self.pending = BucketView {
            content: BucketContent::Failed(failure.clone()),
            count: 0,
        };
        self.confirmed = BucketView {
            content: BucketContent::Failed(failure),
            count: 0,
        };
    }

    pub fn insert_optimistic(&mut self, appointment: Appointment) {
        self.pending.prepend(AppointmentCard {
            appointment,
            provenance: CardProvenance::Optimistic,
        });
    }

    pub fn optimistic_cards(&self) -> usize {
        self.pending
            .cards()
            .iter()
            .chain(self.confirmed.cards())
            .filter(|card| card.provenance == CardProvenance::Optimistic)
            .count()
    }

    pub fn show_notice(&mut self, kind: NoticeKind, text: impl Into<String>) -> Notice {
        self.notices_shown += 1;
        let notice = Notice {
            serial: self.notices_shown,
            ..Notice::new(kind, text)
        };
        self.notice = Some(notice.clone());
        notice
    }

    /// Clears the notice only if it is still the one with `serial`.
    pub fn clear_notice(&mut self, serial: u64) -> bool {
        if self.notice.as_ref().is_some_and(|n| n.serial == serial) {
            self.notice = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(id: i64, status: &str) -> Appointment {
        Appointment {
            id: AppointmentId(id),
            status: status.to_string(),
            data_retirada: "2025-11-15".to_string(),
            tipo_lixo: "Baterias".to_string(),
            endereco_coleta: None,
            ponto_referencia: None,
            usuario_id: None,
            nome_usuario: None,
            email_usuario: None,
            ponto_coleta_id: None,
            nome_ponto_coleta: None,
        }
    }

    #[test]
    fn snapshot_partitions_and_preserves_server_order() {
        let mut view = ViewModel::default();
        view.apply_snapshot(vec![
            appointment(5, "pendente"),
            appointment(4, "Confirmado"),
            appointment(3, "PENDENTE"),
            appointment(2, "concluido"),
        ]);

        let pending: Vec<_> = view.pending.cards().iter().map(|c| c.appointment.id.0).collect();
        let confirmed: Vec<_> = view.confirmed.cards().iter().map(|c| c.appointment.id.0).collect();
        assert_eq!(pending, vec![5, 3]);
        assert_eq!(confirmed, vec![4, 2]);
        assert_eq!(view.pending.count + view.confirmed.count, 4);
    }

    #[test]
    fn empty_bucket_gets_placeholder() {
        let mut view = ViewModel::default();
        view.apply_snapshot(vec![appointment(1, "Confirmado")]);
        assert_eq!(view.pending.content, BucketContent::Empty);
        assert_eq!(view.pending.count, 0);
    }

    #[test]
    fn optimistic_insert_prepends_into_empty_bucket() {
        let mut view = ViewModel::default();
        view.apply_snapshot(vec![]);
        view.insert_optimistic(appointment(9, "pendente"));
        assert_eq!(view.pending.count, 1);
        assert_eq!(view.pending.cards()[0].provenance, CardProvenance::Optimistic);
        assert_eq!(view.optimistic_cards(), 1);

        view.apply_snapshot(vec![appointment(9, "pendente")]);
        assert_eq!(view.optimistic_cards(), 0);
        assert_eq!(view.pending.count, 1);
    }

    #[test]
    fn sync_failure_zeroes_both_counters() {
        let mut view = ViewModel::default();
        view.apply_snapshot(vec![appointment(1, "pendente")]);
        view.apply_sync_failure(SyncFailure::Connection);
        assert_eq!(view.pending.count, 0);
        assert_eq!(view.confirmed.count, 0);
        assert_eq!(
            view.confirmed.content,
            BucketContent::Failed(SyncFailure::Connection)
        );
    }

    #[test]
    fn clearing_a_replaced_notice_keeps_the_newer_one() {
        let mut view = ViewModel::default();
        let first = view.show_notice(NoticeKind::Success, "same text");
        let second = view.show_notice(NoticeKind::Success, "same text");
        assert_ne!(first.serial, second.serial);

        assert!(!view.clear_notice(first.serial));
        assert_eq!(view.notice.as_ref(), Some(&second));
        assert!(view.clear_notice(second.serial));
        assert!(view.notice.is_none());
    }
}

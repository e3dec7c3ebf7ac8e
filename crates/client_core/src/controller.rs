use std::sync::Arc;

use shared::domain::{Appointment, AppointmentId, AppointmentStatus};
use tokio::{
    sync::{broadcast, Mutex},
    time::sleep,
};
use tracing::{debug, info, warn};

use crate::{
    form::{AppointmentForm, FormError, NewAppointment},
    view::{
        DirectoryFailure, DirectorySelector, Notice, NoticeKind, Panel, SyncFailure, ViewModel,
        NOTICE_LIFETIME,
    },
    ClientError, SchedulingApi,
};

const INCOMPLETE_FORM: &str =
    "Fill in all required fields, including the user ID and the collection company.";
const SERVER_UNREACHABLE: &str = "Connection error with the server. Check that the API is running.";

/// Asked before any status change is sent. Returning `false` cancels the
/// transition without touching the network.
pub trait ConfirmationPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// Prompt that accepts everything, for non-interactive callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmationPrompt for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BucketCounts {
    pub pending: usize,
    pub confirmed: usize,
}

impl BucketCounts {
    pub fn total(&self) -> usize {
        self.pending + self.confirmed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    DirectoryLoaded { options: usize },
    DirectoryFailed(DirectoryFailure),
    Synchronized(BucketCounts),
    SyncFailed(SyncFailure),
    OptimisticInserted(AppointmentId),
    StatusChanged { id: AppointmentId, status: String },
    Notice(Notice),
    NoticeExpired { serial: u64 },
    /// A sibling component should expand the given panel.
    RevealPanel(Panel),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Declined,
    Applied,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Caught client-side; nothing was sent.
    Rejected(FormError),
    Failed(String),
    Inserted(AppointmentId),
    /// The server did not echo the created record, so the list was refetched.
    Resynchronized,
}

pub struct AppointmentListController {
    api: Arc<dyn SchedulingApi>,
    prompt: Arc<dyn ConfirmationPrompt>,
    view: Arc<Mutex<ViewModel>>,
    events: broadcast::Sender<ControllerEvent>,
}

fn sync_failure(err: &ClientError) -> SyncFailure {
    if err.is_transport() {
        SyncFailure::Connection
    } else {
        SyncFailure::Api(err.user_message())
    }
}

/// Builds the local card for a freshly created appointment. A new record is
/// always pending and belongs to the submitted user and company; the other
/// fields prefer the server's echo and fall back to what was submitted.
/// Resolved names are never known at this point.
fn optimistic_record(
    response: &shared::protocol::CreateAppointmentResponse,
    submitted: &NewAppointment,
) -> Option<Appointment> {
    let created = response.novo_agendamento.as_ref()?;
    let id = created.id.or(response.id_agendamento)?;
    Some(Appointment {
        id,
        status: AppointmentStatus::Pending.wire_value().to_string(),
        data_retirada: created
            .data_retirada
            .clone()
            .unwrap_or_else(|| submitted.pickup_date.clone()),
        tipo_lixo: created
            .tipo_lixo
            .clone()
            .unwrap_or_else(|| submitted.waste_category.clone()),
        endereco_coleta: created
            .endereco_coleta
            .clone()
            .or_else(|| Some(submitted.address.clone())),
        ponto_referencia: created
            .ponto_referencia
            .clone()
            .or_else(|| submitted.landmark.clone()),
        usuario_id: Some(submitted.user_id),
        nome_usuario: None,
        email_usuario: None,
        ponto_coleta_id: Some(submitted.collection_point_id),
        nome_ponto_coleta: None,
    })
}

impl AppointmentListController {
    pub fn new(api: Arc<dyn SchedulingApi>, prompt: Arc<dyn ConfirmationPrompt>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            api,
            prompt,
            view: Arc::new(Mutex::new(ViewModel::default())),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ViewModel {
        self.view.lock().await.clone()
    }

    pub async fn set_form(&self, form: AppointmentForm) {
        self.view.lock().await.form = form;
    }

    pub async fn set_active_panel(&self, panel: Option<Panel>) {
        self.view.lock().await.active_panel = panel;
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Shows a notice and schedules its removal after `NOTICE_LIFETIME`. A
    /// newer notice shown in the meantime is left alone.
    async fn notify(&self, kind: NoticeKind, text: impl Into<String>) {
        let notice = self.view.lock().await.show_notice(kind, text);
        let serial = notice.serial;
        self.emit(ControllerEvent::Notice(notice));

        let view = Arc::clone(&self.view);
        let events = self.events.clone();
        tokio::spawn(async move {
            sleep(NOTICE_LIFETIME).await;
            if view.lock().await.clear_notice(serial) {
                let _ = events.send(ControllerEvent::NoticeExpired { serial });
            }
        });
    }

    /// First render: directory and list, one after the other.
    pub async fn initialize(&self) {
        self.load_directory().await;
        if let Err(err) = self.synchronize().await {
            debug!(error = %err, "initial synchronization failed");
        }
    }

    pub async fn load_directory(&self) {
        self.view.lock().await.directory = DirectorySelector::Loading;

        match self.api.list_collection_points().await {
            Ok(points) => {
                let options = points.len();
                self.view.lock().await.directory = DirectorySelector::from_points(&points);
                debug!(options, "collection point directory loaded");
                self.emit(ControllerEvent::DirectoryLoaded { options });
            }
            Err(err) => {
                let failure = if err.is_transport() {
                    DirectoryFailure::Connection
                } else {
                    DirectoryFailure::Api
                };
                warn!(error = %err, "failed to load collection points");
                self.view.lock().await.directory = DirectorySelector::Failed(failure);
                self.emit(ControllerEvent::DirectoryFailed(failure));
            }
        }
    }

    /// Replaces both buckets with the partition of a fresh fetch. Whichever
    /// fetch completes last decides what is shown.
    pub async fn synchronize(&self) -> Result<BucketCounts, ClientError> {
        self.view.lock().await.begin_sync();

        match self.api.list_appointments().await {
            Ok(appointments) => {
                let counts = {
                    let mut view = self.view.lock().await;
                    view.apply_snapshot(appointments);
                    BucketCounts {
                        pending: view.pending.count,
                        confirmed: view.confirmed.count,
                    }
                };
                debug!(
                    pending = counts.pending,
                    confirmed = counts.confirmed,
                    "appointments synchronized"
                );
                self.emit(ControllerEvent::Synchronized(counts));
                Ok(counts)
            }
            Err(err) => {
                let failure = sync_failure(&err);
                warn!(error = %err, "failed to list appointments");
                self.view.lock().await.apply_sync_failure(failure.clone());
                self.emit(ControllerEvent::SyncFailed(failure));
                Err(err)
            }
        }
    }

    pub async fn transition_status(&self, id: AppointmentId, status: &str) -> TransitionOutcome {
        let question =
            format!("Are you sure you want to change the status of appointment #{id} to '{status}'?");
        if !self.prompt.confirm(&question) {
            debug!(%id, "status change declined");
            return TransitionOutcome::Declined;
        }

        match self.api.update_status(id, status).await {
            Ok(_) => {
                info!(%id, status, "appointment status updated");
                self.notify(
                    NoticeKind::Success,
                    format!("Appointment #{id} updated to '{status}' successfully!"),
                )
                .await;
                self.emit(ControllerEvent::StatusChanged {
                    id,
                    status: status.to_string(),
                });
                // The card moves buckets because the refetch re-partitions it.
                if let Err(err) = self.synchronize().await {
                    debug!(error = %err, "resync after status change failed");
                }
                TransitionOutcome::Applied
            }
            Err(err) => {
                warn!(%id, error = %err, "status change failed");
                let text = if err.is_transport() {
                    "Connection error with the server.".to_string()
                } else {
                    format!("Error updating appointment: {}", err.user_message())
                };
                self.notify(NoticeKind::Error, text.clone()).await;
                TransitionOutcome::Failed(text)
            }
        }
    }

    /// Validates the current form and sends it. On success the form is
    /// cleared and the directory reloaded whichever insertion path was taken.
    pub async fn submit(&self) -> SubmitOutcome {
        let form = self.view.lock().await.form.clone();
        let submitted = match form.validate() {
            Ok(valid) => valid,
            Err(err) => {
                debug!(error = %err, "appointment form rejected");
                self.notify(NoticeKind::Error, INCOMPLETE_FORM).await;
                return SubmitOutcome::Rejected(err);
            }
        };

        let response = match self.api.create_appointment(&submitted.to_request()).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "appointment submission failed");
                let text = if err.is_transport() {
                    SERVER_UNREACHABLE.to_string()
                } else {
                    format!("Scheduling failed: {}", err.user_message())
                };
                self.notify(NoticeKind::Error, text.clone()).await;
                return SubmitOutcome::Failed(text);
            }
        };

        let created_id = response
            .id_agendamento
            .or_else(|| response.novo_agendamento.as_ref().and_then(|c| c.id));
        let confirmation = match created_id {
            Some(id) => format!("Appointment #{id} created successfully!"),
            None => "Appointment created successfully!".to_string(),
        };
        self.notify(NoticeKind::Success, confirmation).await;
        self.view.lock().await.form.clear();

        let outcome = match optimistic_record(&response, &submitted) {
            Some(record) => {
                let id = record.id;
                let reveal = {
                    let mut view = self.view.lock().await;
                    view.insert_optimistic(record);
                    if view.active_panel != Some(Panel::Pending) {
                        view.active_panel = Some(Panel::Pending);
                        true
                    } else {
                        false
                    }
                };
                info!(%id, "appointment created, inserted optimistically");
                self.emit(ControllerEvent::OptimisticInserted(id));
                if reveal {
                    self.emit(ControllerEvent::RevealPanel(Panel::Pending));
                }
                SubmitOutcome::Inserted(id)
            }
            None => {
                info!("appointment created without echoed record, refetching");
                if let Err(err) = self.synchronize().await {
                    debug!(error = %err, "resync after submission failed");
                }
                SubmitOutcome::Resynchronized
            }
        };

        self.load_directory().await;
        outcome
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

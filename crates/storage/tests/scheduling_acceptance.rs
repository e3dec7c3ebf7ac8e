use shared::domain::AppointmentStatus;
use storage::{NewCollectionPoint, NewStoredAppointment, Storage, UserKind};

#[tokio::test]
async fn pending_appointment_is_confirmed_and_reclassified() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let user = storage
        .create_user("Aline Dev", "aline@exemplo.com", UserKind::Citizen)
        .await
        .expect("user");
    let point = storage
        .create_collection_point(&NewCollectionPoint {
            name: "Ponto Recicla Fácil".to_string(),
            address: "Rua das Flores, 100, Centro".to_string(),
            latitude: -23.6698,
            longitude: -46.5492,
            opening_hours: None,
        })
        .await
        .expect("point");

    let created = storage
        .create_appointment(&NewStoredAppointment {
            user_id: user,
            collection_point_id: Some(point),
            pickup_date: "2025-11-15".to_string(),
            waste_category: "Celulares e Baterias".to_string(),
            address: Some("Rua B, 20".to_string()),
            landmark: Some("Perto da praça".to_string()),
        })
        .await
        .expect("appointment");
    assert_eq!(created.classification(), AppointmentStatus::Pending);

    storage
        .update_appointment_status(created.id, AppointmentStatus::Confirmed.wire_value())
        .await
        .expect("confirm");

    let listed = storage.list_appointments().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].classification(), AppointmentStatus::Confirmed);
    assert_eq!(listed[0].ponto_referencia.as_deref(), Some("Perto da praça"));
}

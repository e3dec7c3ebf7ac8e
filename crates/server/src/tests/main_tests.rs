use super::*;
use axum::{body, body::Body, http::Request, response::Response};
use shared::protocol::CreatedAppointment;
use storage::{NewCollectionPoint, UserKind};
use tower::ServiceExt;

async fn test_app() -> (Router, Storage, i64, i64) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let user = storage
        .create_user("Aline Dev", "aline@exemplo.com", UserKind::Citizen)
        .await
        .expect("user");
    let point = storage
        .create_collection_point(&NewCollectionPoint {
            name: "Ponto Recicla Fácil".into(),
            address: "Rua das Flores, 100, Centro".into(),
            latitude: -23.6698,
            longitude: -46.5492,
            opening_hours: Some("Seg-Sex, 8h-17h".into()),
        })
        .await
        .expect("point");

    let app = build_router(Arc::new(AppState {
        api: ApiContext {
            storage: storage.clone(),
        },
    }));
    (app, storage, user.0, point.0)
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn post_json(uri: &str, value: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(value.to_string()))
        .expect("request")
}

fn put_json(uri: &str, value: serde_json::Value) -> Request<Body> {
    Request::put(uri)
        .header("content-type", "application/json")
        .body(Body::from(value.to_string()))
        .expect("request")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage, _user_id, _point_id) = test_app().await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn lists_collection_points_in_success_envelope() {
    let (app, _storage, _user_id, point_id) = test_app().await;
    let request = Request::get("/pontos").body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let envelope: ApiEnvelope<Vec<CollectionPoint>> =
        serde_json::from_value(json_body(response).await).expect("envelope");
    assert!(envelope.is_success());
    let points = envelope.dados.expect("dados");
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].id.0, point_id);
    assert_eq!(points[0].endereco, "Rua das Flores, 100, Centro");
}

#[tokio::test]
async fn create_returns_201_with_record_and_listing_includes_names() {
    let (app, _storage, user_id, point_id) = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/agendamentos",
            serde_json::json!({
                "usuario_id": user_id,
                "ponto_coleta_id": point_id,
                "data_retirada": "2025-11-15",
                "tipo_lixo": "Monitor e CPU",
                "endereco_coleta": "Rua A, 10"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let created: CreateAppointmentResponse =
        serde_json::from_value(json_body(response).await).expect("created");
    assert!(created.is_success());
    let id = created.id_agendamento.expect("id");
    let record: CreatedAppointment = created.novo_agendamento.expect("record");
    assert_eq!(record.id, Some(id));
    assert_eq!(record.status.as_deref(), Some("pendente"));

    let list = app
        .oneshot(Request::get("/agendamentos").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let value = json_body(list).await;
    assert_eq!(value["total"], 1);
    assert_eq!(value["dados"][0]["nome_usuario"], "Aline Dev");
    assert_eq!(value["dados"][0]["nome_ponto_coleta"], "Ponto Recicla Fácil");
}

#[tokio::test]
async fn create_without_required_field_is_rejected_with_failure_envelope() {
    let (app, _storage, user_id, _point_id) = test_app().await;
    let response = app
        .oneshot(post_json(
            "/agendamentos",
            serde_json::json!({ "usuario_id": user_id, "tipo_lixo": "Baterias" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let value = json_body(response).await;
    assert_eq!(value["status"], "erro");
    assert!(value["mensagem"]
        .as_str()
        .expect("mensagem")
        .contains("data_retirada"));
}

#[tokio::test]
async fn create_with_malformed_json_is_rejected() {
    let (app, _storage, _user_id, _point_id) = test_app().await;
    let request = Request::post("/agendamentos")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["status"], "erro");
}

#[tokio::test]
async fn create_for_unknown_user_conflicts() {
    let (app, _storage, _user_id, _point_id) = test_app().await;
    let response = app
        .oneshot(post_json(
            "/agendamentos",
            serde_json::json!({
                "usuario_id": 999,
                "data_retirada": "2025-11-15",
                "tipo_lixo": "Baterias"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_status_round_trip_and_not_found() {
    let (app, storage, user_id, point_id) = test_app().await;
    let created = storage
        .create_appointment(&storage::NewStoredAppointment {
            user_id: shared::domain::UserId(user_id),
            collection_point_id: Some(shared::domain::CollectionPointId(point_id)),
            pickup_date: "2025-11-20".into(),
            waste_category: "Celulares e Baterias".into(),
            address: None,
            landmark: None,
        })
        .await
        .expect("appointment");

    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/agendamentos/{}", created.id.0),
            serde_json::json!({ "status": "Confirmado" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let ok: StatusResponse = serde_json::from_value(json_body(response).await).expect("json");
    assert!(ok.is_success());

    let missing = app
        .clone()
        .oneshot(put_json(
            "/agendamentos/999",
            serde_json::json!({ "status": "Confirmado" }),
        ))
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let no_status = app
        .oneshot(put_json(
            &format!("/agendamentos/{}", created.id.0),
            serde_json::json!({}),
        ))
        .await
        .expect("response");
    assert_eq!(no_status.status(), StatusCode::BAD_REQUEST);

    let listed = storage.list_appointments().await.expect("list");
    assert_eq!(listed[0].status, "Confirmado");
}

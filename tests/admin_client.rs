// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Contract tests for AdminClient against a PostgREST-style table API
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET | `/rest/v1/registros` | `test_count_*`, `test_list_*`, `test_get_*` |
//! | POST | `/rest/v1/registros` | `test_insert_*` |
//! | PATCH | `/rest/v1/registros?id=eq.{id}` | `test_update_*` |
//! | DELETE | `/rest/v1/registros?id=eq.{id}` | `test_delete_*` |

use datalex::client::{AdminClient, ApiError, RegulationForm};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLE: &str = "/rest/v1/registros";

fn test_client(server: &MockServer) -> AdminClient {
    AdminClient::new(&server.uri().parse().unwrap(), "service-key", 5).unwrap()
}

fn form() -> RegulationForm {
    RegulationForm {
        titulo: "Ordenanza de Zonas de Bajas Emisiones".into(),
        escala_normativa: "PLAN_URB".into(),
        ambito: "MUN".into(),
        ccaa: "Comunidad de Madrid".into(),
        provincia: "Madrid".into(),
        ciudad: "Madrid".into(),
        url: "https://example.org/zbe.pdf".into(),
        cambio_climatico: "CLI-01".into(),
        ..RegulationForm::default()
    }
}

#[tokio::test]
async fn test_count_reads_content_range_and_sends_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .and(header("prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "0-0/128")
                .set_body_json(json!([{ "id": 1 }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(test_client(&server).count().await.unwrap(), 128);
}

#[tokio::test]
async fn test_list_uses_offset_and_title_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE))
        .and(query_param("offset", "20"))
        .and(query_param("limit", "10"))
        .and(query_param("titulo", "ilike.*agua*"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "20-20/21")
                .set_body_json(json!([
                    { "id": 21, "titulo": "Plan del agua", "CCAA": "Aragón", "disponible": true }
                ])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page = test_client(&server).list(3, 10, Some(" agua ")).await.unwrap();
    assert_eq!(page.total, Some(21));
    assert_eq!(page.regulations.len(), 1);
    assert_eq!(page.regulations[0].ccaa, "Aragón");
    assert!(page.regulations[0].disponible);
}

#[tokio::test]
async fn test_get_empty_result_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = test_client(&server).get(5).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_insert_uses_next_id_and_uppercase_region() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TABLE))
        .and(query_param("order", "id.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 41 }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TABLE))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": 42, "titulo": "Ordenanza de Zonas de Bajas Emisiones", "CCAA": "Comunidad de Madrid" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let created = test_client(&server).insert(&form()).await.unwrap();
    assert_eq!(created.id, "42");
    assert_eq!(created.ccaa, "Comunidad de Madrid");

    let requests = server.received_requests().await.unwrap();
    let post = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let rows: Value = serde_json::from_slice(&post.body).unwrap();
    let row = &rows[0];
    assert_eq!(row["id"], json!(42));
    assert_eq!(row["CCAA"], json!("Comunidad de Madrid"));
    assert!(row.get("ccaa").is_none());
    assert!(row["created_at"].is_string());
}

#[tokio::test]
async fn test_insert_validates_before_any_request() {
    let server = MockServer::start().await;
    let invalid = RegulationForm {
        url: String::new(),
        ..form()
    };

    let err = test_client(&server).insert(&invalid).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_patches_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(TABLE))
        .and(query_param("id", "eq.42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 42, "titulo": "Título corregido" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let updated = test_client(&server)
        .update(
            42,
            &RegulationForm {
                titulo: "Título corregido".into(),
                ..form()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.titulo, "Título corregido");
}

#[tokio::test]
async fn test_delete_surfaces_backend_errors() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(TABLE))
        .and(query_param("id", "eq.7"))
        .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
        .mount(&server)
        .await;

    match test_client(&server).delete(7).await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, 403),
        other => panic!("expected Status error, got {other:?}"),
    }
}

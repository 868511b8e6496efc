/// HTTP-level tests for the survey API: routing, status codes, error bodies
/// and CORS, driven through the full actix application.

use actix_web::{http::StatusCode, test};
use serde_json::{Value, json};

use readiness_survey::handlers;
use readiness_survey::storage::{MemoryStore, ObjectStore};

mod common;
use common::{test_app_state, upload};

// ---------------------------------------------------------------------------
// GET /questions
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_questions_returns_set_in_file_order() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let req = test::TestRequest::get().uri("/questions?type=company").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["type"], "company");
    assert_eq!(body["total_questions"], 3);
    let ids: Vec<&str> = body["questions"]
        .as_array()
        .expect("questions array")
        .iter()
        .map(|q| q["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, ["c1", "c2", "c3"]);
    assert_eq!(body["questions"][0]["options"], json!(["1-10", "11-50", "51-200", "200+"]));
    assert_eq!(body["questions"][0]["required"], true);
}

#[actix_web::test]
async fn test_questions_rejects_missing_or_unknown_type() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    for uri in ["/questions", "/questions?type=manager", "/questions?type="] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["field"], "type");
    }
}

#[actix_web::test]
async fn test_questions_missing_csv_is_not_found() {
    let store = std::sync::Arc::new(MemoryStore::new());
    let state = actix_web::web::Data::new(handlers::AppState::with_store(store));
    let app = test::init_service(handlers::app(state)).await;

    let req = test::TestRequest::get().uri("/questions?type=employee").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

#[actix_web::test]
async fn test_questions_malformed_csv_is_format_error() {
    let (state, store) = test_app_state().await;
    store
        .put("questions/company_questions.csv", b"id,question\n1,Hi\n".to_vec(), "text/csv")
        .await
        .expect("put");
    let app = test::init_service(handlers::app(state)).await;

    let req = test::TestRequest::get().uri("/questions?type=company").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "format_error");
}

// ---------------------------------------------------------------------------
// GET /responses
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_read_unknown_entity_is_not_found_body() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let query = serde_urlencoded::to_string([
        ("type", "employee"),
        ("company_id", "Acme"),
        ("employee_id", "E42"),
    ])
    .expect("encode query");
    let req = test::TestRequest::get()
        .uri(&format!("/responses?{query}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["found"], false);
    assert_eq!(body["company_id"], "acme");
    assert_eq!(body["employee_id"], "e42");
    assert_eq!(body["storage_path"], "companies/acme/employees/e42/form.json");
}

#[actix_web::test]
async fn test_read_requires_identifiers() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let cases = [
        ("/responses?type=company", "company_id"),
        ("/responses?type=employee&company_id=acme", "employee_id"),
        ("/responses?company_id=acme", "type"),
    ];
    for (uri, field) in cases {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["field"], field, "{uri}");
    }
}

// ---------------------------------------------------------------------------
// POST /responses
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_save_then_read_merges_answers() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let first = json!({
        "type": "company",
        "company_id": "acme",
        "responses": {"c1": "11-50", "c2": "Yes"},
        "page_save": true
    });
    let req = test::TestRequest::post().uri("/responses").set_json(&first).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Response saved successfully");
    assert_eq!(body["revision"], 1);
    assert_eq!(body["uploaded_files"], 0);

    let second = json!({
        "type": "company",
        "company_id": "acme",
        "responses": {"c2": "No", "c3": "Automate reporting"},
        "auto_save": true
    });
    let req = test::TestRequest::post().uri("/responses").set_json(&second).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/responses?type=company&company_id=acme")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["found"], true);
    assert_eq!(body["storage_path"], "companies/acme/form.json");
    assert_eq!(
        body["responses"],
        json!({"c1": "11-50", "c2": "No", "c3": "Automate reporting"})
    );
    assert_eq!(body["last_save"], "auto");
    assert_eq!(body["revision"], 2);
}

#[actix_web::test]
async fn test_save_validation_errors_name_the_field() {
    let (state, store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;
    let puts_before = store.put_count();

    let cases = [
        (json!({"company_id": "acme", "responses": {}}), "type"),
        (json!({"type": "company", "responses": {}}), "company_id"),
        (json!({"type": "employee", "company_id": "acme", "responses": {}}), "employee_id"),
        (json!({"type": "company", "company_id": "acme"}), "responses"),
        (json!({"type": "company", "company_id": "acme", "responses": {"c1": {"x": 1}}}), "responses.c1"),
        (
            json!({
                "type": "company",
                "company_id": "acme",
                "responses": {},
                "files": [{"filename": "a.txt", "content": "aGk=", "content_type": "text/plain"}]
            }),
            "files",
        ),
    ];
    for (payload, field) in cases {
        let req = test::TestRequest::post().uri("/responses").set_json(&payload).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{payload}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["field"], field);
    }
    assert_eq!(store.put_count(), puts_before, "failed saves must not write");
}

#[actix_web::test]
async fn test_save_rejects_bad_attachment_by_name() {
    let (state, store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let payload = json!({
        "type": "employee",
        "company_id": "acme",
        "employee_id": "e42",
        "responses": {"e1": "Analyst"},
        "files": [
            upload("notes.txt", b"fine", "text/plain"),
            upload("payload.exe", b"MZ", "application/x-msdownload"),
        ]
    });
    let req = test::TestRequest::post().uri("/responses").set_json(&payload).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "file_validation_error");
    assert_eq!(body["field"], "payload.exe");

    assert!(
        !store.keys().await.iter().any(|k| k.starts_with("companies/")),
        "nothing is stored when one file fails"
    );
}

#[actix_web::test]
async fn test_stale_revision_is_conflict() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let save = |expected: u64| {
        json!({
            "type": "company",
            "company_id": "acme",
            "responses": {"c1": "1-10"},
            "expected_revision": expected
        })
    };

    let req = test::TestRequest::post().uri("/responses").set_json(save(0)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post().uri("/responses").set_json(save(0)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "conflict");
}

#[actix_web::test]
async fn test_malformed_json_is_validation_error() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let req = test::TestRequest::post()
        .uri("/responses")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["field"], "body");
}

// ---------------------------------------------------------------------------
// CORS and routing
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_preflight_is_answered_with_cors_headers() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/responses")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let headers = resp.headers();
    assert_eq!(headers.get("access-control-allow-origin").expect("origin"), "*");
    assert_eq!(
        headers.get("access-control-allow-methods").expect("methods"),
        "GET,POST,OPTIONS"
    );
    assert!(
        headers
            .get("access-control-allow-headers")
            .expect("headers")
            .to_str()
            .expect("ascii")
            .contains("Content-Type")
    );
}

#[actix_web::test]
async fn test_error_responses_carry_cors_headers() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let req = test::TestRequest::get().uri("/questions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers().contains_key("access-control-allow-origin"));
}

#[actix_web::test]
async fn test_unknown_route_is_json_not_found() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let req = test::TestRequest::get().uri("/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

// ---------------------------------------------------------------------------
// Survey page
// ---------------------------------------------------------------------------

#[actix_web::test]
async fn test_survey_page_renders_sections() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let req = test::TestRequest::get().uri("/survey/employee").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let html = String::from_utf8(body.to_vec()).expect("utf8");
    assert!(html.contains("About You"));
    assert!(html.contains("AI Experience"));
    assert!(html.contains("data-question-id=\"e3\""));
}

#[actix_web::test]
async fn test_survey_page_unknown_type_is_404() {
    let (state, _store) = test_app_state().await;
    let app = test::init_service(handlers::app(state)).await;

    let req = test::TestRequest::get().uri("/survey/manager").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

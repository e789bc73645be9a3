//! Integration tests for the Appwrite REST client.
//!
//! A fake platform built with Axum records every request so the tests can
//! check paths, headers and bodies on the wire, then runs the full
//! onboarding flow through `AppwriteClient`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use staff_onboard::config::OnboardConfig;
use staff_onboard::error::{OnboardingError, PlatformError};
use staff_onboard::onboarding::{OnboardRequest, Onboarder};
use staff_onboard::platform::{AppwriteClient, Permission, Platform, Query, Role};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct Recorded {
    method: &'static str,
    path: String,
    project: Option<String>,
    key: Option<String>,
    body: Value,
}

#[derive(Default)]
struct FakeState {
    requests: Vec<Recorded>,
    documents: Vec<Value>,
    emails: Vec<String>,
    fail_recovery: bool,
}

type Shared = Arc<Mutex<FakeState>>;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn record(state: &Shared, method: &'static str, path: String, headers: &HeaderMap, body: Value) {
    state.lock().unwrap().requests.push(Recorded {
        method,
        path,
        project: header(headers, "x-appwrite-project"),
        key: header(headers, "x-appwrite-key"),
        body,
    });
}

fn platform_error(status: StatusCode, kind: &str, message: &str) -> axum::response::Response {
    (
        status,
        Json(json!({"message": message, "code": status.as_u16(), "type": kind, "version": "1.6.0"})),
    )
        .into_response()
}

async fn list_documents(
    State(state): State<Shared>,
    Path((db, coll)): Path<(String, String)>,
    RawQuery(raw): RawQuery,
    headers: HeaderMap,
) -> impl IntoResponse {
    let raw = raw.unwrap_or_default();
    let url = reqwest::Url::parse(&format!("http://fake/?{raw}")).unwrap();
    let queries: Vec<Query> = url
        .query_pairs()
        .filter(|(k, _)| k == "queries[]")
        .map(|(_, v)| serde_json::from_str(&v).unwrap())
        .collect();

    record(
        &state,
        "GET",
        format!("/databases/{db}/collections/{coll}/documents"),
        &headers,
        json!(queries.iter().map(ToString::to_string).collect::<Vec<_>>()),
    );

    let guard = state.lock().unwrap();
    let matching: Vec<Value> = guard
        .documents
        .iter()
        .filter(|doc| {
            doc.as_object()
                .is_some_and(|data| queries.iter().all(|q| q.matches(data)))
        })
        .cloned()
        .collect();
    Json(json!({"total": matching.len(), "documents": matching})).into_response()
}

async fn create_document(
    State(state): State<Shared>,
    Path((db, coll)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    record(
        &state,
        "POST",
        format!("/databases/{db}/collections/{coll}/documents"),
        &headers,
        body.clone(),
    );

    let mut doc = body["data"].clone();
    doc["$id"] = body["documentId"].clone();
    doc["$permissions"] = body["permissions"].clone();
    doc["$collectionId"] = json!(coll);
    state.lock().unwrap().documents.push(doc.clone());
    (StatusCode::CREATED, Json(doc)).into_response()
}

async fn delete_document(
    State(state): State<Shared>,
    Path((db, coll, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> impl IntoResponse {
    record(
        &state,
        "DELETE",
        format!("/databases/{db}/collections/{coll}/documents/{id}"),
        &headers,
        Value::Null,
    );
    state
        .lock()
        .unwrap()
        .documents
        .retain(|d| d["$id"] != json!(id));
    StatusCode::NO_CONTENT
}

async fn create_account(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    record(&state, "POST", "/account".to_string(), &headers, body.clone());

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let mut guard = state.lock().unwrap();
    if guard.emails.contains(&email) {
        return platform_error(
            StatusCode::CONFLICT,
            "user_already_exists",
            "A user with the same id, email, or phone already exists in this project.",
        );
    }
    guard.emails.push(email.clone());
    (
        StatusCode::CREATED,
        Json(json!({"$id": body["userId"], "email": email, "name": body["name"], "status": true})),
    )
        .into_response()
}

async fn delete_user(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    record(&state, "DELETE", format!("/users/{id}"), &headers, Value::Null);
    StatusCode::NO_CONTENT
}

async fn create_recovery(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    record(&state, "POST", "/account/recovery".to_string(), &headers, body);
    if state.lock().unwrap().fail_recovery {
        return platform_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "general_smtp_disabled",
            "SMTP disabled",
        );
    }
    (StatusCode::CREATED, Json(json!({"$id": "token1"}))).into_response()
}

/// Start the fake platform, return (endpoint, state).
async fn start_fake_platform() -> (String, Shared) {
    let state: Shared = Arc::default();
    let app = Router::new()
        .route(
            "/v1/databases/{db}/collections/{coll}/documents",
            get(list_documents).post(create_document),
        )
        .route(
            "/v1/databases/{db}/collections/{coll}/documents/{id}",
            delete(delete_document),
        )
        .route("/v1/account", post(create_account))
        .route("/v1/account/recovery", post(create_recovery))
        .route("/v1/users/{id}", delete(delete_user))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://127.0.0.1:{port}/v1"), state)
}

fn config(endpoint: &str) -> OnboardConfig {
    OnboardConfig {
        endpoint: endpoint.to_string(),
        project_id: "proj-1".to_string(),
        api_key: SecretString::from("key-1"),
        database_id: "main".to_string(),
        staff_collection_id: "staff".to_string(),
        web_app_url: "https://staff.example.com/".to_string(),
        admin_team: "admin".to_string(),
    }
}

fn ann() -> OnboardRequest {
    OnboardRequest {
        email: Some("a@x.com".to_string()),
        first_name: Some("Ann".to_string()),
        last_name: Some("Lee".to_string()),
        employee_id: Some("E100".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn onboarding_over_rest_sends_expected_requests() {
    timeout(TEST_TIMEOUT, async {
        let (endpoint, state) = start_fake_platform().await;
        let cfg = config(&endpoint);
        let client: Arc<dyn Platform> = Arc::new(AppwriteClient::from_config(&cfg));
        let onboarder = Onboarder::new(client, Arc::new(cfg));

        let resp = onboarder.onboard(ann()).await.unwrap();

        let requests = state.lock().unwrap().requests.clone();
        let calls: Vec<(&str, &str)> = requests
            .iter()
            .map(|r| (r.method, r.path.as_str()))
            .collect();
        assert_eq!(
            calls,
            vec![
                ("GET", "/databases/main/collections/staff/documents"),
                ("POST", "/account"),
                ("POST", "/databases/main/collections/staff/documents"),
                ("POST", "/account/recovery"),
            ]
        );
        for r in &requests {
            assert_eq!(r.project.as_deref(), Some("proj-1"));
            assert_eq!(r.key.as_deref(), Some("key-1"));
        }

        assert_eq!(
            requests[0].body,
            json!([r#"{"method":"equal","attribute":"employeeId","values":["E100"]}"#])
        );

        let account = &requests[1].body;
        assert_eq!(account["userId"], resp.auth_user_id.as_str());
        assert_eq!(account["email"], "a@x.com");
        assert_eq!(account["name"], "Ann");
        assert_eq!(account["password"].as_str().unwrap().len(), 24);

        let document = &requests[2].body;
        assert_eq!(document["documentId"], resp.staff_doc_id.as_str());
        assert_eq!(document["data"]["userId"], resp.auth_user_id.as_str());
        assert_eq!(document["data"]["status"], "onboarding");
        assert!(document["data"]["departmentId"].is_null());
        assert_eq!(
            document["permissions"],
            json!([
                format!(r#"read("user:{}")"#, resp.auth_user_id),
                r#"read("team:admin")"#,
                r#"update("team:admin")"#,
                r#"delete("team:admin")"#,
            ])
        );

        assert_eq!(
            requests[3].body,
            json!({"email": "a@x.com", "url": "https://staff.example.com/reset-password"})
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn existing_employee_stops_after_lookup() {
    timeout(TEST_TIMEOUT, async {
        let (endpoint, state) = start_fake_platform().await;
        state
            .lock()
            .unwrap()
            .documents
            .push(json!({"$id": "doc0", "employeeId": "E100"}));

        let cfg = config(&endpoint);
        let onboarder = Onboarder::new(Arc::new(AppwriteClient::from_config(&cfg)), Arc::new(cfg));

        let err = onboarder.onboard(ann()).await.unwrap_err();
        assert!(matches!(err, OnboardingError::Conflict));
        assert_eq!(state.lock().unwrap().requests.len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn platform_error_body_is_decoded() {
    timeout(TEST_TIMEOUT, async {
        let (endpoint, state) = start_fake_platform().await;
        state.lock().unwrap().emails.push("a@x.com".to_string());

        let client = AppwriteClient::new(&endpoint, "proj-1", SecretString::from("key-1"));
        let err = client
            .create_account("u1", "a@x.com", "pw-pw-pw-pw", "Ann")
            .await
            .unwrap_err();

        match err {
            PlatformError::Api {
                status,
                kind,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(kind, "user_already_exists");
                assert_eq!(
                    message,
                    "A user with the same id, email, or phone already exists in this project."
                );
            }
            other => panic!("expected API error, got {other:?}"),
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn recovery_failure_deletes_profile_then_user() {
    timeout(TEST_TIMEOUT, async {
        let (endpoint, state) = start_fake_platform().await;
        state.lock().unwrap().fail_recovery = true;

        let cfg = config(&endpoint);
        let onboarder = Onboarder::new(Arc::new(AppwriteClient::from_config(&cfg)), Arc::new(cfg));

        let err = onboarder.onboard(ann()).await.unwrap_err();
        assert_eq!(err.to_string(), "SMTP disabled");

        let guard = state.lock().unwrap();
        let methods: Vec<&str> = guard.requests.iter().map(|r| r.method).collect();
        assert_eq!(methods, vec!["GET", "POST", "POST", "POST", "DELETE", "DELETE"]);
        assert!(guard.requests[4].path.starts_with("/databases/main/collections/staff/documents/"));
        assert!(guard.requests[5].path.starts_with("/users/"));
        assert!(guard.documents.is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn document_permissions_serialize_on_the_wire() {
    timeout(TEST_TIMEOUT, async {
        let (endpoint, _state) = start_fake_platform().await;
        let client = AppwriteClient::new(&endpoint, "proj-1", SecretString::from("key-1"));

        let doc = client
            .create_document(
                "main",
                "staff",
                "doc-9",
                json!({"employeeId": "E9"}),
                &[Permission::read(Role::team("admin"))],
            )
            .await
            .unwrap();
        assert_eq!(doc.id, "doc-9");
        assert_eq!(doc.permissions, vec![r#"read("team:admin")"#.to_string()]);
        assert_eq!(doc.data["employeeId"], "E9");

        client.delete_document("main", "staff", "doc-9").await.unwrap();
        let list = client
            .list_documents("main", "staff", &[Query::equal("employeeId", "E9")])
            .await
            .unwrap();
        assert_eq!(list.total, 0);
    })
    .await
    .expect("test timed out");
}

//! Black-box tests: a real axum server on an ephemeral port, exercised
//! through the real client, so credential decoration and the single-flight
//! refresh run over actual sockets.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use bluemine_auth::{Role, can_access};
use bluemine_client::{ApiClient, ApiError, AvatarUpload, ClientConfig, RegisterForm};
use bluemine_core::TaskId;
use bluemine_session::{SessionAuth, SessionStore};

const REFRESH_TOKEN: &str = "refresh-token";

#[derive(Clone)]
struct ApiState {
    refresh_calls: Arc<AtomicUsize>,
    refresh_ok: bool,
    /// The access token the server currently accepts; rotated on refresh.
    access_token: Arc<StdMutex<String>>,
    registration: Arc<StdMutex<Option<(String, String, bool)>>>,
}

impl ApiState {
    fn new(refresh_ok: bool) -> Self {
        Self {
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            refresh_ok,
            access_token: Arc::new(StdMutex::new("access-0".to_string())),
            registration: Arc::new(StdMutex::new(None)),
        }
    }

    fn current_token(&self) -> String {
        self.access_token.lock().unwrap().clone()
    }

    fn auth_payload(&self) -> Value {
        json!({
            "accessToken": self.current_token(),
            "refreshToken": REFRESH_TOKEN,
            "permissions": ["projects", "tasks"],
            "role": "manager",
            "user": {"name": "Gabriel"},
            "avatarUrl": "/uploads/gabriel.png"
        })
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn unauthorized() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "token expired"})),
    )
}

async fn login(State(state): State<ApiState>, Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"] == json!("secret") {
        (StatusCode::OK, Json(state.auth_payload())).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "invalid credentials"})),
        )
            .into_response()
    }
}

async fn refresh(State(state): State<ApiState>, headers: HeaderMap) -> impl IntoResponse {
    let calls = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;

    if bearer(&headers) != Some(REFRESH_TOKEN) || !state.refresh_ok {
        return unauthorized().into_response();
    }

    *state.access_token.lock().unwrap() = format!("access-{calls}");
    (StatusCode::OK, Json(state.auth_payload())).into_response()
}

async fn server_logout() -> impl IntoResponse {
    StatusCode::OK
}

async fn register(State(state): State<ApiState>, mut multipart: Multipart) -> impl IntoResponse {
    let mut name = None;
    let mut email = None;
    let mut has_avatar = false;

    while let Some(field) = multipart.next_field().await.unwrap() {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("name") => name = Some(field.text().await.unwrap()),
            Some("email") => email = Some(field.text().await.unwrap()),
            Some("avatar") => has_avatar = !field.bytes().await.unwrap().is_empty(),
            _ => {}
        }
    }

    *state.registration.lock().unwrap() =
        Some((name.unwrap_or_default(), email.unwrap_or_default(), has_avatar));
    StatusCode::CREATED
}

async fn list_tasks(State(state): State<ApiState>, headers: HeaderMap) -> impl IntoResponse {
    if bearer(&headers) != Some(state.current_token().as_str()) {
        return unauthorized().into_response();
    }
    (
        StatusCode::OK,
        Json(json!([
            {"id": 1, "title": "Fix login", "status": "todo"}
        ])),
    )
        .into_response()
}

async fn create_task() -> impl IntoResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"errors": ["title is required", "projectId is invalid"]})),
    )
}

async fn patch_status(
    State(state): State<ApiState>,
    Path(_id): Path<i64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if bearer(&headers) != Some(state.current_token().as_str()) {
        return unauthorized().into_response();
    }
    (StatusCode::OK, Json(json!({"ok": true}))).into_response()
}

struct TestServer {
    base_url: String,
    state: ApiState,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(refresh_ok: bool) -> Self {
        let state = ApiState::new(refresh_ok);

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh))
            .route("/auth/logout", post(server_logout))
            .route("/auth/register", post(register))
            .route("/task", get(list_tasks).post(create_task))
            .route("/task/:id/status", patch(patch_status))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    fn connect(&self) -> (Arc<SessionStore>, Arc<ApiClient>) {
        let session = Arc::new(SessionStore::in_memory());
        let client = ApiClient::new(ClientConfig::new(self.base_url.clone()), Arc::clone(&session))
            .expect("failed to build client");
        (session, Arc::new(client))
    }

    fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Seed the session with an access token the server no longer accepts.
async fn seed_stale_session(session: &SessionStore) {
    session
        .set_auth(SessionAuth {
            access_token: "stale-token".to_string(),
            refresh_token: REFRESH_TOKEN.to_string(),
            role: Some(Role::new("manager")),
            permissions: vec![],
            user: None,
        })
        .await;
}

#[tokio::test]
async fn login_populates_session_and_access_resolver_agrees() {
    let srv = TestServer::spawn(true).await;
    let (session, client) = srv.connect();

    client.login("gabriel@example.com", "secret").await.unwrap();

    assert!(session.is_authenticated().await);
    let role = session.role().await.unwrap();
    assert_eq!(role, Role::new("manager"));

    // The configured table entry for "projects" admits managers; "users" does not.
    assert!(can_access(Some(&role), "projects"));
    assert!(!can_access(Some(&role), "users"));

    let user = session.user().await.unwrap();
    assert_eq!(user.name.as_deref(), Some("Gabriel"));
    assert_eq!(user.avatar_url.as_deref(), Some("/uploads/gabriel.png"));
}

#[tokio::test]
async fn login_failure_surfaces_server_message() {
    let srv = TestServer::spawn(true).await;
    let (session, client) = srv.connect();

    let err = client
        .login("gabriel@example.com", "wrong")
        .await
        .unwrap_err();

    match err {
        ApiError::Http { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid credentials");
        }
        other => panic!("expected Http error, got {other:?}"),
    }

    // A failed login must not trigger the refresh protocol.
    assert_eq!(srv.refresh_calls(), 0);
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn concurrent_401s_issue_exactly_one_refresh() {
    let srv = TestServer::spawn(true).await;
    let (session, client) = srv.connect();
    seed_stale_session(&session).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(
            async move { client.tasks().list().await },
        ));
    }

    for handle in handles {
        let tasks = handle.await.unwrap().expect("request should recover");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, TaskId::new(1));
    }

    assert_eq!(srv.refresh_calls(), 1);
    assert_eq!(
        session.bearer_token().await.as_deref(),
        Some("access-1"),
        "session should hold the rotated token"
    );
}

#[tokio::test]
async fn refresh_failure_terminates_the_session_and_rejects_everyone() {
    let srv = TestServer::spawn(false).await;
    let (session, client) = srv.connect();
    seed_stale_session(&session).await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(
            async move { client.tasks().list().await },
        ));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(
            matches!(result, Err(ApiError::SessionExpired)),
            "every queued request must reject: {result:?}"
        );
    }

    assert_eq!(srv.refresh_calls(), 1);

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.access_token, None);
    assert_eq!(snapshot.refresh_token, None);
    assert_eq!(snapshot.role, None);
    assert!(snapshot.permissions.is_empty());
    assert_eq!(snapshot.user, None);
}

#[tokio::test]
async fn unauthenticated_session_fails_fast_without_refresh() {
    let srv = TestServer::spawn(true).await;
    let (_session, client) = srv.connect();

    let err = client.tasks().list().await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(srv.refresh_calls(), 0, "no refresh token, no refresh call");
}

#[tokio::test]
async fn validation_errors_pass_through_with_extracted_message() {
    let srv = TestServer::spawn(true).await;
    let (session, client) = srv.connect();

    client.login("gabriel@example.com", "secret").await.unwrap();
    assert!(session.is_authenticated().await);

    let err = client
        .tasks()
        .create(&Default::default())
        .await
        .unwrap_err();

    match err {
        ApiError::Http { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "title is required; projectId is invalid");
        }
        other => panic!("expected Http error, got {other:?}"),
    }

    assert_eq!(srv.refresh_calls(), 0, "non-401 errors never trigger refresh");
}

#[tokio::test]
async fn successful_status_patch_after_recovery() {
    let srv = TestServer::spawn(true).await;
    let (session, client) = srv.connect();
    seed_stale_session(&session).await;

    client
        .tasks()
        .set_status(TaskId::new(1), bluemine_core::TaskStatus::Done)
        .await
        .unwrap();

    assert_eq!(srv.refresh_calls(), 1);
}

#[tokio::test]
async fn logout_clears_the_session_locally() {
    let srv = TestServer::spawn(true).await;
    let (session, client) = srv.connect();

    client.login("gabriel@example.com", "secret").await.unwrap();
    client.logout().await;

    assert!(!session.is_authenticated().await);
    assert_eq!(session.bearer_token().await, None);
}

#[tokio::test]
async fn register_sends_multipart_with_avatar() {
    let srv = TestServer::spawn(true).await;
    let (_session, client) = srv.connect();

    client
        .register(RegisterForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            avatar: Some(AvatarUpload {
                file_name: "ada.png".to_string(),
                bytes: vec![0x89, 0x50, 0x4e, 0x47],
            }),
        })
        .await
        .unwrap();

    let received = srv.state.registration.lock().unwrap().clone().unwrap();
    assert_eq!(received.0, "Ada");
    assert_eq!(received.1, "ada@example.com");
    assert!(received.2, "avatar bytes should arrive");
}

#[tokio::test]
async fn network_errors_pass_through_unmodified() {
    // Nothing listens here; the connection itself fails.
    let session = Arc::new(SessionStore::in_memory());
    let client = ApiClient::new(
        ClientConfig::new("http://127.0.0.1:1"),
        Arc::clone(&session),
    )
    .unwrap();

    seed_stale_session(&session).await;

    let err = client.tasks().list().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    // The session survives a transport failure untouched.
    assert!(session.is_authenticated().await);
}

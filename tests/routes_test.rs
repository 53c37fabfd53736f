//! Router-level tests running the app in local-only mode (no database) with
//! a mock speech backend.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

use audio_scribe::db::UserRecord;
use audio_scribe::serve::{build_router, AppState};
use audio_scribe::session::SessionStore;
use audio_scribe::speech::SpeechService;
use chrono::Utc;
use uuid::Uuid;

type DynError = Box<dyn std::error::Error + Send + Sync>;

const AUDIO_BYTES: &[u8] = b"RIFF....WAVEfmt fake-audio-payload";
const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Records what the handler passed in and returns canned results
struct MockSpeech {
    received: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockSpeech {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
        })
    }

    fn received(&self) -> Vec<(String, Vec<u8>)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechService for MockSpeech {
    async fn transcribe(&self, audio_path: &Path, filename: &str) -> Result<String, DynError> {
        let bytes = tokio::fs::read(audio_path).await?;
        self.received
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes));
        Ok("mock transcript".to_string())
    }

    async fn summarize(&self, transcript: &str) -> Result<String, DynError> {
        Ok(format!("MOCK SUMMARY OF: {}", transcript))
    }
}

fn local_state(speech: Arc<MockSpeech>, uploads_dir: PathBuf) -> Arc<AppState> {
    Arc::new(AppState {
        db: None,
        sessions: SessionStore::new(),
        speech,
        uploads_dir,
        free_trial_limit: 1,
    })
}

fn test_app(speech: Arc<MockSpeech>) -> (axum::Router, TempDir) {
    let uploads = TempDir::new().unwrap();
    let app = build_router(local_state(speech, uploads.path().to_path_buf()));
    (app, uploads)
}

/// A pool that never actually connects. Good enough for routes whose
/// behavior under test is decided before any query runs; queries against it
/// fail, which the handlers treat as database errors.
fn unreachable_pool() -> sqlx::PgPool {
    sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://app@127.0.0.1:1/unreachable")
        .unwrap()
}

fn user_with_usage(usage_count: i64, is_admin: bool) -> UserRecord {
    UserRecord {
        id: Uuid::new_v4(),
        name: "Alex".to_string(),
        email: "alex@example.com".to_string(),
        created_at: Utc::now(),
        usage_count,
        is_admin,
    }
}

/// App with persistence "enabled" (lazy pool) and one logged-in session;
/// returns the session cookie to send with requests.
fn persistent_app(
    speech: Arc<MockSpeech>,
    user: &UserRecord,
) -> (axum::Router, TempDir, String) {
    let uploads = TempDir::new().unwrap();
    let sessions = SessionStore::new();
    let token = sessions.create(user);
    let state = Arc::new(AppState {
        db: Some(unreachable_pool()),
        sessions,
        speech,
        uploads_dir: uploads.path().to_path_buf(),
        free_trial_limit: 1,
    });
    let cookie = format!("session_id={}", token);
    (build_router(state), uploads, cookie)
}

/// Assemble a multipart/form-data body by hand. Each entry is
/// (field name, optional filename, content bytes).
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/file_upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn multipart_request_with_cookie(
    parts: &[(&str, Option<&str>, &[u8])],
    cookie: &str,
) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/file_upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn index_renders() {
    let (app, _uploads) = test_app(MockSpeech::new());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Audio Scribe"));
}

#[tokio::test]
async fn health_reports_local_mode() {
    let (app, _uploads) = test_app(MockSpeech::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("\"persistence_available\":false"));
}

#[tokio::test]
async fn workshop_is_open_without_login_in_local_mode() {
    let (app, _uploads) = test_app(MockSpeech::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/workshop")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn dashboard_redirects_anonymous_users_to_login() {
    let (app, _uploads) = test_app(MockSpeech::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/login"
    );
}

#[tokio::test]
async fn upload_via_file_field_is_transcribed_and_summarized() {
    let mock = MockSpeech::new();
    let (app, uploads) = test_app(mock.clone());

    let response = app
        .oneshot(multipart_request(&[(
            "file",
            Some("meeting.mp3"),
            AUDIO_BYTES,
        )]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    // The summary is markdown rendered to HTML, so it arrives wrapped in
    // block elements rather than as literal text
    assert!(body.contains("<p>MOCK SUMMARY OF: mock transcript</p>"));
    assert!(body.contains("mock transcript"));

    let received = mock.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, "meeting.mp3");
    assert_eq!(received[0].1, AUDIO_BYTES);

    // The staged temp file must be gone after the request
    assert_eq!(std::fs::read_dir(uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn upload_via_browser_recording_matches_file_upload() {
    let mock = MockSpeech::new();
    let (app, _uploads) = test_app(mock.clone());

    let encoded = {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(AUDIO_BYTES)
    };

    let response = app
        .oneshot(multipart_request(&[(
            "recorded_audio",
            None,
            encoded.as_bytes(),
        )]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let received = mock.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, "browser-recording.wav");
    assert_eq!(received[0].1, AUDIO_BYTES);
}

#[tokio::test]
async fn upload_without_audio_redirects_back_to_workshop() {
    let mock = MockSpeech::new();
    let (app, _uploads) = test_app(mock.clone());

    let response = app
        .oneshot(multipart_request(&[("unrelated", None, b"ignored")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/workshop"
    );
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("flash="));
    assert!(cookie.contains("danger"));

    assert!(mock.received().is_empty());
}

#[tokio::test]
async fn register_in_local_mode_reports_database_unavailable() {
    let (app, _uploads) = test_app(MockSpeech::new());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "name=Alex&email=alex%40example.com&password=secret",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/register"
    );
}

#[tokio::test]
async fn upload_requires_login_when_persistence_is_on() {
    let mock = MockSpeech::new();
    let user = user_with_usage(0, false);
    let (app, _uploads, _cookie) = persistent_app(mock.clone(), &user);

    // No session cookie on the request
    let response = app
        .oneshot(multipart_request(&[(
            "file",
            Some("meeting.mp3"),
            AUDIO_BYTES,
        )]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    assert!(mock.received().is_empty());
}

#[tokio::test]
async fn quota_blocked_upload_redirects_to_pricing_without_processing() {
    let mock = MockSpeech::new();
    let user = user_with_usage(1, false);
    let (app, uploads, cookie) = persistent_app(mock.clone(), &user);

    let response = app
        .oneshot(multipart_request_with_cookie(
            &[("file", Some("meeting.mp3"), AUDIO_BYTES)],
            &cookie,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/pricing"
    );
    // The speech backend must never be invoked and nothing may be staged
    assert!(mock.received().is_empty());
    assert_eq!(std::fs::read_dir(uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn admin_upload_is_processed_regardless_of_usage() {
    let mock = MockSpeech::new();
    let user = user_with_usage(5, true);
    let (app, _uploads, cookie) = persistent_app(mock.clone(), &user);

    let response = app
        .oneshot(multipart_request_with_cookie(
            &[("file", Some("meeting.mp3"), AUDIO_BYTES)],
            &cookie,
        ))
        .await
        .unwrap();

    // History saving fails against the unreachable pool but that is
    // non-fatal; the admin still gets their summary
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("MOCK SUMMARY OF: mock transcript"));
    assert_eq!(mock.received().len(), 1);
}

#[tokio::test]
async fn transcription_view_denies_with_redirect_to_dashboard() {
    let mock = MockSpeech::new();
    let user = user_with_usage(0, false);
    let (app, _uploads, cookie) = persistent_app(mock, &user);

    // A malformed id and an id whose lookup fails both end at the dashboard
    // with a notice, never at someone else's content
    for id in ["not-a-number", "123"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/transcription/{}", id))
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/dashboard"
        );
    }
}

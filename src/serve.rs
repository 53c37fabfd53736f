use axum::{
    extract::{DefaultBodyLimit, Form, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPool;
use std::path::PathBuf;
use std::sync::Arc as StdArc;
use tower_http::limit::RequestBodyLimitLayer;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::constants::MAX_UPLOAD_BYTES;
use crate::credentials;
use crate::db;
use crate::flash::{self, Level};
use crate::pages;
use crate::quota::is_quota_blocked;
use crate::session::{self, Session, SessionStore};
use crate::speech::{GroqClient, SpeechService};
use crate::upload::{TempAudioFile, UploadFields};

type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Shared state for all route handlers.
///
/// `db` is the process-wide persistence capability determined once at
/// startup: None means the probe failed and the app runs in local-only mode
/// with authentication gating and history saving disabled.
pub struct AppState {
    pub db: Option<PgPool>,
    pub sessions: SessionStore,
    pub speech: StdArc<dyn SpeechService>,
    pub uploads_dir: PathBuf,
    pub free_trial_limit: i64,
}

/// Run the web application
pub fn run(config: AppConfig) -> Result<(), DynError> {
    config.validate().map_err(DynError::from)?;

    let credentials = credentials::load_credentials()?;
    let api_key = credentials::resolve_groq_api_key(
        &credentials,
        config.speech.credential_profile.as_deref(),
    )
    .map_err(DynError::from)?;

    let speech: StdArc<dyn SpeechService> = StdArc::new(GroqClient::new(
        api_key,
        config.speech.transcription_model.clone(),
        config.speech.summary_model.clone(),
    )?);

    std::fs::create_dir_all(&config.uploads_dir).map_err(|e| {
        format!(
            "Failed to create uploads directory '{}': {}",
            config.uploads_dir.display(),
            e
        )
    })?;

    // Create tokio runtime and run server
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let db = connect_database(&config, &credentials).await;

        println!("Starting audio_scribe");
        if db.is_some() {
            println!("Persistence: ENABLED (accounts and history active)");
        } else {
            println!("Persistence: DISABLED (local-only mode, no authentication or history saving)");
        }
        println!("Listening on: http://[::]:{} (IPv4 + IPv6)", config.port);
        println!("Endpoints:");
        println!("  GET  /           - Landing page");
        println!("  GET  /workshop   - Upload/record audio");
        println!("  POST /file_upload - Transcribe and summarize");
        println!("  GET  /dashboard  - Saved transcriptions");
        println!("  GET  /health     - Health check");

        let state = StdArc::new(AppState {
            db,
            sessions: SessionStore::new(),
            speech,
            uploads_dir: config.uploads_dir.clone(),
            free_trial_limit: config.free_trial_limit,
        });

        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind(format!("[::]:{}", config.port))
            .await
            .map_err(|e| format!("Failed to bind to port {}: {}", config.port, e))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        Ok::<(), DynError>(())
    })
}

/// One-time startup determination of the persistence capability.
/// Any failure (missing config, connect, probe, schema) degrades to
/// local-only mode rather than aborting.
async fn connect_database(
    config: &AppConfig,
    credentials: &Option<credentials::Credentials>,
) -> Option<PgPool> {
    let pg = config.postgres.as_ref()?;

    let password = match credentials::resolve_postgres_password(
        credentials,
        pg.credential_profile.as_deref(),
    ) {
        Ok(password) => password,
        Err(e) => {
            warn!("Database not available: {}", e);
            warn!("Running in local-only mode (no authentication or history saving)");
            return None;
        }
    };

    let pool = match db::open_pool(&pg.base_url, &password, &pg.database).await {
        Ok(pool) => pool,
        Err(e) => {
            warn!("Database not available: {}", e);
            warn!("Running in local-only mode (no authentication or history saving)");
            return None;
        }
    };

    if let Err(e) = db::probe(&pool).await {
        warn!("Database probe failed: {}", e);
        warn!("Running in local-only mode (no authentication or history saving)");
        return None;
    }

    if let Err(e) = db::init_schema(&pool).await {
        warn!("Database schema setup failed: {}", e);
        warn!("Running in local-only mode (no authentication or history saving)");
        return None;
    }

    Some(pool)
}

/// Build the application router
pub fn build_router(state: StdArc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/pricing", get(pricing_handler))
        .route(
            "/register",
            get(register_form_handler).post(register_submit_handler),
        )
        .route("/login", get(login_form_handler).post(login_submit_handler))
        .route("/logout", get(logout_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/workshop", get(workshop_handler))
        .route("/file_upload", post(file_upload_handler))
        .route("/transcription/{id}", get(view_transcription_handler))
        .route("/profile", get(profile_handler))
        .route("/update_profile", post(update_profile_handler))
        .route("/admin", get(admin_panel_handler))
        .route("/admin/toggle_admin/{user_id}", post(toggle_admin_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .with_state(state)
}

// ============================================================================
// Response helpers
// ============================================================================

fn redirect(path: &str) -> Response {
    let mut resp = StatusCode::SEE_OTHER.into_response();
    if let Ok(value) = HeaderValue::from_str(path) {
        resp.headers_mut().insert(header::LOCATION, value);
    }
    resp
}

fn redirect_with_flash(path: &str, level: Level, message: &str) -> Response {
    let mut resp = redirect(path);
    if let Ok(value) = HeaderValue::from_str(&flash::set_cookie(level, message)) {
        resp.headers_mut().append(header::SET_COOKIE, value);
    }
    resp
}

/// Render a page; when a flash notice was consumed, clear its cookie in the
/// same response.
fn page_response(html: String, clear_flash: bool) -> Response {
    let mut resp = Html(html).into_response();
    if clear_flash {
        if let Ok(value) = HeaderValue::from_str(&flash::clear_cookie()) {
            resp.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    resp
}

// ============================================================================
// Access guard
// ============================================================================

fn current_session(state: &AppState, headers: &HeaderMap) -> Option<(String, Session)> {
    let token = session::token_from_headers(headers)?;
    let session = state.sessions.get(&token)?;
    Some((token, session))
}

/// Protected routes call this first: unauthenticated callers are redirected
/// to the login page with a warning notice.
fn require_login(state: &AppState, headers: &HeaderMap) -> Result<(String, Session), Response> {
    current_session(state, headers).ok_or_else(|| {
        redirect_with_flash(
            "/login",
            Level::Warning,
            "Please log in to access this page",
        )
    })
}

/// Admin-only routes additionally check the session's admin flag
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(String, Session), Response> {
    let (token, session) = require_login(state, headers)?;
    if !session.is_admin {
        return Err(redirect_with_flash(
            "/dashboard",
            Level::Danger,
            "Access denied. Admin privileges required.",
        ));
    }
    Ok((token, session))
}

// ============================================================================
// Public pages
// ============================================================================

async fn index_handler(State(state): State<StdArc<AppState>>, headers: HeaderMap) -> Response {
    let flash = flash::from_headers(&headers);
    let session = current_session(&state, &headers).map(|(_, s)| s);
    page_response(
        pages::index(flash.as_ref(), session.as_ref()),
        flash.is_some(),
    )
}

async fn pricing_handler(State(state): State<StdArc<AppState>>, headers: HeaderMap) -> Response {
    let flash = flash::from_headers(&headers);
    let session = current_session(&state, &headers).map(|(_, s)| s);
    page_response(
        pages::pricing(flash.as_ref(), session.as_ref()),
        flash.is_some(),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    persistence_available: bool,
}

async fn health_handler(State(state): State<StdArc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&HealthResponse {
            status: "ok".to_string(),
            persistence_available: state.db.is_some(),
        })
        .unwrap_or_default(),
    )
}

// ============================================================================
// Registration and login
// ============================================================================

#[derive(Deserialize)]
struct RegisterForm {
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

async fn register_form_handler(headers: HeaderMap) -> Response {
    let flash = flash::from_headers(&headers);
    page_response(pages::register(flash.as_ref()), flash.is_some())
}

async fn register_submit_handler(
    State(state): State<StdArc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let pool = match &state.db {
        Some(pool) => pool,
        None => {
            return redirect_with_flash(
                "/register",
                Level::Danger,
                "Registration failed: the database is not available",
            )
        }
    };

    match db::register_user(pool, &form.name, &form.email, &form.password).await {
        Ok(_) => redirect_with_flash(
            "/login",
            Level::Success,
            "Registration successful! Please log in.",
        ),
        Err(e) => {
            error!("Registration failed for '{}': {}", form.email, e);
            redirect_with_flash(
                "/register",
                Level::Danger,
                &format!("Registration failed: {}", e),
            )
        }
    }
}

async fn login_form_handler(headers: HeaderMap) -> Response {
    let flash = flash::from_headers(&headers);
    page_response(pages::login(flash.as_ref()), flash.is_some())
}

async fn login_submit_handler(
    State(state): State<StdArc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let pool = match &state.db {
        Some(pool) => pool,
        None => {
            return redirect_with_flash(
                "/login",
                Level::Danger,
                "Login failed: the database is not available",
            )
        }
    };

    match db::authenticate_user(pool, &form.email, &form.password).await {
        Ok(Some(user)) => {
            let token = state.sessions.create(&user);
            let mut resp = redirect_with_flash("/dashboard", Level::Success, "Login successful!");
            if let Ok(value) = HeaderValue::from_str(&session::set_cookie(&token)) {
                resp.headers_mut().append(header::SET_COOKIE, value);
            }
            resp
        }
        Ok(None) => redirect_with_flash(
            "/login",
            Level::Danger,
            "Login failed: invalid email or password",
        ),
        Err(e) => {
            error!("Login failed for '{}': {}", form.email, e);
            redirect_with_flash("/login", Level::Danger, &format!("Login failed: {}", e))
        }
    }
}

async fn logout_handler(State(state): State<StdArc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session::token_from_headers(&headers) {
        state.sessions.destroy(&token);
    }
    let mut resp = redirect_with_flash("/", Level::Info, "You have been logged out");
    if let Ok(value) = HeaderValue::from_str(&session::clear_cookie()) {
        resp.headers_mut().append(header::SET_COOKIE, value);
    }
    resp
}

// ============================================================================
// Dashboard and saved transcriptions
// ============================================================================

async fn dashboard_handler(State(state): State<StdArc<AppState>>, headers: HeaderMap) -> Response {
    let (_, session) = match require_login(&state, &headers) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let flash = flash::from_headers(&headers);

    let transcriptions = match &state.db {
        Some(pool) => match db::list_transcriptions(pool, session.user_id).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(
                    "Failed to list transcriptions for user {}: {}",
                    session.user_id, e
                );
                // Render an empty dashboard with an inline notice rather
                // than failing the whole page
                let notice = flash::Flash {
                    level: Level::Danger,
                    message: format!("Error retrieving your transcriptions: {}", e),
                };
                return page_response(
                    pages::dashboard(Some(&notice), &session, &[]),
                    flash.is_some(),
                );
            }
        },
        None => Vec::new(),
    };

    page_response(
        pages::dashboard(flash.as_ref(), &session, &transcriptions),
        flash.is_some(),
    )
}

async fn view_transcription_handler(
    State(state): State<StdArc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let (_, session) = match require_login(&state, &headers) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let pool = match &state.db {
        Some(pool) => pool,
        None => return redirect("/dashboard"),
    };

    let id: i64 = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return redirect_with_flash(
                "/dashboard",
                Level::Danger,
                "Transcription not found or access denied",
            )
        }
    };

    // The query filters by owner: someone else's transcription looks exactly
    // like a missing one.
    match db::get_transcription_for_user(pool, id, session.user_id).await {
        Ok(Some(t)) => {
            let flash = flash::from_headers(&headers);
            page_response(
                pages::result(
                    flash.as_ref(),
                    Some(&session),
                    &t.summary,
                    &t.raw_transcription,
                ),
                flash.is_some(),
            )
        }
        Ok(None) => redirect_with_flash(
            "/dashboard",
            Level::Danger,
            "Transcription not found or access denied",
        ),
        Err(e) => {
            error!("Failed to fetch transcription {}: {}", id, e);
            redirect_with_flash(
                "/dashboard",
                Level::Danger,
                &format!("Error retrieving transcription: {}", e),
            )
        }
    }
}

// ============================================================================
// Workshop and upload processing
// ============================================================================

async fn workshop_handler(State(state): State<StdArc<AppState>>, headers: HeaderMap) -> Response {
    // Only require login if persistence is available; in local-only mode the
    // workshop is open and stateless.
    let session = if state.db.is_some() {
        match require_login(&state, &headers) {
            Ok((_, session)) => Some(session),
            Err(resp) => return resp,
        }
    } else {
        None
    };

    let flash = flash::from_headers(&headers);
    page_response(
        pages::workshop(flash.as_ref(), session.as_ref()),
        flash.is_some(),
    )
}

async fn file_upload_handler(
    State(state): State<StdArc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    // Auth gate applies only when persistence is available
    let session = if state.db.is_some() {
        match require_login(&state, &headers) {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        }
    } else {
        None
    };

    // Quota check before any processing
    if let Some((_, session)) = &session {
        if is_quota_blocked(session.usage_count, state.free_trial_limit, session.is_admin) {
            return redirect_with_flash(
                "/pricing",
                Level::Warning,
                "You have used your free trial. Please upgrade to continue.",
            );
        }
    }

    let fields = match UploadFields::collect(&mut multipart).await {
        Ok(fields) => fields,
        Err(e) => {
            error!("Failed to read upload form: {}", e);
            return redirect_with_flash(
                "/workshop",
                Level::Danger,
                &format!("Error processing file: {}", e),
            );
        }
    };

    let input = match fields.into_audio_input() {
        Ok(Some(input)) => input,
        Ok(None) => {
            return redirect_with_flash("/workshop", Level::Danger, "No audio data provided")
        }
        Err(e) => {
            error!("Invalid upload input: {}", e);
            return redirect_with_flash(
                "/workshop",
                Level::Danger,
                &format!("Error processing file: {}", e),
            );
        }
    };

    let mut temp = match TempAudioFile::create(&state.uploads_dir, &input.filename, &input.content)
    {
        Ok(temp) => temp,
        Err(e) => {
            error!("Failed to stage upload: {}", e);
            return redirect_with_flash(
                "/workshop",
                Level::Danger,
                &format!("Error processing file: {}", e),
            );
        }
    };

    let transcription = state.speech.transcribe(temp.path(), &input.filename).await;
    // Clean up the temp file whether or not transcription succeeded
    temp.remove();

    let raw_transcription = match transcription {
        Ok(text) => text,
        Err(e) => {
            error!("Transcription failed for '{}': {}", input.filename, e);
            return redirect_with_flash(
                "/workshop",
                Level::Danger,
                &format!("Error processing file: {}", e),
            );
        }
    };

    let summary = match state.speech.summarize(&raw_transcription).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Summarization failed for '{}': {}", input.filename, e);
            return redirect_with_flash(
                "/workshop",
                Level::Danger,
                &format!("Error processing file: {}", e),
            );
        }
    };

    // Best-effort persistence: the user gets their summary even if saving
    // history or bumping the usage counter fails.
    if let (Some(pool), Some((token, session))) = (&state.db, &session) {
        if let Err(e) = db::insert_transcription(
            pool,
            session.user_id,
            &input.filename,
            &raw_transcription,
            &summary,
        )
        .await
        {
            warn!("Could not save transcription to database: {}", e);
        }

        if !session.is_admin {
            match db::increment_usage_count(pool, session.user_id).await {
                Ok(new_count) => {
                    state
                        .sessions
                        .update(token, |s| s.usage_count = new_count);
                }
                Err(e) => {
                    warn!("Could not update usage count: {}", e);
                }
            }
        }
    }

    let session = session.map(|(_, s)| s);
    page_response(
        pages::result(None, session.as_ref(), &summary, &raw_transcription),
        false,
    )
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Deserialize)]
struct UpdateProfileForm {
    name: String,
}

async fn profile_handler(State(state): State<StdArc<AppState>>, headers: HeaderMap) -> Response {
    let (_, session) = match require_login(&state, &headers) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let flash = flash::from_headers(&headers);
    page_response(pages::profile(flash.as_ref(), &session), flash.is_some())
}

async fn update_profile_handler(
    State(state): State<StdArc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<UpdateProfileForm>,
) -> Response {
    let (token, session) = match require_login(&state, &headers) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let pool = match &state.db {
        Some(pool) => pool,
        None => return redirect("/profile"),
    };

    match db::update_user_name(pool, session.user_id, &form.name).await {
        Ok(()) => {
            state.sessions.update(&token, |s| s.name = form.name.clone());
            redirect_with_flash("/profile", Level::Success, "Profile updated successfully")
        }
        Err(e) => {
            error!("Failed to update profile for {}: {}", session.user_id, e);
            redirect_with_flash(
                "/profile",
                Level::Danger,
                &format!("Error updating profile: {}", e),
            )
        }
    }
}

// ============================================================================
// Admin panel
// ============================================================================

async fn admin_panel_handler(State(state): State<StdArc<AppState>>, headers: HeaderMap) -> Response {
    let (_, session) = match require_admin(&state, &headers) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let flash = flash::from_headers(&headers);

    let pool = match &state.db {
        Some(pool) => pool,
        None => return redirect("/dashboard"),
    };

    match db::list_users(pool).await {
        Ok(users) => page_response(
            pages::admin(flash.as_ref(), &session, &users),
            flash.is_some(),
        ),
        Err(e) => {
            error!("Failed to list users: {}", e);
            let notice = flash::Flash {
                level: Level::Danger,
                message: format!("Error retrieving user data: {}", e),
            };
            page_response(pages::admin(Some(&notice), &session, &[]), flash.is_some())
        }
    }
}

async fn toggle_admin_handler(
    State(state): State<StdArc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    let (token, session) = match require_admin(&state, &headers) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let pool = match &state.db {
        Some(pool) => pool,
        None => return redirect("/dashboard"),
    };

    let target_id = match Uuid::parse_str(&user_id) {
        Ok(id) => id,
        Err(_) => return redirect_with_flash("/admin", Level::Danger, "User not found"),
    };

    let current_status = match db::get_admin_status(pool, target_id).await {
        Ok(Some(status)) => status,
        Ok(None) => return redirect_with_flash("/admin", Level::Danger, "User not found"),
        Err(e) => {
            error!("Failed to read admin status for {}: {}", target_id, e);
            return redirect_with_flash(
                "/admin",
                Level::Danger,
                &format!("Error updating admin status: {}", e),
            );
        }
    };

    let new_status = !current_status;
    if let Err(e) = db::set_admin_status(pool, target_id, new_status).await {
        error!("Failed to update admin status for {}: {}", target_id, e);
        return redirect_with_flash(
            "/admin",
            Level::Danger,
            &format!("Error updating admin status: {}", e),
        );
    }

    // A sole admin demoting themselves is allowed: mirrors the policy of
    // having no self-lockout guard.
    if target_id == session.user_id {
        state.sessions.update(&token, |s| s.is_admin = new_status);
    }

    let message = if new_status {
        "Admin status updated successfully. User is now an admin."
    } else {
        "Admin status updated successfully. User is no longer an admin."
    };
    redirect_with_flash("/admin", Level::Success, message)
}

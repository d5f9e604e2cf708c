use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::validate_jwt;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ClientHandle};
use crate::session::{Session, SessionUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session: Session,
    pub history: Vec<String>,
}

/// GET /login - the login page; signed-in users go straight to the landing page
pub async fn login_page(
    State(app): State<AppState>,
    Extension(client): Extension<ClientHandle>,
    uri: Uri,
) -> Response {
    let mut state = client.state.lock().await;
    state.history.record(uri.path());

    let session = state.session.session();
    if session.is_authenticated && session.role().is_some() {
        let landing = app.guard.routes().default_path.clone();
        return (StatusCode::SEE_OTHER, [(header::LOCATION, landing)]).into_response();
    }

    ApiResponse::success(json!({
        "page": "login",
        "title": "Iniciar sesión",
        "hydrated": session.has_hydrated,
    }))
    .into_response()
}

/// POST /auth/login - accept a token issued by the backend and open the session
pub async fn session_login(
    State(app): State<AppState>,
    Extension(client): Extension<ClientHandle>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<SessionUser> {
    let token = payload.token.trim();
    if token.is_empty() {
        return Err(ApiError::bad_request("token is required"));
    }

    let claims = validate_jwt(token, &app.settings.jwt_secret)?;
    let user = SessionUser::from(claims);

    let mut state = client.state.lock().await;
    state.session.login(user.clone(), token.to_string()).await?;
    tracing::info!("Client {} logged in as {} ({:?})", client.id, user.name, user.role);

    Ok(ApiResponse::success(user))
}

/// POST /auth/logout - close the session and drop persisted state
pub async fn session_logout(Extension(client): Extension<ClientHandle>) -> ApiResult<Value> {
    let mut state = client.state.lock().await;
    state.session.logout().await?;

    Ok(ApiResponse::success(json!({ "logged_out": true })))
}

/// GET /auth/session - current session and navigation trail
pub async fn session_show(Extension(client): Extension<ClientHandle>) -> ApiResult<SessionView> {
    let state = client.state.lock().await;

    Ok(ApiResponse::success(SessionView {
        session: state.session.session().clone(),
        history: state.history.entries().map(str::to_string).collect(),
    }))
}

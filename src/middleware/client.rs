use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::validate_jwt;
use crate::state::{AppState, SharedClient};

/// Per-request handle to the caller's client state, injected by the middleware
#[derive(Clone)]
pub struct ClientHandle {
    pub id: String,
    pub state: SharedClient,
}

/// Identifies the browser by cookie, hydrates its session and expires stale tokens
pub async fn client_session_middleware(
    State(app): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = app.settings.cookie_name.as_str();
    let existing = client_id_from_cookies(&headers, cookie_name);
    let is_new = existing.is_none();
    let client_id = existing.unwrap_or_else(|| Uuid::new_v4().to_string());

    let client = app.client(&client_id).await;
    {
        let mut state = client.lock().await;

        if !state.session.session().has_hydrated {
            // On failure the session stays un-hydrated and guarded pages answer Pending
            if let Err(e) = state.session.hydrate().await {
                tracing::warn!("Client {} session not restored: {}", client_id, e);
            }
        }

        let expired = state.session.session().is_authenticated
            && state
                .session
                .token()
                .map_or(true, |token| validate_jwt(token, &app.settings.jwt_secret).is_err());

        if expired {
            tracing::info!("Client {} token no longer valid, logging out", client_id);
            if let Err(e) = state.session.logout().await {
                tracing::warn!("Failed to clear expired session for {}: {}", client_id, e);
            }
        }
    }

    request.extensions_mut().insert(ClientHandle {
        id: client_id.clone(),
        state: client,
    });

    let mut response = next.run(request).await;

    if is_new {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", cookie_name, client_id);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Failed to build session cookie: {}", e),
        }
    }

    response
}

/// Client id from the Cookie header; only well-formed UUIDs are accepted
fn client_id_from_cookies(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}

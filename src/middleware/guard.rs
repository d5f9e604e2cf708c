use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};

use super::client::ClientHandle;
use crate::access::{AccessDecision, Navigator, RedirectLatch, RequiredAccess};
use crate::session::SessionUser;
use crate::state::AppState;

/// Route-layer state: the app plus what this route requires
#[derive(Clone)]
pub struct PageGuard {
    pub app: AppState,
    pub access: RequiredAccess,
}

/// Navigator backed by the response being built: a redirect becomes a Location header
pub struct ResponseNavigator {
    path: String,
    location: Option<String>,
}

impl ResponseNavigator {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            location: None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl Navigator for ResponseNavigator {
    fn current_path(&self) -> &str {
        &self.path
    }

    fn push(&mut self, path: &str) {
        self.location = Some(path.to_string());
    }

    fn replace(&mut self, path: &str) {
        self.location = Some(path.to_string());
    }
}

/// Records the navigation, evaluates the guard and either runs the page or redirects
pub async fn guard_page_middleware(
    State(page): State<PageGuard>,
    Extension(client): Extension<ClientHandle>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let mut navigator = ResponseNavigator::new(path.as_str());

    let (decision, user) = {
        let mut state = client.state.lock().await;
        // Denied paths land in the shared trail too; the guard skips a previous page the role cannot open
        state.history.record(path.as_str());

        // Every request is a fresh navigation, so each gets its own latch
        let mut latch = RedirectLatch::default();
        let decision = page.app.guard.evaluate(
            &page.access,
            state.session.session(),
            &state.history,
            &mut navigator,
            &mut latch,
        );
        (decision, state.session.session().user.clone())
    };

    tracing::debug!("Client {} {} -> {:?}", client.id, path, decision);

    match decision {
        AccessDecision::Allow => {
            if let Some(user) = user {
                request.extensions_mut().insert::<SessionUser>(user);
            }
            next.run(request).await
        }
        AccessDecision::Pending => StatusCode::NO_CONTENT.into_response(),
        _ => match navigator.location() {
            Some(location) => {
                (StatusCode::SEE_OTHER, [(header::LOCATION, location.to_string())]).into_response()
            }
            None => StatusCode::NO_CONTENT.into_response(),
        },
    }
}

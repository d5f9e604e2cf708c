use axum::{
    handler::Handler,
    middleware,
    routing::{get, post, MethodRouter},
    Extension, Router,
};
use tower_http::trace::TraceLayer;

use crate::access::RequiredAccess;
use crate::handlers::{auth, pages, public};
use crate::middleware::{client_session_middleware, guard_page_middleware, PageGuard};
use crate::session::SessionUser;
use crate::state::AppState;
use crate::types::PageId;

pub fn app(state: AppState) -> Router {
    let session_routes = Router::new()
        .route(&state.guard.routes().login_path, get(auth::login_page))
        .route("/auth/login", post(auth::session_login))
        .route("/auth/logout", post(auth::session_logout))
        .route("/auth/session", get(auth::session_show))
        .merge(page_routes(&state))
        // Runs before the page guard: identifies the client and hydrates its session
        .route_layer(middleware::from_fn_with_state(state.clone(), client_session_middleware));

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(session_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET handler that only runs when the guard allows the caller
pub fn guarded<H, T>(state: &AppState, handler: H, access: impl Into<RequiredAccess>) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    let guard = PageGuard {
        app: state.clone(),
        access: access.into(),
    };
    get(handler).route_layer(middleware::from_fn_with_state(guard, guard_page_middleware))
}

fn page_routes(state: &AppState) -> Router<AppState> {
    PageId::ALL.into_iter().fold(Router::new(), |router, page| {
        let handler = move |Extension(user): Extension<SessionUser>| pages::render_page(page, user);
        router.route(&page.path(), guarded(state, handler, page))
    })
}

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;
use crate::types::PageId;

/// GET / - service description and the page map
pub async fn root(State(app): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let table = app.guard.table();

    let pages: Vec<Value> = PageId::ALL
        .into_iter()
        .map(|page| {
            json!({
                "id": page.as_str(),
                "path": page.path(),
                "title": page.title(),
                "access": table.rule_for(page),
            })
        })
        .collect();

    Json(json!({
        "success": true,
        "data": {
            "name": "Back-office access guard",
            "version": version,
            "login": app.guard.routes().login_path,
            "landing": app.guard.routes().default_path,
            "pages": pages,
        }
    }))
}

/// GET /health - liveness
pub async fn health(State(app): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "clients": app.client_count().await,
        }
    }))
}

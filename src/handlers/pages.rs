use serde::Serialize;

use crate::middleware::ApiResponse;
use crate::session::SessionUser;
use crate::types::PageId;

/// Page bodies are owned by the front-end; the host only confirms what was opened and by whom
#[derive(Debug, Serialize)]
pub struct PageView {
    pub page: &'static str,
    pub path: String,
    pub title: &'static str,
    pub user: SessionUser,
}

pub async fn render_page(page: PageId, user: SessionUser) -> ApiResponse<PageView> {
    ApiResponse::success(PageView {
        page: page.as_str(),
        path: page.path(),
        title: page.title(),
        user,
    })
}

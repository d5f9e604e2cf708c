pub mod client;
pub mod guard;
pub mod response;

pub use client::{client_session_middleware, ClientHandle};
pub use guard::{guard_page_middleware, PageGuard, ResponseNavigator};
pub use response::{ApiResponse, ApiResult};

pub mod access;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod history;
pub mod middleware;
pub mod session;
pub mod state;
pub mod types;

pub use access::{AccessDecision, AccessGuard, RequiredAccess};
pub use app::app;
pub use history::NavigationHistory;
pub use session::{Session, SessionStore, SessionUser};
pub use state::AppState;

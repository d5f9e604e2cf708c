// handlers/mod.rs - HTTP handlers grouped by who may reach them
//
// public: no client session needed (/, /health)
// auth:   client session, no guard (/login, /auth/*)
// pages:  client session + page guard (every back-office page)

pub mod auth;
pub mod pages;
pub mod public;

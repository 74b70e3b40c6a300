//! Blogging backend: cookie-session auth plus owner-scoped blog CRUD over axum.

pub mod app;
pub mod auth;
pub mod blogs;
pub mod config;
pub mod error;
pub mod images;
pub mod state;
pub mod storage;
pub mod users;

pub use app::build_app;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use state::AppState;

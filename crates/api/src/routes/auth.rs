//! Route definitions for `/login`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/login`.
///
/// ```text
/// POST   /        -> login (public)
/// GET    /me      -> me
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(auth::login))
        .route("/me", get(auth::me))
}

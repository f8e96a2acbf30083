use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_paste_handler, get_paste_handler, health_handler, view_paste_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    /// Builds the router. The JSON routes are served both at the root and
    /// under `/api`.
    pub fn router(state: AppState) -> Router {
        let api = Router::new()
            .route("/pastes", post(create_paste_handler))
            .route("/pastes/{id}", get(get_paste_handler))
            .route("/healthz", get(health_handler));

        Router::new()
            .merge(api.clone())
            .nest("/api", api)
            .route("/p/{id}", get(view_paste_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::mw_ctx::CtxState;
use crate::routes::{admin, balances, packages, review_tasks, reviewers, users};

pub fn main_router(ctx_state: &Arc<CtxState>) -> Router {
    Router::new()
        .route("/hc", get(get_hc))
        .merge(review_tasks::routes())
        .merge(packages::routes())
        .merge(reviewers::routes())
        .merge(balances::routes())
        .merge(users::routes())
        .merge(admin::routes())
        .with_state(ctx_state.clone())
        .layer(TraceLayer::new_for_http())
}

async fn get_hc() -> Response {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    (StatusCode::OK, format!("v{}", VERSION)).into_response()
}

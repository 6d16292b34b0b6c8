use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{
    database::table_names::DATA_PACKAGE_TABLE_NAME,
    entities::data_package::PackageQualityView,
    middleware::{error::CtxResult, mw_ctx::CtxState, utils::string_utils::get_str_thing},
    services::package_quality_service::PackageQualityService,
};

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new().route("/api/packages/:package_id/quality", get(get_package_quality))
}

async fn get_package_quality(
    State(state): State<Arc<CtxState>>,
    Path(package_id): Path<String>,
) -> CtxResult<Json<PackageQualityView>> {
    let package_id = get_str_thing(DATA_PACKAGE_TABLE_NAME, &package_id)?;
    let service = PackageQualityService::new(&state.db.data_packages, &state.db.review_submissions);
    Ok(Json(service.get_quality(&package_id).await?))
}

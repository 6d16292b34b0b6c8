use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{
    entities::balance::{AccountKey, AccountKind, BalanceView},
    middleware::{
        bearer_auth::BearerAuth,
        error::{AppError, CtxResult},
        mw_ctx::CtxState,
    },
    services::ledger_service::LedgerService,
};

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new().route("/api/balances/:kind/:id", get(get_balance))
}

async fn get_balance(
    auth_data: BearerAuth,
    State(state): State<Arc<CtxState>>,
    Path((kind, id)): Path<(String, String)>,
) -> CtxResult<Json<BalanceView>> {
    let kind = AccountKind::from_str(&kind).map_err(|_| AppError::Validation {
        description: format!("Unknown account kind {kind}"),
    })?;
    let key = AccountKey::new(kind, id);
    if !auth_data.caller.can_read_account(&key) {
        return Err(auth_data.ctx.to_ctx_error(AppError::AuthorizationFail {
            required: "account owner or admin".to_string(),
        }));
    }
    let balance = LedgerService::new(&state.db.balances).get(&key).await?;
    Ok(Json(balance))
}

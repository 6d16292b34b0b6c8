use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use reqwest::StatusCode;
use surrealdb::sql::Thing;

use crate::{
    database::table_names::{REVIEWER_TABLE_NAME, SUPPLIER_TABLE_NAME},
    entities::balance::AccountKey,
    middleware::{
        ctx::Ctx,
        error::{AppError, AppResult},
        mw_ctx::CtxState,
    },
    utils::jwt::CallerRole,
};

/// Identity decoded from the bearer token: who is calling and in which role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub role: CallerRole,
    pub id: String,
}

impl Caller {
    pub fn require(&self, role: CallerRole) -> AppResult<()> {
        if self.role != role {
            return Err(AppError::AuthorizationFail {
                required: role.to_string(),
            });
        }
        Ok(())
    }

    pub fn reviewer_thing(&self) -> AppResult<Thing> {
        self.require(CallerRole::Reviewer)?;
        Ok(Thing::from((REVIEWER_TABLE_NAME, self.id.as_str())))
    }

    pub fn supplier_thing(&self) -> AppResult<Thing> {
        self.require(CallerRole::Supplier)?;
        Ok(Thing::from((SUPPLIER_TABLE_NAME, self.id.as_str())))
    }

    /// Ledger account owned by the caller. Admins own none.
    pub fn account_key(&self) -> AppResult<AccountKey> {
        match self.role {
            CallerRole::Reviewer => Ok(AccountKey::reviewer(self.id.clone())),
            CallerRole::Supplier => Ok(AccountKey::supplier(self.id.clone())),
            CallerRole::Admin => Err(AppError::AuthorizationFail {
                required: "reviewer or supplier".to_string(),
            }),
        }
    }

    pub fn can_read_account(&self, key: &AccountKey) -> bool {
        self.role == CallerRole::Admin
            || self.account_key().map(|own| &own == key).unwrap_or(false)
    }
}

pub struct BearerAuth {
    pub caller: Caller,
    pub ctx: Ctx,
}

#[async_trait]
impl FromRequestParts<Arc<CtxState>> for BearerAuth {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<CtxState>,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state): State<Arc<CtxState>> = State::from_request_parts(parts, state)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        match parts.headers.typed_get::<Authorization<Bearer>>() {
            Some(token) => match app_state.jwt.decode(token.token()) {
                Ok(claims) => {
                    let ctx = Ctx::new();
                    tracing::debug!(req_id = %ctx.req_id(), sub = %claims.sub, role = %claims.role, "bearer accepted");
                    Ok(BearerAuth {
                        ctx,
                        caller: Caller {
                            role: claims.role,
                            id: claims.sub,
                        },
                    })
                }
                Err(_) => Err(StatusCode::UNAUTHORIZED),
            },
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: CallerRole, id: &str) -> Caller {
        Caller {
            role,
            id: id.to_string(),
        }
    }

    #[test]
    fn owners_and_admins_read_accounts() {
        let key = AccountKey::reviewer("r1");
        assert!(caller(CallerRole::Reviewer, "r1").can_read_account(&key));
        assert!(!caller(CallerRole::Reviewer, "r2").can_read_account(&key));
        assert!(!caller(CallerRole::Supplier, "r1").can_read_account(&key));
        assert!(caller(CallerRole::Admin, "ops").can_read_account(&key));
    }

    #[test]
    fn role_checks() {
        let supplier = caller(CallerRole::Supplier, "s1");
        assert!(supplier.reviewer_thing().is_err());
        assert_eq!(supplier.account_key().unwrap(), AccountKey::supplier("s1"));
        assert!(caller(CallerRole::Admin, "ops").account_key().is_err());
    }
}

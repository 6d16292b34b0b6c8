use uuid::Uuid;

use super::error::{AppError, CtxError};

/// Per-request context, tags errors with the request id.
#[derive(Clone, Debug)]
pub struct Ctx {
    req_id: Uuid,
}

impl Ctx {
    pub fn new() -> Self {
        Self {
            req_id: Uuid::new_v4(),
        }
    }

    pub fn req_id(&self) -> Uuid {
        self.req_id
    }

    pub fn to_ctx_error(&self, error: AppError) -> CtxError {
        CtxError {
            req_id: self.req_id,
            error,
        }
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Self::new()
    }
}

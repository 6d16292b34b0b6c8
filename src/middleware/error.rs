use std::fmt;

use axum::{http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CtxError {
    pub error: AppError,
    pub req_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppError {
    Generic { description: String },
    AuthenticationFail,
    AuthorizationFail { required: String },
    EntityFailIdNotFound { ident: String },
    /// Duplicate submission, consensus already applied, lost race.
    Conflict { description: String },
    /// Task closed or expired, supplier inactive.
    Unavailable { description: String },
    Validation { description: String },
    ExternalPayment { source: String },
    /// A condition the engine treats as a defect; always logged.
    InvariantViolation { description: String },
    Serde { source: String },
    SurrealDb { source: String },
}

/// ApiError has to have the req_id to report to the client and implements IntoResponse.
pub type CtxResult<T> = core::result::Result<T, CtxError>;
/// Any error for storing before composing a response.
pub type AppResult<T> = core::result::Result<T, AppError>;

impl std::error::Error for AppError {}

impl From<AppError> for CtxError {
    fn from(value: AppError) -> Self {
        CtxError {
            req_id: Uuid::new_v4(),
            error: value,
        }
    }
}

impl From<surrealdb::Error> for CtxError {
    fn from(value: surrealdb::Error) -> Self {
        CtxError {
            req_id: Uuid::new_v4(),
            error: value.into(),
        }
    }
}

const INTERNAL: &str = "Internal error";

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic { description } => write!(f, "{description}"),
            Self::AuthenticationFail => write!(f, "Authentication failed"),
            Self::AuthorizationFail { required } => write!(f, "Not authorized, requires {required}"),
            Self::EntityFailIdNotFound { ident } => write!(f, "Record id= {ident} not found"),
            Self::Conflict { description } => write!(f, "{description}"),
            Self::Unavailable { description } => write!(f, "{description}"),
            Self::Validation { description } => write!(f, "{description}"),
            Self::ExternalPayment { source } => write!(f, "Payment rail error - {source}"),
            Self::InvariantViolation { .. } => write!(f, "{INTERNAL}"),
            Self::Serde { source } => write!(f, "Serde error - {source}"),
            Self::SurrealDb { .. } => write!(f, "{INTERNAL}"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponseBody {
    pub error: String,
    pub req_id: String,
}

impl ErrorResponseBody {
    pub fn new(error: String, req_id: Option<String>) -> Self {
        ErrorResponseBody {
            error,
            req_id: req_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EntityFailIdNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unavailable { .. } => StatusCode::GONE,
            AppError::Validation { .. } | AppError::Serde { .. } | AppError::Generic { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::AuthenticationFail => StatusCode::UNAUTHORIZED,
            AppError::AuthorizationFail { .. } => StatusCode::FORBIDDEN,
            AppError::ExternalPayment { .. } => StatusCode::BAD_GATEWAY,
            AppError::InvariantViolation { .. } | AppError::SurrealDb { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// REST error response
impl IntoResponse for CtxError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.error.status_code();
        if status_code.is_server_error() {
            tracing::error!(req_id = %self.req_id, "->> into_response - {:?}", self.error);
        } else {
            tracing::debug!(req_id = %self.req_id, "->> into_response - {:?}", self.error);
        }
        let body = ErrorResponseBody::new(self.error.to_string(), Some(self.req_id.to_string()));
        let mut response = (status_code, axum::Json(body)).into_response();
        // Insert the real Error into the response - for the logger
        response.extensions_mut().insert(self.error);
        response
    }
}

// External Errors
impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde {
            source: value.to_string(),
        }
    }
}

impl From<surrealdb::Error> for AppError {
    fn from(value: surrealdb::Error) -> Self {
        Self::SurrealDb {
            source: value.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(value: validator::ValidationErrors) -> Self {
        Self::Validation {
            description: value.to_string(),
        }
    }
}

impl From<CtxError> for AppError {
    fn from(value: CtxError) -> Self {
        value.error
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_value: jsonwebtoken::errors::Error) -> Self {
        Self::AuthenticationFail
    }
}

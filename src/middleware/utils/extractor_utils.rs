use axum::body::Body;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::{
    async_trait,
    response::{IntoResponse, Response},
    Json, RequestExt,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::middleware::error::ErrorResponseBody;

/// JSON body that has passed its `validator` rules.
#[derive(Debug)]
pub struct JsonValidated<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonValidated<T>
where
    S: Send + Sync,
    Json<T>: FromRequest<()>,
    T: DeserializeOwned + Validate + Send + Sync + 'static,
{
    type Rejection = Response;

    async fn from_request(req: Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = req
            .extract::<Json<T>, _>()
            .await
            .map_err(IntoResponse::into_response)?;
        payload.validate().map_err(|err| {
            let body = ErrorResponseBody::new(err.to_string(), None);
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        })?;
        Ok(Self(payload))
    }
}

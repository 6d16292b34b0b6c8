use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::interfaces::payment_rail::{PaymentRailError, PaymentRailInterface, PaymentRequest};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Serialize)]
struct SendPaymentBody<'a> {
    destination: &'a str,
    amount: String,
    asset: &'a str,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    tx_hash: String,
}

/// Client of the external stablecoin payment gateway.
pub struct HttpPaymentRail {
    client: Client,
    base_url: String,
    api_key: String,
    asset: String,
}

impl HttpPaymentRail {
    pub fn new(base_url: &str, api_key: &str, asset: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            asset: asset.to_string(),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.api_key.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.api_key)
        }
    }

    async fn rejection(res: Response) -> PaymentRailError {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        let reason = format!("{status} {body}").trim().to_string();
        if status.is_client_error() {
            PaymentRailError::Rejected(reason)
        } else {
            PaymentRailError::Transport(reason)
        }
    }
}

fn transport(err: reqwest::Error) -> PaymentRailError {
    PaymentRailError::Transport(err.to_string())
}

#[async_trait]
impl PaymentRailInterface for HttpPaymentRail {
    async fn send_payment(&self, request: &PaymentRequest) -> Result<String, PaymentRailError> {
        let body = SendPaymentBody {
            destination: &request.destination,
            amount: request.amount.to_string(),
            asset: &self.asset,
        };
        let res = self
            .authorized(self.client.post(format!("{}/payments", self.base_url)))
            .header(IDEMPOTENCY_HEADER, &request.idempotency_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        if !res.status().is_success() {
            return Err(Self::rejection(res).await);
        }
        let data = res.json::<PaymentResponse>().await.map_err(transport)?;
        Ok(data.tx_hash)
    }

    async fn find_payment(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<String>, PaymentRailError> {
        let res = self
            .authorized(
                self.client
                    .get(format!("{}/payments/{}", self.base_url, idempotency_key)),
            )
            .send()
            .await
            .map_err(transport)?;

        match res.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let data = res.json::<PaymentResponse>().await.map_err(transport)?;
                Ok(Some(data.tx_hash))
            }
            // a lookup failure never proves the payment is absent
            _ => match Self::rejection(res).await {
                PaymentRailError::Rejected(reason) | PaymentRailError::Transport(reason) => {
                    Err(PaymentRailError::Transport(reason))
                }
            },
        }
    }
}

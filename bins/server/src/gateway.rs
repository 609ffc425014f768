//! HTTP adapter for acquiring gateways.

use std::time::Duration;

use async_trait::async_trait;
use paysettle_core::gateway::{GatewayError, GatewayRefundResponse, PaymentGateway};
use paysettle_core::order::Order;
use paysettle_core::refund::Refund;
use paysettle_shared::GatewayConfig;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

/// Refund request posted to the gateway adapter service.
#[derive(Debug, Serialize)]
struct RefundRequest<'a> {
    refund_id: String,
    order_id: Uuid,
    amount: Decimal,
    currency: &'a str,
    reason: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    terminal_id: Option<&'a str>,
}

/// Gateway reached over HTTP at `{base_url}/refunds`.
pub struct HttpGateway {
    client: reqwest::Client,
    refunds_url: String,
}

impl HttpGateway {
    /// Builds the client from the gateway section of the config.
    pub fn new(config: &GatewayConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            refunds_url: format!("{}/refunds", config.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn create_refund(
        &self,
        order: &Order,
        refund: &Refund,
    ) -> Result<GatewayRefundResponse, GatewayError> {
        let body = RefundRequest {
            refund_id: refund.id.to_string(),
            order_id: order.uuid,
            amount: refund.amount,
            currency: &refund.currency,
            reason: &refund.reason,
            terminal_id: order
                .payment_method
                .as_ref()
                .and_then(|pm| pm.params.terminal_id.as_deref()),
        };

        debug!(refund_id = %refund.id, url = %self.refunds_url, "Sending refund to gateway");

        let response = self
            .client
            .post(&self.refunds_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(refund_id = %refund.id, %status, "Gateway refused the request");
            return Err(GatewayError::Request(format!("gateway answered HTTP {status}")));
        }

        response
            .json::<GatewayRefundResponse>()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refunds_url_strips_trailing_slash() {
        let gateway = HttpGateway::new(&GatewayConfig {
            base_url: "http://gateway.local/v1/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(gateway.refunds_url, "http://gateway.local/v1/refunds");
    }

    #[test]
    fn test_refund_request_omits_missing_terminal() {
        let body = RefundRequest {
            refund_id: "r-1".to_string(),
            order_id: Uuid::nil(),
            amount: Decimal::new(1050, 2),
            currency: "RUB",
            reason: "",
            terminal_id: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["amount"], "10.50");
        assert!(json.get("terminal_id").is_none());
    }
}

//! Router tests over in-memory stores.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use paysettle_api::{AppState, create_router};
use paysettle_core::SettlementService;
use paysettle_core::cost::{
    MoneyBackCostMerchant, MoneyBackCostSystem, PaymentChannelCostMerchant,
    PaymentChannelCostSystem, UndoReason,
};
use paysettle_core::currency::{ExchangeRate, RateKind, StaticRateSource};
use paysettle_core::gateway::{
    GatewayError, GatewayRefundResponse, GatewayRefundStatus, GatewayRegistry, PaymentGateway,
};
use paysettle_core::merchant::{Country, Merchant};
use paysettle_core::order::{
    Address, BANK_CARD_GROUP, CARD_BRAND_REQUISITE, Order, OrderPaymentMethod, OrderStatus,
    OrderTax, OrderType, OrderUser, PaymentMethodParams, PrivateStatus, RoyaltyData,
};
use paysettle_core::refund::{
    CallbackMerchantOrder, CallbackRefundData, Refund, RefundCallback, signature,
};
use paysettle_core::store::{InMemoryStores, OrderStore};
use paysettle_shared::types::{MerchantId, OrderId};
use paysettle_shared::{RatesConfig, RefundConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

const KEY: &str = "internal-test-key";
const HANDLER: &str = "test_gateway";
const SECRET: &str = "callback-secret";
const REGION: &str = "russia_and_cis";

struct AcceptingGateway;

#[async_trait]
impl PaymentGateway for AcceptingGateway {
    async fn create_refund(
        &self,
        _order: &Order,
        refund: &Refund,
    ) -> Result<GatewayRefundResponse, GatewayError> {
        Ok(GatewayRefundResponse {
            status: GatewayRefundStatus::InProgress,
            external_id: format!("gw-{}", refund.id),
            message: String::new(),
        })
    }
}

struct TestApp {
    router: Router,
    stores: InMemoryStores,
    merchant_id: MerchantId,
}

impl TestApp {
    async fn new() -> Self {
        let merchant_id = MerchantId::new();
        let stores = InMemoryStores::new();

        stores
            .merchants
            .put(Merchant {
                id: merchant_id,
                name: "Router Test Merchant".to_string(),
                payout_currency: "USD".to_string(),
                mcc_code: "5816".to_string(),
                operating_company_id: "op1".to_string(),
                vat_report_cutoff: None,
            })
            .await;
        stores
            .countries
            .put(Country {
                iso_code_a2: "RU".to_string(),
                name: "Russia".to_string(),
                region: REGION.to_string(),
                payments_allowed: true,
            })
            .await;
        seed_rules(&stores, merchant_id).await;

        let rates = StaticRateSource::with_rates(vec![
            ExchangeRate::new(RateKind::Common, "RUB", "USD", dec!(0.0125)),
            ExchangeRate::new(RateKind::Common, "EUR", "USD", dec!(1.10)),
            ExchangeRate::new(RateKind::Merchant(merchant_id), "RUB", "USD", dec!(0.02)),
            ExchangeRate::new(RateKind::Merchant(merchant_id), "EUR", "USD", dec!(1.20)),
        ]);
        let gateways = GatewayRegistry::new().with(HANDLER, Arc::new(AcceptingGateway));

        let service = SettlementService::new(
            stores.stores(),
            gateways,
            Arc::new(rates),
            &RatesConfig::default(),
            &RefundConfig::default(),
        );

        Self {
            router: create_router(AppState::new(service, KEY)),
            stores,
            merchant_id,
        }
    }

    async fn seed_order(&self) -> Order {
        let order = order(self.merchant_id);
        self.stores.orders.insert(&order).await.unwrap();
        order
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn rpc(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {KEY}"));
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn callback(&self, refund_id: &str, amount: Decimal, status: &str) -> (StatusCode, Value) {
        let callback = RefundCallback {
            merchant_order: CallbackMerchantOrder {
                id: refund_id.to_string(),
            },
            refund_data: CallbackRefundData {
                id: "gw-refund-1".to_string(),
                amount,
                currency: "RUB".to_string(),
                status: status.to_string(),
                decline: None,
                payer: None,
            },
            payment_method: Some(BANK_CARD_GROUP.to_string()),
            callback_time: Some(Utc::now()),
        };
        let body = serde_json::to_vec(&callback).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/webhooks/refunds/{HANDLER}"))
            .header("X-Signature", signature::sign(&body, SECRET))
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

async fn seed_rules(stores: &InMemoryStores, merchant_id: MerchantId) {
    let rules = &stores.cost_rules;
    rules
        .add_payment_channel_system(PaymentChannelCostSystem {
            id: Uuid::now_v7(),
            name: "VISA".to_string(),
            region: REGION.to_string(),
            country: "RU".to_string(),
            mcc_code: "5816".to_string(),
            operating_company_id: "op1".to_string(),
            percent: dec!(1.5),
            fix_amount: dec!(0.01),
            fix_amount_currency: "EUR".to_string(),
            is_active: true,
        })
        .await;
    rules
        .add_payment_channel_merchant(PaymentChannelCostMerchant {
            id: Uuid::now_v7(),
            merchant_id,
            name: "VISA".to_string(),
            payout_currency: "USD".to_string(),
            min_amount: Decimal::ZERO,
            region: REGION.to_string(),
            country: "RU".to_string(),
            mcc_code: "5816".to_string(),
            operating_company_id: "op1".to_string(),
            method_percent: dec!(3.0),
            method_fix_amount: dec!(0.05),
            method_fix_amount_currency: "EUR".to_string(),
            ps_percent: dec!(1.0),
            ps_fixed_fee: dec!(0.10),
            ps_fixed_fee_currency: "EUR".to_string(),
            is_active: true,
        })
        .await;
    rules
        .add_money_back_system(MoneyBackCostSystem {
            id: Uuid::now_v7(),
            name: "VISA".to_string(),
            payout_currency: "USD".to_string(),
            undo_reason: UndoReason::Reversal,
            region: REGION.to_string(),
            country: "RU".to_string(),
            days_from: 0,
            payment_stage: 1,
            mcc_code: "5816".to_string(),
            operating_company_id: "op1".to_string(),
            percent: dec!(1),
            fix_amount: dec!(0.05),
            fix_amount_currency: "USD".to_string(),
            is_active: true,
        })
        .await;
    rules
        .add_money_back_merchant(MoneyBackCostMerchant {
            id: Uuid::now_v7(),
            merchant_id,
            name: "VISA".to_string(),
            payout_currency: "USD".to_string(),
            undo_reason: UndoReason::Reversal,
            region: REGION.to_string(),
            country: "RU".to_string(),
            days_from: 0,
            payment_stage: 1,
            mcc_code: "5816".to_string(),
            percent: dec!(2),
            fix_amount: dec!(0.10),
            fix_amount_currency: "USD".to_string(),
            is_active: true,
        })
        .await;
}

/// Settled 100 RUB VISA order paid yesterday from Russia.
fn order(merchant_id: MerchantId) -> Order {
    let paid_at = Utc::now() - Duration::days(1);
    Order {
        id: OrderId::new(),
        uuid: Uuid::now_v7(),
        order_type: OrderType::Simple,
        merchant_id,
        private_status: PrivateStatus::PaymentSystemComplete,
        status: OrderStatus::Processed,
        charge_amount: dec!(100),
        charge_currency: "RUB".to_string(),
        total_payment_amount: dec!(100),
        currency: "RUB".to_string(),
        tax: OrderTax {
            tax_type: "vat".to_string(),
            rate: dec!(0.2),
            amount: dec!(20),
            currency: "RUB".to_string(),
        },
        royalty_data: RoyaltyData {
            currency: "USD".to_string(),
            amount_in_royalty_currency: dec!(2.00),
            payment_tax_amount_in_royalty_currency: dec!(0.40),
            refund_tax_amount_in_royalty_currency: Decimal::ZERO,
        },
        payment_method: Some(OrderPaymentMethod {
            id: "pm-card".to_string(),
            name: "Bank card".to_string(),
            group: BANK_CARD_GROUP.to_string(),
            external_id: "BANKCARD".to_string(),
            handler: HANDLER.to_string(),
            params: PaymentMethodParams {
                settlement_currency: "RUB".to_string(),
                terminal_id: None,
                secret_callback: SECRET.to_string(),
            },
        }),
        payment_requisites: HashMap::from([(
            CARD_BRAND_REQUISITE.to_string(),
            "VISA".to_string(),
        )]),
        billing_address: None,
        user: Some(OrderUser {
            external_id: None,
            email: None,
            ip: None,
            address: Some(Address {
                country: "RU".to_string(),
                ..Address::default()
            }),
        }),
        mcc_code: "5816".to_string(),
        operating_company_id: "op1".to_string(),
        refunded_amount: Decimal::ZERO,
        refund: None,
        refunded_at: None,
        parent_order: None,
        is_vat_deduction: false,
        paid_at: Some(paid_at),
        created_at: paid_at,
        updated_at: paid_at,
        version: 0,
    }
}

#[tokio::test]
async fn test_health_needs_no_key() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .uri("/api/v1/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "paysettle");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["gateways"], serde_json::json!([HANDLER]));
}

#[tokio::test]
async fn test_rpc_routes_require_internal_key() {
    let app = TestApp::new().await;

    let missing = Request::builder()
        .method("POST")
        .uri("/api/v1/refunds")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = app.send(missing).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let wrong = Request::builder()
        .uri(format!(
            "/api/v1/orders/{}/refunds?merchant_id={}",
            OrderId::new(),
            app.merchant_id
        ))
        .header(header::AUTHORIZATION, "Bearer not-the-key")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_payment_entries_are_booked_once() {
    let app = TestApp::new().await;
    let order = app.seed_order().await;
    let uri = format!("/api/v1/orders/{}/payment-entries", order.id);
    let body = json!({ "merchant_id": app.merchant_id });

    let (status, first) = app.rpc("POST", &uri, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let items = first["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert_eq!(items[0]["type"], "payment");
    assert_eq!(items[0]["currency"], "USD");

    let (status, second) = app.rpc("POST", &uri, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["items"], first["items"]);
}

#[tokio::test]
async fn test_unknown_entry_type_is_bad_data() {
    let app = TestApp::new().await;
    let order = app.seed_order().await;

    let (status, body) = app
        .rpc(
            "POST",
            "/api/v1/accounting-entries",
            Some(json!({
                "type": "not_exist_accounting_entry_name",
                "order_id": order.id,
                "merchant_id": app.merchant_id,
                "amount": "1.00",
                "currency": "USD",
                "reason": ""
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "bad_data");
    assert_eq!(body["error"], "UNKNOWN_ENTRY");
}

#[tokio::test]
async fn test_single_entry_is_created() {
    let app = TestApp::new().await;
    let order = app.seed_order().await;

    let (status, body) = app
        .rpc(
            "POST",
            "/api/v1/accounting-entries",
            Some(json!({
                "type": "tax_fee",
                "order_id": order.id,
                "merchant_id": app.merchant_id,
                "amount": "0",
                "currency": "USD",
                "reason": "manual"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["item"]["type"], "tax_fee");
    assert_eq!(body["item"]["source"]["type"], "order");
}

#[tokio::test]
async fn test_refund_of_unknown_order_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .rpc(
            "POST",
            "/api/v1/refunds",
            Some(json!({
                "order_id": OrderId::new(),
                "merchant_id": app.merchant_id,
                "creator_id": "operator-1"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ORDER_NOT_FOUND");
}

#[tokio::test]
async fn test_refund_flow_through_webhook() {
    let app = TestApp::new().await;
    let order = app.seed_order().await;

    let (status, created) = app
        .rpc(
            "POST",
            "/api/v1/refunds",
            Some(json!({
                "order_id": order.id,
                "merchant_id": app.merchant_id,
                "creator_id": "operator-1",
                "reason": "customer request"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["item"]["status"], "in_progress");
    let refund_id = created["item"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.callback(&refund_id, dec!(100), "completed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, fetched) = app
        .rpc(
            "GET",
            &format!(
                "/api/v1/orders/{}/refunds/{refund_id}?merchant_id={}",
                order.id, app.merchant_id
            ),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["item"]["status"], "completed");
    assert!(!fetched["item"]["created_order_id"].is_null());

    let (status, listed) = app
        .rpc(
            "GET",
            &format!(
                "/api/v1/orders/{}/refunds?merchant_id={}&limit=5",
                order.id, app.merchant_id
            ),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["count"], 1);

    let stored = app.stores.orders.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored.private_status, PrivateStatus::Refund);
    assert_eq!(stored.refunded_amount, dec!(100));
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/webhooks/refunds/{HANDLER}"))
        .header("X-Signature", "00")
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "bad_data");
}

#[tokio::test]
async fn test_webhook_temporary_status() {
    let app = TestApp::new().await;
    let order = app.seed_order().await;

    let (_, created) = app
        .rpc(
            "POST",
            "/api/v1/refunds",
            Some(json!({
                "order_id": order.id,
                "merchant_id": app.merchant_id,
                "creator_id": "operator-1"
            })),
        )
        .await;
    let refund_id = created["item"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.callback(&refund_id, dec!(100), "pending").await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["status"], "temporary");
}

#[tokio::test]
async fn test_unknown_handler() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/refunds/nobody")
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "callback handler incorrect");
}

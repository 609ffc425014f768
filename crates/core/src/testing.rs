//! Shared test fixtures.
//!
//! One merchant paid 100 RUB by a VISA card from Russia, with cost rules and
//! rates chosen so every entry amount is easy to check by hand.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use paysettle_shared::types::{AccountingEntryId, MerchantId, OrderId, RefundId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::accounting::{AccountingEntry, AccountingEntryEngine, EntrySource, EntryType};
use crate::cost::{
    CostKey, CostRateResolver, MoneyBackCostMerchant, MoneyBackCostSystem,
    PaymentChannelCostMerchant, PaymentChannelCostSystem, UndoReason,
};
use crate::currency::{CurrencyConverter, ExchangeRate, RateKind, StaticRateSource};
use crate::gateway::{
    GatewayError, GatewayRefundResponse, GatewayRefundStatus, GatewayRegistry, PaymentGateway,
};
use crate::merchant::{Country, Merchant};
use crate::order::{
    Address, Order, OrderLedgerState, OrderPaymentMethod, OrderStatus, OrderTax, OrderType,
    OrderUser, PaymentMethodParams, PrivateStatus, RoyaltyData, BANK_CARD_GROUP, CARD_BRAND_REQUISITE,
};
use crate::refund::signature;
use crate::refund::{
    CallbackMerchantOrder, CallbackRefundData, OriginalOrder, Refund, RefundCallback,
    RefundOrchestrator, RefundPayerData, RefundStatus,
};
use crate::store::{InMemoryCostRuleStore, InMemoryStores, OrderStore};

pub const REGION: &str = "russia_and_cis";
pub const MCC: &str = "5816";
pub const OPERATING_COMPANY: &str = "op1";
pub const HANDLER: &str = "test_gateway";
pub const SECRET: &str = "callback-secret";
pub const PAYMENT_STAGE: i32 = 1;

const MERCHANT_UUID: u128 = 0x0190_0000_0000_7000_8000_0000_0000_0001;

pub fn merchant_id() -> MerchantId {
    MerchantId::from_uuid(Uuid::from_u128(MERCHANT_UUID))
}

pub fn merchant() -> Merchant {
    Merchant {
        id: merchant_id(),
        name: "Acme Games".to_string(),
        payout_currency: "USD".to_string(),
        mcc_code: MCC.to_string(),
        operating_company_id: OPERATING_COMPANY.to_string(),
        vat_report_cutoff: None,
    }
}

pub fn country(code: &str) -> Country {
    Country {
        iso_code_a2: code.to_uppercase(),
        name: code.to_uppercase(),
        region: REGION.to_string(),
        payments_allowed: true,
    }
}

/// Settled 100 RUB VISA order paid yesterday.
pub fn order() -> Order {
    let now = Utc::now();
    Order {
        id: OrderId::new(),
        uuid: Uuid::now_v7(),
        order_type: OrderType::Simple,
        merchant_id: merchant_id(),
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
                terminal_id: Some("T-1".to_string()),
                secret_callback: SECRET.to_string(),
            },
        }),
        payment_requisites: HashMap::from([(
            CARD_BRAND_REQUISITE.to_string(),
            "VISA".to_string(),
        )]),
        billing_address: None,
        user: Some(OrderUser {
            external_id: Some("payer-1".to_string()),
            email: Some("payer@example.com".to_string()),
            ip: Some("127.0.0.1".to_string()),
            address: Some(Address {
                country: "RU".to_string(),
                ..Address::default()
            }),
        }),
        mcc_code: MCC.to_string(),
        operating_company_id: OPERATING_COMPANY.to_string(),
        refunded_amount: Decimal::ZERO,
        refund: None,
        refunded_at: None,
        parent_order: None,
        is_vat_deduction: false,
        paid_at: Some(now - Duration::days(1)),
        created_at: now - Duration::days(1),
        updated_at: now - Duration::days(1),
        version: 0,
    }
}

pub fn refund(order: &Order, amount: Decimal, is_chargeback: bool) -> Refund {
    let now = Utc::now();
    Refund {
        id: RefundId::new(),
        original_order: OriginalOrder {
            id: order.id,
            uuid: order.uuid,
        },
        merchant_id: order.merchant_id,
        external_id: String::new(),
        amount,
        currency: order.charge_currency.clone(),
        reason: "customer request".to_string(),
        status: RefundStatus::InProgress,
        is_chargeback,
        created_order_id: None,
        creator_id: "operator-1".to_string(),
        payer_data: RefundPayerData::default(),
        created_at: now,
        updated_at: now,
    }
}

pub fn callback(refund: &Refund, status: &str) -> RefundCallback {
    RefundCallback {
        merchant_order: CallbackMerchantOrder {
            id: refund.id.to_string(),
        },
        refund_data: CallbackRefundData {
            id: "gw-refund-1".to_string(),
            amount: refund.amount,
            currency: refund.currency.clone(),
            status: status.to_string(),
            decline: None,
            payer: None,
        },
        payment_method: Some(BANK_CARD_GROUP.to_string()),
        callback_time: Some(Utc::now()),
    }
}

/// Serialized callback and its signature under the fixture secret.
pub fn signed_callback(refund: &Refund, status: &str) -> (Vec<u8>, String) {
    let body = serde_json::to_vec(&callback(refund, status)).unwrap();
    let sig = signature::sign(&body, SECRET);
    (body, sig)
}

pub fn entry() -> AccountingEntry {
    AccountingEntry {
        id: AccountingEntryId::new(),
        entry_type: EntryType::Payment,
        source: EntrySource::order(Uuid::now_v7()),
        merchant_id: merchant_id(),
        amount: dec!(2.00),
        currency: "USD".to_string(),
        reason: String::new(),
        status: "available".to_string(),
        country: "RU".to_string(),
        created_at: Utc::now(),
    }
}

/// Key matching `order()` paid to `merchant()`.
pub fn cost_key() -> CostKey {
    CostKey {
        name: "VISA".to_string(),
        region: REGION.to_string(),
        country: "RU".to_string(),
        mcc_code: MCC.to_string(),
        operating_company_id: OPERATING_COMPANY.to_string(),
        merchant_id: merchant_id(),
        payout_currency: "USD".to_string(),
        amount: dec!(2.00),
        days: 1,
        payment_stage: PAYMENT_STAGE,
        undo_reason: None,
    }
}

/// Common RUB->USD 0.0125 and EUR->USD 1.10; merchant RUB->USD 0.02 and
/// EUR->USD 1.20.
pub fn rates() -> StaticRateSource {
    let merchant = RateKind::Merchant(merchant_id());
    StaticRateSource::with_rates(vec![
        ExchangeRate::new(RateKind::Common, "RUB", "USD", dec!(0.0125)),
        ExchangeRate::new(RateKind::Common, "EUR", "USD", dec!(1.10)),
        ExchangeRate::new(merchant, "RUB", "USD", dec!(0.02)),
        ExchangeRate::new(merchant, "EUR", "USD", dec!(1.20)),
    ])
}

pub fn pc_system_rule(country: &str) -> PaymentChannelCostSystem {
    PaymentChannelCostSystem {
        id: Uuid::now_v7(),
        name: "VISA".to_string(),
        region: REGION.to_string(),
        country: country.to_string(),
        mcc_code: MCC.to_string(),
        operating_company_id: OPERATING_COMPANY.to_string(),
        percent: dec!(1.5),
        fix_amount: dec!(0.01),
        fix_amount_currency: "EUR".to_string(),
        is_active: true,
    }
}

pub fn pc_merchant_rule(country: &str) -> PaymentChannelCostMerchant {
    PaymentChannelCostMerchant {
        id: Uuid::now_v7(),
        merchant_id: merchant_id(),
        name: "VISA".to_string(),
        payout_currency: "USD".to_string(),
        min_amount: Decimal::ZERO,
        region: REGION.to_string(),
        country: country.to_string(),
        mcc_code: MCC.to_string(),
        operating_company_id: OPERATING_COMPANY.to_string(),
        method_percent: dec!(3.0),
        method_fix_amount: dec!(0.05),
        method_fix_amount_currency: "EUR".to_string(),
        ps_percent: dec!(1.0),
        ps_fixed_fee: dec!(0.10),
        ps_fixed_fee_currency: "EUR".to_string(),
        is_active: true,
    }
}

pub fn mb_system_rule(country: &str, undo_reason: UndoReason) -> MoneyBackCostSystem {
    let (percent, fix_amount) = match undo_reason {
        UndoReason::Reversal => (dec!(1), dec!(0.05)),
        UndoReason::Chargeback => (dec!(2), dec!(1)),
    };
    MoneyBackCostSystem {
        id: Uuid::now_v7(),
        name: "VISA".to_string(),
        payout_currency: "USD".to_string(),
        undo_reason,
        region: REGION.to_string(),
        country: country.to_string(),
        days_from: 0,
        payment_stage: PAYMENT_STAGE,
        mcc_code: MCC.to_string(),
        operating_company_id: OPERATING_COMPANY.to_string(),
        percent,
        fix_amount,
        fix_amount_currency: "USD".to_string(),
        is_active: true,
    }
}

pub fn mb_merchant_rule(country: &str, undo_reason: UndoReason) -> MoneyBackCostMerchant {
    let (percent, fix_amount) = match undo_reason {
        UndoReason::Reversal => (dec!(2), dec!(0.10)),
        UndoReason::Chargeback => (dec!(3), dec!(2)),
    };
    MoneyBackCostMerchant {
        id: Uuid::now_v7(),
        merchant_id: merchant_id(),
        name: "VISA".to_string(),
        payout_currency: "USD".to_string(),
        undo_reason,
        region: REGION.to_string(),
        country: country.to_string(),
        days_from: 0,
        payment_stage: PAYMENT_STAGE,
        mcc_code: MCC.to_string(),
        percent,
        fix_amount,
        fix_amount_currency: "USD".to_string(),
        is_active: true,
    }
}

/// Gateway double answering every refund request the same way.
#[derive(Default)]
pub struct TestGateway {
    pub reject: bool,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl TestGateway {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            reject: true,
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for TestGateway {
    async fn create_refund(
        &self,
        _order: &Order,
        refund: &Refund,
    ) -> Result<GatewayRefundResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GatewayError::Request("connection reset".to_string()));
        }
        let status = if self.reject {
            GatewayRefundStatus::Rejected
        } else {
            GatewayRefundStatus::InProgress
        };
        Ok(GatewayRefundResponse {
            status,
            external_id: format!("gw-{}", refund.id),
            message: String::new(),
        })
    }
}

/// Wired components over in-memory stores.
pub struct Fixture {
    pub stores: InMemoryStores,
    pub rules: InMemoryCostRuleStore,
    pub rates: StaticRateSource,
    pub resolver: CostRateResolver,
    pub state: OrderLedgerState,
    pub converter: CurrencyConverter,
    pub engine: AccountingEntryEngine,
}

impl Fixture {
    /// Reference data and the full rule set.
    pub async fn new() -> Self {
        let fx = Self::empty().await;

        fx.rules.add_payment_channel_system(pc_system_rule("RU")).await;
        let mut fallback = pc_system_rule("");
        fallback.percent = dec!(2.0);
        fx.rules.add_payment_channel_system(fallback).await;

        fx.rules
            .add_payment_channel_merchant(pc_merchant_rule("RU"))
            .await;

        for undo in [UndoReason::Reversal, UndoReason::Chargeback] {
            fx.rules.add_money_back_system(mb_system_rule("RU", undo)).await;
            fx.rules
                .add_money_back_merchant(mb_merchant_rule("RU", undo))
                .await;
        }

        fx
    }

    /// Reference data without cost rules.
    pub async fn empty() -> Self {
        let stores = InMemoryStores::new();
        stores.merchants.put(merchant()).await;
        stores.countries.put(country("RU")).await;
        stores.countries.put(country("KZ")).await;

        let ports = stores.stores();
        let rates = rates();
        let resolver =
            CostRateResolver::new(ports.cost_rules.clone(), ports.countries.clone(), PAYMENT_STAGE);
        let converter = CurrencyConverter::new(Arc::new(rates.clone()));
        let engine =
            AccountingEntryEngine::new(resolver.clone(), converter.clone(), ports.merchants.clone());

        Self {
            rules: stores.cost_rules.clone(),
            state: OrderLedgerState::new(resolver.clone()),
            stores,
            rates,
            resolver,
            converter,
            engine,
        }
    }

    pub async fn cost_key(&self) -> CostKey {
        self.resolver
            .key_for(&order(), &merchant(), Utc::now())
            .await
            .unwrap()
    }

    /// Orchestrator routing `HANDLER` to `gateway`.
    pub fn orchestrator(&self, gateway: Arc<dyn PaymentGateway>) -> RefundOrchestrator {
        RefundOrchestrator::new(
            self.stores.stores(),
            GatewayRegistry::new().with(HANDLER, gateway),
            self.state.clone(),
            self.engine.clone(),
            self.converter.clone(),
            3,
        )
    }

    /// Stores a fresh `order()` and returns it.
    pub async fn seed_order(&self) -> Order {
        let order = order();
        self.stores.orders.insert(&order).await.unwrap();
        order
    }
}

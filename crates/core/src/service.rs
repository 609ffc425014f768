//! RPC facade over the settlement components.
//!
//! `SettlementService` owns the wiring: one resolver, one converter, one
//! entry engine and one refund orchestrator over a shared set of stores.
//! Transports (HTTP, tests) call it and map [`ServiceError`] onto a
//! [`ResponseStatus`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use paysettle_shared::types::{MerchantId, OrderId, PageRequest, PageResponse, RefundId};
use paysettle_shared::{RatesConfig, RefundConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::accounting::{
    AccountingEntry, AccountingEntryEngine, EntryError, EntryRequest, EntrySource, EntryType,
};
use crate::cost::CostRateResolver;
use crate::currency::{CurrencyConverter, RateSource};
use crate::error::ErrorKind;
use crate::gateway::GatewayRegistry;
use crate::order::{Order, OrderLedgerState, OrderType};
use crate::refund::{
    CallbackResponse, CreateRefundRequest, Refund, RefundError, RefundOrchestrator,
};
use crate::store::{StoreError, Stores};

/// Outcome class of an RPC call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Success.
    Ok,
    /// Request data rejected.
    BadData,
    /// Referenced document absent.
    NotFound,
    /// Rate lookup or conversion failed.
    ExchangeFailure,
    /// Not final yet.
    Temporary,
    /// Internal failure.
    SystemError,
}

impl ResponseStatus {
    /// Returns the HTTP status code.
    #[must_use]
    pub const fn http_status_code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadData => ErrorKind::Validation.http_status_code(),
            Self::NotFound => ErrorKind::NotFound.http_status_code(),
            Self::ExchangeFailure => ErrorKind::ExchangeFailure.http_status_code(),
            Self::Temporary => ErrorKind::Temporary.http_status_code(),
            Self::SystemError => ErrorKind::System.http_status_code(),
        }
    }
}

impl From<ErrorKind> for ResponseStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::Validation => Self::BadData,
            ErrorKind::ExchangeFailure => Self::ExchangeFailure,
            ErrorKind::Temporary => Self::Temporary,
            ErrorKind::System => Self::SystemError,
        }
    }
}

/// Errors returned by [`SettlementService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Order absent or owned by another merchant.
    #[error("Order not found")]
    OrderNotFound,

    /// Refund absent or owned by another merchant.
    #[error("Refund not found")]
    RefundNotFound,

    /// Merchant absent.
    #[error("Merchant not found")]
    MerchantNotFound,

    /// Payment entries requested for an order that was never paid.
    #[error("Order {0} has no completed payment")]
    OrderNotPaid(String),

    /// Entry engine failure.
    #[error(transparent)]
    Entry(#[from] EntryError),

    /// Refund workflow failure.
    #[error(transparent)]
    Refund(#[from] RefundError),

    /// Backing store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::RefundNotFound => "REFUND_NOT_FOUND",
            Self::MerchantNotFound => "MERCHANT_NOT_FOUND",
            Self::OrderNotPaid(_) => "ORDER_NOT_PAID",
            Self::Entry(e) => e.error_code(),
            Self::Refund(e) => e.error_code(),
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the coarse error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OrderNotFound | Self::RefundNotFound | Self::MerchantNotFound => {
                ErrorKind::NotFound
            }
            Self::OrderNotPaid(_) => ErrorKind::Validation,
            Self::Entry(e) => e.kind(),
            Self::Refund(e) => e.kind(),
            Self::Store(e) => e.kind(),
        }
    }

    /// Returns the response status class.
    #[must_use]
    pub fn status(&self) -> ResponseStatus {
        self.kind().into()
    }
}

/// Inbound request of `create_accounting_entry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    /// Entry type wire name.
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Order to book against.
    #[serde(default)]
    pub order_id: Option<OrderId>,
    /// Refund to book against.
    #[serde(default)]
    pub refund_id: Option<RefundId>,
    /// Merchant the entry belongs to.
    pub merchant_id: MerchantId,
    /// Amount for request-copying entries.
    #[serde(default)]
    pub amount: Decimal,
    /// Currency for request-copying entries.
    #[serde(default)]
    pub currency: String,
    /// Status override.
    #[serde(default)]
    pub status: Option<String>,
    /// Booking date override.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Free-text reason.
    #[serde(default)]
    pub reason: String,
}

impl CreateEntryRequest {
    fn entry_request(&self) -> EntryRequest {
        EntryRequest {
            amount: self.amount,
            currency: self.currency.clone(),
            status: self.status.clone(),
            date: self.date,
            reason: self.reason.clone(),
        }
    }
}

/// The settlement core behind one facade.
#[derive(Clone)]
pub struct SettlementService {
    stores: Stores,
    engine: AccountingEntryEngine,
    orchestrator: RefundOrchestrator,
}

impl SettlementService {
    /// Wires the components over `stores`.
    pub fn new(
        stores: Stores,
        gateways: GatewayRegistry,
        rate_source: Arc<dyn RateSource>,
        rates: &RatesConfig,
        refund: &RefundConfig,
    ) -> Self {
        let resolver = CostRateResolver::new(
            stores.cost_rules.clone(),
            stores.countries.clone(),
            refund.payment_stage,
        );
        let converter =
            CurrencyConverter::with_cache(rate_source, rates.cache_capacity, rates.cache_ttl_secs);
        let engine =
            AccountingEntryEngine::new(resolver.clone(), converter.clone(), stores.merchants.clone());
        let orchestrator = RefundOrchestrator::new(
            stores.clone(),
            gateways,
            OrderLedgerState::new(resolver),
            engine.clone(),
            converter,
            refund.conflict_retries,
        );

        Self {
            stores,
            engine,
            orchestrator,
        }
    }

    /// Gateway handlers refunds can be sent through.
    #[must_use]
    pub fn gateway_handlers(&self) -> Vec<String> {
        self.orchestrator.gateway_handlers()
    }

    /// Books a single entry.
    ///
    /// The type is validated before anything is read. A refund without an
    /// explicit order is priced on its mirror order once one exists, else
    /// on the original order. Returns `None` when the handler has nothing
    /// to book.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntry` (bad data), `MerchantNotFound`,
    /// `OrderNotFound`, `RefundNotFound` or the handler error.
    #[instrument(skip_all, fields(entry_type = %request.entry_type, merchant_id = %request.merchant_id))]
    pub async fn create_accounting_entry(
        &self,
        request: CreateEntryRequest,
    ) -> Result<Option<AccountingEntry>, ServiceError> {
        let entry_type = EntryType::parse(&request.entry_type)
            .ok_or_else(|| EntryError::UnknownEntry(request.entry_type.clone()))?;

        self.stores
            .merchants
            .get(request.merchant_id)
            .await?
            .ok_or(ServiceError::MerchantNotFound)?;

        let refund = match request.refund_id {
            Some(refund_id) => Some(self.merchant_refund(refund_id, request.merchant_id).await?),
            None => None,
        };

        let order_id = request.order_id.or_else(|| {
            refund
                .as_ref()
                .map(|r| r.created_order_id.unwrap_or(r.original_order.id))
        });
        let order = match order_id {
            Some(order_id) => Some(self.merchant_order(order_id, request.merchant_id).await?),
            None => None,
        };

        let entries = self
            .engine
            .process(
                order.as_ref(),
                refund.as_ref(),
                &request.entry_request(),
                &[entry_type],
            )
            .await?;
        self.stores.entries.insert_many(&entries).await?;

        Ok(entries.into_iter().next())
    }

    /// Books the payment event for a paid order once.
    ///
    /// Types already booked against the order are skipped, so a repeated
    /// call books nothing and returns the event's entries in event order.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`, `OrderNotPaid` or the first handler error.
    #[instrument(skip(self))]
    pub async fn record_payment_entries(
        &self,
        order_id: OrderId,
        merchant_id: MerchantId,
    ) -> Result<Vec<AccountingEntry>, ServiceError> {
        let order = self.merchant_order(order_id, merchant_id).await?;
        let paid = order.private_status.is_settled() || order.private_status.is_reversed();
        if order.order_type != OrderType::Simple || !paid {
            return Err(ServiceError::OrderNotPaid(order.id.to_string()));
        }

        let source = EntrySource::order(order.id.into_inner());
        let mut booked = self.stores.entries.list_by_source(&source).await?;
        let pending = EntryType::unbooked(EntryType::PAYMENT_EVENT, &booked);

        if pending.is_empty() {
            info!(order_id = %order.id, "Payment entries already booked");
        } else {
            let entries = self
                .engine
                .process(Some(&order), None, &EntryRequest::default(), &pending)
                .await?;
            self.stores.entries.insert_many(&entries).await?;
            info!(order_id = %order.id, entries = entries.len(), "Payment entries booked");
            booked.extend(entries);
        }

        booked.retain(|e| EntryType::PAYMENT_EVENT.contains(&e.entry_type));
        booked.sort_by_key(|e| {
            EntryType::PAYMENT_EVENT
                .iter()
                .position(|t| *t == e.entry_type)
        });
        Ok(booked)
    }

    /// Starts a refund.
    ///
    /// # Errors
    ///
    /// Returns the orchestrator's validation or gateway error.
    pub async fn create_refund(&self, request: CreateRefundRequest) -> Result<Refund, ServiceError> {
        Ok(self.orchestrator.create_refund(request).await?)
    }

    /// Loads a refund of a merchant's order.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` or `RefundNotFound`.
    pub async fn get_refund(
        &self,
        order_id: OrderId,
        refund_id: RefundId,
        merchant_id: MerchantId,
    ) -> Result<Refund, ServiceError> {
        Ok(self
            .orchestrator
            .get_refund(order_id, refund_id, merchant_id)
            .await?)
    }

    /// Lists refunds of a merchant's order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`.
    pub async fn list_refunds(
        &self,
        order_id: OrderId,
        merchant_id: MerchantId,
        page: PageRequest,
    ) -> Result<PageResponse<Refund>, ServiceError> {
        let (items, count) = self
            .orchestrator
            .list_refunds(order_id, merchant_id, page.limit(), page.offset())
            .await?;
        Ok(PageResponse::new(items, count))
    }

    /// Webhook entry point; never leaks internal error text.
    pub async fn process_refund_callback(
        &self,
        handler: &str,
        body: &[u8],
        signature: &str,
    ) -> CallbackResponse {
        match self
            .orchestrator
            .process_refund_callback(handler, body, signature)
            .await
        {
            Ok(_) => CallbackResponse::ok(),
            Err(err) => {
                let response = CallbackResponse::from_error(&err);
                warn!(
                    handler,
                    error_code = err.error_code(),
                    error = %err,
                    status = %response.status,
                    "Refund callback not processed"
                );
                response
            }
        }
    }

    async fn merchant_order(
        &self,
        order_id: OrderId,
        merchant_id: MerchantId,
    ) -> Result<Order, ServiceError> {
        self.stores
            .orders
            .get(order_id)
            .await?
            .filter(|o| o.merchant_id == merchant_id)
            .ok_or(ServiceError::OrderNotFound)
    }

    async fn merchant_refund(
        &self,
        refund_id: RefundId,
        merchant_id: MerchantId,
    ) -> Result<Refund, ServiceError> {
        self.stores
            .refunds
            .get(refund_id)
            .await?
            .filter(|r| r.merchant_id == merchant_id)
            .ok_or(ServiceError::RefundNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refund::{CallbackStatus, RefundStatus};
    use crate::store::{AccountingEntryStore, OrderStore, RefundStore};
    use crate::testing::{self, TestGateway};
    use rust_decimal_macros::dec;

    async fn service() -> (SettlementService, testing::Fixture) {
        let fx = testing::Fixture::new().await;
        let service = SettlementService::new(
            fx.stores.stores(),
            GatewayRegistry::new().with(testing::HANDLER, TestGateway::accepting()),
            Arc::new(fx.rates.clone()),
            &RatesConfig::default(),
            &RefundConfig::default(),
        );
        (service, fx)
    }

    fn entry_request(entry_type: &str, order: &Order) -> CreateEntryRequest {
        CreateEntryRequest {
            entry_type: entry_type.to_string(),
            order_id: Some(order.id),
            refund_id: None,
            merchant_id: order.merchant_id,
            amount: Decimal::ZERO,
            currency: String::new(),
            status: None,
            date: None,
            reason: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_accounting_entry() {
        let (service, fx) = service().await;
        let order = fx.seed_order().await;

        let entry = service
            .create_accounting_entry(entry_request("method_fee", &order))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.entry_type, EntryType::MethodFee);
        assert_eq!(entry.amount, dec!(0.06));
        assert_eq!(fx.stores.entries.all().await, vec![entry]);
    }

    #[tokio::test]
    async fn test_unknown_entry_is_bad_data() {
        let (service, fx) = service().await;
        let order = fx.seed_order().await;

        let err = service
            .create_accounting_entry(entry_request("bonus", &order))
            .await
            .unwrap_err();
        assert_eq!(err.status(), ResponseStatus::BadData);
        assert_eq!(err.error_code(), "UNKNOWN_ENTRY");
        assert!(fx.stores.entries.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_documents_are_not_found() {
        let (service, fx) = service().await;
        let order = fx.seed_order().await;

        let mut request = entry_request("payment", &order);
        request.merchant_id = MerchantId::new();
        let err = service.create_accounting_entry(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::MerchantNotFound));
        assert_eq!(err.status(), ResponseStatus::NotFound);

        let mut request = entry_request("payment", &order);
        request.order_id = Some(OrderId::new());
        let err = service.create_accounting_entry(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::OrderNotFound));

        let mut request = entry_request("refund_fee", &order);
        request.refund_id = Some(RefundId::new());
        let err = service.create_accounting_entry(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::RefundNotFound));
    }

    #[tokio::test]
    async fn test_refund_entry_binds_original_order() {
        let (service, fx) = service().await;
        let order = fx.seed_order().await;
        let refund = testing::refund(&order, dec!(100), false);
        fx.stores.refunds.insert(&refund).await.unwrap();

        let mut request = entry_request("refund_fee", &order);
        request.order_id = None;
        request.refund_id = Some(refund.id);
        let entry = service
            .create_accounting_entry(request)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.amount, dec!(0.04));
        assert_eq!(entry.source, EntrySource::refund(refund.id.into_inner()));
    }

    #[tokio::test]
    async fn test_record_payment_entries_once() {
        let (service, fx) = service().await;
        let order = fx.seed_order().await;

        let first = service
            .record_payment_entries(order.id, order.merchant_id)
            .await
            .unwrap();
        assert_eq!(first.len(), 10);

        let second = service
            .record_payment_entries(order.id, order.merchant_id)
            .await
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(fx.stores.entries.all().await.len(), 10);
    }

    #[tokio::test]
    async fn test_record_payment_entries_requires_payment() {
        let (service, fx) = service().await;
        let mut order = testing::order();
        order.set_private_status(crate::order::PrivateStatus::PaymentSystemCreate);
        fx.stores.orders.insert(&order).await.unwrap();

        let err = service
            .record_payment_entries(order.id, order.merchant_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::OrderNotPaid(_)));
        assert_eq!(err.status(), ResponseStatus::BadData);
    }

    #[tokio::test]
    async fn test_refund_round_trip_through_facade() {
        let (service, fx) = service().await;
        let order = fx.seed_order().await;

        let refund = service
            .create_refund(CreateRefundRequest {
                order_id: order.id,
                merchant_id: order.merchant_id,
                amount: None,
                creator_id: "operator-1".to_string(),
                reason: "duplicate charge".to_string(),
                is_chargeback: false,
            })
            .await
            .unwrap();

        let (body, sig) = testing::signed_callback(&refund, "completed");
        let response = service
            .process_refund_callback(testing::HANDLER, &body, &sig)
            .await;
        assert_eq!(response, CallbackResponse::ok());

        let stored = service
            .get_refund(order.id, refund.id, order.merchant_id)
            .await
            .unwrap();
        assert_eq!(stored.status, RefundStatus::Completed);

        let page = service
            .list_refunds(order.id, order.merchant_id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.items[0].id, refund.id);

        let response = service
            .process_refund_callback(testing::HANDLER, &body, "00")
            .await;
        assert_eq!(response.status, CallbackStatus::BadData);
        assert_eq!(response.message, crate::refund::callback::messages::SIGNATURE_INCORRECT);
    }

    #[tokio::test]
    async fn test_manual_entry_does_not_suppress_payment_event() {
        let (service, fx) = service().await;
        let order = fx.seed_order().await;

        let mut request = entry_request("ps_tax_fx_fee", &order);
        request.amount = dec!(0.03);
        request.currency = "USD".to_string();
        service.create_accounting_entry(request).await.unwrap();

        let booked = service
            .record_payment_entries(order.id, order.merchant_id)
            .await
            .unwrap();
        let types: Vec<_> = booked.iter().map(|e| e.entry_type).collect();
        assert_eq!(types, EntryType::PAYMENT_EVENT);
        assert_eq!(fx.stores.entries.all().await.len(), 11);
    }

    #[tokio::test]
    async fn test_refund_entry_booked_early_does_not_suppress_completion() {
        let (service, fx) = service().await;
        let order = fx.seed_order().await;

        let refund = service
            .create_refund(CreateRefundRequest {
                order_id: order.id,
                merchant_id: order.merchant_id,
                amount: None,
                creator_id: "operator-1".to_string(),
                reason: "customer request".to_string(),
                is_chargeback: false,
            })
            .await
            .unwrap();

        let mut request = entry_request("refund_fee", &order);
        request.order_id = None;
        request.refund_id = Some(refund.id);
        service.create_accounting_entry(request).await.unwrap();

        let (body, sig) = testing::signed_callback(&refund, "completed");
        let response = service
            .process_refund_callback(testing::HANDLER, &body, &sig)
            .await;
        assert_eq!(response, CallbackResponse::ok());

        let entries = fx
            .stores
            .entries
            .list_by_source(&EntrySource::refund(refund.id.into_inner()))
            .await
            .unwrap();
        let types: Vec<_> = entries.iter().map(|e| e.entry_type).collect();
        assert_eq!(
            types,
            vec![
                EntryType::RefundFee,
                EntryType::Refund,
                EntryType::RefundFixedFee,
                EntryType::PsMarkupRefundFx,
                EntryType::RefundBody,
                EntryType::ReverseTaxFee,
                EntryType::PsMarkupReverseTaxFee,
            ]
        );
    }
}

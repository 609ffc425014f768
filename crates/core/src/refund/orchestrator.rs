//! Refund orchestration.
//!
//! `create_refund` validates the order, checks money-back costs up front and
//! hands the refund to the gateway. `process_refund_callback` authenticates
//! and interprets gateway callbacks; a `Completed` outcome creates the
//! mirror refund-order, records the refunded total on the original order
//! and books the refund-side entries.

use chrono::Utc;
use paysettle_shared::types::{MerchantId, OrderId, RefundId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::callback::RefundCallback;
use super::error::RefundError;
use super::signature;
use super::types::{OriginalOrder, Refund, RefundPayerData, RefundStatus};
use crate::accounting::{AccountingEntryEngine, EntryRequest, EntrySource, EntryType};
use crate::cost::UndoReason;
use crate::currency::CurrencyConverter;
use crate::gateway::{GatewayRefundStatus, GatewayRegistry, RefundOutcome};
use crate::merchant::Merchant;
use crate::order::{build_refund_order, proportional_amount, Order, OrderLedgerState};
use crate::store::Stores;

/// Inbound refund request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRefundRequest {
    /// Order to refund.
    pub order_id: OrderId,
    /// Merchant the order must belong to.
    pub merchant_id: MerchantId,
    /// Amount; the full charge when absent.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Who requested the refund.
    pub creator_id: String,
    /// Free-text reason.
    #[serde(default)]
    pub reason: String,
    /// True for chargebacks.
    #[serde(default)]
    pub is_chargeback: bool,
}

/// Creates refunds and processes their callbacks.
#[derive(Clone)]
pub struct RefundOrchestrator {
    stores: Stores,
    gateways: GatewayRegistry,
    state: OrderLedgerState,
    engine: AccountingEntryEngine,
    converter: CurrencyConverter,
    conflict_retries: u32,
}

impl RefundOrchestrator {
    /// Creates an orchestrator over its collaborators.
    pub fn new(
        stores: Stores,
        gateways: GatewayRegistry,
        state: OrderLedgerState,
        engine: AccountingEntryEngine,
        converter: CurrencyConverter,
        conflict_retries: u32,
    ) -> Self {
        Self {
            stores,
            gateways,
            state,
            engine,
            converter,
            conflict_retries,
        }
    }

    /// Registered gateway handler names, sorted.
    #[must_use]
    pub fn gateway_handlers(&self) -> Vec<String> {
        let mut handlers: Vec<String> = self.gateways.handlers().map(str::to_string).collect();
        handlers.sort_unstable();
        handlers
    }

    /// Validates and starts a refund.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`, `OrderAlreadyRefunded`, `RefundNotAllowed`,
    /// `RefundAlreadyExists`, `AmountInvalid` or `CostsRatesNotFound` before
    /// anything is persisted; a gateway failure leaves the refund
    /// `Rejected`.
    #[instrument(skip_all, fields(order_id = %request.order_id, chargeback = request.is_chargeback))]
    pub async fn create_refund(&self, request: CreateRefundRequest) -> Result<Refund, RefundError> {
        let order = self.merchant_order(request.order_id, request.merchant_id).await?;

        if order.private_status.is_reversed() {
            return Err(RefundError::OrderAlreadyRefunded);
        }
        if !OrderLedgerState::refund_allowed(&order) {
            return Err(RefundError::RefundNotAllowed(
                order.private_status.as_str().to_string(),
            ));
        }

        let existing = self.stores.refunds.find_by_order(order.id).await?;
        if order.refunded_amount > Decimal::ZERO || existing.iter().any(|r| !r.status.is_failed()) {
            return Err(RefundError::RefundAlreadyExists);
        }

        let amount = request.amount.unwrap_or(order.charge_amount);
        if amount <= Decimal::ZERO || amount > order.charge_amount {
            return Err(RefundError::AmountInvalid {
                requested: amount,
                charge: order.charge_amount,
            });
        }

        let merchant = self.merchant(order.merchant_id).await?;
        let undo = UndoReason::for_refund(request.is_chargeback);
        if !self.state.has_money_back_costs(&order, &merchant, undo).await? {
            return Err(RefundError::CostsRatesNotFound);
        }

        let handler = order.handler().ok_or(RefundError::PaymentMethodNotFound)?;
        let gateway = self.gateways.get(handler)?;

        let now = Utc::now();
        let mut refund = Refund {
            id: RefundId::new(),
            original_order: OriginalOrder {
                id: order.id,
                uuid: order.uuid,
            },
            merchant_id: order.merchant_id,
            external_id: String::new(),
            amount,
            currency: order.charge_currency.clone(),
            reason: request.reason,
            status: RefundStatus::Created,
            is_chargeback: request.is_chargeback,
            created_order_id: None,
            creator_id: request.creator_id,
            payer_data: RefundPayerData::default(),
            created_at: now,
            updated_at: now,
        };
        self.stores.refunds.insert(&refund).await?;

        match gateway.create_refund(&order, &refund).await {
            Ok(response) => {
                refund.external_id = response.external_id;
                let status = match response.status {
                    GatewayRefundStatus::InProgress => RefundStatus::InProgress,
                    GatewayRefundStatus::Rejected => RefundStatus::Rejected,
                };
                refund.set_status(status);
                self.stores.refunds.update(&refund).await?;
                info!(refund_id = %refund.id, status = %status, "Refund created");
                Ok(refund)
            }
            Err(err) => {
                warn!(refund_id = %refund.id, error = %err, "Gateway refused refund");
                refund.set_status(RefundStatus::Rejected);
                self.stores.refunds.update(&refund).await?;
                Err(err.into())
            }
        }
    }

    /// Loads a refund of an order owned by `merchant_id`.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` or `RefundNotFound`.
    pub async fn get_refund(
        &self,
        order_id: OrderId,
        refund_id: RefundId,
        merchant_id: MerchantId,
    ) -> Result<Refund, RefundError> {
        let order = self.merchant_order(order_id, merchant_id).await?;
        self.stores
            .refunds
            .get(refund_id)
            .await?
            .filter(|r| r.original_order.id == order.id)
            .ok_or(RefundError::RefundNotFound)
    }

    /// Lists refunds of an order owned by `merchant_id`.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`.
    pub async fn list_refunds(
        &self,
        order_id: OrderId,
        merchant_id: MerchantId,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Refund>, u64), RefundError> {
        let order = self.merchant_order(order_id, merchant_id).await?;
        Ok(self
            .stores
            .refunds
            .list_by_order(order.id, limit, offset)
            .await?)
    }

    /// Authenticates and applies a gateway refund callback.
    ///
    /// Returns the refund as stored after processing.
    ///
    /// # Errors
    ///
    /// Returns `CallbackHandlerIncorrect`, `CallbackRequestIncorrect`,
    /// `RefundNotFound`, `OrderNotFound` or `SignatureIncorrect` without
    /// touching state; `Temporary` for non-final statuses; interpretation
    /// failures leave the refund `Rejected` unless it is already terminal.
    #[instrument(skip(self, body, presented_signature))]
    pub async fn process_refund_callback(
        &self,
        handler: &str,
        body: &[u8],
        presented_signature: &str,
    ) -> Result<Refund, RefundError> {
        let gateway = self
            .gateways
            .get(handler)
            .map_err(|_| RefundError::CallbackHandlerIncorrect(handler.to_string()))?;

        let callback: RefundCallback = serde_json::from_slice(body)
            .map_err(|err| RefundError::CallbackRequestIncorrect(err.to_string()))?;

        let refund_id: RefundId = callback
            .merchant_order
            .id
            .parse()
            .map_err(|_| RefundError::RefundNotFound)?;
        let mut refund = self
            .stores
            .refunds
            .get(refund_id)
            .await?
            .ok_or(RefundError::RefundNotFound)?;
        let order = self
            .stores
            .orders
            .get(refund.original_order.id)
            .await?
            .ok_or(RefundError::OrderNotFound)?;

        let secret = order
            .payment_method
            .as_ref()
            .map(|m| m.params.secret_callback.as_str())
            .ok_or(RefundError::PaymentMethodNotFound)?;
        if !signature::verify(body, secret, presented_signature) {
            warn!(refund_id = %refund.id, "Callback signature mismatch");
            return Err(RefundError::SignatureIncorrect);
        }

        let outcome = match gateway.refund_outcome(&refund, &callback).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(refund_id = %refund.id, error = %err, "Callback interpretation failed");
                if !refund.status.is_terminal() {
                    refund.set_status(RefundStatus::Rejected);
                    self.stores.refunds.update(&refund).await?;
                }
                return Err(err.into());
            }
        };

        debug!(refund_id = %refund.id, ?outcome, "Callback interpreted");

        match outcome {
            RefundOutcome::Temporary => Err(RefundError::Temporary),
            RefundOutcome::Declined => {
                self.close_failed(refund, RefundStatus::PaymentSystemDeclined)
                    .await
            }
            RefundOutcome::Canceled => {
                self.close_failed(refund, RefundStatus::PaymentSystemCanceled)
                    .await
            }
            RefundOutcome::Completed => self.complete(refund, order, &callback).await,
        }
    }

    async fn close_failed(
        &self,
        mut refund: Refund,
        status: RefundStatus,
    ) -> Result<Refund, RefundError> {
        if refund.status.is_terminal() {
            if refund.status != status {
                warn!(
                    refund_id = %refund.id,
                    current = %refund.status,
                    reported = %status,
                    "Ignoring callback for finished refund"
                );
            }
            return Ok(refund);
        }

        refund.set_status(status);
        self.stores.refunds.update(&refund).await?;
        info!(refund_id = %refund.id, status = %status, "Refund closed");
        Ok(refund)
    }

    async fn complete(
        &self,
        mut refund: Refund,
        original: Order,
        callback: &RefundCallback,
    ) -> Result<Refund, RefundError> {
        if refund.status.is_failed() {
            warn!(refund_id = %refund.id, current = %refund.status, "Ignoring completion of failed refund");
            return Ok(refund);
        }

        let merchant = self.merchant(original.merchant_id).await?;
        let now = Utc::now();

        if let Some(payer) = &callback.refund_data.payer {
            refund.payer_data = payer.clone();
        }
        if !callback.refund_data.id.is_empty() {
            refund.external_id = callback.refund_data.id.clone();
        }

        let mirror = match refund.created_order_id {
            Some(mirror_id) => self
                .stores
                .orders
                .get(mirror_id)
                .await?
                .ok_or(RefundError::OrderNotFound)?,
            None => {
                let tax = proportional_amount(
                    original.tax.amount,
                    refund.amount,
                    original.charge_amount,
                );
                let tax_in_royalty = self
                    .converter
                    .convert_for_merchant(
                        original.merchant_id,
                        tax,
                        &original.tax.currency,
                        original.royalty_currency(),
                    )
                    .await?;
                let mirror = build_refund_order(&original, &refund, &merchant, tax_in_royalty, now);
                self.stores.orders.insert(&mirror).await?;
                refund.created_order_id = Some(mirror.id);
                info!(refund_id = %refund.id, mirror_order_id = %mirror.id, "Mirror order created");
                mirror
            }
        };

        refund.set_status(RefundStatus::Completed);
        self.stores.refunds.update(&refund).await?;

        self.record_refunded_total(&refund).await?;

        let source = EntrySource::refund(refund.id.into_inner());
        let booked = self.stores.entries.list_by_source(&source).await?;
        let pending = EntryType::unbooked(EntryType::refund_event(refund.is_chargeback), &booked);
        if pending.is_empty() {
            debug!(refund_id = %refund.id, "Refund entries already booked");
            return Ok(refund);
        }

        let request = EntryRequest {
            reason: refund.reason.clone(),
            ..EntryRequest::default()
        };
        let entries = self
            .engine
            .process(Some(&mirror), Some(&refund), &request, &pending)
            .await?;
        self.stores.entries.insert_many(&entries).await?;

        info!(refund_id = %refund.id, entries = entries.len(), "Refund completed");
        Ok(refund)
    }

    /// Recomputes the completed refund total and writes it with a version
    /// check, retrying on conflicts.
    async fn record_refunded_total(&self, refund: &Refund) -> Result<Order, RefundError> {
        let order_id = refund.original_order.id;

        for attempt in 0..=self.conflict_retries {
            let mut order = self
                .stores
                .orders
                .get(order_id)
                .await?
                .ok_or(RefundError::OrderNotFound)?;

            let total: Decimal = self
                .stores
                .refunds
                .find_by_order(order_id)
                .await?
                .iter()
                .filter(|r| r.status == RefundStatus::Completed)
                .map(|r| r.amount)
                .sum();

            if total > order.charge_amount {
                warn!(order_id = %order_id, %total, charge = %order.charge_amount, "Refunded total exceeds charge");
            }

            let settled = order.private_status.is_reversed() || total < order.charge_amount;
            if order.refunded_amount == total && settled {
                return Ok(order);
            }

            OrderLedgerState::apply_refunded_total(&mut order, total, refund, Utc::now());

            match self.stores.orders.update(&order).await {
                Ok(stored) => return Ok(stored),
                Err(err) if err.is_conflict() => {
                    warn!(order_id = %order_id, attempt, "Order changed concurrently, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(RefundError::ConcurrentModification(order_id.to_string()))
    }

    async fn merchant_order(
        &self,
        order_id: OrderId,
        merchant_id: MerchantId,
    ) -> Result<Order, RefundError> {
        self.stores
            .orders
            .get(order_id)
            .await?
            .filter(|o| o.merchant_id == merchant_id)
            .ok_or(RefundError::OrderNotFound)
    }

    async fn merchant(&self, merchant_id: MerchantId) -> Result<Merchant, RefundError> {
        self.stores
            .merchants
            .get(merchant_id)
            .await?
            .ok_or(RefundError::MerchantNotFound)
    }
}

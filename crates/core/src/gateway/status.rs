//! Default callback interpretation.

use rust_decimal::Decimal;

use super::{GatewayError, RefundOutcome};
use crate::refund::{Refund, RefundCallback};

/// Maps a callback status onto a [`RefundOutcome`].
///
/// Terminal callbacks must carry the refund's amount and currency.
///
/// # Errors
///
/// Returns `UnknownStatus` for statuses outside the protocol and
/// `Validation` for amount or currency mismatches.
pub fn interpret_callback(
    refund: &Refund,
    callback: &RefundCallback,
) -> Result<RefundOutcome, GatewayError> {
    let outcome = match callback.refund_data.status.to_lowercase().as_str() {
        "completed" | "success" | "refunded" => RefundOutcome::Completed,
        "declined" | "rejected" => RefundOutcome::Declined,
        "canceled" | "cancelled" => RefundOutcome::Canceled,
        "pending" | "processing" | "in_progress" | "created" => {
            return Ok(RefundOutcome::Temporary);
        }
        other => return Err(GatewayError::UnknownStatus(other.to_string())),
    };

    if !callback.refund_data.currency.eq_ignore_ascii_case(&refund.currency) {
        return Err(GatewayError::Validation(format!(
            "currency {} does not match refund currency {}",
            callback.refund_data.currency, refund.currency
        )));
    }

    if !amounts_match(callback.refund_data.amount, refund.amount) {
        return Err(GatewayError::Validation(format!(
            "amount {} does not match refund amount {}",
            callback.refund_data.amount, refund.amount
        )));
    }

    Ok(outcome)
}

fn amounts_match(reported: Decimal, expected: Decimal) -> bool {
    reported.normalize() == expected.normalize()
}

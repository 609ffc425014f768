//! Merchant and country reference data read by the settlement core.

use chrono::{DateTime, Utc};
use paysettle_shared::types::MerchantId;
use serde::{Deserialize, Serialize};

/// Merchant as seen by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    /// Merchant ID.
    pub id: MerchantId,
    /// Display name.
    pub name: String,
    /// Payout (royalty) currency, ISO 4217.
    pub payout_currency: String,
    /// Merchant category code.
    pub mcc_code: String,
    /// Operating company the merchant contracts with.
    pub operating_company_id: String,
    /// End of the period covered by the merchant's last VAT report.
    pub vat_report_cutoff: Option<DateTime<Utc>>,
}

/// Country entry used to map a payer's country onto a tariff region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code, upper case.
    pub iso_code_a2: String,
    /// English name.
    pub name: String,
    /// Tariff region the cost tables are keyed by.
    pub region: String,
    /// Whether payments from this country are accepted at all.
    pub payments_allowed: bool,
}

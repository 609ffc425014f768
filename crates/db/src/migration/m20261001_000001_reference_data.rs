//! Reference data read by the settlement core.
//!
//! Creates merchants, countries, exchange rates and the four cost tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(REFERENCE_SQL).await?;
        db.execute_unprepared(COST_TABLES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS money_back_cost_merchant CASCADE;
DROP TABLE IF EXISTS money_back_cost_system CASCADE;
DROP TABLE IF EXISTS payment_channel_cost_merchant CASCADE;
DROP TABLE IF EXISTS payment_channel_cost_system CASCADE;
DROP TABLE IF EXISTS exchange_rates CASCADE;
DROP TABLE IF EXISTS countries CASCADE;
DROP TABLE IF EXISTS merchants CASCADE;
",
        )
        .await?;
        Ok(())
    }
}

const REFERENCE_SQL: &str = r"
CREATE TABLE merchants (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    payout_currency VARCHAR(3) NOT NULL,
    mcc_code VARCHAR(4) NOT NULL,
    operating_company_id VARCHAR(64) NOT NULL,
    vat_report_cutoff TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE countries (
    iso_code_a2 VARCHAR(2) PRIMARY KEY CHECK (iso_code_a2 = UPPER(iso_code_a2)),
    name VARCHAR(255) NOT NULL,
    region VARCHAR(64) NOT NULL,
    payments_allowed BOOLEAN NOT NULL DEFAULT TRUE
);

CREATE TABLE exchange_rates (
    id UUID PRIMARY KEY,
    rate_kind VARCHAR(16) NOT NULL CHECK (rate_kind IN ('common', 'merchant')),
    merchant_id UUID REFERENCES merchants(id) ON DELETE CASCADE,
    from_currency VARCHAR(3) NOT NULL,
    to_currency VARCHAR(3) NOT NULL,
    rate NUMERIC(20, 10) NOT NULL CHECK (rate > 0),
    effective_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT chk_rate_merchant CHECK ((rate_kind = 'merchant') = (merchant_id IS NOT NULL)),
    CONSTRAINT chk_rate_pair CHECK (from_currency <> to_currency)
);

CREATE INDEX idx_exchange_rates_lookup
    ON exchange_rates(rate_kind, merchant_id, from_currency, to_currency, effective_at DESC);
";

const COST_TABLES_SQL: &str = r"
CREATE TABLE payment_channel_cost_system (
    id UUID PRIMARY KEY,
    name VARCHAR(64) NOT NULL,
    region VARCHAR(64) NOT NULL,
    country VARCHAR(2) NOT NULL DEFAULT '',
    mcc_code VARCHAR(4) NOT NULL,
    operating_company_id VARCHAR(64) NOT NULL,
    percent NUMERIC(10, 4) NOT NULL CHECK (percent >= 0),
    fix_amount NUMERIC(20, 4) NOT NULL CHECK (fix_amount >= 0),
    fix_amount_currency VARCHAR(3) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_pc_system_key
    ON payment_channel_cost_system(UPPER(name), region, country, mcc_code, operating_company_id)
    WHERE is_active;

CREATE TABLE payment_channel_cost_merchant (
    id UUID PRIMARY KEY,
    merchant_id UUID NOT NULL REFERENCES merchants(id) ON DELETE CASCADE,
    name VARCHAR(64) NOT NULL,
    payout_currency VARCHAR(3) NOT NULL,
    min_amount NUMERIC(20, 4) NOT NULL DEFAULT 0,
    region VARCHAR(64) NOT NULL,
    country VARCHAR(2) NOT NULL DEFAULT '',
    mcc_code VARCHAR(4) NOT NULL,
    operating_company_id VARCHAR(64) NOT NULL,
    method_percent NUMERIC(10, 4) NOT NULL CHECK (method_percent >= 0),
    method_fix_amount NUMERIC(20, 4) NOT NULL CHECK (method_fix_amount >= 0),
    method_fix_amount_currency VARCHAR(3) NOT NULL,
    ps_percent NUMERIC(10, 4) NOT NULL CHECK (ps_percent >= 0),
    ps_fixed_fee NUMERIC(20, 4) NOT NULL CHECK (ps_fixed_fee >= 0),
    ps_fixed_fee_currency VARCHAR(3) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_pc_merchant_key
    ON payment_channel_cost_merchant(merchant_id, UPPER(name), payout_currency, region, country, mcc_code, operating_company_id)
    WHERE is_active;

CREATE TABLE money_back_cost_system (
    id UUID PRIMARY KEY,
    name VARCHAR(64) NOT NULL,
    payout_currency VARCHAR(3) NOT NULL,
    undo_reason VARCHAR(16) NOT NULL CHECK (undo_reason IN ('reversal', 'chargeback')),
    region VARCHAR(64) NOT NULL,
    country VARCHAR(2) NOT NULL DEFAULT '',
    days_from INT NOT NULL DEFAULT 0 CHECK (days_from >= 0),
    payment_stage INT NOT NULL DEFAULT 1,
    mcc_code VARCHAR(4) NOT NULL,
    operating_company_id VARCHAR(64) NOT NULL,
    percent NUMERIC(10, 4) NOT NULL CHECK (percent >= 0),
    fix_amount NUMERIC(20, 4) NOT NULL CHECK (fix_amount >= 0),
    fix_amount_currency VARCHAR(3) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_mb_system_key
    ON money_back_cost_system(undo_reason, UPPER(name), payout_currency, region, country, payment_stage)
    WHERE is_active;

CREATE TABLE money_back_cost_merchant (
    id UUID PRIMARY KEY,
    merchant_id UUID NOT NULL REFERENCES merchants(id) ON DELETE CASCADE,
    name VARCHAR(64) NOT NULL,
    payout_currency VARCHAR(3) NOT NULL,
    undo_reason VARCHAR(16) NOT NULL CHECK (undo_reason IN ('reversal', 'chargeback')),
    region VARCHAR(64) NOT NULL,
    country VARCHAR(2) NOT NULL DEFAULT '',
    days_from INT NOT NULL DEFAULT 0 CHECK (days_from >= 0),
    payment_stage INT NOT NULL DEFAULT 1,
    mcc_code VARCHAR(4) NOT NULL,
    percent NUMERIC(10, 4) NOT NULL CHECK (percent >= 0),
    fix_amount NUMERIC(20, 4) NOT NULL CHECK (fix_amount >= 0),
    fix_amount_currency VARCHAR(3) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_mb_merchant_key
    ON money_back_cost_merchant(merchant_id, undo_reason, UPPER(name), payout_currency, region, country)
    WHERE is_active;
";

//! Ledger documents.
//!
//! Creates orders, refunds and the append-only accounting entries table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LEDGER_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS accounting_entries CASCADE;
DROP TABLE IF EXISTS refunds CASCADE;
DROP TABLE IF EXISTS orders CASCADE;
DROP FUNCTION IF EXISTS prevent_entry_modification();
",
        )
        .await?;
        Ok(())
    }
}

const LEDGER_SQL: &str = r"
CREATE TABLE orders (
    id UUID PRIMARY KEY,
    merchant_id UUID NOT NULL REFERENCES merchants(id),
    order_type VARCHAR(16) NOT NULL,
    private_status VARCHAR(64) NOT NULL,
    document JSONB NOT NULL,
    version BIGINT NOT NULL DEFAULT 0 CHECK (version >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_orders_merchant ON orders(merchant_id, created_at DESC);

CREATE TABLE refunds (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL REFERENCES orders(id),
    merchant_id UUID NOT NULL REFERENCES merchants(id),
    status VARCHAR(32) NOT NULL,
    document JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_refunds_order ON refunds(order_id, created_at DESC, id DESC);

CREATE TABLE accounting_entries (
    id UUID PRIMARY KEY,
    seq BIGSERIAL NOT NULL UNIQUE,
    entry_type VARCHAR(64) NOT NULL,
    source_id UUID NOT NULL,
    source_type VARCHAR(16) NOT NULL CHECK (source_type IN ('order', 'refund', 'merchant')),
    merchant_id UUID NOT NULL REFERENCES merchants(id),
    amount NUMERIC(20, 2) NOT NULL,
    currency VARCHAR(3) NOT NULL,
    reason TEXT NOT NULL DEFAULT '',
    status VARCHAR(32) NOT NULL,
    country VARCHAR(2) NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_entries_source ON accounting_entries(source_type, source_id, seq);
CREATE INDEX idx_entries_merchant ON accounting_entries(merchant_id, created_at);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION prevent_entry_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Accounting entries are append-only. Book a compensating entry instead.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_entry_mod
BEFORE UPDATE OR DELETE ON accounting_entries
FOR EACH ROW
EXECUTE FUNCTION prevent_entry_modification();
";

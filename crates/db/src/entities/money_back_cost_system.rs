//! `SeaORM` Entity for money_back_cost_system table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "money_back_cost_system")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub payout_currency: String,
    /// `reversal` or `chargeback`.
    pub undo_reason: String,
    pub region: String,
    pub country: String,
    pub days_from: i32,
    pub payment_stage: i32,
    pub mcc_code: String,
    pub operating_company_id: String,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))")]
    pub percent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub fix_amount: Decimal,
    pub fix_amount_currency: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

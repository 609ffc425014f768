//! `SeaORM` Entity for payment_channel_cost_merchant table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_channel_cost_merchant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub name: String,
    pub payout_currency: String,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub min_amount: Decimal,
    pub region: String,
    pub country: String,
    pub mcc_code: String,
    pub operating_company_id: String,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))")]
    pub method_percent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub method_fix_amount: Decimal,
    pub method_fix_amount_currency: String,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))")]
    pub ps_percent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub ps_fixed_fee: Decimal,
    pub ps_fixed_fee_currency: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::merchants::Entity",
        from = "Column::MerchantId",
        to = "super::merchants::Column::Id"
    )]
    Merchants,
}

impl Related<super::merchants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Merchants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Refund repository.

use async_trait::async_trait;
use paysettle_core::refund::Refund;
use paysettle_core::store::{RefundStore, StoreError};
use paysettle_shared::types::{OrderId, RefundId};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use super::error::RepositoryError;
use crate::entities::refunds;

const ENTITY: &str = "refund";

/// Repository for refund documents.
#[derive(Debug, Clone)]
pub struct RefundRepository {
    db: DatabaseConnection,
}

impl RefundRepository {
    /// Creates a new refund repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a refund by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the document cannot be decoded.
    pub async fn find_by_id(&self, id: RefundId) -> Result<Option<Refund>, RepositoryError> {
        let model = refunds::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;

        model.map(Self::to_refund).transpose()
    }

    /// Inserts a new refund.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the ID is taken.
    pub async fn create(&self, refund: &Refund) -> Result<(), RepositoryError> {
        let model = refunds::ActiveModel {
            id: Set(refund.id.into_inner()),
            order_id: Set(refund.original_order.id.into_inner()),
            merchant_id: Set(refund.merchant_id.into_inner()),
            status: Set(refund.status.as_str().to_string()),
            document: Set(serde_json::to_value(refund)?),
            created_at: Set(refund.created_at.into()),
            updated_at: Set(refund.updated_at.into()),
        };

        model
            .insert(&self.db)
            .await
            .map_err(|e| RepositoryError::on_insert(e, ENTITY, refund.id.into_inner()))?;
        Ok(())
    }

    /// Replaces a refund document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the refund does not exist.
    pub async fn replace(&self, refund: &Refund) -> Result<(), RepositoryError> {
        let id = refund.id.into_inner();
        let result = refunds::Entity::update_many()
            .col_expr(refunds::Column::Status, Expr::value(refund.status.as_str()))
            .col_expr(refunds::Column::Document, Expr::value(serde_json::to_value(refund)?))
            .col_expr(
                refunds::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(refund.updated_at)),
            )
            .filter(refunds::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    /// Lists one page of an order's refunds, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_order(
        &self,
        order_id: OrderId,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Refund>, u64), RepositoryError> {
        let query = refunds::Entity::find()
            .filter(refunds::Column::OrderId.eq(order_id.into_inner()));

        let total = query.clone().count(&self.db).await?;
        let models = query
            .order_by_desc(refunds::Column::CreatedAt)
            .order_by_desc(refunds::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.db)
            .await?;

        let refunds = models
            .into_iter()
            .map(Self::to_refund)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((refunds, total))
    }

    /// Returns every refund of an order, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_all_for_order(&self, order_id: OrderId) -> Result<Vec<Refund>, RepositoryError> {
        refunds::Entity::find()
            .filter(refunds::Column::OrderId.eq(order_id.into_inner()))
            .order_by_desc(refunds::Column::CreatedAt)
            .order_by_desc(refunds::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::to_refund)
            .collect()
    }

    fn to_refund(model: refunds::Model) -> Result<Refund, RepositoryError> {
        Ok(serde_json::from_value(model.document)?)
    }
}

#[async_trait]
impl RefundStore for RefundRepository {
    async fn get(&self, id: RefundId) -> Result<Option<Refund>, StoreError> {
        Ok(self.find_by_id(id).await?)
    }

    async fn insert(&self, refund: &Refund) -> Result<(), StoreError> {
        Ok(self.create(refund).await?)
    }

    async fn update(&self, refund: &Refund) -> Result<(), StoreError> {
        Ok(self.replace(refund).await?)
    }

    async fn list_by_order(
        &self,
        order_id: OrderId,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Refund>, u64), StoreError> {
        Ok(self.list_for_order(order_id, limit, offset).await?)
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Refund>, StoreError> {
        Ok(self.find_all_for_order(order_id).await?)
    }
}

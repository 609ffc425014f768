//! Order repository with optimistic version checks.

use async_trait::async_trait;
use chrono::Utc;
use paysettle_core::order::Order;
use paysettle_core::store::{OrderStore, StoreError};
use paysettle_shared::types::OrderId;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::debug;

use super::error::RepositoryError;
use crate::entities::orders;

const ENTITY: &str = "order";

/// Repository for order documents.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: DatabaseConnection,
}

impl OrderRepository {
    /// Creates a new order repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an order by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the document cannot be decoded.
    pub async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let model = orders::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;

        model.map(Self::to_order).transpose()
    }

    /// Inserts a new order.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the ID is taken.
    pub async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        let model = orders::ActiveModel {
            id: Set(order.id.into_inner()),
            merchant_id: Set(order.merchant_id.into_inner()),
            order_type: Set(order.order_type.as_str().to_string()),
            private_status: Set(order.private_status.as_str().to_string()),
            document: Set(serde_json::to_value(order)?),
            version: Set(order.version),
            created_at: Set(order.created_at.into()),
            updated_at: Set(order.updated_at.into()),
        };

        model
            .insert(&self.db)
            .await
            .map_err(|e| RepositoryError::on_insert(e, ENTITY, order.id.into_inner()))?;
        Ok(())
    }

    /// Replaces an order if the stored version still equals `order.version`.
    ///
    /// Returns the stored document with the bumped version.
    ///
    /// # Errors
    ///
    /// Returns `VersionConflict` if another writer got there first and
    /// `NotFound` if the order does not exist.
    pub async fn update_versioned(&self, order: &Order) -> Result<Order, RepositoryError> {
        let id = order.id.into_inner();
        let mut next = order.clone();
        next.version += 1;
        next.updated_at = Utc::now();

        let result = orders::Entity::update_many()
            .col_expr(
                orders::Column::PrivateStatus,
                Expr::value(next.private_status.as_str()),
            )
            .col_expr(orders::Column::Document, Expr::value(serde_json::to_value(&next)?))
            .col_expr(orders::Column::Version, Expr::value(next.version))
            .col_expr(
                orders::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(next.updated_at)),
            )
            .filter(orders::Column::Id.eq(id))
            .filter(orders::Column::Version.eq(order.version))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            let stored = orders::Entity::find_by_id(id).one(&self.db).await?;
            return Err(match stored {
                Some(stored) => {
                    debug!(
                        order_id = %id,
                        expected = order.version,
                        actual = stored.version,
                        "Order version conflict"
                    );
                    RepositoryError::VersionConflict {
                        entity: ENTITY,
                        id,
                        expected: order.version,
                        actual: stored.version,
                    }
                }
                None => RepositoryError::NotFound { entity: ENTITY, id },
            });
        }

        Ok(next)
    }

    fn to_order(model: orders::Model) -> Result<Order, RepositoryError> {
        let mut order: Order = serde_json::from_value(model.document)?;
        order.version = model.version;
        Ok(order)
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.find_by_id(id).await?)
    }

    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        Ok(self.create(order).await?)
    }

    async fn update(&self, order: &Order) -> Result<Order, StoreError> {
        Ok(self.update_versioned(order).await?)
    }
}

//! Country repository.

use async_trait::async_trait;
use paysettle_core::merchant::Country;
use paysettle_core::store::{CountryStore, StoreError};
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use super::error::RepositoryError;
use crate::entities::countries;

/// Repository for country reference data.
#[derive(Debug, Clone)]
pub struct CountryRepository {
    db: DatabaseConnection,
}

impl CountryRepository {
    /// Creates a new country repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a country by ISO code, case insensitive.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_code(&self, iso_code_a2: &str) -> Result<Option<Country>, RepositoryError> {
        let model = countries::Entity::find_by_id(iso_code_a2.to_uppercase())
            .one(&self.db)
            .await?;

        Ok(model.map(|m| Country {
            iso_code_a2: m.iso_code_a2,
            name: m.name,
            region: m.region,
            payments_allowed: m.payments_allowed,
        }))
    }

    /// Inserts or replaces a country.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn upsert(&self, country: &Country) -> Result<(), RepositoryError> {
        let model = countries::ActiveModel {
            iso_code_a2: Set(country.iso_code_a2.to_uppercase()),
            name: Set(country.name.clone()),
            region: Set(country.region.clone()),
            payments_allowed: Set(country.payments_allowed),
        };

        countries::Entity::insert(model)
            .on_conflict(
                OnConflict::column(countries::Column::IsoCodeA2)
                    .update_columns([
                        countries::Column::Name,
                        countries::Column::Region,
                        countries::Column::PaymentsAllowed,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CountryStore for CountryRepository {
    async fn get(&self, iso_code_a2: &str) -> Result<Option<Country>, StoreError> {
        Ok(self.find_by_code(iso_code_a2).await?)
    }
}

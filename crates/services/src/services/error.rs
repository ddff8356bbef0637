use db::{MissingReference, StoreError};
use strum_macros::Display;
use thiserror::Error;

use super::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Entity {
    Client,
    Category,
    Product,
    Order,
}

#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Store(StoreError),
}

impl CommerceError {
    pub fn not_found(entity: Entity, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for CommerceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(message) => {
                CommerceError::Conflict(describe_unique_violation(&message))
            }
            StoreError::MissingReference(MissingReference::Client(id)) => {
                CommerceError::not_found(Entity::Client, id)
            }
            StoreError::MissingReference(MissingReference::Product(id)) => {
                CommerceError::not_found(Entity::Product, id)
            }
            StoreError::ForeignKeyViolation => CommerceError::Conflict(
                "the record references a missing entity or is still referenced".to_string(),
            ),
            err @ StoreError::Database(_) => CommerceError::Store(err),
        }
    }
}

/// Turn SQLite's "UNIQUE constraint failed: table.column" into a caller-facing message.
fn describe_unique_violation(message: &str) -> String {
    let target = message
        .rsplit(':')
        .next()
        .map(str::trim)
        .unwrap_or_default();
    match target {
        "clients.email" => "email is already registered".to_string(),
        "categories.name" => "category already exists".to_string(),
        "products.sku" => "sku is already in use".to_string(),
        "products.alt_code" => "alt_code is already in use".to_string(),
        "products.legacy_code" => "legacy_code is already in use".to_string(),
        t if t.starts_with("product_equivalences") => "equivalence already exists".to_string(),
        t if t.starts_with("order_items") => "order contains the same product twice".to_string(),
        _ => "record already exists".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violations_become_conflicts() {
        let err: CommerceError = StoreError::UniqueViolation(
            "UNIQUE constraint failed: clients.email".to_string(),
        )
        .into();
        assert!(matches!(&err, CommerceError::Conflict(m) if m == "email is already registered"));

        let err: CommerceError = StoreError::UniqueViolation(
            "UNIQUE constraint failed: product_equivalences.product_id, product_equivalences.equivalent_id"
                .to_string(),
        )
        .into();
        assert!(matches!(&err, CommerceError::Conflict(m) if m == "equivalence already exists"));
    }

    #[test]
    fn missing_references_become_not_found() {
        let id = uuid::Uuid::new_v4();
        let err: CommerceError = StoreError::MissingReference(MissingReference::Product(id)).into();
        assert_eq!(err.to_string(), format!("product {id} not found"));

        let err: CommerceError = StoreError::MissingReference(MissingReference::Client(id)).into();
        assert!(matches!(err, CommerceError::NotFound { entity: Entity::Client, .. }));
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = CommerceError::not_found(Entity::Product, "abc");
        assert_eq!(err.to_string(), "product abc not found");
    }
}

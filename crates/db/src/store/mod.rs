//! Storage adapter interface.
//!
//! Everything above the database talks to a [`Store`]; [`sqlite::SqliteStore`]
//! is the SQLite implementation. Operations that must be all-or-nothing
//! (order plus its lines, line replacement, guarded deletes, equivalence
//! pairs) are single methods so that each implementation can run them in one
//! transaction, together with the reference checks that guard them.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    association_rule::{AssociationRule, NewAssociationRule, RuleAntecedent, RuleConsequent},
    category::Category,
    client::{Client, ClientFilter, ClientPatch, NewClient},
    order::{NewOrder, Order, OrderFilter, OrderLine, OrderUpdate, OrderWithItems},
    product::{NewProduct, Product, ProductFilter, ProductPatch, ProductSales},
    product_equivalence::{EquivalentProduct, NewEquivalence},
};

mod integrity;
pub mod sqlite;

pub const DEFAULT_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE_LIMIT: i64 = 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("referenced record does not exist or is still referenced")]
    ForeignKeyViolation,
    #[error("{0} does not exist")]
    MissingReference(MissingReference),
}

/// A record named by a write that was not there when the write ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingReference {
    #[error("client {0}")]
    Client(Uuid),
    #[error("product {0}")]
    Product(Uuid),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation;
            }
        }
        StoreError::Database(err)
    }
}

/// Result of a guarded delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Refused; the record is referenced this many times
    Referenced(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub skip: i64,
}

impl Pagination {
    pub fn new(limit: Option<i64>, skip: Option<i64>) -> Self {
        Self {
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
            skip: skip.unwrap_or(0).max(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    // Clients
    async fn create_client(&self, id: Uuid, data: &NewClient) -> Result<Client, StoreError>;
    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, StoreError>;
    async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: Pagination,
    ) -> Result<Vec<Client>, StoreError>;
    async fn update_client(
        &self,
        id: Uuid,
        patch: &ClientPatch,
    ) -> Result<Option<Client>, StoreError>;
    /// Delete unless an order references the client, checked in the same transaction.
    async fn delete_client(&self, id: Uuid) -> Result<DeleteOutcome, StoreError>;
    async fn count_client_orders(&self, id: Uuid) -> Result<i64, StoreError>;
    async fn list_client_orders(&self, id: Uuid) -> Result<Vec<Order>, StoreError>;

    // Categories
    async fn create_category(&self, name: &str) -> Result<Category, StoreError>;
    async fn find_category(&self, name: &str) -> Result<Option<Category>, StoreError>;
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn list_category_products(
        &self,
        name: &str,
        limit: i64,
    ) -> Result<Vec<ProductSales>, StoreError>;

    // Products
    async fn create_product(&self, id: Uuid, data: &NewProduct) -> Result<Product, StoreError>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, StoreError>;
    async fn lookup_products(&self, code: &str) -> Result<Vec<Product>, StoreError>;
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<Vec<Product>, StoreError>;
    async fn update_product(
        &self,
        id: Uuid,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, StoreError>;
    /// Delete unless an order line references the product, checked in the same transaction.
    async fn delete_product(&self, id: Uuid) -> Result<DeleteOutcome, StoreError>;
    async fn count_product_lines(&self, id: Uuid) -> Result<i64, StoreError>;

    // Equivalences
    async fn equivalence_exists(&self, product_a: Uuid, product_b: Uuid)
    -> Result<bool, StoreError>;
    /// Store both directions of the link atomically.
    async fn create_equivalence(&self, data: &NewEquivalence) -> Result<(), StoreError>;
    async fn list_equivalences(&self, product_id: Uuid)
    -> Result<Vec<EquivalentProduct>, StoreError>;

    // Orders
    /// Write the order row and all of its lines atomically, after checking in the
    /// same transaction that the client and every product exist.
    async fn create_order(&self, id: Uuid, data: &NewOrder) -> Result<OrderWithItems, StoreError>;
    async fn find_order(&self, id: Uuid) -> Result<Option<OrderWithItems>, StoreError>;
    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Pagination,
    ) -> Result<Vec<Order>, StoreError>;
    /// Update the order row and, when `data.items` is set, replace every line, atomically.
    /// References are checked inside the same transaction.
    async fn update_order(
        &self,
        id: Uuid,
        data: &OrderUpdate,
    ) -> Result<Option<OrderWithItems>, StoreError>;
    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn list_order_lines(&self, id: Uuid) -> Result<Vec<OrderLine>, StoreError>;

    // Association rules
    async fn rules_with_any_antecedent(&self, product_ids: &[Uuid]) -> Result<Vec<i64>, StoreError>;
    async fn rule_antecedents(&self, rule_ids: &[i64]) -> Result<Vec<RuleAntecedent>, StoreError>;
    async fn rule_consequents(&self, rule_ids: &[i64]) -> Result<Vec<RuleConsequent>, StoreError>;
    async fn create_association_rule(
        &self,
        data: &NewAssociationRule,
    ) -> Result<AssociationRule, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default(), Pagination { limit: 100, skip: 0 });
        assert_eq!(Pagination::new(Some(0), Some(-5)), Pagination { limit: 1, skip: 0 });
        assert_eq!(Pagination::new(Some(5000), Some(20)), Pagination { limit: 1000, skip: 20 });
    }
}

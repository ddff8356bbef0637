//! SQLite implementation of [`Store`].

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::{DeleteOutcome, Pagination, Store, StoreError, integrity};
use crate::models::{
    association_rule::{AssociationRule, NewAssociationRule, RuleAntecedent, RuleConsequent},
    category::Category,
    client::{Client, ClientFilter, ClientPatch, NewClient},
    order::{NewOrder, Order, OrderFilter, OrderItem, OrderLine, OrderUpdate, OrderWithItems},
    product::{NewProduct, Product, ProductFilter, ProductPatch, ProductSales},
    product_equivalence::{EquivalentProduct, NewEquivalence, ProductEquivalence},
};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_client(&self, id: Uuid, data: &NewClient) -> Result<Client, StoreError> {
        Ok(Client::create(&self.pool, id, data).await?)
    }

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        Ok(Client::find_by_id(&self.pool, id).await?)
    }

    async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: Pagination,
    ) -> Result<Vec<Client>, StoreError> {
        Ok(Client::list(&self.pool, filter, page).await?)
    }

    async fn update_client(
        &self,
        id: Uuid,
        patch: &ClientPatch,
    ) -> Result<Option<Client>, StoreError> {
        Ok(Client::update(&self.pool, id, patch).await?)
    }

    async fn delete_client(&self, id: Uuid) -> Result<DeleteOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let references = Order::count_by_client_id(&mut *tx, id).await?;
        if references > 0 {
            debug!(client_id = %id, references, "Client delete refused");
            return Ok(DeleteOutcome::Referenced(references));
        }

        let deleted = Client::delete(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(if deleted == 0 {
            DeleteOutcome::NotFound
        } else {
            DeleteOutcome::Deleted
        })
    }

    async fn count_client_orders(&self, id: Uuid) -> Result<i64, StoreError> {
        Ok(Order::count_by_client_id(&self.pool, id).await?)
    }

    async fn list_client_orders(&self, id: Uuid) -> Result<Vec<Order>, StoreError> {
        Ok(Order::find_by_client_id(&self.pool, id).await?)
    }

    async fn create_category(&self, name: &str) -> Result<Category, StoreError> {
        Ok(Category::create(&self.pool, name).await?)
    }

    async fn find_category(&self, name: &str) -> Result<Option<Category>, StoreError> {
        Ok(Category::find_by_name(&self.pool, name).await?)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(Category::find_all(&self.pool).await?)
    }

    async fn list_category_products(
        &self,
        name: &str,
        limit: i64,
    ) -> Result<Vec<ProductSales>, StoreError> {
        Ok(Product::find_by_category_ranked(&self.pool, name, limit).await?)
    }

    async fn create_product(&self, id: Uuid, data: &NewProduct) -> Result<Product, StoreError> {
        Ok(Product::create(&self.pool, id, data).await?)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(Product::find_by_id(&self.pool, id).await?)
    }

    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, StoreError> {
        Ok(Product::find_by_ids(&self.pool, ids).await?)
    }

    async fn lookup_products(&self, code: &str) -> Result<Vec<Product>, StoreError> {
        Ok(Product::lookup(&self.pool, code).await?)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<Vec<Product>, StoreError> {
        Ok(Product::list(&self.pool, filter, page).await?)
    }

    async fn update_product(
        &self,
        id: Uuid,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, StoreError> {
        Ok(Product::update(&self.pool, id, patch).await?)
    }

    async fn delete_product(&self, id: Uuid) -> Result<DeleteOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let references = OrderItem::count_by_product_id(&mut *tx, id).await?;
        if references > 0 {
            debug!(product_id = %id, references, "Product delete refused");
            return Ok(DeleteOutcome::Referenced(references));
        }

        let deleted = Product::delete(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(if deleted == 0 {
            DeleteOutcome::NotFound
        } else {
            DeleteOutcome::Deleted
        })
    }

    async fn count_product_lines(&self, id: Uuid) -> Result<i64, StoreError> {
        Ok(OrderItem::count_by_product_id(&self.pool, id).await?)
    }

    async fn equivalence_exists(
        &self,
        product_a: Uuid,
        product_b: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(ProductEquivalence::exists(&self.pool, product_a, product_b).await?)
    }

    async fn create_equivalence(&self, data: &NewEquivalence) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        ProductEquivalence::create_pair(&mut tx, data).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_equivalences(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<EquivalentProduct>, StoreError> {
        Ok(ProductEquivalence::find_for_product(&self.pool, product_id).await?)
    }

    async fn create_order(&self, id: Uuid, data: &NewOrder) -> Result<OrderWithItems, StoreError> {
        let mut tx = self.pool.begin().await?;

        let product_ids: Vec<Uuid> = data.items.iter().map(|item| item.product_id).collect();
        integrity::validate_order_references(&mut tx, data.client_id, &product_ids).await?;

        let order = Order::create(&mut *tx, id, data).await?;
        let items = OrderItem::insert_all(&mut tx, id, &data.items).await?;

        tx.commit().await?;
        debug!(order_id = %id, lines = items.len(), "Order written");

        Ok(OrderWithItems { order, items })
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<OrderWithItems>, StoreError> {
        let Some(order) = Order::find_by_id(&self.pool, id).await? else {
            return Ok(None);
        };
        let items = OrderItem::find_by_order_id(&self.pool, id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Pagination,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(Order::list(&self.pool, filter, page).await?)
    }

    async fn update_order(
        &self,
        id: Uuid,
        data: &OrderUpdate,
    ) -> Result<Option<OrderWithItems>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let product_ids: Vec<Uuid> = data
            .items
            .iter()
            .flatten()
            .map(|item| item.product_id)
            .collect();
        integrity::validate_order_references(&mut tx, data.client_id, &product_ids).await?;

        let Some(order) = Order::update(&mut *tx, id, data).await? else {
            return Ok(None);
        };

        let items = match &data.items {
            Some(replacement) => {
                let removed = OrderItem::delete_by_order_id(&mut *tx, id).await?;
                let inserted = OrderItem::insert_all(&mut tx, id, replacement).await?;
                debug!(order_id = %id, removed, inserted = inserted.len(), "Order lines replaced");
                inserted
            }
            None => OrderItem::find_by_order_id(&mut *tx, id).await?,
        };

        tx.commit().await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError> {
        // Lines go with the order through ON DELETE CASCADE.
        Ok(Order::delete(&self.pool, id).await? > 0)
    }

    async fn list_order_lines(&self, id: Uuid) -> Result<Vec<OrderLine>, StoreError> {
        Ok(OrderLine::find_by_order_id(&self.pool, id).await?)
    }

    async fn rules_with_any_antecedent(
        &self,
        product_ids: &[Uuid],
    ) -> Result<Vec<i64>, StoreError> {
        Ok(AssociationRule::find_ids_with_any_antecedent(&self.pool, product_ids).await?)
    }

    async fn rule_antecedents(&self, rule_ids: &[i64]) -> Result<Vec<RuleAntecedent>, StoreError> {
        Ok(AssociationRule::find_antecedents(&self.pool, rule_ids).await?)
    }

    async fn rule_consequents(&self, rule_ids: &[i64]) -> Result<Vec<RuleConsequent>, StoreError> {
        Ok(AssociationRule::find_consequents(&self.pool, rule_ids).await?)
    }

    async fn create_association_rule(
        &self,
        data: &NewAssociationRule,
    ) -> Result<AssociationRule, StoreError> {
        let mut tx = self.pool.begin().await?;
        let rule = AssociationRule::create(&mut tx, data).await?;
        tx.commit().await?;
        Ok(rule)
    }
}

//! Offline data loading.
//!
//! Records go through the same validators and integrity checks as the HTTP
//! path, one store transaction per record, in sequential batches. A bad record
//! is logged and skipped; it never aborts the run.

use std::{future::Future, sync::Arc};

use db::{Store, models::association_rule::NewAssociationRule};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    categories::CategoryService,
    clients::ClientService,
    error::CommerceError,
    orders::OrderService,
    products::ProductService,
    validation::{CreateCategory, CreateClient, CreateOrder, CreateProduct, validate_rule},
};

pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub clients: Vec<Seeded<CreateClient>>,
    #[serde(default)]
    pub products: Vec<Seeded<CreateProduct>>,
    #[serde(default)]
    pub orders: Vec<Seeded<CreateOrder>>,
    #[serde(default)]
    pub rules: Vec<NewAssociationRule>,
}

/// A request body plus an optional fixed id, so other records can point at it.
#[derive(Debug, Clone, Deserialize)]
pub struct Seeded<T> {
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub record: T,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedCount {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub categories: SeedCount,
    pub clients: SeedCount,
    pub products: SeedCount,
    pub orders: SeedCount,
    pub rules: SeedCount,
}

pub struct Seeder {
    store: Arc<dyn Store>,
    batch_size: usize,
}

impl Seeder {
    pub fn new(store: Arc<dyn Store>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Load categories, clients, products, orders, then rules, in that order.
    pub async fn run(&self, doc: &SeedDocument) -> SeedReport {
        let categories = CategoryService::new(self.store.clone());
        let clients = ClientService::new(self.store.clone());
        let products = ProductService::new(self.store.clone());
        let orders = OrderService::new(self.store.clone());

        let report = SeedReport {
            categories: self
                .load("categories", &doc.categories, |name| {
                    let input = CreateCategory {
                        name: Some(name.clone()),
                    };
                    let categories = categories.clone();
                    async move { categories.create(&input).await.map(|_| ()) }
                })
                .await,
            clients: self
                .load("clients", &doc.clients, |seeded| {
                    let clients = clients.clone();
                    async move {
                        let id = seeded.id.unwrap_or_else(Uuid::new_v4);
                        clients.create_with_id(id, &seeded.record).await.map(|_| ())
                    }
                })
                .await,
            products: self
                .load("products", &doc.products, |seeded| {
                    let products = products.clone();
                    async move {
                        let id = seeded.id.unwrap_or_else(Uuid::new_v4);
                        products.create_with_id(id, &seeded.record).await.map(|_| ())
                    }
                })
                .await,
            orders: self
                .load("orders", &doc.orders, |seeded| {
                    let orders = orders.clone();
                    async move {
                        let id = seeded.id.unwrap_or_else(Uuid::new_v4);
                        orders.create_with_id(id, &seeded.record).await.map(|_| ())
                    }
                })
                .await,
            rules: self
                .load("rules", &doc.rules, |rule| self.insert_rule(rule))
                .await,
        };

        info!(?report, "Seeding finished");
        report
    }

    async fn insert_rule(&self, rule: &NewAssociationRule) -> Result<(), CommerceError> {
        validate_rule(rule)?;
        let products = ProductService::new(self.store.clone());
        for id in rule.antecedents.iter().chain(&rule.consequents) {
            products.get(*id).await?;
        }
        self.store.create_association_rule(rule).await?;
        Ok(())
    }

    async fn load<'a, T, F, Fut>(&self, entity: &str, records: &'a [T], mut insert: F) -> SeedCount
    where
        F: FnMut(&'a T) -> Fut,
        Fut: Future<Output = Result<(), CommerceError>>,
    {
        let mut count = SeedCount::default();
        let batches = records.len().div_ceil(self.batch_size);
        for (batch, chunk) in records.chunks(self.batch_size).enumerate() {
            for (offset, record) in chunk.iter().enumerate() {
                match insert(record).await {
                    Ok(()) => count.inserted += 1,
                    Err(err) => {
                        count.skipped += 1;
                        warn!(
                            entity,
                            index = batch * self.batch_size + offset,
                            error = %err,
                            "Skipping seed record"
                        );
                    }
                }
            }
            info!(
                entity,
                batch = batch + 1,
                batches,
                inserted = count.inserted,
                skipped = count.skipped,
                "Seed batch done"
            );
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use db::{DBService, Pagination, models::client::ClientFilter};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn loads_document_and_skips_bad_records() {
        let store: Arc<dyn Store> = Arc::new(DBService::new_in_memory().await.unwrap().store());
        let ana = Uuid::new_v4();
        let lamp = Uuid::new_v4();
        let bulb = Uuid::new_v4();

        let doc: SeedDocument = serde_json::from_value(json!({
            "categories": ["Luz", "Luz", "Hogar"],
            "clients": [
                { "id": ana, "name": "Ana", "email": "ana@example.com", "gender": "F" },
                { "name": "Dup", "email": "ANA@example.com", "gender": "F" },
                { "name": "Luis", "email": "luis@example.com", "gender": "M", "country": "NI" }
            ],
            "products": [
                { "id": lamp, "name": "Lamp", "category": "Luz", "sku": "L-1" },
                { "id": bulb, "name": "Bulb", "category": "Luz" },
                { "name": "Chair", "category": "Muebles" }
            ],
            "orders": [
                { "client_id": ana, "channel": "WEB",
                  "items": [{ "product_id": lamp, "quantity": 1, "unit_price": 15000 },
                            { "product_id": bulb, "quantity": 2, "unit_price": "1000" }] },
                { "client_id": ana, "channel": "WEB", "items": [] }
            ],
            "rules": [
                { "antecedents": [lamp], "consequents": [bulb],
                  "support": 0.1, "confidence": 0.7, "lift": 1.5 },
                { "antecedents": [lamp], "consequents": [Uuid::new_v4()],
                  "support": 0.1, "confidence": 0.7, "lift": 1.5 }
            ]
        }))
        .unwrap();

        let report = Seeder::new(store.clone(), 2).run(&doc).await;
        assert_eq!(report.categories, SeedCount { inserted: 2, skipped: 1 });
        assert_eq!(report.clients, SeedCount { inserted: 2, skipped: 1 });
        assert_eq!(report.products, SeedCount { inserted: 2, skipped: 1 });
        assert_eq!(report.orders, SeedCount { inserted: 1, skipped: 1 });
        assert_eq!(report.rules, SeedCount { inserted: 1, skipped: 1 });

        let clients = store
            .list_clients(&ClientFilter::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(store.count_client_orders(ana).await.unwrap(), 1);
        assert_eq!(store.rules_with_any_antecedent(&[lamp]).await.unwrap().len(), 1);
    }
}

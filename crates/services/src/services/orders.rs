use std::{collections::BTreeSet, sync::Arc};

use chrono::{DateTime, Utc};
use db::{
    Pagination, Store,
    models::{
        amount::Amount,
        order::{Currency, Order, OrderFilter, OrderLine, OrderWithItems},
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    error::{CommerceError, Entity},
    reconciler::line_subtotal,
    validation::{
        CreateOrder, UpdateOrder, ValidationError, parse_channel, parse_currency,
        validate_new_order, validate_order_update,
    },
};

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct OrderQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    pub channel: Option<String>,
    pub currency: Option<String>,
    pub client_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Line item as shown to the admin, with product details and subtotal
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct OrderLineView {
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    #[ts(type = "string")]
    pub unit_price: Amount,
    #[ts(type = "string")]
    pub subtotal: Amount,
}

impl TryFrom<OrderLine> for OrderLineView {
    type Error = ValidationError;

    fn try_from(line: OrderLine) -> Result<Self, Self::Error> {
        let subtotal = line_subtotal(line.quantity, line.unit_price).ok_or_else(|| {
            ValidationError::new(
                "subtotal",
                format!("out of range for product {}", line.product_id),
            )
        })?;
        Ok(Self {
            subtotal,
            product_id: line.product_id,
            name: line.name,
            category: line.category,
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct OrderStats {
    pub order_id: Uuid,
    pub currency: Currency,
    #[ts(type = "string")]
    pub total: Amount,
    pub line_count: usize,
    pub distinct_products: usize,
    pub total_units: i64,
    pub categories: Vec<String>,
}

impl OrderStats {
    pub fn from_lines(order: &Order, lines: &[OrderLine]) -> Self {
        let products: BTreeSet<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let categories: BTreeSet<&str> = lines.iter().map(|l| l.category.as_str()).collect();
        Self {
            order_id: order.id,
            currency: order.currency,
            total: order.total,
            line_count: lines.len(),
            distinct_products: products.len(),
            total_units: lines.iter().fold(0_i64, |units, l| units.saturating_add(l.quantity)),
            categories: categories.into_iter().map(str::to_string).collect(),
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: &CreateOrder) -> Result<OrderWithItems, CommerceError> {
        self.create_with_id(Uuid::new_v4(), input).await
    }

    pub(crate) async fn create_with_id(
        &self,
        id: Uuid,
        input: &CreateOrder,
    ) -> Result<OrderWithItems, CommerceError> {
        let data = validate_new_order(input, Utc::now())?;
        // The store checks the client and products in the write transaction.
        let order = self.store.create_order(id, &data).await?;
        info!(
            order_id = %order.id,
            client_id = %order.client_id,
            lines = order.items.len(),
            total = %order.total,
            currency = %order.currency,
            "Order created"
        );
        Ok(order)
    }

    pub async fn get(&self, id: Uuid) -> Result<OrderWithItems, CommerceError> {
        self.store
            .find_order(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Order, id))
    }

    pub async fn list(&self, query: &OrderQuery) -> Result<Vec<Order>, CommerceError> {
        let filter = OrderFilter {
            channel: query.channel.as_deref().map(parse_channel).transpose()?,
            currency: query.currency.as_deref().map(parse_currency).transpose()?,
            client_id: query.client_id,
            from: query.from,
            to: query.to,
        };
        let page = Pagination::new(query.limit, query.skip);
        Ok(self.store.list_orders(&filter, page).await?)
    }

    /// Merge, re-validate and write. Supplied items replace every stored line atomically.
    pub async fn update(
        &self,
        id: Uuid,
        input: &UpdateOrder,
    ) -> Result<OrderWithItems, CommerceError> {
        let existing = self.get(id).await?;
        let update = validate_order_update(&existing, input)?;

        let order = self
            .store
            .update_order(id, &update)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Order, id))?;
        info!(
            order_id = %id,
            lines_replaced = update.items.is_some(),
            total = %order.total,
            "Order updated"
        );
        Ok(order)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CommerceError> {
        if !self.store.delete_order(id).await? {
            return Err(CommerceError::not_found(Entity::Order, id));
        }
        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    pub async fn lines(&self, id: Uuid) -> Result<Vec<OrderLineView>, CommerceError> {
        self.get(id).await?;
        let lines = self.store.list_order_lines(id).await?;
        Ok(lines
            .into_iter()
            .map(OrderLineView::try_from)
            .collect::<Result<_, _>>()?)
    }

    pub async fn stats(&self, id: Uuid) -> Result<OrderStats, CommerceError> {
        let order = self.get(id).await?;
        let lines = self.store.list_order_lines(id).await?;
        Ok(OrderStats::from_lines(&order, &lines))
    }
}

#[cfg(test)]
mod tests {
    use db::{
        DBService,
        models::{client::SalesChannel, product::NewProduct},
    };
    use serde_json::json;

    use super::*;
    use crate::services::{
        clients::ClientService,
        products::ProductService,
        validation::{CreateClient, OrderItemInput},
    };

    struct Fixture {
        store: Arc<dyn Store>,
        orders: OrderService,
        client: Uuid,
        lamp: Uuid,
        rug: Uuid,
        bulb: Uuid,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(DBService::new_in_memory().await.unwrap().store());
        let client = ClientService::new(store.clone())
            .create(&CreateClient {
                name: Some("Ana".to_string()),
                email: Some("ana@example.com".to_string()),
                gender: Some("F".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .id;
        store.create_category("Hogar").await.unwrap();
        store.create_category("Luz").await.unwrap();

        let mut ids = Vec::new();
        for (name, category) in [("Lamp", "Luz"), ("Rug", "Hogar"), ("Bulb", "Luz")] {
            let product = store
                .create_product(
                    Uuid::new_v4(),
                    &NewProduct {
                        name: name.to_string(),
                        category: category.to_string(),
                        sku: None,
                        alt_code: None,
                        legacy_code: None,
                    },
                )
                .await
                .unwrap();
            ids.push(product.id);
        }

        Fixture {
            orders: OrderService::new(store.clone()),
            store,
            client,
            lamp: ids[0],
            rug: ids[1],
            bulb: ids[2],
        }
    }

    fn item(product_id: Uuid, quantity: i64, price: i64) -> OrderItemInput {
        OrderItemInput {
            product_id: Some(product_id),
            quantity: Some(quantity),
            unit_price: Some(Amount::from(price)),
        }
    }

    fn new_order(client_id: Uuid, items: Vec<OrderItemInput>) -> CreateOrder {
        CreateOrder {
            client_id: Some(client_id),
            channel: Some("WEB".to_string()),
            items: Some(items),
            metadata: Some(json!({ "coupon": "PROMO10" })),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_reconciles_total() {
        let f = fixture().await;
        let order = f
            .orders
            .create(&new_order(f.client, vec![item(f.lamp, 2, 15000), item(f.rug, 1, 42000)]))
            .await
            .unwrap();

        assert_eq!(order.total, Amount::from(72000));
        assert_eq!(order.currency, Currency::Crc);
        assert_eq!(order.items.len(), 2);

        let stored = f.orders.get(order.id).await.unwrap();
        assert_eq!(stored.total, order.total);
        assert_eq!(stored.metadata["coupon"], "PROMO10");
    }

    #[tokio::test]
    async fn referenced_records_cannot_be_deleted() {
        let f = fixture().await;
        let clients = ClientService::new(f.store.clone());
        let products = ProductService::new(f.store.clone());
        assert!(clients.can_delete(f.client).await.unwrap());
        assert!(products.can_delete(f.lamp).await.unwrap());

        let order = f
            .orders
            .create(&new_order(f.client, vec![item(f.lamp, 1, 100)]))
            .await
            .unwrap();
        assert!(!clients.can_delete(f.client).await.unwrap());
        assert!(!products.can_delete(f.lamp).await.unwrap());
        assert!(products.can_delete(f.rug).await.unwrap());
        assert!(matches!(
            clients.delete(f.client).await.unwrap_err(),
            CommerceError::Conflict(_)
        ));
        assert!(matches!(
            products.delete(f.lamp).await.unwrap_err(),
            CommerceError::Conflict(_)
        ));

        f.orders.delete(order.id).await.unwrap();
        assert!(clients.can_delete(f.client).await.unwrap());
        products.delete(f.lamp).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_client_fails_before_any_write() {
        let f = fixture().await;
        let err = f
            .orders
            .create(&new_order(Uuid::new_v4(), vec![item(f.lamp, 1, 100)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { entity: Entity::Client, .. }));
        assert!(f.orders.list(&OrderQuery::default()).await.unwrap().is_empty());
        assert_eq!(f.store.count_product_lines(f.lamp).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_product_fails_before_any_write() {
        let f = fixture().await;
        let err = f
            .orders
            .create(&new_order(f.client, vec![item(f.lamp, 1, 100), item(Uuid::new_v4(), 1, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { entity: Entity::Product, .. }));
        assert!(f.orders.list(&OrderQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn item_replacement_is_complete() {
        let f = fixture().await;
        let order = f
            .orders
            .create(&new_order(f.client, vec![item(f.lamp, 1, 100), item(f.rug, 2, 50)]))
            .await
            .unwrap();

        let updated = f
            .orders
            .update(
                order.id,
                &UpdateOrder {
                    items: Some(vec![item(f.bulb, 4, 25)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total, Amount::from(100));
        assert_eq!(updated.placed_at, order.placed_at);

        let stored = f.orders.get(order.id).await.unwrap();
        let products: Vec<_> = stored.items.iter().map(|i| i.product_id).collect();
        assert_eq!(products, vec![f.bulb]);
        assert_eq!(f.store.count_product_lines(f.lamp).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejected_replacement_keeps_old_items() {
        let f = fixture().await;
        let order = f
            .orders
            .create(&new_order(f.client, vec![item(f.lamp, 1, 100)]))
            .await
            .unwrap();

        let err = f
            .orders
            .update(
                order.id,
                &UpdateOrder {
                    items: Some(vec![item(f.rug, 1, 10), item(Uuid::new_v4(), 1, 10)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { .. }));

        let stored = f.orders.get(order.id).await.unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].product_id, f.lamp);
        assert_eq!(stored.total, Amount::from(100));
    }

    #[tokio::test]
    async fn product_removed_before_the_write_is_not_found() {
        let f = fixture().await;
        let order = f
            .orders
            .create(&new_order(f.client, vec![item(f.lamp, 1, 100)]))
            .await
            .unwrap();
        f.store.delete_product(f.bulb).await.unwrap();

        let err = f
            .orders
            .update(
                order.id,
                &UpdateOrder {
                    items: Some(vec![item(f.bulb, 1, 10)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        match err {
            CommerceError::NotFound { entity, id } => {
                assert_eq!(entity, Entity::Product);
                assert_eq!(id, f.bulb.to_string());
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = f
            .orders
            .create(&new_order(f.client, vec![item(f.bulb, 1, 10)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { entity: Entity::Product, .. }));
    }

    #[tokio::test]
    async fn update_without_items_keeps_lines_and_total() {
        let f = fixture().await;
        let order = f
            .orders
            .create(&new_order(f.client, vec![item(f.lamp, 3, 100)]))
            .await
            .unwrap();

        let updated = f
            .orders
            .update(
                order.id,
                &UpdateOrder {
                    channel: Some("tienda".to_string()),
                    metadata: Some(json!({ "note": "gift" })),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.channel, SalesChannel::Store);
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.total, Amount::from(300));
        assert_eq!(updated.metadata, json!({ "note": "gift" }));

        let err = f
            .orders
            .update(
                order.id,
                &UpdateOrder {
                    client_id: Some(Uuid::new_v4()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound { entity: Entity::Client, .. }));
    }

    #[tokio::test]
    async fn referenced_client_and_product_cannot_be_deleted() {
        let f = fixture().await;
        let order = f
            .orders
            .create(&new_order(f.client, vec![item(f.lamp, 1, 100)]))
            .await
            .unwrap();
        let clients = ClientService::new(f.store.clone());
        let products = crate::services::products::ProductService::new(f.store.clone());

        assert!(matches!(clients.delete(f.client).await.unwrap_err(), CommerceError::Conflict(_)));
        assert!(matches!(products.delete(f.lamp).await.unwrap_err(), CommerceError::Conflict(_)));
        products.delete(f.rug).await.unwrap();

        f.orders.delete(order.id).await.unwrap();
        clients.delete(f.client).await.unwrap();
        products.delete(f.lamp).await.unwrap();
    }

    #[tokio::test]
    async fn lines_and_stats() {
        let f = fixture().await;
        let order = f
            .orders
            .create(&new_order(
                f.client,
                vec![item(f.rug, 1, 42000), item(f.lamp, 2, 15000), item(f.bulb, 5, 1000)],
            ))
            .await
            .unwrap();

        let lines = f.orders.lines(order.id).await.unwrap();
        let names: Vec<_> = lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Bulb", "Lamp", "Rug"]);
        assert_eq!(lines[1].subtotal, Amount::from(30000));

        let stats = f.orders.stats(order.id).await.unwrap();
        assert_eq!(stats.line_count, 3);
        assert_eq!(stats.distinct_products, 3);
        assert_eq!(stats.total_units, 8);
        assert_eq!(stats.categories, vec!["Hogar", "Luz"]);
        assert_eq!(stats.total, Amount::from(77000));
    }

    #[tokio::test]
    async fn list_filters() {
        let f = fixture().await;
        f.orders
            .create(&new_order(f.client, vec![item(f.lamp, 1, 100)]))
            .await
            .unwrap();
        f.orders
            .create(&CreateOrder {
                channel: Some("PARTNER".to_string()),
                currency: Some("USD".to_string()),
                ..new_order(f.client, vec![item(f.rug, 1, 5)])
            })
            .await
            .unwrap();

        let usd = f
            .orders
            .list(&OrderQuery {
                currency: Some("usd".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(usd.len(), 1);
        assert_eq!(usd[0].channel, SalesChannel::Partner);

        let mine = f
            .orders
            .list(&OrderQuery {
                client_id: Some(f.client),
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        let err = f
            .orders
            .list(&OrderQuery {
                channel: Some("FAX".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }
}

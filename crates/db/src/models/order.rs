use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite, SqliteConnection, Type, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::{amount::Amount, client::SalesChannel};
use crate::store::Pagination;

const ORDER_COLUMNS: &str =
    "id, client_id, placed_at, channel, currency, total, metadata, created_at, updated_at";

#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "currency", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Currency {
    /// Costa Rican colón, integer amounts only
    #[default]
    Crc,
    Usd,
}

impl Currency {
    /// Maximum number of decimal places allowed in amounts of this currency
    pub fn max_decimal_places(self) -> u32 {
        match self {
            Currency::Crc => 0,
            Currency::Usd => 2,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub placed_at: DateTime<Utc>,
    pub channel: SalesChannel,
    pub currency: Currency,
    #[sqlx(try_from = "String")]
    #[ts(type = "string")]
    pub total: Amount,
    #[sqlx(json)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct OrderItem {
    pub order_id: Uuid,
    pub position: i64,
    pub product_id: Uuid,
    pub quantity: i64,
    #[sqlx(try_from = "String")]
    #[ts(type = "string")]
    pub unit_price: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct OrderWithItems {
    #[serde(flatten)]
    #[ts(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl std::ops::Deref for OrderWithItems {
    type Target = Order;
    fn deref(&self) -> &Self::Target {
        &self.order
    }
}

/// Line item joined with its product
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    #[sqlx(try_from = "String")]
    #[ts(type = "string")]
    pub unit_price: Amount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_price: Amount,
}

/// Validated order ready to be written, total already reconciled
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub client_id: Uuid,
    pub placed_at: DateTime<Utc>,
    pub channel: SalesChannel,
    pub currency: Currency,
    pub items: Vec<NewOrderItem>,
    pub total: Amount,
    pub metadata: serde_json::Value,
}

/// Fully merged order state for an update. `items: None` keeps the stored lines.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub client_id: Uuid,
    pub channel: SalesChannel,
    pub currency: Currency,
    pub metadata: serde_json::Value,
    pub items: Option<Vec<NewOrderItem>>,
    pub total: Amount,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub channel: Option<SalesChannel>,
    pub currency: Option<Currency>,
    pub client_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl Order {
    pub async fn create<'e, E>(executor: E, id: Uuid, data: &NewOrder) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        sqlx::query_as::<_, Order>(&format!(
            r#"INSERT INTO orders (id, client_id, placed_at, channel, currency, total, metadata, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
               RETURNING {ORDER_COLUMNS}"#
        ))
        .bind(id)
        .bind(data.client_id)
        .bind(data.placed_at)
        .bind(data.channel)
        .bind(data.currency)
        .bind(data.total.to_db_string())
        .bind(Json(&data.metadata))
        .bind(now)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_client_id<'e, E>(
        executor: E,
        client_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Order>(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM orders
               WHERE client_id = $1
               ORDER BY placed_at DESC, id ASC"#
        ))
        .bind(client_id)
        .fetch_all(executor)
        .await
    }

    pub async fn count_by_client_id<'e, E>(executor: E, client_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE client_id = $1")
            .bind(client_id)
            .fetch_one(executor)
            .await
    }

    pub async fn list<'e, E>(
        executor: E,
        filter: &OrderFilter,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"
        ));
        if let Some(channel) = filter.channel {
            query.push(" AND channel = ").push_bind(channel);
        }
        if let Some(currency) = filter.currency {
            query.push(" AND currency = ").push_bind(currency);
        }
        if let Some(client_id) = filter.client_id {
            query.push(" AND client_id = ").push_bind(client_id);
        }
        if let Some(from) = filter.from {
            query.push(" AND placed_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND placed_at <= ").push_bind(to);
        }
        query
            .push(" ORDER BY placed_at DESC, id ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.skip);

        query.build_query_as::<Order>().fetch_all(executor).await
    }

    /// Overwrite the mutable columns. `placed_at` is never touched.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: &OrderUpdate,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Order>(&format!(
            r#"UPDATE orders
               SET client_id = $2, channel = $3, currency = $4, total = $5, metadata = $6, updated_at = $7
               WHERE id = $1
               RETURNING {ORDER_COLUMNS}"#
        ))
        .bind(id)
        .bind(data.client_id)
        .bind(data.channel)
        .bind(data.currency)
        .bind(data.total.to_db_string())
        .bind(Json(&data.metadata))
        .bind(Utc::now())
        .fetch_optional(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

impl OrderItem {
    /// Insert `items` in list order. Callers wrap this in a transaction.
    pub async fn insert_all(
        conn: &mut SqliteConnection,
        order_id: Uuid,
        items: &[NewOrderItem],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut inserted = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let row = sqlx::query_as::<_, OrderItem>(
                r#"INSERT INTO order_items (order_id, position, product_id, quantity, unit_price)
                   VALUES ($1, $2, $3, $4, $5)
                   RETURNING order_id, position, product_id, quantity, unit_price"#,
            )
            .bind(order_id)
            .bind(position as i64)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price.to_db_string())
            .fetch_one(&mut *conn)
            .await?;
            inserted.push(row);
        }
        Ok(inserted)
    }

    pub async fn find_by_order_id<'e, E>(
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, OrderItem>(
            r#"SELECT order_id, position, product_id, quantity, unit_price
               FROM order_items
               WHERE order_id = $1
               ORDER BY position ASC"#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await
    }

    pub async fn delete_by_order_id<'e, E>(executor: E, order_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_by_product_id<'e, E>(
        executor: E,
        product_id: Uuid,
    ) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(executor)
            .await
    }
}

impl OrderLine {
    pub async fn find_by_order_id<'e, E>(
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, OrderLine>(
            r#"SELECT oi.product_id, p.name, p.category, oi.quantity, oi.unit_price
               FROM order_items oi
               JOIN products p ON p.id = oi.product_id
               WHERE oi.order_id = $1
               ORDER BY p.name ASC, oi.position ASC"#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await
    }
}

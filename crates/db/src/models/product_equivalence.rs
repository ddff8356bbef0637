use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqliteConnection};
use ts_rs::TS;
use uuid::Uuid;

/// A product linked as equivalent to another, seen from one side of the link
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct EquivalentProduct {
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub sku: Option<String>,
    pub alt_code: Option<String>,
    pub legacy_code: Option<String>,
    pub reason: String,
    pub confidence: f64,
    pub validated_by: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEquivalence {
    pub product_a: Uuid,
    pub product_b: Uuid,
    pub reason: String,
    pub confidence: f64,
    pub validated_by: String,
}

pub struct ProductEquivalence;

impl ProductEquivalence {
    /// Insert both directions of the link. Callers wrap this in a transaction.
    pub async fn create_pair(
        conn: &mut SqliteConnection,
        data: &NewEquivalence,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        for (from, to) in [
            (data.product_a, data.product_b),
            (data.product_b, data.product_a),
        ] {
            sqlx::query(
                r#"INSERT INTO product_equivalences (product_id, equivalent_id, reason, confidence, validated_by, created_at)
                   VALUES ($1, $2, $3, $4, $5, $6)"#,
            )
            .bind(from)
            .bind(to)
            .bind(&data.reason)
            .bind(data.confidence)
            .bind(&data.validated_by)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn exists<'e, E>(
        executor: E,
        product_a: Uuid,
        product_b: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM product_equivalences
               WHERE product_id = $1 AND equivalent_id = $2"#,
        )
        .bind(product_a)
        .bind(product_b)
        .fetch_one(executor)
        .await?;
        Ok(count > 0)
    }

    pub async fn find_for_product<'e, E>(
        executor: E,
        product_id: Uuid,
    ) -> Result<Vec<EquivalentProduct>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, EquivalentProduct>(
            r#"SELECT p.id AS product_id, p.name, p.category, p.sku, p.alt_code, p.legacy_code,
                      e.reason, e.confidence, e.validated_by
               FROM product_equivalences e
               JOIN products p ON p.id = e.equivalent_id
               WHERE e.product_id = $1
               ORDER BY e.confidence DESC, p.name ASC"#,
        )
        .bind(product_id)
        .fetch_all(executor)
        .await
    }
}

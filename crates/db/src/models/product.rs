use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite};
use ts_rs::TS;
use uuid::Uuid;

use crate::store::Pagination;

const PRODUCT_COLUMNS: &str =
    "id, name, category, sku, alt_code, legacy_code, created_at, updated_at";

/// Cross-system equivalence code carried by a product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Sku,
    AltCode,
    LegacyCode,
}

impl CodeKind {
    pub const ALL: [CodeKind; 3] = [CodeKind::Sku, CodeKind::AltCode, CodeKind::LegacyCode];

    fn column(self) -> &'static str {
        match self {
            CodeKind::Sku => "sku",
            CodeKind::AltCode => "alt_code",
            CodeKind::LegacyCode => "legacy_code",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub sku: Option<String>,
    pub alt_code: Option<String>,
    pub legacy_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product with the number of order lines that reference it
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ProductSales {
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[ts(flatten)]
    pub product: Product,
    pub order_lines: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub sku: Option<String>,
    pub alt_code: Option<String>,
    pub legacy_code: Option<String>,
}

/// Partial update. For codes, `Some(None)` clears the code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub sku: Option<Option<String>>,
    pub alt_code: Option<Option<String>>,
    pub legacy_code: Option<Option<String>>,
}

impl ProductPatch {
    pub fn code(&self, kind: CodeKind) -> Option<Option<&str>> {
        let code = match kind {
            CodeKind::Sku => &self.sku,
            CodeKind::AltCode => &self.alt_code,
            CodeKind::LegacyCode => &self.legacy_code,
        };
        code.as_ref().map(|c| c.as_deref())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Case-insensitive substring of the name
    pub q: Option<String>,
}

impl Product {
    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        data: &NewProduct,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        sqlx::query_as::<_, Product>(&format!(
            r#"INSERT INTO products (id, name, category, sku, alt_code, legacy_code, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
               RETURNING {PRODUCT_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.category)
        .bind(&data.sku)
        .bind(&data.alt_code)
        .bind(&data.legacy_code)
        .bind(now)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_ids<'e, E>(executor: E, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("
        ));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY name ASC, id ASC");

        query.build_query_as::<Product>().fetch_all(executor).await
    }

    /// Products whose id or any equivalence code matches `code`.
    pub async fn lookup<'e, E>(executor: E, code: &str) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let by_id = code.parse::<Uuid>().ok();
        sqlx::query_as::<_, Product>(&format!(
            r#"SELECT {PRODUCT_COLUMNS} FROM products
               WHERE id = $1 OR sku = $2 OR alt_code = $2 OR legacy_code = $2
               ORDER BY name ASC, id ASC"#
        ))
        .bind(by_id)
        .bind(code)
        .fetch_all(executor)
        .await
    }

    pub async fn list<'e, E>(
        executor: E,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE 1 = 1"
        ));
        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(q) = &filter.q {
            query
                .push(" AND lower(name) LIKE ")
                .push_bind(format!("%{}%", q.to_lowercase()));
        }
        query
            .push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.skip);

        query.build_query_as::<Product>().fetch_all(executor).await
    }

    /// Products of a category ranked by how many order lines reference them.
    pub async fn find_by_category_ranked<'e, E>(
        executor: E,
        category: &str,
        limit: i64,
    ) -> Result<Vec<ProductSales>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ProductSales>(
            r#"SELECT p.id, p.name, p.category, p.sku, p.alt_code, p.legacy_code,
                      p.created_at, p.updated_at,
                      COUNT(oi.order_id) AS order_lines
               FROM products p
               LEFT JOIN order_items oi ON oi.product_id = p.id
               WHERE p.category = $1
               GROUP BY p.id
               ORDER BY order_lines DESC, p.name ASC
               LIMIT $2"#,
        )
        .bind(category)
        .bind(limit)
        .fetch_all(executor)
        .await
    }

    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        patch: &ProductPatch,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE products SET updated_at = ");
        query.push_bind(Utc::now());
        if let Some(name) = &patch.name {
            query.push(", name = ").push_bind(name.clone());
        }
        if let Some(category) = &patch.category {
            query.push(", category = ").push_bind(category.clone());
        }
        for kind in CodeKind::ALL {
            if let Some(code) = patch.code(kind) {
                query
                    .push(format!(", {} = ", kind.column()))
                    .push_bind(code.map(str::to_string));
            }
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(format!(" RETURNING {PRODUCT_COLUMNS}"));

        query.build_query_as::<Product>().fetch_optional(executor).await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

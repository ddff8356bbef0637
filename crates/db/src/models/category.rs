use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite};
use ts_rs::TS;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Category {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub async fn create<'e, E>(executor: E, name: &str) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Category>(
            r#"INSERT INTO categories (name, created_at)
               VALUES ($1, $2)
               RETURNING name, created_at"#,
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_name<'e, E>(executor: E, name: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Category>("SELECT name, created_at FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_all<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Category>("SELECT name, created_at FROM categories ORDER BY name ASC")
            .fetch_all(executor)
            .await
    }
}

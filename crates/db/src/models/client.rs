use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite, Type, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use crate::store::Pagination;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display,
)]
#[sqlx(type_name = "gender")]
#[strum(ascii_case_insensitive)]
pub enum Gender {
    #[strum(to_string = "Male", serialize = "M", serialize = "Masculino")]
    Male,
    #[strum(to_string = "Female", serialize = "F", serialize = "Femenino")]
    Female,
    #[strum(to_string = "Other", serialize = "O", serialize = "Otro")]
    Other,
}

/// Sales channel of an order, also used for client channel preferences.
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
)]
#[sqlx(type_name = "sales_channel", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[strum(ascii_case_insensitive)]
pub enum SalesChannel {
    #[strum(to_string = "WEB")]
    Web,
    #[strum(to_string = "STORE", serialize = "TIENDA")]
    Store,
    #[strum(to_string = "PARTNER")]
    Partner,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub country: String,
    #[sqlx(json)]
    pub channels: Vec<SalesChannel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated data for inserting a client
#[derive(Debug, Clone, PartialEq)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub country: String,
    pub channels: Vec<SalesChannel>,
}

/// Validated partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub country: Option<String>,
    pub channels: Option<Vec<SalesChannel>>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    /// Case-insensitive substring of the name
    pub q: Option<String>,
    pub country: Option<String>,
    pub gender: Option<Gender>,
}

impl Client {
    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        data: &NewClient,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        sqlx::query_as::<_, Client>(
            r#"INSERT INTO clients (id, name, email, gender, country, channels, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
               RETURNING id, name, email, gender, country, channels, created_at, updated_at"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(data.gender)
        .bind(&data.country)
        .bind(Json(&data.channels))
        .bind(now)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Client>(
            r#"SELECT id, name, email, gender, country, channels, created_at, updated_at
               FROM clients
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn list<'e, E>(
        executor: E,
        filter: &ClientFilter,
        page: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, name, email, gender, country, channels, created_at, updated_at FROM clients WHERE 1 = 1",
        );
        if let Some(q) = &filter.q {
            query
                .push(" AND lower(name) LIKE ")
                .push_bind(format!("%{}%", q.to_lowercase()));
        }
        if let Some(country) = &filter.country {
            query.push(" AND country = ").push_bind(country.clone());
        }
        if let Some(gender) = filter.gender {
            query.push(" AND gender = ").push_bind(gender);
        }
        query
            .push(" ORDER BY name ASC, id ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.skip);

        query.build_query_as::<Client>().fetch_all(executor).await
    }

    /// Apply a patch and return the updated row, or `None` when the id is unknown.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        patch: &ClientPatch,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE clients SET updated_at = ");
        query.push_bind(Utc::now());
        if let Some(name) = &patch.name {
            query.push(", name = ").push_bind(name.clone());
        }
        if let Some(email) = &patch.email {
            query.push(", email = ").push_bind(email.clone());
        }
        if let Some(gender) = patch.gender {
            query.push(", gender = ").push_bind(gender);
        }
        if let Some(country) = &patch.country {
            query.push(", country = ").push_bind(country.clone());
        }
        if let Some(channels) = &patch.channels {
            query.push(", channels = ").push_bind(Json(channels.clone()));
        }
        query.push(" WHERE id = ").push_bind(id).push(
            " RETURNING id, name, email, gender, country, channels, created_at, updated_at",
        );

        query.build_query_as::<Client>().fetch_optional(executor).await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn gender_accepts_legacy_aliases() {
        assert_eq!(Gender::from_str("M").unwrap(), Gender::Male);
        assert_eq!(Gender::from_str("femenino").unwrap(), Gender::Female);
        assert_eq!(Gender::from_str("other").unwrap(), Gender::Other);
        assert!(Gender::from_str("X").is_err());
        assert_eq!(Gender::Female.to_string(), "Female");
    }

    #[test]
    fn channel_accepts_store_alias() {
        assert_eq!(SalesChannel::from_str("tienda").unwrap(), SalesChannel::Store);
        assert_eq!(SalesChannel::from_str("web").unwrap(), SalesChannel::Web);
        assert_eq!(SalesChannel::Store.to_string(), "STORE");
    }
}

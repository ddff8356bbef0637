//! Association rules mined offline from historical baskets.
//!
//! The HTTP surface only reads these; rows are written by the seeder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite, SqliteConnection};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct AssociationRule {
    pub id: i64,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// One product on the antecedent side of a rule
#[derive(Debug, Clone, Copy, FromRow, PartialEq)]
pub struct RuleAntecedent {
    pub rule_id: i64,
    pub product_id: Uuid,
}

/// One product on the consequent side of a rule, with the rule's statistics
#[derive(Debug, Clone, Copy, FromRow, PartialEq)]
pub struct RuleConsequent {
    pub rule_id: i64,
    pub product_id: Uuid,
    pub confidence: f64,
    pub lift: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssociationRule {
    pub antecedents: Vec<Uuid>,
    pub consequents: Vec<Uuid>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl AssociationRule {
    /// Insert a rule with its antecedent and consequent sets. Callers wrap this in a transaction.
    pub async fn create(
        conn: &mut SqliteConnection,
        data: &NewAssociationRule,
    ) -> Result<Self, sqlx::Error> {
        let rule = sqlx::query_as::<_, AssociationRule>(
            r#"INSERT INTO association_rules (support, confidence, lift, active, created_at)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, support, confidence, lift, active, created_at"#,
        )
        .bind(data.support)
        .bind(data.confidence)
        .bind(data.lift)
        .bind(data.active)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        for product_id in &data.antecedents {
            sqlx::query("INSERT OR IGNORE INTO rule_antecedents (rule_id, product_id) VALUES ($1, $2)")
                .bind(rule.id)
                .bind(product_id)
                .execute(&mut *conn)
                .await?;
        }
        for product_id in &data.consequents {
            sqlx::query("INSERT OR IGNORE INTO rule_consequents (rule_id, product_id) VALUES ($1, $2)")
                .bind(rule.id)
                .bind(product_id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(rule)
    }

    /// Ids of active rules with at least one antecedent in `product_ids`.
    pub async fn find_ids_with_any_antecedent<'e, E>(
        executor: E,
        product_ids: &[Uuid],
    ) -> Result<Vec<i64>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"SELECT DISTINCT a.rule_id
               FROM rule_antecedents a
               JOIN association_rules r ON r.id = a.rule_id
               WHERE r.active = 1 AND a.product_id IN ("#,
        );
        let mut separated = query.separated(", ");
        for id in product_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY a.rule_id ASC");

        query.build_query_scalar::<i64>().fetch_all(executor).await
    }

    pub async fn find_antecedents<'e, E>(
        executor: E,
        rule_ids: &[i64],
    ) -> Result<Vec<RuleAntecedent>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        if rule_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT rule_id, product_id FROM rule_antecedents WHERE rule_id IN (",
        );
        let mut separated = query.separated(", ");
        for id in rule_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        query.build_query_as::<RuleAntecedent>().fetch_all(executor).await
    }

    pub async fn find_consequents<'e, E>(
        executor: E,
        rule_ids: &[i64],
    ) -> Result<Vec<RuleConsequent>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        if rule_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"SELECT c.rule_id, c.product_id, r.confidence, r.lift
               FROM rule_consequents c
               JOIN association_rules r ON r.id = c.rule_id
               WHERE r.active = 1 AND c.rule_id IN ("#,
        );
        let mut separated = query.separated(", ");
        for id in rule_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        query.build_query_as::<RuleConsequent>().fetch_all(executor).await
    }
}

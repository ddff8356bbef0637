use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use db::{
    DeleteOutcome, Pagination, Store,
    models::{
        amount::Amount,
        client::{Client, ClientFilter, SalesChannel},
        order::{Currency, Order},
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    error::{CommerceError, Entity},
    validation::{self, CreateClient, UpdateClient, validate_client_patch, validate_new_client},
};

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct ClientQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    /// Case-insensitive name substring
    pub q: Option<String>,
    pub country: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct CurrencyTotal {
    pub currency: Currency,
    pub orders: i64,
    #[ts(type = "string")]
    pub total: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ClientStats {
    pub client_id: Uuid,
    pub order_count: i64,
    pub totals: Vec<CurrencyTotal>,
    pub channels: Vec<SalesChannel>,
    pub first_order_at: Option<DateTime<Utc>>,
    pub last_order_at: Option<DateTime<Utc>>,
}

impl ClientStats {
    pub fn from_orders(client_id: Uuid, orders: &[Order]) -> Self {
        let mut totals: BTreeMap<Currency, CurrencyTotal> = BTreeMap::new();
        let mut channels: Vec<SalesChannel> = Vec::new();
        for order in orders {
            let entry = totals.entry(order.currency).or_insert(CurrencyTotal {
                currency: order.currency,
                orders: 0,
                total: Amount::ZERO,
            });
            entry.orders += 1;
            // Many maximal orders can exceed the decimal range; the report caps there.
            entry.total = Amount::new(entry.total.saturating_add(*order.total));
            channels.push(order.channel);
        }
        channels.sort();
        channels.dedup();

        Self {
            client_id,
            order_count: orders.len() as i64,
            totals: totals.into_values().collect(),
            channels,
            first_order_at: orders.iter().map(|o| o.placed_at).min(),
            last_order_at: orders.iter().map(|o| o.placed_at).max(),
        }
    }
}

#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn Store>,
}

impl ClientService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: &CreateClient) -> Result<Client, CommerceError> {
        self.create_with_id(Uuid::new_v4(), input).await
    }

    pub(crate) async fn create_with_id(
        &self,
        id: Uuid,
        input: &CreateClient,
    ) -> Result<Client, CommerceError> {
        let data = validate_new_client(input)?;
        let client = self.store.create_client(id, &data).await?;
        info!(client_id = %client.id, email = %client.email, "Client created");
        Ok(client)
    }

    pub async fn get(&self, id: Uuid) -> Result<Client, CommerceError> {
        self.store
            .find_client(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Client, id))
    }

    pub async fn list(&self, query: &ClientQuery) -> Result<Vec<Client>, CommerceError> {
        let filter = ClientFilter {
            q: query
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            country: query
                .country
                .as_deref()
                .map(validation::parse_country)
                .transpose()?,
            gender: query
                .gender
                .as_deref()
                .map(validation::parse_gender)
                .transpose()?,
        };
        let page = Pagination::new(query.limit, query.skip);
        Ok(self.store.list_clients(&filter, page).await?)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateClient) -> Result<Client, CommerceError> {
        let patch = validate_client_patch(input)?;
        let client = self
            .store
            .update_client(id, &patch)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Client, id))?;
        info!(client_id = %id, "Client updated");
        Ok(client)
    }

    /// False while any order belongs to the client.
    pub async fn can_delete(&self, id: Uuid) -> Result<bool, CommerceError> {
        Ok(self.store.count_client_orders(id).await? == 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CommerceError> {
        match self.store.delete_client(id).await? {
            DeleteOutcome::Deleted => {
                info!(client_id = %id, "Client deleted");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(CommerceError::not_found(Entity::Client, id)),
            DeleteOutcome::Referenced(orders) => Err(CommerceError::Conflict(format!(
                "client {id} has {orders} order(s) and cannot be deleted"
            ))),
        }
    }

    pub async fn orders(&self, id: Uuid) -> Result<Vec<Order>, CommerceError> {
        self.get(id).await?;
        Ok(self.store.list_client_orders(id).await?)
    }

    pub async fn stats(&self, id: Uuid) -> Result<ClientStats, CommerceError> {
        let orders = self.orders(id).await?;
        Ok(ClientStats::from_orders(id, &orders))
    }
}

#[cfg(test)]
mod tests {
    use db::DBService;
    use serde_json::json;

    use super::*;

    async fn service() -> ClientService {
        let store: Arc<dyn Store> = Arc::new(DBService::new_in_memory().await.unwrap().store());
        ClientService::new(store)
    }

    fn ana() -> CreateClient {
        CreateClient {
            name: Some("Ana Mora".to_string()),
            email: Some("ana@example.com".to_string()),
            gender: Some("F".to_string()),
            country: Some("cr".to_string()),
            channels: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_and_keeps_original() {
        let service = service().await;
        let original = service.create(&ana()).await.unwrap();

        let err = service
            .create(&CreateClient {
                name: Some("Someone Else".to_string()),
                email: Some("ANA@example.com".to_string()),
                ..ana()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Conflict(m) if m == "email is already registered"));

        let stored = service.get(original.id).await.unwrap();
        assert_eq!(stored.name, "Ana Mora");
        assert_eq!(service.list(&ClientQuery::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts() {
        let service = service().await;
        service.create(&ana()).await.unwrap();
        let luis = service
            .create(&CreateClient {
                name: Some("Luis".to_string()),
                email: Some("luis@example.com".to_string()),
                gender: Some("M".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let err = service
            .update(
                luis.id,
                &UpdateClient {
                    email: Some("ana@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Conflict(m) if m == "email is already registered"));

        let renamed = service
            .update(
                luis.id,
                &UpdateClient {
                    email: Some("luis@example.com".to_string()),
                    name: Some("Luis Rojas".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Luis Rojas");
    }

    #[tokio::test]
    async fn list_filters_by_name_and_gender() {
        let service = service().await;
        service.create(&ana()).await.unwrap();
        service
            .create(&CreateClient {
                name: Some("Luis".to_string()),
                email: Some("luis@example.com".to_string()),
                gender: Some("Masculino".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let found = service
            .list(&ClientQuery {
                q: Some("MORA".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email, "ana@example.com");

        let men = service
            .list(&ClientQuery {
                gender: Some("m".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(men.len(), 1);
        assert_eq!(men[0].name, "Luis");

        let err = service
            .list(&ClientQuery {
                gender: Some("unknown".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_client_is_not_found() {
        let service = service().await;
        let id = Uuid::new_v4();
        assert!(matches!(
            service.get(id).await.unwrap_err(),
            CommerceError::NotFound { entity: Entity::Client, .. }
        ));
        assert!(matches!(
            service.delete(id).await.unwrap_err(),
            CommerceError::NotFound { .. }
        ));
        assert!(matches!(
            service.stats(id).await.unwrap_err(),
            CommerceError::NotFound { .. }
        ));
    }

    #[test]
    fn stats_group_totals_by_currency() {
        let client_id = Uuid::new_v4();
        let early = Utc::now() - chrono::Duration::days(3);
        let late = Utc::now();
        let order = |currency, total: &str, channel, placed_at| Order {
            id: Uuid::new_v4(),
            client_id,
            placed_at,
            channel,
            currency,
            total: total.parse().unwrap(),
            metadata: json!({}),
            created_at: placed_at,
            updated_at: placed_at,
        };
        let orders = vec![
            order(Currency::Crc, "1500", SalesChannel::Web, late),
            order(Currency::Usd, "10.25", SalesChannel::Store, early),
            order(Currency::Crc, "2500", SalesChannel::Web, early),
        ];

        let stats = ClientStats::from_orders(client_id, &orders);
        assert_eq!(stats.order_count, 3);
        assert_eq!(
            stats.totals,
            vec![
                CurrencyTotal {
                    currency: Currency::Crc,
                    orders: 2,
                    total: Amount::from(4000),
                },
                CurrencyTotal {
                    currency: Currency::Usd,
                    orders: 1,
                    total: "10.25".parse().unwrap(),
                },
            ]
        );
        assert_eq!(stats.channels, vec![SalesChannel::Web, SalesChannel::Store]);
        assert_eq!(stats.first_order_at, Some(early));
        assert_eq!(stats.last_order_at, Some(late));
    }

    #[test]
    fn stats_total_caps_instead_of_overflowing() {
        let client_id = Uuid::new_v4();
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            client_id,
            placed_at: now,
            channel: SalesChannel::Web,
            currency: Currency::Crc,
            total: "50000000000000000000000000000".parse().unwrap(),
            metadata: json!({}),
            created_at: now,
            updated_at: now,
        };

        let stats = ClientStats::from_orders(client_id, &[order.clone(), order]);
        assert_eq!(stats.totals[0].orders, 2);
        assert_eq!(stats.totals[0].total, Amount::new(rust_decimal::Decimal::MAX));
    }
}

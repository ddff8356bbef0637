//! Reference checks that share a connection, and so a transaction, with the
//! write they guard.

use std::collections::HashSet;

use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{MissingReference, StoreError};
use crate::models::{client::Client, product::Product};

/// Fail with the client if it is missing, or else the first missing product in line order.
pub(crate) async fn validate_order_references(
    conn: &mut SqliteConnection,
    client_id: Uuid,
    product_ids: &[Uuid],
) -> Result<(), StoreError> {
    if Client::find_by_id(&mut *conn, client_id).await?.is_none() {
        return Err(StoreError::MissingReference(MissingReference::Client(
            client_id,
        )));
    }
    validate_products(conn, product_ids).await
}

async fn validate_products(
    conn: &mut SqliteConnection,
    ids: &[Uuid],
) -> Result<(), StoreError> {
    let found: HashSet<Uuid> = Product::find_by_ids(&mut *conn, ids)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(StoreError::MissingReference(MissingReference::Product(
            *missing,
        ))),
        None => Ok(()),
    }
}

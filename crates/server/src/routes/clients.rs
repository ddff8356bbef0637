use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{client::Client, order::Order};
use services::services::{
    clients::{ClientQuery, ClientStats},
    validation::{CreateClient, UpdateClient},
};
use utils::response::DeletedBody;
use uuid::Uuid;

use crate::{
    Deployment,
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
};

/// GET /api/clients
pub async fn list_clients(
    State(deployment): State<Deployment>,
    ApiQuery(query): ApiQuery<ClientQuery>,
) -> Result<ResponseJson<Vec<Client>>, ApiError> {
    Ok(ResponseJson(deployment.clients().list(&query).await?))
}

/// GET /api/clients/{id}
pub async fn get_client(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<Client>, ApiError> {
    Ok(ResponseJson(deployment.clients().get(id).await?))
}

/// POST /api/clients
pub async fn create_client(
    State(deployment): State<Deployment>,
    ApiJson(payload): ApiJson<CreateClient>,
) -> Result<(StatusCode, ResponseJson<Client>), ApiError> {
    let client = deployment.clients().create(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(client)))
}

/// PATCH /api/clients/{id}
pub async fn update_client(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateClient>,
) -> Result<ResponseJson<Client>, ApiError> {
    Ok(ResponseJson(deployment.clients().update(id, &payload).await?))
}

/// DELETE /api/clients/{id}
/// Refused with 409 while any order belongs to the client
pub async fn delete_client(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<DeletedBody>, ApiError> {
    deployment.clients().delete(id).await?;
    Ok(ResponseJson(DeletedBody::DELETED))
}

/// GET /api/clients/{id}/orders
pub async fn get_client_orders(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<Vec<Order>>, ApiError> {
    Ok(ResponseJson(deployment.clients().orders(id).await?))
}

/// GET /api/clients/{id}/stats
pub async fn get_client_stats(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ClientStats>, ApiError> {
    Ok(ResponseJson(deployment.clients().stats(id).await?))
}

pub fn router(_deployment: &Deployment) -> Router<Deployment> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{id}",
            get(get_client).patch(update_client).delete(delete_client),
        )
        .route("/clients/{id}/orders", get(get_client_orders))
        .route("/clients/{id}/stats", get(get_client_stats))
}

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::order::{Order, OrderWithItems};
use services::services::{
    orders::{OrderLineView, OrderQuery, OrderStats},
    validation::{CreateOrder, UpdateOrder},
};
use utils::response::DeletedBody;
use uuid::Uuid;

use crate::{
    Deployment,
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
};

/// GET /api/orders
/// Newest first
pub async fn list_orders(
    State(deployment): State<Deployment>,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<ResponseJson<Vec<Order>>, ApiError> {
    Ok(ResponseJson(deployment.orders().list(&query).await?))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<OrderWithItems>, ApiError> {
    Ok(ResponseJson(deployment.orders().get(id).await?))
}

/// POST /api/orders
/// The total is computed from the items; a caller-supplied total is ignored
pub async fn create_order(
    State(deployment): State<Deployment>,
    ApiJson(payload): ApiJson<CreateOrder>,
) -> Result<(StatusCode, ResponseJson<OrderWithItems>), ApiError> {
    let order = deployment.orders().create(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(order)))
}

/// PATCH /api/orders/{id}
pub async fn update_order(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateOrder>,
) -> Result<ResponseJson<OrderWithItems>, ApiError> {
    Ok(ResponseJson(deployment.orders().update(id, &payload).await?))
}

/// DELETE /api/orders/{id}
pub async fn delete_order(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<DeletedBody>, ApiError> {
    deployment.orders().delete(id).await?;
    Ok(ResponseJson(DeletedBody::DELETED))
}

/// GET /api/orders/{id}/items
pub async fn get_order_items(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<Vec<OrderLineView>>, ApiError> {
    Ok(ResponseJson(deployment.orders().lines(id).await?))
}

/// GET /api/orders/{id}/stats
pub async fn get_order_stats(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<OrderStats>, ApiError> {
    Ok(ResponseJson(deployment.orders().stats(id).await?))
}

pub fn router(_deployment: &Deployment) -> Router<Deployment> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{id}",
            get(get_order).patch(update_order).delete(delete_order),
        )
        .route("/orders/{id}/items", get(get_order_items))
        .route("/orders/{id}/stats", get(get_order_stats))
}

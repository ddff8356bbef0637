use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{product::Product, product_equivalence::EquivalentProduct};
use serde::Deserialize;
use services::services::{
    products::{EquivalenceLink, ProductQuery},
    validation::{CreateEquivalence, CreateProduct, UpdateProduct},
};
use utils::response::DeletedBody;
use uuid::Uuid;

use crate::{
    Deployment,
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
};

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub code: String,
}

pub async fn list_products(
    State(deployment): State<Deployment>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<ResponseJson<Vec<Product>>, ApiError> {
    Ok(ResponseJson(deployment.products().list(&query).await?))
}

pub async fn get_product(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<Product>, ApiError> {
    Ok(ResponseJson(deployment.products().get(id).await?))
}

pub async fn create_product(
    State(deployment): State<Deployment>,
    ApiJson(payload): ApiJson<CreateProduct>,
) -> Result<(StatusCode, ResponseJson<Product>), ApiError> {
    let product = deployment.products().create(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(product)))
}

pub async fn update_product(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateProduct>,
) -> Result<ResponseJson<Product>, ApiError> {
    Ok(ResponseJson(deployment.products().update(id, &payload).await?))
}

pub async fn delete_product(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<DeletedBody>, ApiError> {
    deployment.products().delete(id).await?;
    Ok(ResponseJson(DeletedBody::DELETED))
}

/// GET /api/products/lookup?code=X
/// Matches the product id or any of its equivalence codes
pub async fn lookup_products(
    State(deployment): State<Deployment>,
    ApiQuery(query): ApiQuery<LookupQuery>,
) -> Result<ResponseJson<Vec<Product>>, ApiError> {
    Ok(ResponseJson(deployment.products().lookup(&query.code).await?))
}

pub async fn get_equivalences(
    State(deployment): State<Deployment>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<Vec<EquivalentProduct>>, ApiError> {
    Ok(ResponseJson(deployment.products().equivalences(id).await?))
}

pub async fn create_equivalence(
    State(deployment): State<Deployment>,
    ApiJson(payload): ApiJson<CreateEquivalence>,
) -> Result<(StatusCode, ResponseJson<EquivalenceLink>), ApiError> {
    let link = deployment.products().create_equivalence(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(link)))
}

pub fn router(_deployment: &Deployment) -> Router<Deployment> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/lookup", get(lookup_products))
        .route("/products/equivalences", post(create_equivalence))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/products/{id}/equivalences", get(get_equivalences))
}

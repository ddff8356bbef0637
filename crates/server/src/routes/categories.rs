use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{category::Category, product::ProductSales};
use serde::Deserialize;
use services::services::validation::CreateCategory;

use crate::{
    Deployment,
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
};

#[derive(Debug, Deserialize)]
pub struct CategoryProductsQuery {
    pub limit: Option<i64>,
}

/// GET /api/categories
pub async fn list_categories(
    State(deployment): State<Deployment>,
) -> Result<ResponseJson<Vec<Category>>, ApiError> {
    Ok(ResponseJson(deployment.categories().list().await?))
}

/// POST /api/categories
pub async fn create_category(
    State(deployment): State<Deployment>,
    ApiJson(payload): ApiJson<CreateCategory>,
) -> Result<(StatusCode, ResponseJson<Category>), ApiError> {
    let category = deployment.categories().create(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(category)))
}

/// GET /api/categories/{name}/products
/// Ranked by number of order lines, then name
pub async fn get_category_products(
    State(deployment): State<Deployment>,
    ApiPath(name): ApiPath<String>,
    ApiQuery(query): ApiQuery<CategoryProductsQuery>,
) -> Result<ResponseJson<Vec<ProductSales>>, ApiError> {
    let products = deployment
        .categories()
        .products(&name, query.limit)
        .await?;
    Ok(ResponseJson(products))
}

pub fn router(_deployment: &Deployment) -> Router<Deployment> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{name}/products", get(get_category_products))
}

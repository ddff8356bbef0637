use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use services::services::recommendation::{Recommendation, RecommendationRequest};

use crate::{Deployment, error::ApiError, extract::ApiJson};

/// POST /api/recommendations
/// Products suggested for a basket, from rules whose antecedents equal the basket exactly
pub async fn recommend(
    State(deployment): State<Deployment>,
    ApiJson(payload): ApiJson<RecommendationRequest>,
) -> Result<ResponseJson<Vec<Recommendation>>, ApiError> {
    Ok(ResponseJson(
        deployment.recommendations().recommend(&payload).await?,
    ))
}

pub fn router(_deployment: &Deployment) -> Router<Deployment> {
    Router::new().route("/recommendations", post(recommend))
}

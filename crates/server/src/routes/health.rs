use axum::{Router, response::Json as ResponseJson, routing::get};
use utils::response::HealthBody;

use crate::Deployment;

pub async fn health_check() -> ResponseJson<HealthBody> {
    ResponseJson(HealthBody::ok())
}

pub fn router(_deployment: &Deployment) -> Router<Deployment> {
    Router::new().route("/health", get(health_check))
}

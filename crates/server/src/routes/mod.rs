use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::Deployment;

pub mod categories;
pub mod clients;
pub mod health;
pub mod orders;
pub mod products;
pub mod recommendations;

/// Full application router with state applied.
pub fn router(deployment: Deployment) -> Router {
    let api = Router::new()
        .merge(health::router(&deployment))
        .merge(clients::router(&deployment))
        .merge(categories::router(&deployment))
        .merge(products::router(&deployment))
        .merge(orders::router(&deployment))
        .merge(recommendations::router(&deployment));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(deployment)
}

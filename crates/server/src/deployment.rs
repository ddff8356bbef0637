use std::sync::Arc;

use db::{DBService, Store};
use services::services::{
    categories::CategoryService, clients::ClientService, orders::OrderService,
    products::ProductService, recommendation::RecommendationService,
};

/// Shared application state handed to every route.
#[derive(Clone)]
pub struct Deployment {
    store: Arc<dyn Store>,
}

impl Deployment {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn from_db(db: &DBService) -> Self {
        Self::new(Arc::new(db.store()))
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn clients(&self) -> ClientService {
        ClientService::new(self.store.clone())
    }

    pub fn categories(&self) -> CategoryService {
        CategoryService::new(self.store.clone())
    }

    pub fn products(&self) -> ProductService {
        ProductService::new(self.store.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.store.clone())
    }

    pub fn recommendations(&self) -> RecommendationService {
        RecommendationService::new(self.store.clone())
    }
}

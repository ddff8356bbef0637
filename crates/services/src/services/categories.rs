use std::sync::Arc;

use db::{
    Store,
    models::{category::Category, product::ProductSales},
};
use tracing::info;

use super::{
    error::{CommerceError, Entity},
    validation::{CreateCategory, validate_category},
};

pub const DEFAULT_CATEGORY_PRODUCTS: i64 = 20;

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn Store>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: &CreateCategory) -> Result<Category, CommerceError> {
        let name = validate_category(input)?;
        let category = self.store.create_category(&name).await?;
        info!(category = %category.name, "Category created");
        Ok(category)
    }

    pub async fn list(&self) -> Result<Vec<Category>, CommerceError> {
        Ok(self.store.list_categories().await?)
    }

    /// Products of the category, best sellers (by order lines) first.
    pub async fn products(
        &self,
        name: &str,
        limit: Option<i64>,
    ) -> Result<Vec<ProductSales>, CommerceError> {
        if self.store.find_category(name).await?.is_none() {
            return Err(CommerceError::not_found(Entity::Category, name));
        }
        let limit = limit
            .unwrap_or(DEFAULT_CATEGORY_PRODUCTS)
            .clamp(1, db::store::MAX_PAGE_LIMIT);
        Ok(self.store.list_category_products(name, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use db::{DBService, models::product::NewProduct};
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn category_lifecycle() {
        let store: Arc<dyn Store> = Arc::new(DBService::new_in_memory().await.unwrap().store());
        let service = CategoryService::new(store.clone());

        service
            .create(&CreateCategory {
                name: Some(" Hogar ".to_string()),
            })
            .await
            .unwrap();
        let err = service
            .create(&CreateCategory {
                name: Some("Hogar".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Conflict(m) if m == "category already exists"));
        let err = service.create(&CreateCategory { name: None }).await.unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));

        store
            .create_product(
                Uuid::new_v4(),
                &NewProduct {
                    name: "Lamp".to_string(),
                    category: "Hogar".to_string(),
                    sku: None,
                    alt_code: None,
                    legacy_code: None,
                },
            )
            .await
            .unwrap();

        let names: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Hogar"]);

        let products = service.products("Hogar", None).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].order_lines, 0);

        assert!(matches!(
            service.products("Jardin", None).await.unwrap_err(),
            CommerceError::NotFound { entity: Entity::Category, .. }
        ));
    }
}

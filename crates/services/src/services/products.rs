use std::sync::Arc;

use db::{
    DeleteOutcome, Pagination, Store,
    models::{
        product::{Product, ProductFilter},
        product_equivalence::EquivalentProduct,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    error::{CommerceError, Entity},
    validation::{
        CreateEquivalence, CreateProduct, UpdateProduct, ValidationError, validate_equivalence,
        validate_new_product, validate_product_patch,
    },
};

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct ProductQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct EquivalenceLink {
    pub product_a: Uuid,
    pub product_b: Uuid,
    pub reason: String,
    pub confidence: f64,
    pub validated_by: String,
}

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn Store>,
}

impl ProductService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn ensure_category(&self, name: &str) -> Result<(), CommerceError> {
        match self.store.find_category(name).await? {
            Some(_) => Ok(()),
            None => Err(CommerceError::not_found(Entity::Category, name)),
        }
    }

    pub async fn create(&self, input: &CreateProduct) -> Result<Product, CommerceError> {
        self.create_with_id(Uuid::new_v4(), input).await
    }

    pub(crate) async fn create_with_id(
        &self,
        id: Uuid,
        input: &CreateProduct,
    ) -> Result<Product, CommerceError> {
        let data = validate_new_product(input)?;
        self.ensure_category(&data.category).await?;

        let product = self.store.create_product(id, &data).await?;
        info!(product_id = %product.id, category = %product.category, "Product created");
        Ok(product)
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, CommerceError> {
        self.store
            .find_product(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Product, id))
    }

    pub async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, CommerceError> {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let filter = ProductFilter {
            category: text(&query.category),
            q: text(&query.q),
        };
        let page = Pagination::new(query.limit, query.skip);
        Ok(self.store.list_products(&filter, page).await?)
    }

    /// Products whose id, sku, alt_code or legacy_code equals `code`.
    pub async fn lookup(&self, code: &str) -> Result<Vec<Product>, CommerceError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ValidationError::new("code", "is required").into());
        }
        Ok(self.store.lookup_products(code).await?)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateProduct) -> Result<Product, CommerceError> {
        let patch = validate_product_patch(input)?;
        if let Some(category) = &patch.category {
            self.ensure_category(category).await?;
        }

        let product = self
            .store
            .update_product(id, &patch)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Product, id))?;
        info!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// False while any order line references the product.
    pub async fn can_delete(&self, id: Uuid) -> Result<bool, CommerceError> {
        Ok(self.store.count_product_lines(id).await? == 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CommerceError> {
        match self.store.delete_product(id).await? {
            DeleteOutcome::Deleted => {
                info!(product_id = %id, "Product deleted");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(CommerceError::not_found(Entity::Product, id)),
            DeleteOutcome::Referenced(lines) => Err(CommerceError::Conflict(format!(
                "product {id} appears in {lines} order line(s) and cannot be deleted"
            ))),
        }
    }

    pub async fn equivalences(&self, id: Uuid) -> Result<Vec<EquivalentProduct>, CommerceError> {
        self.get(id).await?;
        Ok(self.store.list_equivalences(id).await?)
    }

    pub async fn create_equivalence(
        &self,
        input: &CreateEquivalence,
    ) -> Result<EquivalenceLink, CommerceError> {
        let data = validate_equivalence(input)?;
        self.get(data.product_a).await?;
        self.get(data.product_b).await?;
        if self
            .store
            .equivalence_exists(data.product_a, data.product_b)
            .await?
        {
            return Err(CommerceError::Conflict(format!(
                "products {} and {} are already linked",
                data.product_a, data.product_b
            )));
        }

        self.store.create_equivalence(&data).await?;
        info!(
            product_a = %data.product_a,
            product_b = %data.product_b,
            confidence = data.confidence,
            "Equivalence linked"
        );

        Ok(EquivalenceLink {
            product_a: data.product_a,
            product_b: data.product_b,
            reason: data.reason,
            confidence: data.confidence,
            validated_by: data.validated_by,
        })
    }
}

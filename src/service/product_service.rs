use crate::domain::product::{
    NewProduct, Product, ProductFilter, ProductPatch, StockLevels,
};
use crate::error::ServiceError;
use crate::repo::products_repo::ProductStore;
use crate::service::product_filter;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProductService {
    pub store: Arc<dyn ProductStore>,
}

impl ProductService {
    pub async fn list_all(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.list_all().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, ServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>, ServiceError> {
        let found = self.store.list_by_category(category.trim()).await?;
        if found.is_empty() {
            return Err(ServiceError::not_found(format!(
                "products in category '{category}'"
            )));
        }
        Ok(found)
    }

    pub async fn by_brand(&self, brand: &str) -> Result<Vec<Product>, ServiceError> {
        let found = self.store.list_by_brand(brand.trim()).await?;
        if found.is_empty() {
            return Err(ServiceError::not_found(format!("products of brand '{brand}'")));
        }
        Ok(found)
    }

    pub async fn create(&self, new: NewProduct) -> Result<Product, ServiceError> {
        let stock = new
            .stock_levels()
            .into_entries()
            .map_err(ServiceError::Validation)?;

        let product = Product {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            brand: new.brand.trim().to_string(),
            category: new.category.trim().to_string(),
            description: new.description,
            price: new.price,
            image: new.image.filter(|i| !i.trim().is_empty()),
            stock,
            featured: new.featured,
            disabled: false,
            created_at: chrono::Utc::now(),
        };
        validate_product(&product)?;

        self.store.insert(&product).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn modify(&self, id: Uuid, patch: ProductPatch) -> Result<Product, ServiceError> {
        let mut product = self.get(id).await?;

        if let Some(name) = patch.name {
            product.name = name.trim().to_string();
        }
        if let Some(brand) = patch.brand {
            product.brand = brand.trim().to_string();
        }
        if let Some(category) = patch.category {
            product.category = category.trim().to_string();
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(image) = patch.image {
            product.image = Some(image).filter(|i| !i.trim().is_empty());
        }
        validate_product(&product)?;

        if !self.store.update(&product).await? {
            return Err(not_found(id));
        }
        Ok(product)
    }

    /// Sets the count of each listed size; sizes not listed keep their stock.
    pub async fn control_stock(
        &self,
        id: Uuid,
        levels: StockLevels,
    ) -> Result<StockLevels, ServiceError> {
        let updates = levels.into_entries().map_err(ServiceError::Validation)?;
        if updates.is_empty() {
            return Err(ServiceError::validation("at least one size is required"));
        }

        let mut product = self.get(id).await?;
        product.apply_stock(&updates);

        if !self.store.update(&product).await? {
            return Err(not_found(id));
        }
        tracing::info!(product_id = %id, sizes = updates.len(), "stock updated");
        Ok(StockLevels::from_entries(&product.stock))
    }

    pub async fn toggle_disabled(&self, id: Uuid) -> Result<Product, ServiceError> {
        self.store
            .toggle_disabled(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn toggle_featured(&self, id: Uuid) -> Result<Product, ServiceError> {
        self.store
            .toggle_featured(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.store.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn search(&self, name: Option<&str>) -> Result<Vec<Product>, ServiceError> {
        let name = name.map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(ServiceError::validation("name is required"));
        }

        let found = self.store.search_by_name(name).await?;
        if found.is_empty() {
            return Err(ServiceError::not_found(format!("product matching '{name}'")));
        }
        Ok(found)
    }

    pub async fn filter(&self, filter: ProductFilter) -> Result<Vec<Product>, ServiceError> {
        product_filter::validate(&filter).map_err(ServiceError::Validation)?;
        let products = self.store.list_all().await?;
        Ok(product_filter::apply(&filter, products))
    }
}

fn validate_product(product: &Product) -> Result<(), ServiceError> {
    if product.name.is_empty() {
        return Err(ServiceError::validation("name must not be empty"));
    }
    if product.brand.is_empty() {
        return Err(ServiceError::validation("brand must not be empty"));
    }
    if product.category.is_empty() {
        return Err(ServiceError::validation("category must not be empty"));
    }
    if product.price <= Decimal::ZERO {
        return Err(ServiceError::validation("price must be > 0"));
    }
    Ok(())
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::not_found(format!("product {id}"))
}

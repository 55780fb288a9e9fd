use crate::domain::product::{Product, StockEntry};
use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Product>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>>;
    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>>;
    async fn list_by_brand(&self, brand: &str) -> Result<Vec<Product>>;
    /// Enabled products whose name contains `fragment`, ignoring case.
    async fn search_by_name(&self, fragment: &str) -> Result<Vec<Product>>;
    async fn insert(&self, product: &Product) -> Result<()>;
    /// Writes every mutable column. Returns false when the product is gone.
    async fn update(&self, product: &Product) -> Result<bool>;
    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<Product>>;
    async fn toggle_featured(&self, id: Uuid) -> Result<Option<Product>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[derive(Clone)]
pub struct ProductsRepo {
    pub pool: PgPool,
}

const PRODUCT_COLUMNS: &str =
    "id, name, brand, category, description, price, image, stock, featured, disabled, created_at";

fn row_to_product(r: &PgRow) -> Result<Product> {
    let stock: Json<Vec<StockEntry>> = r.try_get("stock")?;
    Ok(Product {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        brand: r.try_get("brand")?,
        category: r.try_get("category")?,
        description: r.try_get("description")?,
        price: r.try_get("price")?,
        image: r.try_get("image")?,
        stock: stock.0,
        featured: r.try_get("featured")?,
        disabled: r.try_get("disabled")?,
        created_at: r.try_get("created_at")?,
    })
}

/// Escapes LIKE metacharacters so user input matches literally.
pub fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl ProductsRepo {
    async fn fetch_many(&self, sql: &str, arg: Option<&str>) -> Result<Vec<Product>> {
        let mut query = sqlx::query::<sqlx::Postgres>(sql);
        if let Some(arg) = arg {
            query = query.bind(arg);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_product).collect()
    }
}

#[async_trait::async_trait]
impl ProductStore for ProductsRepo {
    async fn list_all(&self) -> Result<Vec<Product>> {
        self.fetch_many(
            &format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at ASC"),
            None,
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>> {
        self.fetch_many(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE lower(category) = lower($1) ORDER BY created_at ASC"
            ),
            Some(category),
        )
        .await
    }

    async fn list_by_brand(&self, brand: &str) -> Result<Vec<Product>> {
        self.fetch_many(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE lower(brand) = lower($1) ORDER BY created_at ASC"
            ),
            Some(brand),
        )
        .await
    }

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<Product>> {
        self.fetch_many(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE disabled = false AND name ILIKE $1 ORDER BY name ASC"
            ),
            Some(&like_pattern(fragment)),
        )
        .await
    }

    async fn insert(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, brand, category, description, price, image,
                stock, featured, disabled, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .bind(Json(&product.stock))
        .bind(product.featured)
        .bind(product.disabled)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, brand = $3, category = $4, description = $5, price = $6,
                image = $7, stock = $8, featured = $9, disabled = $10, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .bind(Json(&product.stock))
        .bind(product.featured)
        .bind(product.disabled)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "UPDATE products SET disabled = NOT disabled, updated_at = now() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn toggle_featured(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "UPDATE products SET featured = NOT featured, updated_at = now() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("nike"), "%nike%");
    }
}

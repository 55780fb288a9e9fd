use crate::domain::review::Review;
use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait ReviewStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Review>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>>;
    async fn insert(&self, review: &Review) -> Result<()>;
    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<Review>>;
}

#[derive(Clone)]
pub struct ReviewsRepo {
    pub pool: PgPool,
}

const REVIEW_COLUMNS: &str =
    "id, product_name, first_name, user_id, comment, rating, disabled, created_at";

fn row_to_review(r: &PgRow) -> Result<Review> {
    Ok(Review {
        id: r.try_get("id")?,
        product_name: r.try_get("product_name")?,
        first_name: r.try_get("first_name")?,
        user_id: r.try_get("user_id")?,
        comment: r.try_get("comment")?,
        rating: r.try_get("rating")?,
        disabled: r.try_get("disabled")?,
        created_at: r.try_get("created_at")?,
    })
}

#[async_trait::async_trait]
impl ReviewStore for ReviewsRepo {
    async fn list_all(&self) -> Result<Vec<Review>> {
        let rows = sqlx::query(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_review).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>> {
        let row = sqlx::query(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_review).transpose()
    }

    async fn insert(&self, review: &Review) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, product_name, first_name, user_id, comment, rating, disabled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(review.id)
        .bind(&review.product_name)
        .bind(&review.first_name)
        .bind(review.user_id)
        .bind(&review.comment)
        .bind(review.rating)
        .bind(review.disabled)
        .bind(review.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<Review>> {
        let row = sqlx::query(&format!(
            "UPDATE reviews SET disabled = NOT disabled WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_review).transpose()
    }
}

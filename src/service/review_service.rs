use crate::domain::review::{NewReview, Review, MAX_RATING, MIN_RATING};
use crate::error::ServiceError;
use crate::repo::reviews_repo::ReviewStore;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ReviewService {
    pub store: Arc<dyn ReviewStore>,
}

impl ReviewService {
    pub async fn list_all(&self) -> Result<Vec<Review>, ServiceError> {
        Ok(self.store.list_all().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Review, ServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("review {id}")))
    }

    pub async fn create(&self, new: NewReview) -> Result<Review, ServiceError> {
        if !(MIN_RATING..=MAX_RATING).contains(&new.rating) {
            return Err(ServiceError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }
        if new.comment.trim().is_empty() {
            return Err(ServiceError::validation("comment must not be empty"));
        }
        if new.product_name.trim().is_empty() {
            return Err(ServiceError::validation("productName must not be empty"));
        }

        let review = Review {
            id: Uuid::new_v4(),
            product_name: new.product_name.trim().to_string(),
            first_name: new.first_name.trim().to_string(),
            user_id: new.id_user,
            comment: new.comment.trim().to_string(),
            rating: new.rating,
            disabled: false,
            created_at: chrono::Utc::now(),
        };
        self.store.insert(&review).await?;
        Ok(review)
    }

    pub async fn toggle_disabled(&self, id: Uuid) -> Result<Review, ServiceError> {
        self.store
            .toggle_disabled(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("review {id}")))
    }
}

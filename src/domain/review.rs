use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub product_name: String,
    pub first_name: String,
    pub user_id: Uuid,
    pub comment: String,
    pub rating: i32,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub comment: String,
    pub rating: i32,
    pub first_name: String,
    pub product_name: String,
    pub id_user: Uuid,
}

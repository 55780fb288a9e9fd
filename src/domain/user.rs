use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub picture: Option<String>,
    pub nationality: Option<String>,
    pub date_birth: Option<NaiveDate>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub disabled: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    pub email: String,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Profile edit. `first_name`/`last_name` map onto the given/family name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nationality: Option<String>,
    pub date_birth: Option<NaiveDate>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressUpdate {
    pub address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserCreated {
    pub message: &'static str,
    pub user: User,
}

use crate::domain::user::{NewUser, User, UserPatch};
use crate::error::ServiceError;
use crate::repo::users_repo::UserStore;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Created(User),
    AlreadyExists(User),
}

#[derive(Clone)]
pub struct UserService {
    pub store: Arc<dyn UserStore>,
}

impl UserService {
    pub async fn list_all(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.store.list_all().await?)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User, ServiceError> {
        self.store
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user {email}")))
    }

    /// Registering an email twice returns the existing user untouched.
    pub async fn register(&self, new: NewUser) -> Result<Registration, ServiceError> {
        let email = new.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::validation("email must be a valid email"));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.clone(),
            given_name: new.given_name.trim().to_string(),
            family_name: new.family_name.trim().to_string(),
            picture: new.picture.filter(|p| !p.trim().is_empty()),
            nationality: None,
            date_birth: None,
            mobile: None,
            address: None,
            disabled: false,
            is_admin: false,
            created_at: chrono::Utc::now(),
        };

        if self.store.insert(&user).await? {
            // Delivery is handled outside this service.
            tracing::info!(user_id = %user.id, email = %email, "user registered, welcome email due");
            return Ok(Registration::Created(user));
        }

        let existing = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user {email}")))?;
        Ok(Registration::AlreadyExists(existing))
    }

    pub async fn modify(&self, email: &str, patch: UserPatch) -> Result<User, ServiceError> {
        let mut user = self.get_by_email(email).await?;

        if let Some(first_name) = patch.first_name {
            user.given_name = first_name.trim().to_string();
        }
        if let Some(last_name) = patch.last_name {
            user.family_name = last_name.trim().to_string();
        }
        if let Some(nationality) = patch.nationality {
            user.nationality = Some(nationality);
        }
        if let Some(date_birth) = patch.date_birth {
            if date_birth > chrono::Utc::now().date_naive() {
                return Err(ServiceError::validation("date_birth must not be in the future"));
            }
            user.date_birth = Some(date_birth);
        }
        if let Some(mobile) = patch.mobile {
            user.mobile = Some(mobile);
        }
        if let Some(address) = patch.address {
            user.address = Some(address);
        }
        if let Some(image) = patch.image {
            user.picture = Some(image);
        }

        self.save(user).await
    }

    pub async fn update_address(&self, email: &str, address: String) -> Result<User, ServiceError> {
        let address = address.trim().to_string();
        if address.is_empty() {
            return Err(ServiceError::validation("address must not be empty"));
        }

        let mut user = self.get_by_email(email).await?;
        user.address = Some(address);
        self.save(user).await
    }

    pub async fn toggle_disabled(&self, id: Uuid) -> Result<User, ServiceError> {
        self.store
            .toggle_disabled(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user {id}")))
    }

    pub async fn toggle_privilege(&self, id: Uuid) -> Result<User, ServiceError> {
        let user = self
            .store
            .toggle_admin(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user {id}")))?;
        tracing::info!(user_id = %id, is_admin = user.is_admin, "user privilege changed");
        Ok(user)
    }

    async fn save(&self, user: User) -> Result<User, ServiceError> {
        if !self.store.update(&user).await? {
            return Err(ServiceError::not_found(format!("user {}", user.email)));
        }
        Ok(user)
    }
}

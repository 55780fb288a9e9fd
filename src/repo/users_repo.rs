use crate::domain::user::User;
use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Emails are stored lowercased; lookups lowercase their argument.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Returns false, writing nothing, when the email is already registered.
    async fn insert(&self, user: &User) -> Result<bool>;
    async fn update(&self, user: &User) -> Result<bool>;
    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<User>>;
    async fn toggle_admin(&self, id: Uuid) -> Result<Option<User>>;
}

#[derive(Clone)]
pub struct UsersRepo {
    pub pool: PgPool,
}

const USER_COLUMNS: &str = "id, email, given_name, family_name, picture, nationality, date_birth, mobile, address, disabled, is_admin, created_at";

fn row_to_user(r: &PgRow) -> Result<User> {
    Ok(User {
        id: r.try_get("id")?,
        email: r.try_get("email")?,
        given_name: r.try_get("given_name")?,
        family_name: r.try_get("family_name")?,
        picture: r.try_get("picture")?,
        nationality: r.try_get("nationality")?,
        date_birth: r.try_get("date_birth")?,
        mobile: r.try_get("mobile")?,
        address: r.try_get("address")?,
        disabled: r.try_get("disabled")?,
        is_admin: r.try_get("is_admin")?,
        created_at: r.try_get("created_at")?,
    })
}

#[async_trait::async_trait]
impl UserStore for UsersRepo {
    async fn list_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user).collect()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn insert(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                id, email, given_name, family_name, picture, nationality,
                date_birth, mobile, address, disabled, is_admin, created_at
            ) VALUES ($1, lower($2), $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.given_name)
        .bind(&user.family_name)
        .bind(&user.picture)
        .bind(&user.nationality)
        .bind(user.date_birth)
        .bind(&user.mobile)
        .bind(&user.address)
        .bind(user.disabled)
        .bind(user.is_admin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET given_name = $2, family_name = $3, picture = $4, nationality = $5,
                date_birth = $6, mobile = $7, address = $8, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.given_name)
        .bind(&user.family_name)
        .bind(&user.picture)
        .bind(&user.nationality)
        .bind(user.date_birth)
        .bind(&user.mobile)
        .bind(&user.address)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "UPDATE users SET disabled = NOT disabled, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn toggle_admin(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "UPDATE users SET is_admin = NOT is_admin, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }
}

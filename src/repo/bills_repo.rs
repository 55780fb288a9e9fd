use crate::domain::bill::{Bill, BillFilter, BillItem, BillStatus, Payer};
use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait BillStore: Send + Sync {
    async fn insert(&self, bill: &Bill) -> Result<()>;

    /// Newest first.
    async fn list_all(&self) -> Result<Vec<Bill>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Bill>>;

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Bill>>;

    async fn attach_preference(&self, id: Uuid, preference_id: &str) -> Result<()>;

    /// Compare-and-set: moves the bill from `expected` to `next` and records
    /// `payment_id`, but only while the bill is still in `expected` and holds
    /// no payment id or this same one. Returns whether a row changed.
    async fn apply_payment_status(
        &self,
        id: Uuid,
        payment_id: &str,
        expected: BillStatus,
        next: BillStatus,
    ) -> Result<bool>;

    async fn set_disabled(&self, id: Uuid, disabled: bool) -> Result<Option<Bill>>;

    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<Bill>>;

    async fn search(&self, filter: &BillFilter) -> Result<Vec<Bill>>;
}

#[derive(Clone)]
pub struct BillsRepo {
    pub pool: PgPool,
}

const BILL_COLUMNS: &str = "id, items, payer_email, payer_name, payer_surname, payment_id, preference_id, status, disabled, created_at";

fn row_to_bill(r: &PgRow) -> Result<Bill> {
    let status: String = r.try_get("status")?;
    let items: Json<Vec<BillItem>> = r.try_get("items")?;
    Ok(Bill {
        id: r.try_get("id")?,
        items: items.0,
        payer: Payer {
            email: r.try_get("payer_email")?,
            name: r.try_get("payer_name")?,
            surname: r.try_get("payer_surname")?,
        },
        payment_id: r.try_get("payment_id")?,
        preference_id: r.try_get("preference_id")?,
        status: BillStatus::parse(&status).ok_or_else(|| anyhow!("unknown bill status '{status}'"))?,
        disabled: r.try_get("disabled")?,
        created_at: r.try_get("created_at")?,
    })
}

#[async_trait::async_trait]
impl BillStore for BillsRepo {
    async fn insert(&self, bill: &Bill) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bills (
                id, items, payer_email, payer_name, payer_surname,
                payment_id, preference_id, status, disabled, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(bill.id)
        .bind(Json(&bill.items))
        .bind(&bill.payer.email)
        .bind(&bill.payer.name)
        .bind(&bill.payer.surname)
        .bind(&bill.payment_id)
        .bind(&bill.preference_id)
        .bind(bill.status.as_str())
        .bind(bill.disabled)
        .bind(bill.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Bill>> {
        let rows = sqlx::query(&format!(
            "SELECT {BILL_COLUMNS} FROM bills ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_bill).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Bill>> {
        let row = sqlx::query(&format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_bill).transpose()
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Bill>> {
        let row = sqlx::query(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE payment_id = $1"
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_bill).transpose()
    }

    async fn attach_preference(&self, id: Uuid, preference_id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE bills SET preference_id = $2, updated_at = now() WHERE id = $1 AND preference_id IS NULL",
        )
        .bind(id)
        .bind(preference_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_payment_status(
        &self,
        id: Uuid,
        payment_id: &str,
        expected: BillStatus,
        next: BillStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bills
            SET status = $4, payment_id = COALESCE(payment_id, $2), updated_at = now()
            WHERE id = $1
              AND status = $3
              AND (payment_id IS NULL OR payment_id = $2)
            "#,
        )
        .bind(id)
        .bind(payment_id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_disabled(&self, id: Uuid, disabled: bool) -> Result<Option<Bill>> {
        let row = sqlx::query(&format!(
            "UPDATE bills SET disabled = $2, updated_at = now() WHERE id = $1 RETURNING {BILL_COLUMNS}"
        ))
        .bind(id)
        .bind(disabled)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_bill).transpose()
    }

    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<Bill>> {
        let row = sqlx::query(&format!(
            "UPDATE bills SET disabled = NOT disabled, updated_at = now() WHERE id = $1 RETURNING {BILL_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_bill).transpose()
    }

    async fn search(&self, filter: &BillFilter) -> Result<Vec<Bill>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BILL_COLUMNS}
            FROM bills
            WHERE ($1::text IS NULL OR lower(payer_email) = lower($1))
              AND ($2::text IS NULL OR status = $2)
              AND ($3::boolean IS NULL OR disabled = $3)
              AND ($4::text IS NULL OR payment_id = $4)
            ORDER BY created_at DESC
            "#
        ))
        .bind(&filter.email)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.disabled)
        .bind(&filter.payment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_bill).collect()
    }
}

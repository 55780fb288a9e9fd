//! In-memory stores for tests and `STORAGE_BACKEND=memory` local runs.
//!
//! Each mutation takes one write lock, so the conditional updates behave
//! like the single-statement SQL versions.

use crate::domain::bill::{Bill, BillFilter, BillStatus};
use crate::domain::product::Product;
use crate::domain::review::Review;
use crate::domain::user::User;
use crate::repo::bills_repo::BillStore;
use crate::repo::products_repo::ProductStore;
use crate::repo::reviews_repo::ReviewStore;
use crate::repo::users_repo::UserStore;
use anyhow::{anyhow, Result};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("lock poisoned"))
}

#[derive(Debug, Default)]
pub struct InMemoryBillStore {
    bills: RwLock<Vec<Bill>>,
}

impl InMemoryBillStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BillStore for InMemoryBillStore {
    async fn insert(&self, bill: &Bill) -> Result<()> {
        let mut bills = write(&self.bills)?;
        if bills.iter().any(|b| b.id == bill.id) {
            return Err(anyhow!("bill {} already exists", bill.id));
        }
        bills.push(bill.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Bill>> {
        Ok(read(&self.bills)?.iter().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Bill>> {
        Ok(read(&self.bills)?.iter().find(|b| b.id == id).cloned())
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Bill>> {
        Ok(read(&self.bills)?
            .iter()
            .find(|b| b.payment_id.as_deref() == Some(payment_id))
            .cloned())
    }

    async fn attach_preference(&self, id: Uuid, preference_id: &str) -> Result<()> {
        let mut bills = write(&self.bills)?;
        if let Some(bill) = bills.iter_mut().find(|b| b.id == id) {
            if bill.preference_id.is_none() {
                bill.preference_id = Some(preference_id.to_string());
            }
        }
        Ok(())
    }

    async fn apply_payment_status(
        &self,
        id: Uuid,
        payment_id: &str,
        expected: BillStatus,
        next: BillStatus,
    ) -> Result<bool> {
        let mut bills = write(&self.bills)?;
        let Some(bill) = bills.iter_mut().find(|b| b.id == id) else {
            return Ok(false);
        };

        let payment_ok = match &bill.payment_id {
            None => true,
            Some(existing) => existing == payment_id,
        };
        if bill.status != expected || !payment_ok {
            return Ok(false);
        }

        bill.status = next;
        if bill.payment_id.is_none() {
            bill.payment_id = Some(payment_id.to_string());
        }
        Ok(true)
    }

    async fn set_disabled(&self, id: Uuid, disabled: bool) -> Result<Option<Bill>> {
        let mut bills = write(&self.bills)?;
        Ok(bills.iter_mut().find(|b| b.id == id).map(|bill| {
            bill.disabled = disabled;
            bill.clone()
        }))
    }

    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<Bill>> {
        let mut bills = write(&self.bills)?;
        Ok(bills.iter_mut().find(|b| b.id == id).map(|bill| {
            bill.disabled = !bill.disabled;
            bill.clone()
        }))
    }

    async fn search(&self, filter: &BillFilter) -> Result<Vec<Bill>> {
        Ok(read(&self.bills)?
            .iter()
            .rev()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn toggle(&self, id: Uuid, flip: impl FnOnce(&mut Product)) -> Result<Option<Product>> {
        let mut products = write(&self.products)?;
        Ok(products.iter_mut().find(|p| p.id == id).map(|product| {
            flip(product);
            product.clone()
        }))
    }
}

#[async_trait::async_trait]
impl ProductStore for InMemoryProductStore {
    async fn list_all(&self) -> Result<Vec<Product>> {
        Ok(read(&self.products)?.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(read(&self.products)?.iter().find(|p| p.id == id).cloned())
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>> {
        Ok(read(&self.products)?
            .iter()
            .filter(|p| p.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect())
    }

    async fn list_by_brand(&self, brand: &str) -> Result<Vec<Product>> {
        Ok(read(&self.products)?
            .iter()
            .filter(|p| p.brand.eq_ignore_ascii_case(brand))
            .cloned()
            .collect())
    }

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<Product>> {
        let needle = fragment.to_lowercase();
        let mut found: Vec<Product> = read(&self.products)?
            .iter()
            .filter(|p| !p.disabled && p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn insert(&self, product: &Product) -> Result<()> {
        write(&self.products)?.push(product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<bool> {
        let mut products = write(&self.products)?;
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<Product>> {
        self.toggle(id, |p| p.disabled = !p.disabled)
    }

    async fn toggle_featured(&self, id: Uuid) -> Result<Option<Product>> {
        self.toggle(id, |p| p.featured = !p.featured)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut products = write(&self.products)?;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReviewStore {
    reviews: RwLock<Vec<Review>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn list_all(&self) -> Result<Vec<Review>> {
        Ok(read(&self.reviews)?.iter().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>> {
        Ok(read(&self.reviews)?.iter().find(|r| r.id == id).cloned())
    }

    async fn insert(&self, review: &Review) -> Result<()> {
        write(&self.reviews)?.push(review.clone());
        Ok(())
    }

    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<Review>> {
        let mut reviews = write(&self.reviews)?;
        Ok(reviews.iter_mut().find(|r| r.id == id).map(|review| {
            review.disabled = !review.disabled;
            review.clone()
        }))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn list_all(&self) -> Result<Vec<User>> {
        Ok(read(&self.users)?.clone())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_lowercase();
        Ok(read(&self.users)?.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: &User) -> Result<bool> {
        let mut users = write(&self.users)?;
        let email = user.email.to_lowercase();
        if users.iter().any(|u| u.email == email) {
            return Ok(false);
        }
        users.push(User {
            email,
            ..user.clone()
        });
        Ok(true)
    }

    async fn update(&self, user: &User) -> Result<bool> {
        let mut users = write(&self.users)?;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                existing.given_name = user.given_name.clone();
                existing.family_name = user.family_name.clone();
                existing.picture = user.picture.clone();
                existing.nationality = user.nationality.clone();
                existing.date_birth = user.date_birth;
                existing.mobile = user.mobile.clone();
                existing.address = user.address.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn toggle_disabled(&self, id: Uuid) -> Result<Option<User>> {
        let mut users = write(&self.users)?;
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            user.disabled = !user.disabled;
            user.clone()
        }))
    }

    async fn toggle_admin(&self, id: Uuid) -> Result<Option<User>> {
        let mut users = write(&self.users)?;
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            user.is_admin = !user.is_admin;
            user.clone()
        }))
    }
}
